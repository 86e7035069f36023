//! Dictamen turns a radiologist's terse CT dictation into a fully worded
//! Spanish report: the dictated findings are matched against a curated
//! catalog, merged into the normal-phrase template for the study, cleaned up
//! by a fixed set of redaction rules and rendered section by section.

pub mod catalog;
pub mod config;
pub mod pipeline;

pub use catalog::{CatalogError, CatalogIndex, ReferenceData};
pub use pipeline::{ReportError, ReportGenerator};
