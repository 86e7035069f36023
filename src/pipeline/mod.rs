pub mod classify;
pub mod integrate;
pub mod llm;
pub mod normalize;
pub mod orchestrator;
pub mod redaction;
pub mod render;
pub mod section;
pub mod study_tags;

pub use classify::{ClassifiedDictation, ClassifiedFinding, FindingKind};
pub use llm::{ChatClient, FallbackClassifier};
pub use orchestrator::ReportGenerator;
pub use section::Section;
pub use study_tags::StudyTags;

use thiserror::Error;

use crate::catalog::CatalogError;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("dictation is empty, nothing to report")]
    EmptyDictation,

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
