use std::fs;
use std::path::{Path, PathBuf};

use super::types::{FindingEntry, FuzzyEntry, NormalPhrase};
use super::CatalogError;
use crate::config;

/// The three reference tables, loaded once at process start and passed by
/// reference into each request. Never mutated; indices are rebuilt from
/// these per request.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub normals: Vec<NormalPhrase>,
    pub findings: Vec<FindingEntry>,
    pub fuzzy: Vec<FuzzyEntry>,
}

impl ReferenceData {
    /// Load the reference tables from a data directory containing
    /// `normal_phrases.json`, `findings.json` and `fuzzy_lexicon.json`.
    pub fn load_dir(dir: &Path) -> Result<Self, CatalogError> {
        let normals = read_table(&dir.join(config::NORMALS_FILE))?;
        let findings = read_table(&dir.join(config::FINDINGS_FILE))?;
        let fuzzy = read_table(&dir.join(config::FUZZY_FILE))?;
        tracing::info!(
            dir = %dir.display(),
            "reference data loaded"
        );
        Ok(Self {
            normals,
            findings,
            fuzzy,
        })
    }

    /// The catalog shipped with the crate. Parsing is infallible by
    /// construction; a failure here is a build defect.
    pub fn builtin() -> Self {
        Self {
            normals: serde_json::from_str(include_str!("../data/normal_phrases.json"))
                .expect("embedded normal_phrases.json is valid"),
            findings: serde_json::from_str(include_str!("../data/findings.json"))
                .expect("embedded findings.json is valid"),
            fuzzy: serde_json::from_str(include_str!("../data/fuzzy_lexicon.json"))
                .expect("embedded fuzzy_lexicon.json is valid"),
        }
    }
}

fn read_table<T: serde::de::DeserializeOwned>(path: &PathBuf) -> Result<T, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        path: path.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let data = ReferenceData::builtin();
        assert!(!data.normals.is_empty());
        assert!(!data.findings.is_empty());
        assert!(!data.fuzzy.is_empty());
    }

    #[test]
    fn builtin_anchors_exist_in_normal_table() {
        // Every anchored finding entry must point at a phrase that can enter
        // the active template, otherwise its findings could never place.
        let data = ReferenceData::builtin();
        let texts: Vec<&str> = data.normals.iter().map(|n| n.text.as_str()).collect();
        for entry in &data.findings {
            if let Some(anchor) = &entry.normal_phrase {
                assert!(
                    texts.contains(&anchor.as_str()),
                    "anchor of zone {} missing from normal phrases: {}",
                    entry.zone,
                    anchor
                );
            }
        }
    }

    #[test]
    fn missing_directory_reports_file_path() {
        let err = ReferenceData::load_dir(Path::new("/nonexistent/dictamen-data")).unwrap_err();
        assert!(err.to_string().contains(config::NORMALS_FILE));
    }
}
