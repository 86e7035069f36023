use std::collections::HashMap;

use super::loader::ReferenceData;
use super::types::{Contrast, RegionTag};
use crate::pipeline::normalize::normalize;

/// Where a known finding phrase anchors: its anatomical zone, the canonical
/// phrase text as authored, and the normal phrase it replaces or augments
/// (`None` for anchorless zones).
#[derive(Debug, Clone)]
pub struct FindingAnchor {
    pub zone: String,
    pub text: String,
    pub normal_phrase: Option<String>,
}

/// Resolution target of a fuzzy variant.
#[derive(Debug, Clone)]
pub struct FuzzyTarget {
    pub official: String,
    pub exclusions: Vec<String>,
}

/// Per-request lookup structures built from the immutable reference tables
/// and the inferred study tags. Construction is pure and cheap; no caching.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    /// Normal phrases active for this study, in template order.
    pub active_template: Vec<String>,
    /// normalize(pathological phrase) → anchor
    pub pathological: HashMap<String, FindingAnchor>,
    /// normalize(additional phrase) → anchor
    pub additional: HashMap<String, FindingAnchor>,
    /// normalize(synonym | common error | official) → target
    pub fuzzy: HashMap<String, FuzzyTarget>,
}

impl CatalogIndex {
    pub fn build(data: &ReferenceData, regions: &[RegionTag], contrast: Contrast) -> Self {
        let active_template: Vec<String> = data
            .normals
            .iter()
            .filter(|n| n.regions.iter().any(|r| regions.contains(r)))
            .filter(|n| n.contrast.iter().any(|c| c.matches(contrast)))
            .map(|n| n.text.trim().to_string())
            .collect();

        let mut pathological = HashMap::new();
        let mut additional = HashMap::new();
        for entry in &data.findings {
            let anchor_text = entry.normal_phrase.as_deref().and_then(anchor_or_none);
            for phrase in &entry.pathological {
                pathological.insert(
                    normalize(phrase),
                    FindingAnchor {
                        zone: entry.zone.clone(),
                        text: phrase.clone(),
                        normal_phrase: anchor_text.map(str::to_string),
                    },
                );
            }
            for phrase in &entry.additional {
                additional.insert(
                    normalize(phrase),
                    FindingAnchor {
                        zone: entry.zone.clone(),
                        text: phrase.clone(),
                        normal_phrase: anchor_text.map(str::to_string),
                    },
                );
            }
        }

        // Last write wins on key collisions; the lexicon is curated to
        // avoid them.
        let mut fuzzy = HashMap::new();
        for entry in &data.fuzzy {
            let official = entry.official.trim();
            if official.is_empty() {
                continue;
            }
            let target = FuzzyTarget {
                official: official.to_string(),
                exclusions: entry.exclusions.clone(),
            };
            fuzzy.insert(normalize(official), target.clone());
            for variant in entry.synonyms.iter().chain(&entry.common_errors) {
                fuzzy.insert(normalize(variant), target.clone());
            }
        }

        tracing::debug!(
            template_len = active_template.len(),
            pathological = pathological.len(),
            additional = additional.len(),
            fuzzy = fuzzy.len(),
            "catalog index built"
        );

        Self {
            active_template,
            pathological,
            additional,
            fuzzy,
        }
    }

    /// Whether `anchor` (already normalized) is a legal placement anchor:
    /// an active template line or a normal phrase named by the finding
    /// tables. Used to validate fallback-classifier verdicts.
    pub fn is_known_anchor(&self, anchor_norm: &str) -> bool {
        self.active_template
            .iter()
            .any(|l| normalize(l) == anchor_norm)
            || self
                .pathological
                .values()
                .chain(self.additional.values())
                .filter_map(|a| a.normal_phrase.as_deref())
                .any(|n| normalize(n) == anchor_norm)
    }
}

/// Curated data sometimes carries "Null."/"none" placeholders instead of a
/// JSON null for anchorless zones.
fn anchor_or_none(raw: &str) -> Option<&str> {
    match normalize(raw).as_str() {
        "" | "null" | "none" => None,
        _ => Some(raw),
    }
}
