use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize;
use crate::catalog::{Contrast, RegionTag};

/// Region set and contrast flag inferred from the first dictated sentence.
/// Empty regions + `Unknown` contrast mean the sentence did not specify a
/// study type; the pipeline still produces a degraded report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudyTags {
    pub regions: Vec<RegionTag>,
    pub contrast: Contrast,
}

impl StudyTags {
    pub fn none() -> Self {
        Self {
            regions: Vec::new(),
            contrast: Contrast::Unknown,
        }
    }

    pub fn has(&self, region: RegionTag) -> bool {
        self.regions.contains(&region)
    }
}

// Markers are matched against normalized text, so the patterns are plain
// ASCII (accents are already stripped).
static STUDY_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\btc\b").unwrap());
static THORAX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\btorax\b").unwrap());
static ABDOMEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\babdomen\b|\babdominal\b|\babdominopelv|abdomen y pelvis").unwrap()
});
static COMPOUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\btoracoabdominal\b").unwrap());
static CONTRAST_WITH: LazyLock<Regex> = LazyLock::new(|| {
    // "con y sin contraste" is a conflicting mention; WITH wins.
    Regex::new(r"\bcon (?:y sin )?contraste\b|\bcon realce\b|\bcon iv\b").unwrap()
});
static CONTRAST_WITHOUT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsin contraste\b|\bsin iv\b|\bsin realce\b").unwrap());

/// Parse the first sentence of the dictation into study tags.
///
/// The sentence must carry the whole word "tc" to count as a study-type
/// sentence at all. "toracoabdominal" selects both regions. When a sentence
/// mentions both contrast states ("con y sin contraste"), WITH wins; that
/// tie-break is deliberate.
pub fn parse_study_tags(first_sentence: &str) -> StudyTags {
    let n = normalize(first_sentence);

    if !STUDY_MARKER.is_match(&n) {
        tracing::warn!("first sentence carries no study marker, degrading");
        return StudyTags::none();
    }

    let mut regions = Vec::new();
    if THORAX.is_match(&n) || COMPOUND.is_match(&n) {
        regions.push(RegionTag::Thorax);
    }
    if ABDOMEN.is_match(&n) || COMPOUND.is_match(&n) {
        regions.push(RegionTag::Abdomen);
    }

    let contrast = if CONTRAST_WITH.is_match(&n) {
        Contrast::With
    } else if CONTRAST_WITHOUT.is_match(&n) {
        Contrast::Without
    } else {
        Contrast::Unknown
    };

    StudyTags { regions, contrast }
}
