use std::sync::LazyLock;

use regex::Regex;

use super::section::{SectionClassifier, RENDER_GROUPS, THORAX_LAST_GROUP};
use super::study_tags::StudyTags;
use crate::catalog::{Contrast, RegionTag};

static EXCESS_BLANKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("invalid blank-line pattern"));

fn region_phrase(tags: &StudyTags) -> Option<&'static str> {
    let thorax = tags.has(RegionTag::Thorax);
    let abdomen = tags.has(RegionTag::Abdomen);
    match (thorax, abdomen) {
        (true, true) => Some("tórax y abdomen"),
        (true, false) => Some("tórax"),
        (false, true) => Some("abdomen"),
        (false, false) => None,
    }
}

/// Canonical title line, e.g. `TC DE TÓRAX Y ABDOMEN CON CONTRASTE:`.
/// Unknown contrast and empty regions degrade to shorter canonical forms
/// rather than failing.
pub fn build_report_title(tags: &StudyTags) -> String {
    let Some(regions) = region_phrase(tags) else {
        return "TC:".to_string();
    };
    let regions = regions.to_uppercase();
    match tags.contrast {
        Contrast::With => format!("TC DE {regions} CON CONTRASTE:"),
        Contrast::Without => format!("TC DE {regions} SIN CONTRASTE:"),
        Contrast::Unknown => format!("TC DE {regions}:"),
    }
}

/// Fixed technique paragraph matching the title. The sentences are official
/// wordings used verbatim, never paraphrased.
pub fn build_technique_block(tags: &StudyTags) -> String {
    let sentence = match (region_phrase(tags), tags.contrast) {
        (Some(regions), Contrast::With) => {
            format!("Se realiza TC de {regions} con contraste ev.")
        }
        (Some(regions), Contrast::Without) => {
            format!("Se realiza TC de {regions} sin contraste ev.")
        }
        (Some(regions), Contrast::Unknown) => format!("Se realiza TC de {regions}."),
        (None, _) => "Se realiza TC.".to_string(),
    };
    format!("TECNICA:\n{sentence}")
}

/// Buckets the working set into anatomical paragraphs and joins them in the
/// fixed render order. One blank line separates the thoracic block from the
/// abdominal one; unclassified sentences form their own paragraph right
/// before the closing one.
pub fn render_body(lines: &[String], classifier: &SectionClassifier) -> String {
    use super::section::Section;

    let mut by_section: std::collections::HashMap<Section, Vec<&str>> =
        std::collections::HashMap::new();
    for line in lines {
        by_section.entry(classifier.classify(line)).or_default().push(line);
    }

    let mut paragraphs: Vec<(bool, String)> = Vec::new();
    for (group_idx, group) in RENDER_GROUPS.iter().enumerate() {
        let sentences: Vec<&str> = group
            .iter()
            .filter_map(|section| by_section.get(section))
            .flat_map(|v| v.iter().copied())
            .collect();
        if !sentences.is_empty() {
            paragraphs.push((group_idx <= THORAX_LAST_GROUP, sentences.join(" ")));
        }
    }
    if let Some(loose) = by_section.get(&Section::Unclassified) {
        paragraphs.push((false, loose.join(" ")));
    }
    if let Some(closing) = by_section.get(&Section::Closing) {
        paragraphs.push((false, closing.join(" ")));
    }

    let mut body = String::new();
    let mut prev_thoracic: Option<bool> = None;
    for (thoracic, paragraph) in paragraphs {
        if let Some(prev) = prev_thoracic {
            body.push('\n');
            if prev && !thoracic {
                body.push('\n');
            }
        }
        body.push_str(&paragraph);
        prev_thoracic = Some(thoracic);
    }
    EXCESS_BLANKS.replace_all(body.trim(), "\n\n").into_owned()
}

/// Assembles the final report: title, technique block, findings header and
/// the sectioned body.
pub fn render_report(tags: &StudyTags, lines: &[String], classifier: &SectionClassifier) -> String {
    format!(
        "{}\n\n{}\n\nHALLAZGOS:\n{}",
        build_report_title(tags),
        build_technique_block(tags),
        render_body(lines, classifier)
    )
}
