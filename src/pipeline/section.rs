use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use super::normalize::normalize;
use crate::catalog::CatalogIndex;
use crate::config;

/// Anatomical sections in their fixed clinical render order. Every sentence
/// of the working set falls into exactly one of these; anything no rule
/// recognizes lands in `Unclassified`, rendered immediately before
/// `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Mediastinum,
    ThoracicVascular,
    MediastinalHilarNodes,
    AxillarySupraclavicularNodes,
    LungParenchyma,
    Pleura,
    LiverParenchyma,
    LiverVessels,
    Biliary,
    SpleenPancreasAdrenals,
    RenalRight,
    RenalLeft,
    AbdominalNodes,
    PelvicNodes,
    Peritoneum,
    Unclassified,
    Closing,
}

/// Sections whose sentences merge into one rendered paragraph, in render
/// order. The blank line of the report falls between the last thoracic
/// group (pleura) and the first abdominal one (liver).
pub const RENDER_GROUPS: &[&[Section]] = &[
    &[Section::Mediastinum, Section::ThoracicVascular],
    &[Section::MediastinalHilarNodes, Section::AxillarySupraclavicularNodes],
    &[Section::LungParenchyma],
    &[Section::Pleura],
    &[Section::LiverParenchyma],
    &[Section::LiverVessels],
    &[Section::Biliary],
    &[Section::SpleenPancreasAdrenals],
    &[Section::RenalRight, Section::RenalLeft],
    &[Section::AbdominalNodes, Section::PelvicNodes],
    &[Section::Peritoneum],
];

/// Index of the render group after which the mandated blank line goes
/// (the pleura group).
pub const THORAX_LAST_GROUP: usize = 3;

struct SectionRule {
    pattern: Regex,
    section: Section,
}

fn rule(pattern: &str, section: Section) -> SectionRule {
    SectionRule {
        pattern: Regex::new(pattern).unwrap(),
        section,
    }
}

// Keyword heuristics over normalized text (lower-case, accent-free, no
// punctuation). Order matters: earlier rules shadow later ones, e.g.
// "derrame" must reach the pleura rule before any abdominal rule.
static SECTION_RULES: LazyLock<Vec<SectionRule>> = LazyLock::new(|| {
    vec![
        rule(r"arteria pulmonar|calibre normal", Section::ThoracicVascular),
        rule(r"\btep\b|tromboembol|defecto de reple", Section::ThoracicVascular),
        rule(r"supraclavicul|axilar", Section::AxillarySupraclavicularNodes),
        rule(
            r"parenquima pulmonar|condensacion|nodulos? pulmon",
            Section::LungParenchyma,
        ),
        rule(r"pleural|pleura|derrame", Section::Pleura),
        rule(r"via biliar|vesicula|colelitiasis", Section::Biliary),
        rule(r"\bbazo\b|esplenomegalia", Section::SpleenPancreasAdrenals),
        rule(r"pancreas|wirsung", Section::SpleenPancreasAdrenals),
        rule(r"suprarrenal|adrenal", Section::SpleenPancreasAdrenals),
        rule(
            r"rinon derech|renal derech|via urinaria derech",
            Section::RenalRight,
        ),
        rule(
            r"rinon izquierd|renal izquierd|via urinaria izquierd",
            Section::RenalLeft,
        ),
        rule(r"\brinones\b|vias urinarias", Section::RenalRight),
        rule(r"adenopatias? intraabdominal", Section::AbdominalNodes),
        rule(r"adenopatias? pelvic|inguinal", Section::PelvicNodes),
        rule(
            r"coleccion|neumoperitoneo|liquido libre intraabdominal|ascitis",
            Section::Peritoneum,
        ),
    ]
});

// The two branching families that a flat rule table cannot express.
static MEDIASTINAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"mediastin|hiliar").unwrap());
static MEDIASTINAL_CONTEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"estructura|significativa|no se observan|adenopat").unwrap());
static ADENOPATHY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"adenopat").unwrap());
static HEPATIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"higado|hepatic").unwrap());
static HEPATIC_VESSELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"vena porta|suprahepat|esplenoportal|permeable").unwrap());
static HEPATIC_BILIARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"via biliar|vesicula").unwrap());
static URETER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ureter|urotel").unwrap());
static SIDE_LEFT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"izquierd").unwrap());

/// Classify one sentence into its section by keyword heuristics alone.
pub fn classify_by_keywords(sentence: &str) -> Section {
    let n = normalize(sentence);
    if n.is_empty() {
        return Section::Unclassified;
    }
    if n == normalize(config::CLOSING_SENTENCE) {
        return Section::Closing;
    }

    if MEDIASTINAL.is_match(&n) && MEDIASTINAL_CONTEXT.is_match(&n) {
        if ADENOPATHY.is_match(&n) {
            return Section::MediastinalHilarNodes;
        }
        return Section::Mediastinum;
    }

    for r in SECTION_RULES.iter() {
        // The hepatic branch outranks the later flat rules but not the
        // thoracic ones, mirroring the clinical precedence.
        if r.section == Section::Biliary && HEPATIC.is_match(&n) {
            break;
        }
        if r.pattern.is_match(&n) {
            return r.section;
        }
    }

    if HEPATIC.is_match(&n) {
        if HEPATIC_VESSELS.is_match(&n) {
            return Section::LiverVessels;
        }
        if HEPATIC_BILIARY.is_match(&n) {
            return Section::Biliary;
        }
        return Section::LiverParenchyma;
    }

    // Remaining flat rules (biliary onwards) for non-hepatic sentences.
    for r in SECTION_RULES.iter() {
        if r.pattern.is_match(&n) {
            return r.section;
        }
    }

    if URETER.is_match(&n) {
        if SIDE_LEFT.is_match(&n) {
            return Section::RenalLeft;
        }
        return Section::RenalRight;
    }

    Section::Unclassified
}

/// Section classifier with literal-anchor matching first and keyword
/// heuristics second. Anchor matching covers both the active template lines
/// themselves and every cataloged finding phrase, which inherits the section
/// of its anchor normal phrase. That is what keeps an anatomy-silent
/// addition like "Bocio tiroideo." inside its mediastinal paragraph.
pub struct SectionClassifier {
    anchors: HashMap<String, Section>,
}

impl SectionClassifier {
    pub fn new(active_template: &[String], index: &CatalogIndex) -> Self {
        let mut anchors: HashMap<String, Section> = active_template
            .iter()
            .map(|line| (normalize(line), classify_by_keywords(line)))
            .collect();

        for anchor in index.pathological.values().chain(index.additional.values()) {
            let Some(normal) = anchor.normal_phrase.as_deref() else {
                continue;
            };
            let section = anchors
                .get(&normalize(normal))
                .copied()
                .unwrap_or_else(|| classify_by_keywords(normal));
            anchors.entry(normalize(&anchor.text)).or_insert(section);
        }

        Self { anchors }
    }

    pub fn classify(&self, sentence: &str) -> Section {
        if let Some(section) = self.anchors.get(&normalize(sentence)) {
            return *section;
        }
        classify_by_keywords(sentence)
    }
}
