use serde::Deserialize;

/// Study region selected by the first dictated sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub enum RegionTag {
    #[serde(rename = "TORAX")]
    Thorax,
    #[serde(rename = "ABDOMEN")]
    Abdomen,
}

/// Contrast state of the study. `Unknown` means the dictation did not say;
/// downstream renders a degraded technique block instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Contrast {
    #[serde(rename = "CON CONTRASTE")]
    With,
    #[serde(rename = "SIN CONTRASTE")]
    Without,
    #[serde(rename = "DESCONOCIDO")]
    Unknown,
}

/// Condition under which a normal phrase enters the active template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum ContrastCondition {
    #[serde(rename = "SIEMPRE")]
    Always,
    #[serde(rename = "CON CONTRASTE")]
    With,
    #[serde(rename = "SIN CONTRASTE")]
    Without,
}

impl ContrastCondition {
    /// Whether a phrase with this condition applies to a study contrast.
    /// An `Unknown` study contrast only matches `Always`.
    pub fn matches(self, study: Contrast) -> bool {
        match self {
            ContrastCondition::Always => true,
            ContrastCondition::With => study == Contrast::With,
            ContrastCondition::Without => study == Contrast::Without,
        }
    }
}

/// A boilerplate sentence describing an anatomically unremarkable structure,
/// conditioned on study region and contrast. Immutable reference data.
#[derive(Debug, Clone, Deserialize)]
pub struct NormalPhrase {
    pub text: String,
    pub regions: Vec<RegionTag>,
    pub contrast: Vec<ContrastCondition>,
}

/// One anatomical zone with its anchor normal phrase and the known
/// pathological/additional findings that map onto it. A missing or
/// "Null."-style anchor means findings of this zone have no placement
/// anchor and are treated as loose.
#[derive(Debug, Clone, Deserialize)]
pub struct FindingEntry {
    #[serde(rename = "zona_anatomica")]
    pub zone: String,
    #[serde(rename = "frase_normal")]
    pub normal_phrase: Option<String>,
    #[serde(rename = "hallazgos_patologicos", default)]
    pub pathological: Vec<String>,
    #[serde(rename = "hallazgos_adicionales", default)]
    pub additional: Vec<String>,
}

/// Fuzzy lexicon entry: many variant spellings/synonyms resolving to one
/// official finding string. `exclusions` lists variants that must NOT
/// resolve through this entry (disambiguation guard).
#[derive(Debug, Clone, Deserialize)]
pub struct FuzzyEntry {
    #[serde(rename = "hallazgo_oficial")]
    pub official: String,
    #[serde(rename = "sinonimos", default)]
    pub synonyms: Vec<String>,
    #[serde(rename = "errores_comunes", default)]
    pub common_errors: Vec<String>,
    #[serde(rename = "excluir", default)]
    pub exclusions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contrast_condition_matching() {
        assert!(ContrastCondition::Always.matches(Contrast::Unknown));
        assert!(ContrastCondition::Always.matches(Contrast::With));
        assert!(ContrastCondition::With.matches(Contrast::With));
        assert!(!ContrastCondition::With.matches(Contrast::Without));
        assert!(!ContrastCondition::With.matches(Contrast::Unknown));
        assert!(ContrastCondition::Without.matches(Contrast::Without));
        assert!(!ContrastCondition::Without.matches(Contrast::Unknown));
    }

    #[test]
    fn finding_entry_deserializes_spanish_field_names() {
        let entry: FindingEntry = serde_json::from_str(
            r#"{
                "zona_anatomica": "Pleura",
                "frase_normal": "Espacios pleurales libres.",
                "hallazgos_patologicos": ["Derrame pleural bilateral."]
            }"#,
        )
        .unwrap();
        assert_eq!(entry.zone, "Pleura");
        assert_eq!(entry.pathological.len(), 1);
        assert!(entry.additional.is_empty());
    }

    #[test]
    fn finding_entry_accepts_null_anchor() {
        let entry: FindingEntry = serde_json::from_str(
            r#"{"zona_anatomica": "Otros", "frase_normal": null}"#,
        )
        .unwrap();
        assert!(entry.normal_phrase.is_none());
    }

    #[test]
    fn normal_phrase_tags_deserialize() {
        let phrase: NormalPhrase = serde_json::from_str(
            r#"{
                "text": "Espacios pleurales libres.",
                "regions": ["TORAX"],
                "contrast": ["SIEMPRE"]
            }"#,
        )
        .unwrap();
        assert_eq!(phrase.regions, vec![RegionTag::Thorax]);
        assert_eq!(phrase.contrast, vec![ContrastCondition::Always]);
    }
}
