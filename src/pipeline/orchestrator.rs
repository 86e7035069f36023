use tracing::{debug, info};

use super::classify::classify_sentences;
use super::integrate::integrate;
use super::llm::FallbackClassifier;
use super::redaction::apply_rules;
use super::render::render_report;
use super::section::SectionClassifier;
use super::study_tags::parse_study_tags;
use super::{normalize, ReportError};
use crate::catalog::{CatalogIndex, ReferenceData};

/// Runs the whole pipeline for one dictation: split, tag, classify,
/// integrate, redact, render. Holds the reference data and an optional
/// external classifier for sentences the catalog stages cannot place.
pub struct ReportGenerator {
    data: ReferenceData,
    fallback: Option<Box<dyn FallbackClassifier>>,
}

impl ReportGenerator {
    pub fn new(data: ReferenceData) -> Self {
        Self {
            data,
            fallback: None,
        }
    }

    pub fn with_fallback(data: ReferenceData, fallback: Box<dyn FallbackClassifier>) -> Self {
        Self {
            data,
            fallback: Some(fallback),
        }
    }

    /// The only hard failure is an empty dictation; every downstream miss
    /// degrades to a loose finding or a shorter report instead of an error.
    pub fn generate(&self, dictation: &str) -> Result<String, ReportError> {
        if dictation.trim().is_empty() {
            return Err(ReportError::EmptyDictation);
        }

        let (study_sentence, finding_sentences) = normalize::split_dictation(dictation);
        let tags = parse_study_tags(&study_sentence);
        info!(
            regions = ?tags.regions,
            contrast = ?tags.contrast,
            sentences = finding_sentences.len(),
            "generating report"
        );

        let index = CatalogIndex::build(&self.data, &tags.regions, tags.contrast);
        let classified =
            classify_sentences(&finding_sentences, &index, self.fallback.as_deref());
        debug!(
            findings = classified.findings.len(),
            template_mode = classified.template_mode,
            "dictation classified"
        );

        let working = integrate(&index.active_template, &classified.findings);
        let classifier = SectionClassifier::new(&index.active_template, &index);
        let redacted = apply_rules(working, classified.template_mode, &classifier);

        Ok(render_report(&tags, &redacted, &classifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::classify::FindingKind;
    use crate::pipeline::llm::{ScriptedClassifier, Verdict};

    fn generator() -> ReportGenerator {
        ReportGenerator::new(ReferenceData::builtin())
    }

    #[test]
    fn empty_dictation_is_the_only_hard_error() {
        assert!(matches!(
            generator().generate("   \n "),
            Err(ReportError::EmptyDictation)
        ));
    }

    #[test]
    fn pulmonary_nodule_scenario() {
        let report = generator()
            .generate("TC de tórax con contraste. Nódulo pulmonar derecho de 8mm.")
            .unwrap();
        assert!(report.starts_with("TC DE TÓRAX CON CONTRASTE:\n\nTECNICA:\n"));
        assert!(report.contains("Se realiza TC de tórax con contraste ev."));
        assert!(report.contains("Nódulo pulmonar derecho de 8mm."));
        // The parenchyma normal is suppressed, the pleura normal survives.
        assert!(!report.contains("Parénquima pulmonar"));
        assert!(report.ends_with("Espacios pleurales libres.\n\nSin otros hallazgos."));
    }

    #[test]
    fn dictation_without_findings_renders_full_template() {
        let report = generator().generate("TC de abdomen sin contraste.").unwrap();
        assert!(report.starts_with("TC DE ABDOMEN SIN CONTRASTE:"));
        assert!(report.contains("Hígado de tamaño y morfología normal"));
        assert!(report.contains("Riñones de tamaño y morfología normales."));
        assert!(report
            .contains("No se observan lesiones focales ni dilatación de las vías urinarias."));
        assert!(report.ends_with("Sin otros hallazgos."));
        // Portal vein line is contrast-gated and must not leak in.
        assert!(!report.contains("Vena porta"));
    }

    #[test]
    fn closing_sentence_appears_exactly_once_and_last() {
        let report = generator()
            .generate("TC de tórax y abdomen con contraste. Esteatosis hepática difusa. Sin otros hallazgos.")
            .unwrap();
        assert_eq!(report.matches("Sin otros hallazgos.").count(), 1);
        assert!(report.ends_with("Sin otros hallazgos."));
    }

    #[test]
    fn generation_is_deterministic() {
        let dictation = "TC de tórax y abdomen con contraste. Derrame pleural bilateral. Quiste hepático simple.";
        let a = generator().generate(dictation).unwrap();
        let b = generator().generate(dictation).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fuzzy_synonym_resolves_to_official_finding() {
        let report = generator()
            .generate("TC de tórax con contraste. Derame pleural bilateral.")
            .unwrap();
        assert!(report.contains("Derrame pleural bilateral."));
        assert!(!report.contains("Derame"));
        assert!(!report.contains("Espacios pleurales libres."));
    }

    #[test]
    fn pathological_finding_replaces_and_addition_follows() {
        let report = generator()
            .generate("TC de abdomen con contraste. Esteatosis hepática difusa. Quiste hepático simple.")
            .unwrap();
        assert!(report.contains("Esteatosis hepática difusa. Quiste hepático simple."));
        assert!(!report.contains("Hígado de tamaño y morfología normal"));
    }

    #[test]
    fn template_mode_reorders_dictated_sections() {
        let report = generator()
            .generate(
                "TC de tórax y abdomen con contraste. Esteatosis hepática difusa. Derrame pleural bilateral. Valida frases normales.",
            )
            .unwrap();
        let pleura = report.find("Derrame pleural bilateral.").unwrap();
        let liver = report.find("Esteatosis hepática difusa.").unwrap();
        assert!(pleura < liver);
        assert!(report.contains("Derrame pleural bilateral.\n\nEsteatosis hepática difusa."));
        assert!(!report.contains("Valida frases normales"));
    }

    #[test]
    fn missing_study_marker_degrades_to_bare_report() {
        let report = generator().generate("Informe sin marcador. Bocio tiroideo.").unwrap();
        assert!(report.starts_with("TC:\n\nTECNICA:\nSe realiza TC."));
        assert!(report.contains("Bocio tiroideo."));
        assert!(report.ends_with("Sin otros hallazgos."));
    }

    #[test]
    fn scripted_fallback_places_sentence_on_its_anchor() {
        let scripted = ScriptedClassifier::new().with_response(
            "imagen nodular suprarrenal izquierda",
            Verdict {
                kind: FindingKind::Pathological,
                normal_phrase: Some(
                    "Glándulas suprarrenales de tamaño y morfología normales.".to_string(),
                ),
                final_text: "Nódulo suprarrenal izquierdo.".to_string(),
            },
        );
        let generator =
            ReportGenerator::with_fallback(ReferenceData::builtin(), Box::new(scripted));
        let report = generator
            .generate("TC de abdomen con contraste. Imagen nodular suprarrenal izquierda.")
            .unwrap();
        assert!(report.contains("Nódulo suprarrenal izquierdo."));
        assert!(!report.contains("Glándulas suprarrenales de tamaño y morfología normales."));
    }

    #[test]
    fn failing_fallback_degrades_to_loose() {
        let generator = ReportGenerator::with_fallback(
            ReferenceData::builtin(),
            Box::new(ScriptedClassifier::failing()),
        );
        let report = generator
            .generate("TC de tórax con contraste. Hallazgo incidental inespecífico.")
            .unwrap();
        assert!(report.contains("Hallazgo incidental inespecífico."));
        assert!(report.ends_with("Sin otros hallazgos."));
    }
}
