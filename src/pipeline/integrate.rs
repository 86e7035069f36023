use std::collections::HashMap;

use super::classify::{ClassifiedFinding, FindingKind};
use super::normalize::normalize;
use crate::config;

/// Merge the classified findings into the active template:
/// pathological findings replace their anchor line, additional findings are
/// appended after the anchor's original position, loose findings go right
/// before the closing sentence. Returns the flat working set for the
/// redaction rules.
pub fn integrate(active_template: &[String], findings: &[ClassifiedFinding]) -> Vec<String> {
    // Anchor keys are normalized so punctuation variants in curated data
    // cannot break placement.
    let template_keys: std::collections::HashSet<String> =
        active_template.iter().map(|l| normalize(l)).collect();

    let mut replacements: HashMap<String, String> = HashMap::new();
    let mut additions: HashMap<String, Vec<String>> = HashMap::new();
    let mut loose: Vec<String> = Vec::new();

    for finding in findings {
        // An anchor outside the active template (wrong region, gated by
        // contrast) cannot place the finding; it degrades to loose.
        let anchor = finding
            .anchor
            .as_deref()
            .filter(|a| template_keys.contains(&normalize(a)));
        match (finding.kind, anchor) {
            (FindingKind::Pathological, Some(anchor)) => {
                // Shared anchor: last one wins, earlier replacements drop.
                replacements.insert(normalize(anchor), finding.final_text.clone());
            }
            (FindingKind::Additional, Some(anchor)) => {
                additions
                    .entry(normalize(anchor))
                    .or_default()
                    .push(finding.final_text.clone());
            }
            _ => loose.push(finding.final_text.clone()),
        }
    }

    let mut working: Vec<String> = Vec::with_capacity(active_template.len() + findings.len() + 1);
    for line in active_template {
        let key = normalize(line);
        match replacements.get(&key) {
            Some(replacement) => working.push(replacement.clone()),
            None => working.push(line.clone()),
        }
        if let Some(extra) = additions.get(&key) {
            working.extend(extra.iter().cloned());
        }
    }

    ensure_closing(&mut working);

    if !loose.is_empty() {
        let closing_n = normalize(config::CLOSING_SENTENCE);
        match working.iter().position(|l| normalize(l) == closing_n) {
            Some(idx) => {
                working.splice(idx..idx, loose);
            }
            None => working.extend(loose),
        }
    }

    working
}

/// Append the default closing sentence unless one is already present.
fn ensure_closing(lines: &mut Vec<String>) {
    let closing_n = normalize(config::CLOSING_SENTENCE);
    if !lines.iter().any(|l| normalize(l) == closing_n) {
        lines.push(config::CLOSING_SENTENCE.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Vec<String> {
        vec![
            "Estructuras mediastínicas sin alteraciones significativas.".to_string(),
            "Espacios pleurales libres.".to_string(),
        ]
    }

    fn pathological(anchor: &str, text: &str) -> ClassifiedFinding {
        ClassifiedFinding {
            kind: FindingKind::Pathological,
            anchor: Some(anchor.to_string()),
            final_text: text.to_string(),
        }
    }

    fn additional(anchor: &str, text: &str) -> ClassifiedFinding {
        ClassifiedFinding {
            kind: FindingKind::Additional,
            anchor: Some(anchor.to_string()),
            final_text: text.to_string(),
        }
    }

    fn loose(text: &str) -> ClassifiedFinding {
        ClassifiedFinding {
            kind: FindingKind::Loose,
            anchor: None,
            final_text: text.to_string(),
        }
    }

    #[test]
    fn empty_findings_yield_template_plus_closing() {
        let out = integrate(&template(), &[]);
        assert_eq!(
            out,
            vec![
                "Estructuras mediastínicas sin alteraciones significativas.".to_string(),
                "Espacios pleurales libres.".to_string(),
                "Sin otros hallazgos.".to_string(),
            ]
        );
    }

    #[test]
    fn pathological_replaces_in_place() {
        let out = integrate(
            &template(),
            &[pathological("Espacios pleurales libres.", "Derrame pleural bilateral.")],
        );
        assert_eq!(out[1], "Derrame pleural bilateral.");
        assert!(!out.contains(&"Espacios pleurales libres.".to_string()));
    }

    #[test]
    fn additional_follows_its_anchor() {
        let out = integrate(
            &template(),
            &[additional(
                "Estructuras mediastínicas sin alteraciones significativas.",
                "Bocio tiroideo.",
            )],
        );
        assert_eq!(out[0], "Estructuras mediastínicas sin alteraciones significativas.");
        assert_eq!(out[1], "Bocio tiroideo.");
        assert_eq!(out[2], "Espacios pleurales libres.");
    }

    #[test]
    fn replacement_then_additions_on_same_anchor() {
        // Norma 4: replace first, then append, at the anchor's position.
        let anchor = "Estructuras mediastínicas sin alteraciones significativas.";
        let out = integrate(
            &template(),
            &[
                pathological(anchor, "Desplazamiento mediastínico hacia la derecha."),
                additional(anchor, "Ateromatosis aortocoronaria calcificada."),
                additional(anchor, "Bocio tiroideo."),
            ],
        );
        assert_eq!(
            &out[..3],
            &[
                "Desplazamiento mediastínico hacia la derecha.".to_string(),
                "Ateromatosis aortocoronaria calcificada.".to_string(),
                "Bocio tiroideo.".to_string(),
            ]
        );
        assert!(!out.contains(&anchor.to_string()));
    }

    #[test]
    fn competing_replacements_last_wins() {
        let anchor = "Espacios pleurales libres.";
        let out = integrate(
            &template(),
            &[
                pathological(anchor, "Derrame pleural derecho."),
                pathological(anchor, "Derrame pleural bilateral."),
            ],
        );
        assert!(out.contains(&"Derrame pleural bilateral.".to_string()));
        assert!(!out.contains(&"Derrame pleural derecho.".to_string()));
    }

    #[test]
    fn loose_findings_go_before_closing_in_order() {
        let out = integrate(&template(), &[loose("Primero."), loose("Segundo.")]);
        let len = out.len();
        assert_eq!(out[len - 3], "Primero.");
        assert_eq!(out[len - 2], "Segundo.");
        assert_eq!(out[len - 1], "Sin otros hallazgos.");
    }

    #[test]
    fn orphaned_anchor_degrades_to_loose() {
        // Thorax-only template; an abdominal anchor cannot place the finding.
        let out = integrate(
            &template(),
            &[pathological(
                "Hígado de tamaño y morfología normal.",
                "Esteatosis hepática difusa.",
            )],
        );
        let len = out.len();
        assert_eq!(out[len - 2], "Esteatosis hepática difusa.");
        assert_eq!(out[len - 1], "Sin otros hallazgos.");
    }

    #[test]
    fn empty_template_still_closes() {
        let out = integrate(&[], &[loose("Hallazgo suelto.")]);
        assert_eq!(out, vec!["Hallazgo suelto.".to_string(), "Sin otros hallazgos.".to_string()]);
    }
}
