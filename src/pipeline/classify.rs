use serde::{Deserialize, Serialize};

use super::llm::{build_candidate_subset, FallbackClassifier};
use super::normalize::{ensure_final_dot, is_template_mode_sentinel, normalize};
use crate::catalog::CatalogIndex;

/// How a dictated sentence relates to the normal-phrase template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FindingKind {
    /// Replaces its anchor normal phrase.
    #[serde(rename = "patologico")]
    Pathological,
    /// Appended after its anchor normal phrase, which stays.
    #[serde(rename = "adicional")]
    Additional,
    /// No anchor; placed immediately before the closing sentence.
    #[serde(rename = "suelto")]
    Loose,
}

/// A classified dictated sentence, consumed once by the integrator.
#[derive(Debug, Clone)]
pub struct ClassifiedFinding {
    pub kind: FindingKind,
    /// Anchor normal phrase; `None` for loose findings and anchorless zones.
    pub anchor: Option<String>,
    pub final_text: String,
}

/// Classifier output: the findings in dictation order plus the
/// template-mode flag raised by the trailing sentinel sentence.
#[derive(Debug, Clone, Default)]
pub struct ClassifiedDictation {
    pub findings: Vec<ClassifiedFinding>,
    pub template_mode: bool,
}

/// Classify every dictated sentence after the first, in order:
/// exact match → fuzzy match → fallback classifier → loose.
pub fn classify_sentences(
    sentences: &[String],
    index: &CatalogIndex,
    fallback: Option<&dyn FallbackClassifier>,
) -> ClassifiedDictation {
    let mut items: &[String] = sentences;
    let template_mode = matches!(items.last(), Some(last) if is_template_mode_sentinel(last));
    if template_mode {
        items = &items[..items.len() - 1];
    }

    let mut findings = Vec::with_capacity(items.len());
    for sentence in items {
        let n = normalize(sentence);
        if n.is_empty() {
            continue;
        }
        findings.push(classify_one(sentence, &n, index, fallback));
    }

    ClassifiedDictation {
        findings,
        template_mode,
    }
}

fn classify_one(
    sentence: &str,
    n: &str,
    index: &CatalogIndex,
    fallback: Option<&dyn FallbackClassifier>,
) -> ClassifiedFinding {
    // Stage 1: exact match against the finding tables.
    if let Some(found) = exact_match(n, sentence, index) {
        tracing::debug!(sentence, "exact catalog match");
        return found;
    }

    // Stage 2: fuzzy lexicon. A hit substitutes the official finding text
    // for the dictated variant, then resolves through the exact tables.
    if let Some(target) = index.fuzzy.get(n) {
        let excluded = target.exclusions.iter().any(|e| normalize(e) == n);
        if !excluded {
            let official_n = normalize(&target.official);
            if let Some(found) = exact_match(&official_n, &target.official, index) {
                tracing::debug!(sentence, official = %target.official, "fuzzy match");
                return found;
            }
            // Official finding absent from the tables: data inconsistency,
            // fall through to the next stage.
            tracing::warn!(
                sentence,
                official = %target.official,
                "fuzzy target missing from finding tables"
            );
        }
    }

    // Stage 3: external classifier, fail-open to loose.
    if let Some(classifier) = fallback {
        let candidates = build_candidate_subset(sentence, index);
        match classifier.classify(sentence, &candidates) {
            Ok(verdict) => {
                let anchor_known = verdict
                    .normal_phrase
                    .as_deref()
                    .is_some_and(|a| index.is_known_anchor(&normalize(a)));
                if verdict.kind != FindingKind::Loose && anchor_known {
                    let text = if verdict.final_text.trim().is_empty() {
                        sentence
                    } else {
                        verdict.final_text.as_str()
                    };
                    tracing::debug!(sentence, kind = ?verdict.kind, "fallback classifier verdict accepted");
                    return ClassifiedFinding {
                        kind: verdict.kind,
                        anchor: verdict.normal_phrase,
                        final_text: ensure_final_dot(text),
                    };
                }
                if verdict.kind != FindingKind::Loose {
                    tracing::debug!(sentence, "fallback verdict with unknown anchor coerced to loose");
                }
            }
            Err(e) => {
                tracing::warn!(sentence, error = %e, "fallback classifier unavailable, sentence stays loose");
            }
        }
    }

    ClassifiedFinding {
        kind: FindingKind::Loose,
        anchor: None,
        final_text: ensure_final_dot(sentence),
    }
}

fn exact_match(n: &str, text: &str, index: &CatalogIndex) -> Option<ClassifiedFinding> {
    let (kind, anchor) = if let Some(anchor) = index.pathological.get(n) {
        (FindingKind::Pathological, anchor)
    } else if let Some(anchor) = index.additional.get(n) {
        (FindingKind::Additional, anchor)
    } else {
        return None;
    };

    // Anchorless zones ("Otros") place like loose findings.
    match &anchor.normal_phrase {
        Some(normal) => Some(ClassifiedFinding {
            kind,
            anchor: Some(normal.clone()),
            final_text: ensure_final_dot(text),
        }),
        None => Some(ClassifiedFinding {
            kind: FindingKind::Loose,
            anchor: None,
            final_text: ensure_final_dot(text),
        }),
    }
}
