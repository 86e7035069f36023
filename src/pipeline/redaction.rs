use tracing::debug;

use super::normalize::normalize;
use super::section::{Section, SectionClassifier};

/// A left/right pair of normal sentences that collapses into one plural
/// sentence when nothing pathological argues against it.
struct PairMerge {
    singulars: [&'static str; 2],
    plural: &'static str,
    /// Normalized keywords that veto the merge when present in any
    /// affirmative sentence of the working set.
    vetoes: &'static [&'static str],
}

const KIDNEY_MERGE: PairMerge = PairMerge {
    singulars: [
        "Riñón derecho de tamaño y morfología normales.",
        "Riñón izquierdo de tamaño y morfología normales.",
    ],
    plural: "Riñones de tamaño y morfología normales.",
    vetoes: &[
        "atrofia",
        "nefrectom",
        "hipoplasia",
        "masa renal",
        "tumor renal",
        "pielonefritis",
        "litiasis",
        "quiste",
        "cicatriz",
        "cicatrices",
        "aumentado de tamano",
        "signos inflamatorios",
    ],
};

const URETER_MERGE: PairMerge = PairMerge {
    singulars: [
        "No se observan lesiones focales ni dilatación de la vía urinaria derecha.",
        "No se observan lesiones focales ni dilatación de la vía urinaria izquierda.",
    ],
    plural: "No se observan lesiones focales ni dilatación de las vías urinarias.",
    vetoes: &[
        "ectasia",
        "hidronefrosis",
        "ureterohidronefrosis",
        "dilatacion de pelvis",
        "pelvis extrarrenal",
        "sindrome de la union",
        "engrosamiento urotelial",
        "tumor de vias",
    ],
};

/// Normal sentences that must disappear when a contradicting pathology
/// keyword shows up anywhere in the working set, even when the finding was
/// injected as literal text and never replaced its anchor.
struct Contradiction {
    normal: &'static str,
    vetoes: &'static [&'static str],
}

const CONTRADICTIONS: &[Contradiction] = &[
    Contradiction {
        normal: "Glándulas suprarrenales de tamaño y morfología normales.",
        vetoes: &["hiperplasia", "nodulo suprarrenal", "engrosamiento suprarrenal"],
    },
    Contradiction {
        normal: "Hígado de tamaño y morfología normal y contornos lisos. No se observan lesiones focales hepáticas.",
        vetoes: &["hepatomegalia", "cirrosis", "esteatosis"],
    },
    Contradiction {
        normal: "Bazo de tamaño y morfología normal. No se observan lesiones focales.",
        vetoes: &["esplenomegalia"],
    },
];

const LUNG_NORMAL: &str = "Parénquima pulmonar sin alteraciones a destacar. No se observan condensaciones de espacio aéreo ni nódulos pulmonares.";
const PLEURA_NORMAL: &str = "Espacios pleurales libres.";

const LUNG_VETOES: &[&str] = &[
    "enfisema",
    "vidrio deslustrado",
    "condensacion",
    "nodulo pulmon",
    "nodulos pulmon",
    "masa pulmonar",
    "metastasis pulmon",
    "linfangitis",
    "engrosamientos bronquiales",
    "broncopatia",
    "opacidades",
    "patron intersticial",
    "reticulacion",
    "engrosamientos septales",
    "atelectasia",
];

const PLEURA_VETOES: &[&str] = &[
    "derrame",
    "engrosamiento pleural",
    "engrosamientos pleurales",
    "pleurodesis",
    "calcificaciones pleurales",
    "placas pleurales",
    "liquido pleural",
];

/// Runs the fixed rule sequence over the integrated working set. Every rule
/// is a no-op when its trigger condition is absent, so the whole pass is
/// idempotent.
pub fn apply_rules(
    lines: Vec<String>,
    template_mode: bool,
    classifier: &SectionClassifier,
) -> Vec<String> {
    let mut working = merge_paired_normals(lines, &KIDNEY_MERGE);
    working = merge_paired_normals(working, &URETER_MERGE);
    working = remove_contradicted_normals(working);
    working = acknowledge_benign_lesions(working, classifier);
    working = dedup(working);
    working = suppress_pulmonary_normals(working);
    if template_mode {
        working = reorder_by_section(working, classifier);
    }
    working
}

/// Keyword scans only consider affirmative sentences. Negated normals
/// ("Sin evidencia de litiasis...") mention pathology words without
/// asserting the pathology.
fn is_affirmative(norm: &str) -> bool {
    !(norm.contains("no se observa") || norm.contains("sin evidencia") || norm.contains("sin signos"))
}

fn merge_paired_normals(lines: Vec<String>, pair: &PairMerge) -> Vec<String> {
    let norms: Vec<String> = lines.iter().map(|l| normalize(l)).collect();
    let right = normalize(pair.singulars[0]);
    let left = normalize(pair.singulars[1]);
    let both_present = norms.iter().any(|n| *n == right) && norms.iter().any(|n| *n == left);
    if !both_present {
        return lines;
    }
    let vetoed = norms
        .iter()
        .filter(|n| is_affirmative(n))
        .any(|n| pair.vetoes.iter().any(|v| n.contains(v)));
    if vetoed {
        return lines;
    }

    debug!(plural = pair.plural, "merging paired normal sentences");
    let mut merged = false;
    let mut out = Vec::with_capacity(lines.len());
    for (line, norm) in lines.into_iter().zip(norms) {
        if norm == right || norm == left {
            if !merged {
                out.push(pair.plural.to_string());
                merged = true;
            }
            continue;
        }
        out.push(line);
    }
    out
}

fn remove_contradicted_normals(lines: Vec<String>) -> Vec<String> {
    let norms: Vec<String> = lines.iter().map(|l| normalize(l)).collect();
    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let dropped = CONTRADICTIONS.iter().any(|c| {
            norms[i] == normalize(c.normal)
                && norms.iter().enumerate().any(|(j, n)| {
                    j != i && is_affirmative(n) && c.vetoes.iter().any(|v| n.contains(v))
                })
        });
        if dropped {
            debug!(line, "dropping contradicted normal sentence");
            continue;
        }
        out.push(line.clone());
    }
    out
}

const LESION_NEEDLE: &str = "No se observan lesiones focales";
const LESION_REWORDED: &str = "No se observan otras lesiones focales";
const BENIGN_MODIFIERS: &[&str] = &["quiste", "microlitiasis", "granuloma"];

/// When a benign lesion is asserted in a section, its "no focal lesions"
/// normal is reworded to acknowledge it instead of contradicting it.
fn acknowledge_benign_lesions(lines: Vec<String>, classifier: &SectionClassifier) -> Vec<String> {
    let norms: Vec<String> = lines.iter().map(|l| normalize(l)).collect();
    let sections: Vec<Section> = lines.iter().map(|l| classifier.classify(l)).collect();
    let mut out = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if line.contains(LESION_NEEDLE) && !line.contains(LESION_REWORDED) {
            let triggered = norms.iter().enumerate().any(|(j, n)| {
                j != i
                    && sections[j] == sections[i]
                    && is_affirmative(n)
                    && BENIGN_MODIFIERS.iter().any(|m| n.contains(m))
            });
            if triggered {
                out.push(line.replace(LESION_NEEDLE, LESION_REWORDED));
                continue;
            }
        }
        out.push(line.clone());
    }
    out
}

fn dedup(lines: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    lines.into_iter().filter(|l| seen.insert(normalize(l))).collect()
}

fn suppress_pulmonary_normals(lines: Vec<String>) -> Vec<String> {
    let norms: Vec<String> = lines.iter().map(|l| normalize(l)).collect();
    let lung_n = normalize(LUNG_NORMAL);
    let pleura_n = normalize(PLEURA_NORMAL);

    let triggered = |normal: &str, vetoes: &[&str]| {
        norms.iter().any(|n| {
            n.as_str() != normal && is_affirmative(n) && vetoes.iter().any(|v| n.contains(v))
        })
    };
    let drop_lung = triggered(&lung_n, LUNG_VETOES);
    let drop_pleura = triggered(&pleura_n, PLEURA_VETOES);

    lines
        .into_iter()
        .zip(norms)
        .filter(|(_, n)| !(drop_lung && *n == lung_n) && !(drop_pleura && *n == pleura_n))
        .map(|(l, _)| l)
        .collect()
}

fn reorder_by_section(lines: Vec<String>, classifier: &SectionClassifier) -> Vec<String> {
    let mut keyed: Vec<(Section, String)> =
        lines.into_iter().map(|l| (classifier.classify(&l), l)).collect();
    // sort_by_key is stable, so in-section dictation order survives.
    keyed.sort_by_key(|(section, _)| *section);
    keyed.into_iter().map(|(_, line)| line).collect()
}
