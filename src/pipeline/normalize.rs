use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Canonicalize text for matching: lower-case, Unicode NFD, strip combining
/// diacritical marks, drop everything that is not a letter/digit/whitespace,
/// collapse whitespace runs, trim.
///
/// Total and idempotent: `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_space = false;

    for c in s.to_lowercase().nfd() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
        } else if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(c);
        }
        // punctuation and symbols are dropped entirely
    }

    out
}

/// Split a dictation into its first sentence (the study-type sentence) and
/// the remaining sentences. Sentences end at periods or newlines; empty
/// fragments are discarded.
pub fn split_dictation(raw: &str) -> (String, Vec<String>) {
    let mut parts = raw
        .split(['.', '\n'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    let first = parts.next().unwrap_or_default();
    (first, parts.collect())
}

/// Append a final period unless the sentence already ends in `.` or `:`.
pub fn ensure_final_dot(s: &str) -> String {
    let t = s.trim();
    if t.is_empty() || t.ends_with('.') || t.ends_with(':') {
        return t.to_string();
    }
    format!("{t}.")
}

/// Whether a dictated sentence is the template-mode sentinel
/// ("valida frases normales"), case and diacritic insensitive.
pub fn is_template_mode_sentinel(s: &str) -> bool {
    normalize(s).contains(crate::config::TEMPLATE_MODE_SENTINEL)
}
