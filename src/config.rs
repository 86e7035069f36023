use std::env;

/// Application-level constants
pub const APP_NAME: &str = "Dictamen";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Closing sentence of every report. Appears exactly once, always last.
pub const CLOSING_SENTENCE: &str = "Sin otros hallazgos.";

/// Sentinel phrase that, dictated as the last sentence, activates the full
/// anatomical reordering of the report (template mode).
pub const TEMPLATE_MODE_SENTINEL: &str = "valida frases normales";

/// Reference data file names inside the data directory.
pub const NORMALS_FILE: &str = "normal_phrases.json";
pub const FINDINGS_FILE: &str = "findings.json";
pub const FUZZY_FILE: &str = "fuzzy_lexicon.json";

/// Upper bound on the catalog subset sent to the fallback classifier.
pub const MAX_LLM_CANDIDATES: usize = 30;

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}

/// Connection settings for the fallback classifier (OpenAI-compatible
/// chat-completions endpoint). The classifier is optional: without an API
/// key the pipeline runs fully deterministically and unresolved sentences
/// stay loose.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 30;

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
        }
    }
}

impl LlmConfig {
    /// Read the classifier settings from the environment.
    /// DICTAMEN_LLM_API_KEY enables the fallback; the rest have defaults.
    pub fn from_env() -> Self {
        let timeout_secs = env::var("DICTAMEN_LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

        Self {
            base_url: env::var("DICTAMEN_LLM_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
            model: env::var("DICTAMEN_LLM_MODEL")
                .unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            api_key: env::var("DICTAMEN_LLM_API_KEY").ok().filter(|k| !k.is_empty()),
            timeout_secs,
        }
    }

    /// The fallback classifier only runs when an API key is configured.
    pub fn enabled(&self) -> bool {
        self.api_key.is_some()
    }
}
