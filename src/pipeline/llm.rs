use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classify::FindingKind;
use super::normalize::normalize;
use crate::catalog::CatalogIndex;
use crate::config::{self, LlmConfig};

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("fallback classifier is not reachable at {0}")]
    Connection(String),

    #[error("fallback classifier request timed out after {0}s")]
    Timeout(u64),

    #[error("fallback classifier returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("malformed classifier response: {0}")]
    MalformedResponse(String),
}

/// One catalog entry offered to the external classifier as a candidate.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogCandidate {
    #[serde(rename = "oficial")]
    pub text: String,
    #[serde(rename = "tipo")]
    pub kind: FindingKind,
    #[serde(rename = "frase_normal")]
    pub normal_phrase: Option<String>,
}

/// Verdict of the external classifier for one sentence. The anchor is taken
/// at face value only when it names a phrase the catalog actually knows;
/// otherwise the Classifier coerces the sentence to loose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "tipo")]
    pub kind: FindingKind,
    #[serde(rename = "frase_normal")]
    pub normal_phrase: Option<String>,
    #[serde(rename = "texto_final", default)]
    pub final_text: String,
}

impl Verdict {
    pub fn loose(sentence: &str) -> Self {
        Self {
            kind: FindingKind::Loose,
            normal_phrase: None,
            final_text: sentence.to_string(),
        }
    }
}

/// Capability interface for the last-resort sentence classifier. Injected
/// into the pipeline so tests can script it; unavailability always degrades
/// to a loose finding, never past this boundary.
pub trait FallbackClassifier {
    fn classify(
        &self,
        sentence: &str,
        candidates: &[CatalogCandidate],
    ) -> Result<Verdict, ClassifierError>;
}

/// Build the bounded candidate subset for one sentence: catalog phrases
/// sharing at least one informative token, best matches first, capped at
/// `MAX_LLM_CANDIDATES`.
pub fn build_candidate_subset(sentence: &str, index: &CatalogIndex) -> Vec<CatalogCandidate> {
    let n = normalize(sentence);
    let tokens: Vec<&str> = n.split_whitespace().filter(|t| t.len() > 3).collect();

    let mut scored: Vec<(usize, CatalogCandidate)> = Vec::new();
    let sources = [
        (&index.pathological, FindingKind::Pathological),
        (&index.additional, FindingKind::Additional),
    ];
    for (map, kind) in sources {
        for (key, anchor) in map.iter() {
            let score = tokens.iter().filter(|t| key.contains(*t)).count();
            if score == 0 {
                continue;
            }
            scored.push((
                score,
                CatalogCandidate {
                    text: anchor.text.clone(),
                    kind,
                    normal_phrase: anchor.normal_phrase.clone(),
                },
            ));
        }
    }

    // HashMap iteration order is arbitrary; sort for a deterministic prompt.
    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.text.cmp(&b.1.text)));
    scored.truncate(config::MAX_LLM_CANDIDATES);
    scored.into_iter().map(|(_, c)| c).collect()
}

/// HTTP client for an OpenAI-compatible chat-completions endpoint.
pub struct ChatClient {
    base_url: String,
    model: String,
    api_key: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

impl ChatClient {
    /// Build a client from config. Returns `None` when no API key is
    /// configured, which disables the fallback stage entirely.
    pub fn from_config(cfg: &LlmConfig) -> Option<Self> {
        let api_key = cfg.api_key.clone()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Some(Self {
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            model: cfg.model.clone(),
            api_key,
            timeout_secs: cfg.timeout_secs,
            client,
        })
    }

    fn system_prompt(candidates: &[CatalogCandidate]) -> String {
        let catalog = serde_json::to_string(candidates).unwrap_or_else(|_| "[]".to_string());
        format!(
            "Eres un asistente de clasificación de hallazgos radiológicos en español.\n\
             Clasifica el hallazgo del usuario en una de estas categorías:\n\
             - \"patologico\": sustituye su frase normal asociada.\n\
             - \"adicional\": se añade detrás de su frase normal.\n\
             - \"suelto\": sin frase normal asociada; irá antes del cierre.\n\
             REGLAS:\n\
             1. No inventes frases normales: frase_normal debe salir del catálogo.\n\
             2. Si ninguna aplica, responde tipo \"suelto\" y frase_normal null.\n\
             3. Responde SOLO con JSON válido con las claves tipo, frase_normal, texto_final.\n\
             Catálogo permitido: {catalog}"
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl FallbackClassifier for ChatClient {
    fn classify(
        &self,
        sentence: &str,
        candidates: &[CatalogCandidate],
    ) -> Result<Verdict, ClassifierError> {
        let url = format!("{}/chat/completions", self.base_url);
        let system = Self::system_prompt(candidates);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: sentence,
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ClassifierError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    ClassifierError::Timeout(self.timeout_secs)
                } else {
                    ClassifierError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ClassifierError::MalformedResponse("empty choices".to_string()))?;

        serde_json::from_str(content)
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))
    }
}

/// Scripted classifier for tests. Answers from a fixed table, loose for
/// everything else, or fails every call when built with `failing()`.
pub struct ScriptedClassifier {
    responses: HashMap<String, Verdict>,
    failing: bool,
}

impl ScriptedClassifier {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            failing: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            responses: HashMap::new(),
            failing: true,
        }
    }

    pub fn with_response(mut self, sentence: &str, verdict: Verdict) -> Self {
        self.responses.insert(normalize(sentence), verdict);
        self
    }
}

impl Default for ScriptedClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackClassifier for ScriptedClassifier {
    fn classify(
        &self,
        sentence: &str,
        _candidates: &[CatalogCandidate],
    ) -> Result<Verdict, ClassifierError> {
        if self.failing {
            return Err(ClassifierError::Connection("scripted failure".to_string()));
        }
        Ok(self
            .responses
            .get(&normalize(sentence))
            .cloned()
            .unwrap_or_else(|| Verdict::loose(sentence)))
    }
}
