//! Google Gemini `generateContent` client (blocking).

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::model::TextModel;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("GOOGLE_API_KEY is not set")]
    MissingApiKey,
    #[error("invalid {name}: {message}")]
    Config { name: &'static str, message: String },
    #[error("text model request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("text model returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("text model response contained no text")]
    EmptyResponse,
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub base_url: String,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Reads `GOOGLE_API_KEY`, `GEMINI_MODEL` and `GEMINI_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ModelError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ModelError> {
        let api_key = lookup("GOOGLE_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ModelError::MissingApiKey)?;
        let mut config = Self::new(api_key.trim());

        if let Some(model) = lookup("GEMINI_MODEL").filter(|model| !model.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(raw) = lookup("GEMINI_TIMEOUT_SECS") {
            let seconds = raw.trim().parse::<u64>().map_err(|err| ModelError::Config {
                name: "GEMINI_TIMEOUT_SECS",
                message: err.to_string(),
            })?;
            config.timeout = Duration::from_secs(seconds);
        }
        Ok(config)
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: [RequestContent {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate, concatenated.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Blocking client; call it from a blocking context (or the runtime's
/// blocking pool), never directly on an async worker.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: GeminiConfig,
    http: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ModelError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, http })
    }

    pub fn from_env() -> Result<Self, ModelError> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    pub fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        debug!(model = %self.config.model, prompt_len = prompt.len(), "calling text model");
        let response = self
            .http
            .post(self.config.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateRequest::new(prompt))
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = response.json()?;
        body.text().ok_or(ModelError::EmptyResponse)
    }
}

impl TextModel for GeminiClient {
    fn describe(&mut self, prompt: &str) -> Result<String, String> {
        self.generate(prompt).map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use super::{
        DEFAULT_MODEL, GeminiConfig, GenerateRequest, GenerateResponse, ModelError,
    };

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn config_requires_api_key() {
        let err = GeminiConfig::from_lookup(lookup(&[])).expect_err("key is required");
        assert!(matches!(err, ModelError::MissingApiKey));
        let blank = GeminiConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "  ")]));
        assert!(matches!(blank, Err(ModelError::MissingApiKey)));
    }

    #[test]
    fn config_reads_overrides_from_environment() {
        let config = GeminiConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-2.0-flash"),
            ("GEMINI_TIMEOUT_SECS", "5"),
        ]))
        .expect("config should load");
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(
            config.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );

        let defaults = GeminiConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "secret")]))
            .expect("config should load");
        assert_eq!(defaults.model, DEFAULT_MODEL);
        assert_eq!(defaults.timeout, Duration::from_secs(30));
    }

    #[test]
    fn invalid_timeout_names_the_variable() {
        let err = GeminiConfig::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "secret"),
            ("GEMINI_TIMEOUT_SECS", "soon"),
        ]))
        .expect_err("timeout must be numeric");
        assert!(err.to_string().contains("GEMINI_TIMEOUT_SECS"));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let rendered = format!("{:?}", GeminiConfig::new("top-secret"));
        assert!(!rendered.contains("top-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn request_body_matches_generate_content_shape() {
        let json = serde_json::to_value(GenerateRequest::new("a box"))
            .expect("request should serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "a box" }] }]
            })
        );
    }

    #[test]
    fn response_text_joins_first_candidate_parts() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Create a box " }, { "text": "with length 10mm." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .expect("response should parse");
        assert_eq!(
            response.text().as_deref(),
            Some("Create a box with length 10mm.")
        );

        let empty: GenerateResponse = serde_json::from_value(serde_json::json!({}))
            .expect("empty response should parse");
        assert_eq!(empty.text(), None);
    }
}
