use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::LlmError;

/// Text-generation backend used by the semantic matcher.
pub trait LlmBackend {
    fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Short description for logs, e.g. "ollama:qwen2.5:1.5b".
    fn describe(&self) -> String;
}

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

fn blocking_client(timeout: Duration) -> Result<reqwest::blocking::Client, LlmError> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Malformed(format!("could not build HTTP client: {}", e)))
}

// ============================================================================
// Ollama Backend
// ============================================================================

pub struct OllamaBackend {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "qwen2.5:1.5b".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaBackend {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            timeout,
        }
    }
}

impl LlmBackend for OllamaBackend {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
        };

        let client = blocking_client(self.timeout)?;
        let response = client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|e| LlmError::from_reqwest(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let ollama_response: OllamaResponse = response
            .json()
            .map_err(|e| LlmError::from_reqwest(&self.endpoint, e))?;
        Ok(ollama_response.response.trim().to_string())
    }

    fn describe(&self) -> String {
        format!("ollama:{}", self.model)
    }
}

// ============================================================================
// Gemini Backend
// ============================================================================

pub struct GeminiBackend {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiBackend {
    pub const DEFAULT_MODEL: &'static str = "gemini-2.0-flash";

    /// Build a backend; `endpoint` defaults to the public generateContent URL
    /// for `model`.
    pub fn new(endpoint: Option<&str>, model: &str, api_key: &str, timeout: Duration) -> Self {
        let endpoint = endpoint.map(str::to_string).unwrap_or_else(|| {
            format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                model
            )
        });
        Self {
            endpoint,
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
        }
    }
}

impl LlmBackend for GeminiBackend {
    fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.2, "maxOutputTokens": 1024 }
        });

        let client = blocking_client(self.timeout)?;
        let response = client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .map_err(|e| LlmError::from_reqwest(&self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
                body: response.text().unwrap_or_default(),
            });
        }

        let body: GeminiResponse = response
            .json()
            .map_err(|e| LlmError::from_reqwest(&self.endpoint, e))?;

        body.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .map(|t| t.trim().to_string())
            .ok_or_else(|| LlmError::Malformed("Gemini reply has no candidate text".into()))
    }

    fn describe(&self) -> String {
        format!("gemini:{}", self.model)
    }
}
