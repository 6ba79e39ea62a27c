//! LLM backend trait and concrete implementations.
//! See ARCHITECTURE.md §4.1
//!
//! Backends:
//!   HuggingFaceBackend — hosted Inference API (text-generation task)
//!   OllamaBackend      — local Ollama (OpenAI-compatible), offline use

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Model is warming up: {0}")]
    ModelLoading(String),
    #[error("Rate limit exceeded")]
    RateLimitExceeded,
    #[error("API error [{status}]: {message}")]
    ApiError { status: u16, message: String },
    #[error("Backend {0} returned an empty completion")]
    EmptyCompletion(String),
}

// ── Request ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
}

impl GenerationRequest {
    /// Defaults tuned for short factual scientific summaries.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_new_tokens: 600,
            temperature: 0.3,
        }
    }
}

// ── Trait ─────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn generate(&self, req: GenerationRequest) -> Result<String, LlmError>;
    fn model_id(&self) -> &str;
    fn is_local(&self) -> bool;
}

// ── 1. Hugging Face Inference API ─────────────────────────────────────────────

pub struct HuggingFaceBackend {
    pub model: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl HuggingFaceBackend {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: "https://api-inference.huggingface.co".to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl LlmBackend for HuggingFaceBackend {
    async fn generate(&self, req: GenerationRequest) -> Result<String, LlmError> {
        let url = format!(
            "{}/models/{}",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let body = serde_json::json!({
            "inputs": req.prompt,
            "parameters": {
                "max_new_tokens":   req.max_new_tokens,
                "temperature":      req.temperature,
                "return_full_text": false,
            }
        });

        let resp = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status == 429 {
            return Err(LlmError::RateLimitExceeded);
        }

        let json: serde_json::Value = resp.json().await?;

        // The free tier reports errors in the body, sometimes with a 200.
        // A "loading" message means the model is cold and worth retrying.
        if let Some(message) = json["error"].as_str() {
            if message.to_lowercase().contains("loading") {
                return Err(LlmError::ModelLoading(message.to_string()));
            }
            return Err(LlmError::ApiError { status, message: message.to_string() });
        }
        if status >= 400 {
            return Err(LlmError::ApiError {
                status,
                message: "unknown API error".to_string(),
            });
        }

        extract_generated_text(&json)
            .ok_or_else(|| LlmError::EmptyCompletion(self.model.clone()))
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

/// Extract generated text from the Inference API's response shapes:
/// a list of objects with `generated_text` (classic text-generation) or
/// a single object with `generated_text`.
fn extract_generated_text(json: &serde_json::Value) -> Option<String> {
    let candidate = json
        .as_array()
        .and_then(|items| items.first())
        .and_then(|item| item["generated_text"].as_str())
        .or_else(|| json["generated_text"].as_str())?;

    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ── 2. Ollama (local) ─────────────────────────────────────────────────────────

pub struct OllamaBackend {
    pub base_url: String,
    pub model: String,
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl LlmBackend for OllamaBackend {
    async fn generate(&self, req: GenerationRequest) -> Result<String, LlmError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model":       &self.model,
            "messages":    [{ "role": "user", "content": req.prompt }],
            "max_tokens":  req.max_new_tokens,
            "temperature": req.temperature,
        });

        let resp = self.client.post(&url).json(&body).send().await?;
        let status = resp.status().as_u16();
        let json: serde_json::Value = resp.json().await?;

        if status >= 400 {
            let message = json["error"]["message"]
                .as_str()
                .or_else(|| json["error"].as_str())
                .unwrap_or("unknown API error")
                .to_string();
            return Err(LlmError::ApiError { status, message });
        }

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LlmError::EmptyCompletion(self.model.clone()))?;

        Ok(content.to_string())
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { true }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_list_shape() {
        let json = serde_json::json!([{ "generated_text": "A short summary." }]);
        assert_eq!(
            extract_generated_text(&json).as_deref(),
            Some("A short summary.")
        );
    }

    #[test]
    fn test_extract_from_object_shape() {
        let json = serde_json::json!({ "generated_text": "Another summary." });
        assert_eq!(
            extract_generated_text(&json).as_deref(),
            Some("Another summary.")
        );
    }

    #[test]
    fn test_extract_unrecognised_shape() {
        let json = serde_json::json!({ "choices": [] });
        assert_eq!(extract_generated_text(&json), None);
    }

    #[test]
    fn test_extract_blank_text_is_none() {
        let json = serde_json::json!([{ "generated_text": "   " }]);
        assert_eq!(extract_generated_text(&json), None);
    }

    #[test]
    fn test_huggingface_backend_is_remote() {
        let b = HuggingFaceBackend::new("hf_test", "EssentialAI/rnj-1-instruct");
        assert!(!b.is_local());
        assert_eq!(b.model_id(), "EssentialAI/rnj-1-instruct");
    }

    #[test]
    fn test_ollama_is_local() {
        let b = OllamaBackend::new("http://localhost:11434", "llama3:8b");
        assert!(b.is_local());
    }

    #[test]
    fn test_generation_request_defaults() {
        let req = GenerationRequest::new("prompt");
        assert_eq!(req.max_new_tokens, 600);
        assert!(req.temperature < 0.5);
    }
}
