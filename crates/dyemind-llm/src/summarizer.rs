//! Summary and question-answering facade over an LLM backend.
//!
//! This is the language-model provider seen by the aggregation layer:
//! failures come back as classified `ProviderError`s like every other
//! provider, and an empty input short-circuits to NotFound before any
//! network call is made.

use std::sync::Arc;

use async_trait::async_trait;
use dyemind_common::error::{FailureKind, ProviderError};
use tracing::instrument;

use crate::backend::{GenerationRequest, LlmBackend, LlmError};
use crate::prompt;

#[async_trait]
pub trait SummarySource: Send + Sync {
    /// Summarize source material about `subject` into a short review.
    async fn summarize(&self, subject: &str, context: &str) -> Result<String, ProviderError>;

    /// Answer a free-text question grounded in `context`.
    async fn answer(&self, question: &str, context: &str) -> Result<String, ProviderError>;
}

pub struct LlmSummarizer {
    backend: Arc<dyn LlmBackend>,
}

impl LlmSummarizer {
    pub fn new(backend: Arc<dyn LlmBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SummarySource for LlmSummarizer {
    #[instrument(skip(self, context))]
    async fn summarize(&self, subject: &str, context: &str) -> Result<String, ProviderError> {
        if context.trim().is_empty() {
            return Err(ProviderError::not_found("no source text to summarize"));
        }
        let req = GenerationRequest::new(prompt::review_prompt(subject, context));
        self.backend.generate(req).await.map_err(ProviderError::from)
    }

    #[instrument(skip(self, context))]
    async fn answer(&self, question: &str, context: &str) -> Result<String, ProviderError> {
        let req = GenerationRequest::new(prompt::answer_prompt(question, context));
        self.backend.generate(req).await.map_err(ProviderError::from)
    }
}

impl From<LlmError> for ProviderError {
    fn from(err: LlmError) -> Self {
        match err {
            // Warm-up is a throttling-class signal: the retry loop backs
            // off and tries again, exactly like a 429.
            LlmError::ModelLoading(msg) => ProviderError::rate_limited(msg),
            LlmError::RateLimitExceeded => ProviderError::rate_limited("rate limit exceeded"),
            LlmError::Http(e) => e.into(),
            LlmError::ApiError { status, message } => {
                match reqwest::StatusCode::from_u16(status) {
                    Ok(code) if !code.is_success() => ProviderError::from_status(code, &message),
                    _ => ProviderError::new(FailureKind::Unknown, message),
                }
            }
            LlmError::Serde(e) => ProviderError::unknown(e.to_string()),
            LlmError::EmptyCompletion(model) => {
                ProviderError::unknown(format!("backend {model} returned an empty completion"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmBackend for CountingBackend {
        async fn generate(&self, req: GenerationRequest) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(req.prompt.contains("chemical biologist"));
            Ok("A generated review.".to_string())
        }
        fn model_id(&self) -> &str { "counting" }
        fn is_local(&self) -> bool { true }
    }

    #[tokio::test]
    async fn test_summarize_empty_context_skips_backend() {
        let backend = Arc::new(CountingBackend { calls: AtomicUsize::new(0) });
        let summarizer = LlmSummarizer::new(backend.clone());

        let err = summarizer.summarize("Fluorescein", "   ").await.unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summarize_with_context_calls_backend() {
        let backend = Arc::new(CountingBackend { calls: AtomicUsize::new(0) });
        let summarizer = LlmSummarizer::new(backend.clone());

        let text = summarizer
            .summarize("Fluorescein", "- Title: T\n  Abstract: A")
            .await
            .unwrap();
        assert_eq!(text, "A generated review.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_model_loading_maps_to_rate_limited() {
        let err: ProviderError = LlmError::ModelLoading("model is loading".to_string()).into();
        assert_eq!(err.kind, FailureKind::RateLimited);
    }

    #[test]
    fn test_api_error_status_is_classified() {
        let err: ProviderError = LlmError::ApiError { status: 404, message: "gone".into() }.into();
        assert_eq!(err.kind, FailureKind::NotFound);

        let err: ProviderError = LlmError::ApiError { status: 503, message: "down".into() }.into();
        assert_eq!(err.kind, FailureKind::Transport);
    }
}
