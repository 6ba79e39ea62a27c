//! dyemind-llm — Language-model backends and the summary/Q&A facade.
//! See ARCHITECTURE.md §4.

pub mod backend;
pub mod prompt;
pub mod summarizer;

pub use backend::{GenerationRequest, HuggingFaceBackend, LlmBackend, LlmError, OllamaBackend};
pub use summarizer::{LlmSummarizer, SummarySource};
