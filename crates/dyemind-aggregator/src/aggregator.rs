//! Fan-out/fan-in aggregation over the four DyeMind providers.
//! See ARCHITECTURE.md §3.1.
//!
//! The structure, literature and encyclopedia lookups start immediately;
//! the summary lookup waits for the literature lookup to settle (soft
//! dependency: a failed literature slot still dispatches the summary
//! provider, with empty input). `fetch()` returns only after every
//! enabled lookup has settled. The lookups are plain composed futures,
//! nothing is spawned, so dropping the `fetch()` future cancels all
//! in-flight requests and pending retries cooperatively.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use dyemind_common::error::{FailureKind, ProviderError};
use dyemind_llm::summarizer::SummarySource;
use dyemind_providers::models::{Article, CompoundRecord, PageIntro};
use dyemind_providers::{EncyclopediaSource, LiteratureSource, StructureSource};

use crate::cache::{CachedPayload, ResponseCache};
use crate::options::{FetchOptions, ProviderName};
use crate::result::{AggregateResult, ProviderResult};
use crate::retry::with_retries;

/// Abstracts fed to the summary prompt; more blows the context window of
/// small hosted models.
const SUMMARY_ABSTRACT_LIMIT: usize = 3;
const ABSTRACT_SNIPPET_CHARS: usize = 300;

/// The only error that escapes `fetch()`/`ask()`; every provider failure
/// is captured inside the result record instead.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("query is empty after trimming whitespace")]
    InvalidQuery,
}

pub struct Aggregator {
    structure: Arc<dyn StructureSource>,
    literature: Arc<dyn LiteratureSource>,
    summary: Arc<dyn SummarySource>,
    encyclopedia: Arc<dyn EncyclopediaSource>,
    cache: Option<ResponseCache>,
}

impl Aggregator {
    pub fn new(
        structure: Arc<dyn StructureSource>,
        literature: Arc<dyn LiteratureSource>,
        summary: Arc<dyn SummarySource>,
        encyclopedia: Arc<dyn EncyclopediaSource>,
    ) -> Self {
        Self {
            structure,
            literature,
            summary,
            encyclopedia,
            cache: None,
        }
    }

    /// Enable the bounded TTL response cache.
    pub fn with_cache(mut self, capacity: usize, ttl: Duration) -> Self {
        self.cache = Some(ResponseCache::new(capacity, ttl));
        self
    }

    /// Dispatch all enabled provider lookups for `query` and settle them
    /// into one complete [`AggregateResult`].
    ///
    /// Never fails for provider-side reasons; the only error is
    /// [`AggregateError::InvalidQuery`], raised before any network call.
    pub async fn fetch(
        &self,
        query: &str,
        options: &FetchOptions,
    ) -> Result<AggregateResult, AggregateError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AggregateError::InvalidQuery);
        }

        let query_id = Uuid::new_v4();
        info!(%query_id, query, "Starting aggregate fetch");
        let t0 = tokio::time::Instant::now();

        let (structure, (literature, summary), encyclopedia) = tokio::join!(
            self.structure_slot(query, options),
            self.literature_then_summary(query, options),
            self.encyclopedia_slot(query, options),
        );

        let result = AggregateResult {
            query: query.to_string(),
            query_id,
            fetched_at: Utc::now(),
            structure,
            literature,
            summary,
            encyclopedia,
            qa: ProviderResult::failure(FailureKind::NotFound, "no question submitted"),
        };

        info!(
            %query_id,
            duration_ms = t0.elapsed().as_millis() as u64,
            successes = result.success_count(),
            slots = ?result.slot_kinds(),
            "Aggregate fetch settled"
        );
        Ok(result)
    }

    /// Thin pass-through to the language-model provider's `answer`.
    pub async fn ask(
        &self,
        question: &str,
        context: &str,
    ) -> Result<ProviderResult<String>, AggregateError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AggregateError::InvalidQuery);
        }
        Ok(self.summary.answer(question, context).await.into())
    }

    // ── Per-slot lookups ──────────────────────────────────────────────────────

    async fn structure_slot(
        &self,
        query: &str,
        options: &FetchOptions,
    ) -> ProviderResult<CompoundRecord> {
        if !options.is_enabled(ProviderName::Structure) {
            return disabled_slot();
        }
        if let Some(CachedPayload::Structure(hit)) = self.cache_get(ProviderName::Structure, query)
        {
            return ProviderResult::Success(hit);
        }

        let outcome = self
            .run_lookup(ProviderName::Structure, options, || {
                self.structure.lookup_structure(query)
            })
            .await;

        if let Ok(ref record) = outcome {
            self.cache_put(
                ProviderName::Structure,
                query,
                CachedPayload::Structure(record.clone()),
            );
        }
        outcome.into()
    }

    async fn literature_then_summary(
        &self,
        query: &str,
        options: &FetchOptions,
    ) -> (ProviderResult<Vec<Article>>, ProviderResult<String>) {
        let literature = self.literature_slot(query, options).await;
        let summary = self.summary_slot(query, options, &literature).await;
        (literature, summary)
    }

    async fn literature_slot(
        &self,
        query: &str,
        options: &FetchOptions,
    ) -> ProviderResult<Vec<Article>> {
        if !options.is_enabled(ProviderName::Literature) {
            return disabled_slot();
        }
        if let Some(CachedPayload::Literature(hit)) =
            self.cache_get(ProviderName::Literature, query)
        {
            return ProviderResult::Success(hit);
        }

        let outcome = self
            .run_lookup(ProviderName::Literature, options, || {
                self.literature.search_literature(query, options.literature_limit)
            })
            .await;

        if let Ok(ref articles) = outcome {
            self.cache_put(
                ProviderName::Literature,
                query,
                CachedPayload::Literature(articles.clone()),
            );
        }
        outcome.into()
    }

    async fn summary_slot(
        &self,
        query: &str,
        options: &FetchOptions,
        literature: &ProviderResult<Vec<Article>>,
    ) -> ProviderResult<String> {
        if !options.is_enabled(ProviderName::Summary) {
            return disabled_slot();
        }
        if let Some(CachedPayload::Summary(hit)) = self.cache_get(ProviderName::Summary, query) {
            return ProviderResult::Success(hit);
        }

        // A failed literature slot yields an empty context; the provider
        // is still invoked and settles as NotFound without a network call.
        let context = literature_context(literature);
        let outcome = self
            .run_lookup(ProviderName::Summary, options, || {
                self.summary.summarize(query, &context)
            })
            .await;

        if let Ok(ref text) = outcome {
            self.cache_put(ProviderName::Summary, query, CachedPayload::Summary(text.clone()));
        }
        outcome.into()
    }

    async fn encyclopedia_slot(
        &self,
        query: &str,
        options: &FetchOptions,
    ) -> ProviderResult<PageIntro> {
        if !options.is_enabled(ProviderName::Encyclopedia) {
            return disabled_slot();
        }
        if let Some(CachedPayload::Encyclopedia(hit)) =
            self.cache_get(ProviderName::Encyclopedia, query)
        {
            return ProviderResult::Success(hit);
        }

        let outcome = self
            .run_lookup(ProviderName::Encyclopedia, options, || {
                self.encyclopedia.get_intro(query)
            })
            .await;

        if let Ok(ref intro) = outcome {
            self.cache_put(
                ProviderName::Encyclopedia,
                query,
                CachedPayload::Encyclopedia(intro.clone()),
            );
        }
        outcome.into()
    }

    /// Wrap one provider lookup with the retry loop and the per-provider
    /// deadline. The deadline covers retries too: hitting it settles the
    /// slot as Timeout with no further attempts.
    async fn run_lookup<T, F, Fut>(
        &self,
        provider: ProviderName,
        options: &FetchOptions,
        lookup: F,
    ) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let attempt = with_retries(provider.as_str(), options.max_retries, lookup);
        match timeout(options.per_provider_timeout, attempt).await {
            Ok(outcome) => {
                if let Err(ref err) = outcome {
                    warn!(provider = provider.as_str(), error = %err, "Provider lookup failed");
                }
                outcome
            }
            Err(_) => {
                warn!(
                    provider = provider.as_str(),
                    timeout_ms = options.per_provider_timeout.as_millis() as u64,
                    "Provider lookup timed out"
                );
                Err(ProviderError::timeout(format!(
                    "no response within {:?}",
                    options.per_provider_timeout
                )))
            }
        }
    }

    fn cache_get(&self, provider: ProviderName, query: &str) -> Option<CachedPayload> {
        self.cache.as_ref()?.get(provider, query)
    }

    fn cache_put(&self, provider: ProviderName, query: &str, payload: CachedPayload) {
        if let Some(ref cache) = self.cache {
            cache.insert(provider, query, payload);
        }
    }
}

fn disabled_slot<T>() -> ProviderResult<T> {
    ProviderResult::failure(FailureKind::NotFound, "provider disabled")
}

/// Assemble the summary input from the literature slot: the top abstracts,
/// trimmed to fit a small model's context window.
fn literature_context(literature: &ProviderResult<Vec<Article>>) -> String {
    let ProviderResult::Success(articles) = literature else {
        return String::new();
    };

    let mut out = String::new();
    for article in articles.iter().take(SUMMARY_ABSTRACT_LIMIT) {
        let Some(abstract_text) = article.abstract_text.as_deref() else {
            continue;
        };
        let snippet: String = abstract_text.chars().take(ABSTRACT_SNIPPET_CHARS).collect();
        out.push_str("- Title: ");
        out.push_str(&article.title);
        out.push_str("\n  Abstract: ");
        out.push_str(&snippet);
        out.push_str("...\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ProviderResult;

    fn article(title: &str, abstract_text: Option<&str>) -> Article {
        Article {
            pmid: None,
            title: title.to_string(),
            abstract_text: abstract_text.map(String::from),
            journal: None,
        }
    }

    #[test]
    fn test_literature_context_empty_on_failure() {
        let failed: ProviderResult<Vec<Article>> =
            ProviderResult::failure(FailureKind::NotFound, "nothing");
        assert!(literature_context(&failed).is_empty());
    }

    #[test]
    fn test_literature_context_limits_abstracts() {
        let articles: Vec<Article> = (0..5)
            .map(|i| article(&format!("Paper {i}"), Some("Abstract body.")))
            .collect();
        let context = literature_context(&ProviderResult::Success(articles));
        assert_eq!(context.matches("- Title:").count(), SUMMARY_ABSTRACT_LIMIT);
    }

    #[test]
    fn test_literature_context_skips_missing_abstracts() {
        let articles = vec![article("No abstract", None), article("Has one", Some("Body."))];
        let context = literature_context(&ProviderResult::Success(articles));
        assert!(!context.contains("No abstract"));
        assert!(context.contains("Has one"));
    }
}
