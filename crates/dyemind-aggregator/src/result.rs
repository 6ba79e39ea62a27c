//! Result records handed back to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use dyemind_common::error::{FailureKind, ProviderError};
use dyemind_providers::models::{Article, CompoundRecord, PageIntro};

use crate::options::ProviderName;

/// Outcome of a single provider lookup. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum ProviderResult<T> {
    Success(T),
    Failure { kind: FailureKind, message: String },
}

impl<T> ProviderResult<T> {
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        ProviderResult::Failure { kind, message: message.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProviderResult::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            ProviderResult::Success(value) => Some(value),
            ProviderResult::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ProviderResult::Success(_) => None,
            ProviderResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

impl<T> From<Result<T, ProviderError>> for ProviderResult<T> {
    fn from(res: Result<T, ProviderError>) -> Self {
        match res {
            Ok(value) => ProviderResult::Success(value),
            Err(err) => ProviderResult::Failure { kind: err.kind, message: err.message },
        }
    }
}

/// Everything one `fetch()` call settled, one slot per provider.
///
/// The record is created fresh per query and handed to the caller by
/// value; after `fetch()` returns, the `qa` slot holds NotFound until the
/// caller attaches an `ask()` outcome via [`AggregateResult::record_answer`]
/// (a by-value move, so a settled record is never mutated in place).
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub query: String,
    pub query_id: Uuid,
    pub fetched_at: DateTime<Utc>,
    pub structure: ProviderResult<CompoundRecord>,
    pub literature: ProviderResult<Vec<Article>>,
    pub summary: ProviderResult<String>,
    pub encyclopedia: ProviderResult<PageIntro>,
    pub qa: ProviderResult<String>,
}

impl AggregateResult {
    /// Attach the outcome of `ask()` to the `qa` slot.
    pub fn record_answer(mut self, answer: ProviderResult<String>) -> Self {
        self.qa = answer;
        self
    }

    /// Failure kind per slot (`None` for successes), always all five.
    pub fn slot_kinds(&self) -> [(ProviderName, Option<FailureKind>); 5] {
        [
            (ProviderName::Structure,    self.structure.failure_kind()),
            (ProviderName::Literature,   self.literature.failure_kind()),
            (ProviderName::Summary,      self.summary.failure_kind()),
            (ProviderName::Encyclopedia, self.encyclopedia.failure_kind()),
            (ProviderName::Qa,           self.qa.failure_kind()),
        ]
    }

    pub fn success_count(&self) -> usize {
        self.slot_kinds()
            .iter()
            .filter(|(_, kind)| kind.is_none())
            .count()
    }
}
