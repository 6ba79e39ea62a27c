//! Bounded, time-expiring cache of successful provider payloads.
//! See ARCHITECTURE.md §3.3.
//!
//! Keyed by (provider, normalized query). Entries expire after a TTL;
//! only successes are stored, failures are always re-attempted.
//! Concurrent inserts race with last-writer-wins semantics.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use tokio::time::Instant;

use dyemind_providers::models::{Article, CompoundRecord, PageIntro};

use crate::options::ProviderName;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    provider: ProviderName,
    query: String,
}

#[derive(Debug, Clone)]
pub(crate) enum CachedPayload {
    Structure(CompoundRecord),
    Literature(Vec<Article>),
    Summary(String),
    Encyclopedia(PageIntro),
}

struct CachedEntry {
    stored_at: Instant,
    payload: CachedPayload,
}

pub(crate) struct ResponseCache {
    inner: Mutex<LruCache<CacheKey, CachedEntry>>,
    ttl: Duration,
}

impl ResponseCache {
    pub(crate) fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    pub(crate) fn get(&self, provider: ProviderName, query: &str) -> Option<CachedPayload> {
        let key = CacheKey { provider, query: normalize_query(query) };
        let mut cache = self.inner.lock().ok()?;
        let expired = match cache.get(&key) {
            Some(entry) => {
                if entry.stored_at.elapsed() <= self.ttl {
                    return Some(entry.payload.clone());
                }
                true
            }
            None => false,
        };
        if expired {
            cache.pop(&key);
        }
        None
    }

    pub(crate) fn insert(&self, provider: ProviderName, query: &str, payload: CachedPayload) {
        let key = CacheKey { provider, query: normalize_query(query) };
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(key, CachedEntry { stored_at: Instant::now(), payload });
        }
    }
}

/// Cache keys ignore case and surrounding whitespace: "Fluorescein" and
/// " fluorescein " are the same lookup.
pub(crate) fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}
