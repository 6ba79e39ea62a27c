//! Per-fetch configuration.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The five slots of an aggregate result. Four of them are dispatched by
/// `fetch()`; `Qa` is only ever settled through `ask()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderName {
    Structure,
    Literature,
    Summary,
    Encyclopedia,
    Qa,
}

impl ProviderName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Structure    => "structure",
            ProviderName::Literature   => "literature",
            ProviderName::Summary      => "summary",
            ProviderName::Encyclopedia => "encyclopedia",
            ProviderName::Qa           => "qa",
        }
    }

    /// The providers `fetch()` dispatches.
    pub fn fetchable() -> [ProviderName; 4] {
        [
            ProviderName::Structure,
            ProviderName::Literature,
            ProviderName::Summary,
            ProviderName::Encyclopedia,
        ]
    }

    pub fn from_str_opt(s: &str) -> Option<ProviderName> {
        match s {
            "structure"    => Some(ProviderName::Structure),
            "literature"   => Some(ProviderName::Literature),
            "summary"      => Some(ProviderName::Summary),
            "encyclopedia" => Some(ProviderName::Encyclopedia),
            "qa"           => Some(ProviderName::Qa),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Deadline for one provider lookup, retries included.
    pub per_provider_timeout: Duration,
    /// Additional attempts after the first, for retryable failures only.
    pub max_retries: u32,
    /// Which of the fetchable providers to dispatch. Disabled providers
    /// still occupy their result slot.
    pub providers_enabled: HashSet<ProviderName>,
    /// How many literature hits to request.
    pub literature_limit: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            per_provider_timeout: Duration::from_secs(8),
            max_retries: 1,
            providers_enabled: ProviderName::fetchable().into_iter().collect(),
            literature_limit: 5,
        }
    }
}

impl FetchOptions {
    pub fn is_enabled(&self, provider: ProviderName) -> bool {
        self.providers_enabled.contains(&provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_all_fetchable_providers() {
        let options = FetchOptions::default();
        for provider in ProviderName::fetchable() {
            assert!(options.is_enabled(provider));
        }
        assert!(!options.is_enabled(ProviderName::Qa));
        assert_eq!(options.per_provider_timeout, Duration::from_secs(8));
        assert_eq!(options.max_retries, 1);
    }

    #[test]
    fn test_provider_name_round_trip() {
        for provider in ProviderName::fetchable() {
            assert_eq!(ProviderName::from_str_opt(provider.as_str()), Some(provider));
        }
        assert_eq!(ProviderName::from_str_opt("nonsense"), None);
    }
}
