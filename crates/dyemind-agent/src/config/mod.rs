//! Configuration loading for DyeMind.
//! Reads dyemind.toml from the current directory or path in DYEMIND_CONFIG env var.

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use dyemind_aggregator::{FetchOptions, ProviderName};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    #[serde(default = "default_timeout_secs")]
    pub per_provider_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_providers")]
    pub providers: Vec<String>,
}

fn default_timeout_secs()   -> u64   { 8 }
fn default_max_retries()    -> u32   { 1 }
fn default_cache_ttl_secs() -> u64   { 900 }
fn default_cache_capacity() -> usize { 256 }

fn default_providers() -> Vec<String> {
    ProviderName::fetchable()
        .iter()
        .map(|p| p.as_str().to_string())
        .collect()
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            per_provider_timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            providers: default_providers(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// "huggingface" (hosted) or "ollama" (local).
    #[serde(default = "default_llm_mode")]
    pub mode: String,
    #[serde(default)]
    pub huggingface: HuggingFaceConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

fn default_llm_mode() -> String { "huggingface".to_string() }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            mode: default_llm_mode(),
            huggingface: HuggingFaceConfig::default(),
            ollama: OllamaConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceConfig {
    /// Falls back to DYEMIND_HF_TOKEN when empty.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_hf_model")]
    pub model: String,
}

fn default_hf_model() -> String { "EssentialAI/rnj-1-instruct".to_string() }

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self { api_key: String::new(), model: default_hf_model() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,
    #[serde(default = "default_ollama_model")]
    pub model: String,
}

fn default_ollama_url()   -> String { "http://localhost:11434".to_string() }
fn default_ollama_model() -> String { "llama3:8b".to_string() }

impl Default for OllamaConfig {
    fn default() -> Self {
        Self { base_url: default_ollama_url(), model: default_ollama_model() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Optional NCBI API key for higher rate limits.
    pub pubmed_api_key: Option<String>,
    #[serde(default = "default_literature_limit")]
    pub literature_limit: usize,
}

fn default_literature_limit() -> usize { 5 }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self { pubmed_api_key: None, literature_limit: default_literature_limit() }
    }
}


impl Config {
    /// Load configuration from dyemind.toml.
    /// Checks DYEMIND_CONFIG env var first, then current directory.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("DYEMIND_CONFIG")
            .unwrap_or_else(|_| "dyemind.toml".to_string());

        if !Path::new(&path).exists() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy dyemind.example.toml to dyemind.toml and edit it.",
                path
            );
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Translate the aggregator section into per-fetch options.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            per_provider_timeout: Duration::from_secs(self.aggregator.per_provider_timeout_secs),
            max_retries: self.aggregator.max_retries,
            providers_enabled: parse_providers(&self.aggregator.providers),
            literature_limit: self.sources.literature_limit,
        }
    }
}

fn parse_providers(names: &[String]) -> HashSet<ProviderName> {
    let mut enabled = HashSet::new();
    for name in names {
        match ProviderName::from_str_opt(name) {
            Some(ProviderName::Qa) | None => {
                tracing::warn!(provider = %name, "Ignoring unknown provider in config");
            }
            Some(provider) => {
                enabled.insert(provider);
            }
        }
    }
    enabled
}
