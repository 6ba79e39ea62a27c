use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use url::Url;

use crate::error::DyeMindError;

/// An allowlist-capped HTTP client that only allows requests to the
/// external provider domains. Every data-source client in
/// `dyemind-providers` goes through this wrapper.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client whose allowlist covers exactly the DyeMind provider domains.
    pub fn new() -> Result<Self, DyeMindError> {
        let mut allowlist = HashSet::new();
        let domains = vec![
            "pubchem.ncbi.nlm.nih.gov",   // PubChem PUG REST
            "eutils.ncbi.nlm.nih.gov",    // NCBI E-utilities (PubMed)
            "wikipedia.org",              // Wikipedia REST (en.wikipedia.org et al.)
            "api-inference.huggingface.co", // Hugging Face Inference API
            "huggingface.co",
            "localhost",                  // Ollama local
            "127.0.0.1",
        ];

        for d in domains {
            allowlist.insert(d.to_string());
        }

        let client = ClientBuilder::new()
            .user_agent(concat!("dyemind/", env!("CARGO_PKG_VERSION"), " (research)"))
            .build()
            .map_err(|e| DyeMindError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Validates if a URL is permitted under the current allowlist.
    /// Subdomains of an allowed domain are permitted.
    pub fn is_allowed(&self, url: &str) -> bool {
        if let Ok(parsed) = Url::parse(url) {
            if let Some(host) = parsed.host_str() {
                for allowed in &self.allowlist {
                    if host == allowed || host.ends_with(&format!(".{}", allowed)) {
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Exposes the inner `reqwest::Client` builder pattern safely for GET requests.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, DyeMindError> {
        if !self.is_allowed(url) {
            return Err(DyeMindError::Sandbox(format!(
                "domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.get(url))
    }

    /// Exposes the inner `reqwest::Client` builder pattern safely for POST requests.
    pub fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, DyeMindError> {
        if !self.is_allowed(url) {
            return Err(DyeMindError::Sandbox(format!(
                "domain not in allowlist for URL {}",
                url
            )));
        }

        Ok(self.client.post(url))
    }
}
