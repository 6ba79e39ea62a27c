//! Wikipedia REST client.
//! See ARCHITECTURE.md §2.3 (Wikipedia page-summary API)
//!
//! Endpoint: https://en.wikipedia.org/api/rest_v1/page/summary/{title}

use async_trait::async_trait;
use dyemind_common::error::ProviderError;
use dyemind_common::sandbox::SandboxClient as Client;
use tracing::{debug, instrument};

use crate::models::PageIntro;
use crate::EncyclopediaSource;

const SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";

pub struct WikipediaClient {
    client: Client,
}

impl WikipediaClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EncyclopediaSource for WikipediaClient {
    #[instrument(skip(self))]
    async fn get_intro(&self, name: &str) -> Result<PageIntro, ProviderError> {
        // Page titles use underscores for spaces.
        let title = name.trim().replace(' ', "_");
        let url = format!("{}/{}", SUMMARY_URL, urlencoding::encode(&title));

        let resp = self.client.get(&url)?.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let json: serde_json::Value = resp.json().await?;
        let intro = parse_summary_json(&json)?;
        debug!(title = %intro.title, "Wikipedia summary retrieved");
        Ok(intro)
    }
}

fn parse_summary_json(json: &serde_json::Value) -> Result<PageIntro, ProviderError> {
    // Disambiguation pages are not a usable intro; treat as no-data.
    if json["type"].as_str() == Some("disambiguation") {
        return Err(ProviderError::not_found("title resolves to a disambiguation page"));
    }

    let extract = json["extract"]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::not_found("page has no extract"))?;

    Ok(PageIntro {
        title: json["title"].as_str().unwrap_or("").to_string(),
        extract: extract.to_string(),
        page_url: json["content_urls"]["desktop"]["page"]
            .as_str()
            .map(String::from),
    })
}
