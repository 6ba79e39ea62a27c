//! PubMed E-utilities client.
//! See ARCHITECTURE.md §2.2 (NCBI E-utilities API)
//!
//! Endpoints used:
//!   esearch: https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi
//!   efetch:  https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi

use async_trait::async_trait;
use dyemind_common::error::ProviderError;
use dyemind_common::sandbox::SandboxClient as Client;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{debug, instrument, warn};

use crate::models::Article;
use crate::LiteratureSource;

const ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";
const EFETCH_URL:  &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

pub struct PubMedClient {
    client: Client,
    api_key: Option<String>,
}

impl PubMedClient {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self { client, api_key }
    }

    /// Search PubMed and return a list of PMIDs, most relevant first.
    #[instrument(skip(self))]
    async fn esearch(&self, term: &str, max: usize) -> Result<Vec<String>, ProviderError> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("term", term.to_string()),
            ("retmode", "json".to_string()),
            ("retmax", max.to_string()),
            ("sort", "relevance".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }

        let resp = self.client.get(ESEARCH_URL)?.query(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let json: serde_json::Value = resp.json().await?;
        let ids: Vec<String> = json["esearchresult"]["idlist"]
            .as_array()
            .unwrap_or(&vec![])
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();

        debug!(?ids, "PubMed esearch returned PMIDs");
        Ok(ids)
    }

    /// Fetch PubMed XML for a list of PMIDs and parse into Articles.
    #[instrument(skip(self))]
    async fn efetch_abstracts(&self, pmids: &[String]) -> Result<Vec<Article>, ProviderError> {
        let mut params = vec![
            ("db", "pubmed".to_string()),
            ("id", pmids.join(",")),
            ("rettype", "abstract".to_string()),
            ("retmode", "xml".to_string()),
        ];
        if let Some(key) = &self.api_key {
            params.push(("api_key", key.clone()));
        }

        let resp = self.client.get(EFETCH_URL)?.query(&params).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let xml = resp.text().await?;
        parse_pubmed_xml(&xml)
    }
}

#[async_trait]
impl LiteratureSource for PubMedClient {
    async fn search_literature(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<Vec<Article>, ProviderError> {
        let term = build_term(name);
        let pmids = self.esearch(&term, limit).await?;
        if pmids.is_empty() {
            return Err(ProviderError::not_found(format!(
                "no PubMed records matched {name:?}"
            )));
        }
        let articles = self.efetch_abstracts(&pmids).await?;
        if articles.is_empty() {
            return Err(ProviderError::not_found(format!(
                "PubMed records for {name:?} carried no abstracts"
            )));
        }
        Ok(articles)
    }
}

/// Shape the search term towards fluorophore-relevant hits.
fn build_term(name: &str) -> String {
    format!("{name} AND (fluorescent OR probe OR sensor)")
}

/// Parse PubMed XML (efetch abstract mode) into an Article list.
/// Handles the <PubmedArticleSet><PubmedArticle> structure; articles with
/// no abstract are dropped, matching what the summary step can use.
fn parse_pubmed_xml(xml: &str) -> Result<Vec<Article>, ProviderError> {
    let mut articles = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    // State machine for XML parsing
    let mut current: Option<Article> = None;
    let mut in_pmid     = false;
    let mut in_title    = false;
    let mut in_abstract = false;
    let mut in_journal  = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"PubmedArticle" => {
                    current = Some(Article {
                        pmid: None,
                        title: String::new(),
                        abstract_text: None,
                        journal: None,
                    });
                }
                b"PMID"         => in_pmid = true,
                b"ArticleTitle" => in_title = true,
                b"AbstractText" => in_abstract = true,
                b"Title"        => in_journal = true,
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                if let Some(ref mut a) = current {
                    if in_pmid && a.pmid.is_none() {
                        a.pmid = Some(text.clone());
                    }
                    if in_title {
                        a.title.push_str(&text);
                    }
                    if in_abstract {
                        // Structured abstracts arrive as several
                        // AbstractText sections; concatenate them.
                        match a.abstract_text {
                            Some(ref mut existing) => {
                                existing.push(' ');
                                existing.push_str(&text);
                            }
                            None => a.abstract_text = Some(text.clone()),
                        }
                    }
                    if in_journal && a.journal.is_none() {
                        a.journal = Some(text.clone());
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"PMID"         => in_pmid = false,
                b"ArticleTitle" => in_title = false,
                b"AbstractText" => in_abstract = false,
                b"Title"        => in_journal = false,
                b"PubmedArticle" => {
                    if let Some(a) = current.take() {
                        if !a.title.is_empty() && a.abstract_text.is_some() {
                            articles.push(a);
                        } else {
                            warn!(pmid = ?a.pmid, "Skipping article without title or abstract");
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ProviderError::unknown(format!("PubMed XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(articles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_term_adds_fluorophore_filter() {
        let term = build_term("Fluorescein");
        assert!(term.starts_with("Fluorescein AND"));
        assert!(term.contains("fluorescent OR probe OR sensor"));
    }

    #[test]
    fn test_parse_minimal_pubmed_xml() {
        let xml = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>31411123</PMID>
      <Article>
        <ArticleTitle>Fluorescein-based probes for live-cell imaging</ArticleTitle>
        <Abstract><AbstractText>Fluorescein derivatives remain workhorse probes.</AbstractText></Abstract>
        <Journal><Title>Chem Rev</Title></Journal>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

        let articles = parse_pubmed_xml(xml).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].pmid.as_deref(), Some("31411123"));
        assert_eq!(
            articles[0].title,
            "Fluorescein-based probes for live-cell imaging"
        );
        assert_eq!(articles[0].journal.as_deref(), Some("Chem Rev"));
    }

    #[test]
    fn test_parse_structured_abstract_concatenates_sections() {
        let xml = r#"<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>1</PMID>
      <Article>
        <ArticleTitle>A structured abstract</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">First part.</AbstractText>
          <AbstractText Label="RESULTS">Second part.</AbstractText>
        </Abstract>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

        let articles = parse_pubmed_xml(xml).unwrap();
        assert_eq!(
            articles[0].abstract_text.as_deref(),
            Some("First part. Second part.")
        );
    }

    #[test]
    fn test_parse_drops_article_without_abstract() {
        let xml = r#"<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID>2</PMID>
      <Article>
        <ArticleTitle>No abstract here</ArticleTitle>
      </Article>
    </MedlineCitation>
  </PubmedArticle>
</PubmedArticleSet>"#;

        let articles = parse_pubmed_xml(xml).unwrap();
        assert!(articles.is_empty());
    }
}
