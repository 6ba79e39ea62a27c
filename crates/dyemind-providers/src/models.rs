//! Typed payloads returned by the provider clients.

use serde::{Deserialize, Serialize};

/// Chemical identity of a compound as resolved by the structure provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompoundRecord {
    pub cid: u64,
    pub smiles: Option<String>,
    pub molecular_formula: Option<String>,
    pub molecular_weight: Option<f64>,
    /// 2D depiction rendered by the provider.
    pub image_url: String,
    pub record_url: String,
}

/// One literature hit: title plus abstract, as far as the record carries them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub pmid: Option<String>,
    pub title: String,
    pub abstract_text: Option<String>,
    pub journal: Option<String>,
}

/// Lead paragraph of an encyclopedia entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageIntro {
    pub title: String,
    pub extract: String,
    pub page_url: Option<String>,
}
