//! dyemind-providers — External data-source clients.
//! See ARCHITECTURE.md §2:
//! - PubChem PUG REST (chemical structure)
//! - NCBI E-utilities / PubMed (literature)
//! - Wikipedia REST (encyclopedic summary)
//!
//! Each client converts the provider's loosely-typed JSON/XML into a typed
//! payload or a classified `ProviderError` at the boundary; nothing
//! dictionary-shaped escapes this crate.

pub mod models;
pub mod pubchem;
pub mod pubmed;
pub mod wikipedia;

use async_trait::async_trait;
use dyemind_common::error::ProviderError;

use crate::models::{Article, CompoundRecord, PageIntro};

/// Chemical-structure lookup by compound name.
#[async_trait]
pub trait StructureSource: Send + Sync {
    async fn lookup_structure(&self, name: &str) -> Result<CompoundRecord, ProviderError>;
}

/// Literature search by compound name, returning abstracts.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    async fn search_literature(
        &self,
        name: &str,
        limit: usize,
    ) -> Result<Vec<Article>, ProviderError>;
}

/// Encyclopedic one-paragraph introduction by article title.
#[async_trait]
pub trait EncyclopediaSource: Send + Sync {
    async fn get_intro(&self, name: &str) -> Result<PageIntro, ProviderError>;
}
