//! PubChem PUG REST client.
//! See ARCHITECTURE.md §2.1 (PubChem PUG REST API)
//!
//! Two-step lookup:
//!   name → CID:       /compound/name/{name}/cids/JSON
//!   CID → properties: /compound/cid/{cid}/property/…/JSON

use async_trait::async_trait;
use dyemind_common::error::ProviderError;
use dyemind_common::sandbox::SandboxClient as Client;
use tracing::{debug, instrument};

use crate::models::CompoundRecord;
use crate::StructureSource;

const PUG_REST_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";
const COMPOUND_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/compound";
const PROPERTY_LIST: &str = "CanonicalSMILES,MolecularFormula,MolecularWeight";

pub struct PubChemClient {
    client: Client,
}

impl PubChemClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve a free-text compound name to the first matching CID.
    #[instrument(skip(self))]
    async fn resolve_cid(&self, name: &str) -> Result<u64, ProviderError> {
        let url = format!(
            "{}/compound/name/{}/cids/JSON",
            PUG_REST_URL,
            urlencoding::encode(name)
        );

        let resp = self.client.get(&url)?.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let json: serde_json::Value = resp.json().await?;
        let cid = first_cid(&json)
            .ok_or_else(|| ProviderError::not_found(format!("no CID matched name {name:?}")))?;

        debug!(cid, "PubChem name lookup resolved");
        Ok(cid)
    }

    #[instrument(skip(self))]
    async fn fetch_properties(&self, cid: u64) -> Result<CompoundRecord, ProviderError> {
        let url = format!(
            "{}/compound/cid/{}/property/{}/JSON",
            PUG_REST_URL, cid, PROPERTY_LIST
        );

        let resp = self.client.get(&url)?.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, &body));
        }

        let json: serde_json::Value = resp.json().await?;
        parse_property_json(cid, &json)
    }
}

#[async_trait]
impl StructureSource for PubChemClient {
    async fn lookup_structure(&self, name: &str) -> Result<CompoundRecord, ProviderError> {
        let cid = self.resolve_cid(name).await?;
        self.fetch_properties(cid).await
    }
}

fn first_cid(json: &serde_json::Value) -> Option<u64> {
    json["IdentifierList"]["CID"]
        .as_array()
        .and_then(|cids| cids.first())
        .and_then(|v| v.as_u64())
}

/// Parse the PropertyTable response into a CompoundRecord.
/// Newer PUG REST revisions return MolecularWeight as a string.
fn parse_property_json(
    cid: u64,
    json: &serde_json::Value,
) -> Result<CompoundRecord, ProviderError> {
    let props = json["PropertyTable"]["Properties"]
        .as_array()
        .and_then(|p| p.first())
        .ok_or_else(|| ProviderError::unknown("property response missing PropertyTable"))?;

    let molecular_weight = props["MolecularWeight"]
        .as_f64()
        .or_else(|| props["MolecularWeight"].as_str().and_then(|s| s.parse().ok()));

    Ok(CompoundRecord {
        cid,
        smiles: props["CanonicalSMILES"].as_str().map(String::from),
        molecular_formula: props["MolecularFormula"].as_str().map(String::from),
        molecular_weight,
        image_url: format!(
            "{}/compound/cid/{}/PNG?record_type=2d&image_size=large",
            PUG_REST_URL, cid
        ),
        record_url: format!("{}/{}", COMPOUND_URL, cid),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_cid_from_identifier_list() {
        let json = serde_json::json!({
            "IdentifierList": { "CID": [16850, 517045] }
        });
        assert_eq!(first_cid(&json), Some(16850));
    }

    #[test]
    fn test_first_cid_empty_list() {
        let json = serde_json::json!({ "IdentifierList": { "CID": [] } });
        assert_eq!(first_cid(&json), None);
    }

    #[test]
    fn test_parse_property_json_numeric_weight() {
        let json = serde_json::json!({
            "PropertyTable": { "Properties": [{
                "CID": 16850,
                "CanonicalSMILES": "C1=CC=C2C(=C1)C(=O)OC23C4=CC=C(C=C4OC5=C3C=CC(=C5)O)O",
                "MolecularFormula": "C20H12O5",
                "MolecularWeight": 332.3
            }]}
        });
        let record = parse_property_json(16850, &json).unwrap();
        assert_eq!(record.molecular_formula.as_deref(), Some("C20H12O5"));
        assert_eq!(record.molecular_weight, Some(332.3));
        assert!(record.image_url.contains("/cid/16850/PNG"));
        assert!(record.record_url.ends_with("/16850"));
    }

    #[test]
    fn test_parse_property_json_string_weight() {
        let json = serde_json::json!({
            "PropertyTable": { "Properties": [{
                "CID": 16850,
                "MolecularWeight": "332.31"
            }]}
        });
        let record = parse_property_json(16850, &json).unwrap();
        assert_eq!(record.molecular_weight, Some(332.31));
        assert!(record.smiles.is_none());
    }

    #[test]
    fn test_parse_property_json_missing_table() {
        let json = serde_json::json!({ "Fault": { "Code": "PUGREST.BadRequest" } });
        let err = parse_property_json(1, &json).unwrap_err();
        assert_eq!(err.kind, dyemind_common::FailureKind::Unknown);
    }
}
