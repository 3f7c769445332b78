use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::PhytoError;
use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://pubchem.ncbi.nlm.nih.gov/rest/pug";

pub trait PubchemClient: Send + Sync {
    /// CIDs matching a compound name, best match first. Unknown names yield
    /// an empty list rather than an error.
    fn lookup_cids(&self, name: &str) -> Result<Vec<u64>, PhytoError>;
    fn download_structure(&self, cid: u64, destination: &Path) -> Result<(), PhytoError>;
}

#[derive(Debug, Deserialize)]
struct CidResponse {
    #[serde(rename = "IdentifierList")]
    identifier_list: Option<IdentifierList>,
}

#[derive(Debug, Deserialize)]
struct IdentifierList {
    #[serde(rename = "CID", default)]
    cid: Vec<u64>,
}

#[derive(Clone)]
pub struct PubchemHttpClient {
    client: Client,
    base_url: String,
}

impl PubchemHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PhytoError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn cids_url(base_url: &str, name: &str) -> String {
        format!(
            "{}/compound/name/{}/cids/JSON",
            base_url.trim_end_matches('/'),
            urlencoding::encode(name)
        )
    }

    pub fn structure_url(base_url: &str, cid: u64) -> String {
        format!(
            "{}/compound/cid/{cid}/SDF?record_type=3d",
            base_url.trim_end_matches('/')
        )
    }
}

impl PubchemClient for PubchemHttpClient {
    fn lookup_cids(&self, name: &str) -> Result<Vec<u64>, PhytoError> {
        let url = Self::cids_url(&self.base_url, name);
        debug!(%url, "pubchem.request");
        let response = http::send(self.client.get(&url))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = http::handle_status(response, "PubChem")?;
        let body: CidResponse = response
            .json()
            .map_err(|err| PhytoError::RetrievalHttp(err.to_string()))?;
        Ok(parse_cids(body))
    }

    fn download_structure(&self, cid: u64, destination: &Path) -> Result<(), PhytoError> {
        let url = Self::structure_url(&self.base_url, cid);
        debug!(%url, "pubchem.request");
        let response = http::send(self.client.get(&url))?;
        let response = http::handle_status(response, "PubChem")?;
        http::write_body(response, destination)
    }
}

/// PubChem reports CID 0 for names it accepted but could not map.
fn parse_cids(body: CidResponse) -> Vec<u64> {
    body.identifier_list
        .map(|list| list.cid.into_iter().filter(|cid| *cid != 0).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cids_url_encodes_name() {
        assert_eq!(
            PubchemHttpClient::cids_url(DEFAULT_BASE_URL, "Ursolic acid"),
            "https://pubchem.ncbi.nlm.nih.gov/rest/pug/compound/name/Ursolic%20acid/cids/JSON"
        );
        assert!(
            PubchemHttpClient::cids_url(DEFAULT_BASE_URL, "1,8-cineole/eucalyptol")
                .contains("1%2C8-cineole%2Feucalyptol")
        );
    }

    #[test]
    fn parse_cid_payloads() {
        let body: CidResponse =
            serde_json::from_str(r#"{"IdentifierList":{"CID":[3314,0,12345]}}"#).unwrap();
        assert_eq!(parse_cids(body), vec![3314, 12345]);

        let body: CidResponse = serde_json::from_str(r#"{"Fault":{"Code":"x"}}"#).unwrap();
        assert!(parse_cids(body).is_empty());
    }
}
