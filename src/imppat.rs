use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::domain::PlantName;
use crate::error::PhytoError;
use crate::http;

pub const DEFAULT_BASE_URL: &str = "https://cb.imsc.res.in/imppat";

pub trait ImppatClient: Send + Sync {
    /// Raw HTML of the plant's phytochemical association page.
    fn fetch_phytochemical_page(&self, plant: &PlantName) -> Result<String, PhytoError>;
    fn download_structure(&self, identifier: &str, destination: &Path) -> Result<(), PhytoError>;
}

#[derive(Clone)]
pub struct ImppatHttpClient {
    client: Client,
    base_url: String,
}

impl ImppatHttpClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PhytoError> {
        Ok(Self {
            client: http::build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn phytochemical_url(base_url: &str, plant: &PlantName) -> String {
        format!(
            "{}/phytochemical/{}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(plant.as_str())
        )
    }

    pub fn structure_url(base_url: &str, identifier: &str) -> String {
        format!(
            "{}/images/3D/SDF/{}_3D.sdf",
            base_url.trim_end_matches('/'),
            urlencoding::encode(identifier)
        )
    }
}

impl ImppatClient for ImppatHttpClient {
    fn fetch_phytochemical_page(&self, plant: &PlantName) -> Result<String, PhytoError> {
        let url = Self::phytochemical_url(&self.base_url, plant);
        debug!(%url, "imppat.request");
        let response = http::send(self.client.get(&url))?;
        let response = http::handle_status(response, "IMPPAT")?;
        response
            .text()
            .map_err(|err| PhytoError::RetrievalHttp(err.to_string()))
    }

    fn download_structure(&self, identifier: &str, destination: &Path) -> Result<(), PhytoError> {
        let url = Self::structure_url(&self.base_url, identifier);
        debug!(%url, "imppat.request");
        let response = http::send(self.client.get(&url))?;
        let response = http::handle_status(response, "IMPPAT")?;
        http::write_body(response, destination)
    }
}
