use std::fs::File;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::PhytoError;

const MESSAGE_LIMIT: usize = 200;

pub fn build_client(timeout: Duration) -> Result<Client, PhytoError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("phytofetch/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| PhytoError::RetrievalHttp(err.to_string()))?,
    );
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(|err| PhytoError::RetrievalHttp(err.to_string()))
}

/// Sends a single request; there is no retry.
pub fn send(request: reqwest::blocking::RequestBuilder) -> Result<Response, PhytoError> {
    request
        .send()
        .map_err(|err| PhytoError::RetrievalHttp(err.to_string()))
}

pub fn handle_status(response: Response, source_name: &str) -> Result<Response, PhytoError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let mut message = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if message.is_empty() || message.starts_with('<') {
        message = status.canonical_reason().unwrap_or("request failed").to_string();
    }
    if let Some((cut, _)) = message.char_indices().nth(MESSAGE_LIMIT) {
        message.truncate(cut);
        message.push('…');
    }
    Err(PhytoError::Retrieval {
        source_name: source_name.to_string(),
        status: status.as_u16(),
        message,
    })
}

pub fn write_body(mut response: Response, destination: &Path) -> Result<(), PhytoError> {
    let mut file = File::create(destination)
        .map_err(|err| PhytoError::persistence(destination.display(), err))?;
    std::io::copy(&mut response, &mut file)
        .map_err(|err| PhytoError::persistence(destination.display(), err))?;
    Ok(())
}
