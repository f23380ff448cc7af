use crate::types::{Result, TransportError};
use std::time::Duration;
use url::Url;

/// Plain HTTP GETs for the negotiate and start handshake steps
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("signalr-client-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Sends a GET request and returns the full body of a successful response
    pub async fn get_text(&self, url: &Url) -> std::result::Result<String, TransportError> {
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            tracing::debug!("GET {} returned status {}", url.path(), response.status());
            return Err(TransportError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}
