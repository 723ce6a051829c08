use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

use crate::error::WatchError;

/// Retrieves the current state of the watched page
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform one retrieval. Non-2xx responses, network errors and timeouts
    /// all surface as `WatchError::Fetch`; the caller skips the rest of the
    /// check and retries on the next scheduled one. There is no retry here,
    /// the polling interval is the retry mechanism.
    async fn fetch(&self) -> Result<String, WatchError>;
}

/// HTTP fetcher for the watched page
pub struct HttpFetcher {
    /// Page URL to fetch
    url: String,
    /// HTTP client
    client: Client,
}

impl HttpFetcher {
    /// Create a new HTTP fetcher
    pub fn new(url: &str) -> Self {
        // Create HTTP client with timeout
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            url: url.to_string(),
            client,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<String, WatchError> {
        debug!("Fetching page content: {}", self.url);

        let response = self.client.get(&self.url)
            .send()
            .await
            .map_err(|e| WatchError::Fetch(format!("request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WatchError::Fetch(format!("HTTP request failed, status code: {}", status)));
        }

        let body = response.text()
            .await
            .map_err(|e| WatchError::Fetch(format!("failed to read response body: {}", e)))?;

        debug!("Page content retrieved: {} bytes", body.len());
        Ok(body)
    }
}
