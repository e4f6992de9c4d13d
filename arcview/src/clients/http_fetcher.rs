//! Generic content fetch

use crate::types::{ContentFetcher, ExtractionError, FetchedContent};
use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

pub struct HttpFetcher {
    http_client: Client,
}

impl HttpFetcher {
    pub fn new(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl ContentFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchedContent, ExtractionError> {
        debug!(url = %url, "Fetching content");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| ExtractionError::Transport(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Transport(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Transport(format!("reading {} failed: {}", url, e)))?;

        debug!(
            url = %url,
            content_type = ?content_type,
            bytes = body.len(),
            "Content fetched"
        );
        Ok(FetchedContent::new(content_type, body.to_vec()))
    }
}
