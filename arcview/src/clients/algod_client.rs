//! Ledger (algod) client
//!
//! # API Reference
//! - Endpoint: `GET {algod}/v2/assets/{id}`
//! - Auth: optional `X-Algo-API-Token` header (public nodes need none)

use crate::types::{LedgerError, LedgerReader, TokenConfig};
use arcview_common::config::AlgodConfig;
use arcview_common::Network;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

/// Header carrying the node API token
pub const API_TOKEN_HEADER: &str = "X-Algo-API-Token";

/// `GET /v2/assets/{id}` response
#[derive(Debug, Clone, Deserialize)]
pub struct AssetResponse {
    pub index: u64,
    pub params: TokenConfig,
}

pub struct AlgodClient {
    http_client: Client,
    config: AlgodConfig,
}

impl AlgodClient {
    pub fn new(http_client: Client, config: AlgodConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Fetch the full asset record
    ///
    /// # Errors
    /// - `NotFound` on HTTP 404
    /// - `Transport` on network failure or any other non-2xx status
    /// - `Decode` when the body is not an asset record
    pub async fn asset(&self, asset_id: u64, network: Network) -> Result<AssetResponse, LedgerError> {
        let url = format!(
            "{}/v2/assets/{}",
            self.config.base_url(network).trim_end_matches('/'),
            asset_id
        );
        debug!(asset_id, network = %network, url = %url, "Querying ledger for asset");

        let mut request = self.http_client.get(&url);
        if let Some(token) = self.config.token.as_deref() {
            request = request.header(API_TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("asset request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LedgerError::NotFound(asset_id));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!(
                "ledger returned {}: {}",
                status, body
            )));
        }

        response
            .json::<AssetResponse>()
            .await
            .map_err(|e| LedgerError::Decode(format!("failed to parse asset record: {}", e)))
    }
}

#[async_trait]
impl LedgerReader for AlgodClient {
    async fn token_config(
        &self,
        asset_id: u64,
        network: Network,
    ) -> Result<TokenConfig, LedgerError> {
        Ok(self.asset(asset_id, network).await?.params)
    }
}
