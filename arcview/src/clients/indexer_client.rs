//! Transaction-log (indexer) client
//!
//! Endpoint: `GET {indexer}/v2/assets/{id}/transactions?tx-type=acfg`
//!
//! History is optional context, so every failure here is logged and turned
//! into an empty result.

use crate::types::{ConfigTransaction, TransactionLogReader};
use arcview_common::config::IndexerConfig;
use arcview_common::Network;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Transaction type filter for asset configuration transactions
pub const ASSET_CONFIG_TX_TYPE: &str = "acfg";

#[derive(Debug, Default, Deserialize)]
struct TransactionsResponse {
    #[serde(default)]
    transactions: Vec<ConfigTransaction>,
}

pub struct IndexerClient {
    http_client: Client,
    config: IndexerConfig,
}

impl IndexerClient {
    pub fn new(http_client: Client, config: IndexerConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn query(&self, url: &str) -> Result<Vec<ConfigTransaction>, String> {
        let response = self
            .http_client
            .get(url)
            .query(&[("tx-type", ASSET_CONFIG_TX_TYPE)])
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("indexer returned {}", status));
        }

        let parsed: TransactionsResponse = response
            .json()
            .await
            .map_err(|e| format!("failed to parse transactions: {}", e))?;
        Ok(parsed.transactions)
    }
}

#[async_trait]
impl TransactionLogReader for IndexerClient {
    async fn config_transactions(&self, asset_id: u64, network: Network) -> Vec<ConfigTransaction> {
        let url = format!(
            "{}/v2/assets/{}/transactions",
            self.config.base_url(network).trim_end_matches('/'),
            asset_id
        );

        match self.query(&url).await {
            Ok(transactions) => {
                debug!(asset_id, count = transactions.len(), "Configuration transactions loaded");
                transactions
            }
            Err(e) => {
                warn!(asset_id, network = %network, error = %e, "Transaction log unavailable");
                Vec::new()
            }
        }
    }
}
