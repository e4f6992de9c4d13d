//! Test Helper Utilities
//!
//! In-memory collaborators for exercising the resolution pipeline without a
//! network.

use arcview::types::{
    ConfigTransaction, ContentFetcher, ExtractionError, FetchedContent, LedgerError, LedgerReader,
    TokenConfig, TransactionLogReader,
};
use arcview_common::Network;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Address whose public key is the bytes 0..=31
pub const SEQUENTIAL_ADDRESS: &str = "AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQTCQKRMFYYDENBWHA5DYP7MUPJQE";

/// CIDv1 (raw, sha2-256) over that key
pub const SEQUENTIAL_RAW_CID: &str =
    "bafkreiaaaebagbafaydqqcikbmga2dqpcaireeyuculbogazdinryhi6d4";

/// Fetcher serving fixed responses and recording requested urls
#[derive(Default)]
pub struct StaticFetcher {
    routes: HashMap<String, FetchedContent>,
    pub requested: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, url: &str, document: Value) -> Self {
        self.routes.insert(url.to_string(), FetchedContent::json(&document));
        self
    }

    pub fn bytes(mut self, url: &str, content_type: &str, body: &[u8]) -> Self {
        self.routes.insert(
            url.to_string(),
            FetchedContent::new(Some(content_type.to_string()), body.to_vec()),
        );
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentFetcher for StaticFetcher {
    async fn get(&self, url: &str) -> Result<FetchedContent, ExtractionError> {
        self.requested.lock().unwrap().push(url.to_string());
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| ExtractionError::Transport(format!("404 for {}", url)))
    }
}

/// Transaction log returning a fixed list
#[derive(Default)]
pub struct StaticLog(pub Vec<ConfigTransaction>);

#[async_trait]
impl TransactionLogReader for StaticLog {
    async fn config_transactions(&self, _asset_id: u64, _network: Network) -> Vec<ConfigTransaction> {
        self.0.clone()
    }
}

/// Ledger holding configuration records by asset id
#[derive(Default)]
pub struct StaticLedger(pub HashMap<u64, TokenConfig>);

impl StaticLedger {
    pub fn with(asset_id: u64, config: TokenConfig) -> Self {
        Self(HashMap::from([(asset_id, config)]))
    }
}

#[async_trait]
impl LedgerReader for StaticLedger {
    async fn token_config(&self, asset_id: u64, _network: Network) -> Result<TokenConfig, LedgerError> {
        self.0.get(&asset_id).cloned().ok_or(LedgerError::NotFound(asset_id))
    }
}

/// Configuration transaction carrying `note` as its base64 note field
pub fn note_tx(note: &Value, round_time: i64) -> ConfigTransaction {
    ConfigTransaction {
        note: Some(BASE64.encode(note.to_string())),
        round_time,
    }
}

pub fn token(name: Option<&str>, url: Option<&str>, reserve: Option<&str>) -> TokenConfig {
    TokenConfig {
        name: name.map(str::to_string),
        url: url.map(str::to_string),
        reserve: reserve.map(str::to_string),
        creator: "CREATOR".to_string(),
        total: 1,
        ..Default::default()
    }
}
