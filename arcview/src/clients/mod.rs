//! HTTP collaborators
//!
//! Thin reqwest-backed implementations of the collaborator traits:
//! - [`AlgodClient`]: token configuration records (`LedgerReader`)
//! - [`IndexerClient`]: configuration-transaction history (`TransactionLogReader`)
//! - [`HttpFetcher`]: generic GET for documents and media (`ContentFetcher`)
//!
//! All three are built around one shared [`reqwest::Client`].

pub mod algod_client;
pub mod http_fetcher;
pub mod indexer_client;

pub use algod_client::AlgodClient;
pub use http_fetcher::HttpFetcher;
pub use indexer_client::IndexerClient;

use reqwest::{header, Client};
use std::time::Duration;

/// User-Agent sent with every request
pub const USER_AGENT: &str = concat!("arcview/", env!("CARGO_PKG_VERSION"));

/// Build the shared HTTP client
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_static(USER_AGENT),
    );

    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
}
