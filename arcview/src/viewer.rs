//! NFT viewer facade
//!
//! Looks up a token on the ledger, resolves its metadata and optionally
//! downloads the resolved media.

use crate::clients::{build_http_client, AlgodClient, HttpFetcher, IndexerClient};
use crate::locator::LocatorNormalizer;
use crate::presentation::{animation_mime_type, image_mime_type};
use crate::resolver::MetadataResolver;
use crate::types::{
    ContentFetcher, LedgerReader, ResolutionContext, ResolutionError, ResolvedMetadata,
    TokenConfig, TransactionLogReader,
};
use arcview_common::config::TomlConfig;
use arcview_common::Network;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A token with its resolved metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NftAsset {
    pub index: u64,
    pub params: TokenConfig,
    pub metadata: ResolvedMetadata,
}

/// Downloaded media
#[derive(Debug, Clone, PartialEq)]
pub struct MediaFile {
    /// `image` or `animation`
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl MediaFile {
    /// `image/svg+xml` → `image.svg`
    pub fn file_name(&self) -> String {
        let extension = self
            .mime_type
            .split(';')
            .next()
            .and_then(|essence| essence.split('/').nth(1))
            .and_then(|subtype| subtype.split('+').next())
            .map(str::trim)
            .filter(|ext| !ext.is_empty());

        match extension {
            Some(ext) => format!("{}.{}", self.name, ext),
            None => self.name.clone(),
        }
    }

    /// Write into `dir`, returning the written path
    pub async fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(self.file_name());
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}

pub struct NftViewer {
    ledger: Arc<dyn LedgerReader>,
    fetcher: Arc<dyn ContentFetcher>,
    resolver: MetadataResolver,
}

impl NftViewer {
    pub fn new(
        ledger: Arc<dyn LedgerReader>,
        log: Arc<dyn TransactionLogReader>,
        fetcher: Arc<dyn ContentFetcher>,
        normalizer: LocatorNormalizer,
    ) -> Self {
        Self {
            ledger,
            resolver: MetadataResolver::new(Arc::clone(&fetcher), log, normalizer),
            fetcher,
        }
    }

    /// Per-extractor deadline
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.resolver = self.resolver.with_deadline(deadline);
        self
    }

    /// Wire HTTP clients from configuration
    pub fn from_config(config: &TomlConfig) -> Result<Self, reqwest::Error> {
        let http_client = build_http_client(config.request_timeout())?;

        Ok(Self::new(
            Arc::new(AlgodClient::new(http_client.clone(), config.algod.clone())),
            Arc::new(IndexerClient::new(http_client.clone(), config.indexer.clone())),
            Arc::new(HttpFetcher::new(http_client)),
            LocatorNormalizer::new(config.ipfs_gateway.clone()),
        ))
    }

    pub async fn asset(&self, asset_id: u64, network: Network) -> Result<NftAsset, ResolutionError> {
        self.asset_with_cancellation(asset_id, network, &CancellationToken::new())
            .await
    }

    /// Resolve a token, abandoning extractors once `cancel` fires
    ///
    /// # Errors
    /// - `Cancelled` when `cancel` fires before the ledger answers
    /// - `Ledger` when the configuration record cannot be read
    /// - `ResolutionFailed` when every applicable standard failed
    pub async fn asset_with_cancellation(
        &self,
        asset_id: u64,
        network: Network,
        cancel: &CancellationToken,
    ) -> Result<NftAsset, ResolutionError> {
        let params = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!(asset_id, "Ledger lookup cancelled");
                return Err(ResolutionError::Cancelled);
            }
            result = self.ledger.token_config(asset_id, network) => result?,
        };
        debug!(asset_id, network = %network, url = params.url_str(), "Token configuration loaded");

        let ctx = ResolutionContext::new(asset_id, network, params);
        let metadata = self.resolver.resolve_with_cancellation(&ctx, cancel).await?;

        Ok(NftAsset {
            index: asset_id,
            params: ctx.config,
            metadata,
        })
    }

    /// Resolve a token and download its image and animation
    ///
    /// # Errors
    /// As [`NftViewer::asset`], plus `Media` when a download fails.
    pub async fn asset_with_files(
        &self,
        asset_id: u64,
        network: Network,
    ) -> Result<(NftAsset, Vec<MediaFile>), ResolutionError> {
        self.asset_with_files_with_cancellation(asset_id, network, &CancellationToken::new())
            .await
    }

    /// [`NftViewer::asset_with_files`], stopping with `Cancelled` once
    /// `cancel` fires
    pub async fn asset_with_files_with_cancellation(
        &self,
        asset_id: u64,
        network: Network,
        cancel: &CancellationToken,
    ) -> Result<(NftAsset, Vec<MediaFile>), ResolutionError> {
        let asset = self
            .asset_with_cancellation(asset_id, network, cancel)
            .await?;
        let metadata = &asset.metadata;

        let media = [
            ("image", metadata.image_locator.as_ref(), image_mime_type(metadata)),
            ("animation", metadata.animation_locator.as_ref(), animation_mime_type(metadata)),
        ];

        let mut files = Vec::new();
        for (name, locator, mime_type) in media {
            let Some(locator) = locator else { continue };
            let content = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(asset_id, name, url = %locator.url, "Media download cancelled");
                    return Err(ResolutionError::Cancelled);
                }
                result = self.fetcher.get(&locator.url) => result.map_err(ResolutionError::Media)?,
            };

            info!(asset_id, name, url = %locator.url, bytes = content.body.len(), "Media downloaded");
            files.push(MediaFile {
                name: name.to_string(),
                mime_type,
                bytes: content.body,
            });
        }

        Ok((asset, files))
    }
}
