//! Direct-JSON Extractor (ARC-3)
//!
//! The token url points either at a JSON metadata document or straight at
//! the media. The declared content type decides which.

use crate::classifier::DIRECT_JSON_URL_SUFFIX;
use crate::locator::LocatorNormalizer;
use crate::types::{
    ContentFetcher, ConventionExtractor, ExtractionError, PartialMetadata, ResolutionContext,
    Standard, TokenConfig,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct DirectJsonExtractor {
    fetcher: Arc<dyn ContentFetcher>,
    normalizer: LocatorNormalizer,
}

impl DirectJsonExtractor {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, normalizer: LocatorNormalizer) -> Self {
        Self {
            fetcher,
            normalizer,
        }
    }

    /// Fetch the token url and interpret it
    ///
    /// # Errors
    /// - `MissingRequiredField` when the url is absent
    /// - `UnresolvableUrl` when the url is neither `ipfs://` nor `https://`
    /// - `Transport` when the fetch fails
    pub async fn fetch(&self, config: &TokenConfig) -> Result<PartialMetadata, ExtractionError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ExtractionError::MissingRequiredField("url"))?;
        let target = url.strip_suffix(DIRECT_JSON_URL_SUFFIX).unwrap_or(url);

        let locator = self
            .normalizer
            .normalize(target)
            .ok_or_else(|| ExtractionError::UnresolvableUrl(url.to_string()))?;

        let content = self.fetcher.get(&locator.url).await?;
        if !content.is_json() {
            debug!(
                url = %locator.url,
                content_type = ?content.content_type,
                "Url points directly at media"
            );
            return Ok(PartialMetadata {
                image: Some(locator),
                animation: None,
                document: None,
            });
        }

        match content.parse_json() {
            Ok(document) => Ok(PartialMetadata::from_document(document, &self.normalizer)),
            Err(e) => {
                warn!(url = %locator.url, error = %e, "Direct metadata document omitted");
                Ok(PartialMetadata::default())
            }
        }
    }
}

#[async_trait]
impl ConventionExtractor for DirectJsonExtractor {
    fn standard(&self) -> Standard {
        Standard::DirectJson
    }

    async fn extract(
        &self,
        ctx: &ResolutionContext,
    ) -> Result<Option<PartialMetadata>, ExtractionError> {
        self.fetch(&ctx.config).await.map(Some)
    }
}
