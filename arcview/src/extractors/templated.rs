//! Templated Extractor (ARC-19)
//!
//! Rebuilds the metadata url from the url template and the reserve address,
//! fetches the JSON document and reads its media fields.

use crate::template_resolver::TemplateResolver;
use crate::types::{
    ContentFetcher, ConventionExtractor, ExtractionError, PartialMetadata, ResolutionContext,
    Standard, TokenConfig,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct TemplatedExtractor {
    fetcher: Arc<dyn ContentFetcher>,
    resolver: TemplateResolver,
}

impl TemplatedExtractor {
    pub fn new(fetcher: Arc<dyn ContentFetcher>, resolver: TemplateResolver) -> Self {
        Self { fetcher, resolver }
    }

    /// Resolve and fetch the templated document
    ///
    /// # Errors
    /// - `MissingRequiredField` when url or reserve is absent
    /// - `InvalidReserveAddress` from the template resolver
    /// - `Transport` when the document cannot be fetched
    pub async fn fetch(&self, config: &TokenConfig) -> Result<PartialMetadata, ExtractionError> {
        let url = config
            .url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or(ExtractionError::MissingRequiredField("url"))?;
        let reserve = config
            .reserve
            .as_deref()
            .filter(|r| !r.is_empty())
            .ok_or(ExtractionError::MissingRequiredField("reserve"))?;

        let metadata_url = self.resolver.resolve(url, reserve)?;
        debug!(template = %url, url = %metadata_url, "Fetching templated metadata");

        let content = self.fetcher.get(&metadata_url).await?;
        match content.parse_json() {
            Ok(document) => Ok(PartialMetadata::from_document(
                document,
                self.resolver.normalizer(),
            )),
            Err(e) => {
                warn!(url = %metadata_url, error = %e, "Templated metadata document omitted");
                Ok(PartialMetadata::default())
            }
        }
    }
}

#[async_trait]
impl ConventionExtractor for TemplatedExtractor {
    fn standard(&self) -> Standard {
        Standard::Templated
    }

    async fn extract(
        &self,
        ctx: &ResolutionContext,
    ) -> Result<Option<PartialMetadata>, ExtractionError> {
        self.fetch(&ctx.config).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::mock::MockFetcher;
    use crate::types::LocatorScheme;
    use serde_json::json;

    const SEQUENTIAL_ADDRESS: &str = "AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQTCQKRMFYYDENBWHA5DYP7MUPJQE";
    const RAW_CID: &str = "bafkreiaaaebagbafaydqqcikbmga2dqpcaireeyuculbogazdinryhi6d4";

    fn templated_config() -> TokenConfig {
        TokenConfig {
            url: Some("template-ipfs://{ipfscid:1:raw:reserve:sha2-256}".to_string()),
            reserve: Some(SEQUENTIAL_ADDRESS.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_fetches_reconstructed_document() {
        let fetcher = MockFetcher::new().json(
            &format!("https://ipfs.io/ipfs/{}", RAW_CID),
            json!({"image": "ipfs://IMG", "animation_url": "ipfs://ANIM", "name": "Bird"}),
        );
        let extractor = TemplatedExtractor::new(Arc::new(fetcher), TemplateResolver::default());

        let partial = extractor.fetch(&templated_config()).await.unwrap();
        let image = partial.image.unwrap();
        assert_eq!(image.url, "https://ipfs.io/ipfs/IMG");
        assert_eq!(image.scheme, LocatorScheme::ContentAddressed);
        assert_eq!(partial.animation.unwrap().url, "https://ipfs.io/ipfs/ANIM");
        assert_eq!(partial.document.unwrap()["name"], json!("Bird"));
    }

    #[tokio::test]
    async fn test_missing_reserve_is_fatal() {
        let extractor =
            TemplatedExtractor::new(Arc::new(MockFetcher::new()), TemplateResolver::default());
        let config = TokenConfig {
            reserve: None,
            ..templated_config()
        };

        assert_eq!(
            extractor.fetch(&config).await,
            Err(ExtractionError::MissingRequiredField("reserve"))
        );
    }

    #[tokio::test]
    async fn test_invalid_reserve_is_fatal() {
        let fetcher = Arc::new(MockFetcher::new());
        let extractor = TemplatedExtractor::new(fetcher.clone(), TemplateResolver::default());
        let config = TokenConfig {
            reserve: Some("BROKEN".to_string()),
            ..templated_config()
        };

        assert!(matches!(
            extractor.fetch(&config).await,
            Err(ExtractionError::InvalidReserveAddress(_))
        ));
        assert_eq!(fetcher.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_document_is_omitted() {
        let fetcher = MockFetcher::new().content(
            &format!("https://ipfs.io/ipfs/{}", RAW_CID),
            "application/json",
            b"{not json",
        );
        let extractor = TemplatedExtractor::new(Arc::new(fetcher), TemplateResolver::default());

        let partial = extractor.fetch(&templated_config()).await.unwrap();
        assert!(partial.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal() {
        let extractor =
            TemplatedExtractor::new(Arc::new(MockFetcher::new()), TemplateResolver::default());
        assert!(matches!(
            extractor.fetch(&templated_config()).await,
            Err(ExtractionError::Transport(_))
        ));
    }
}
