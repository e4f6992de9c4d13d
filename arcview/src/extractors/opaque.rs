//! Opaque Extractor (custom tokens)
//!
//! No convention signal matched, so both url-based conventions are tried
//! speculatively. Their failures are logged and discarded. Templated comes
//! first: its locators and document keys win over DirectJSON's.

use super::{DirectJsonExtractor, TemplatedExtractor};
use crate::locator::LocatorNormalizer;
use crate::types::{
    ConventionExtractor, ExtractionError, PartialMetadata, ResolutionContext, Standard,
};
use async_trait::async_trait;
use tracing::warn;

pub struct OpaqueExtractor {
    templated: TemplatedExtractor,
    direct: DirectJsonExtractor,
    normalizer: LocatorNormalizer,
}

impl OpaqueExtractor {
    pub fn new(
        templated: TemplatedExtractor,
        direct: DirectJsonExtractor,
        normalizer: LocatorNormalizer,
    ) -> Self {
        Self {
            templated,
            direct,
            normalizer,
        }
    }
}

#[async_trait]
impl ConventionExtractor for OpaqueExtractor {
    fn standard(&self) -> Standard {
        Standard::Opaque
    }

    async fn extract(
        &self,
        ctx: &ResolutionContext,
    ) -> Result<Option<PartialMetadata>, ExtractionError> {
        let (templated, direct) = tokio::join!(
            self.templated.fetch(&ctx.config),
            self.direct.fetch(&ctx.config)
        );

        let attempts = [(Standard::Templated, templated), (Standard::DirectJson, direct)];
        let mut merged = attempts.into_iter().fold(
            PartialMetadata::default(),
            |mut acc, (standard, attempt)| {
                match attempt {
                    Ok(partial) => acc.absorb(partial),
                    Err(e) => warn!(
                        asset_id = ctx.asset_id,
                        attempt = %standard,
                        error = %e,
                        "Speculative attempt failed"
                    ),
                }
                acc
            },
        );

        if merged.image.is_none() {
            merged.image = ctx
                .config
                .url
                .as_deref()
                .and_then(|url| self.normalizer.normalize(url));
        }

        if merged.is_empty() {
            warn!(asset_id = ctx.asset_id, "Nothing resolvable for custom token");
        }
        Ok(Some(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::mock::{LogCapture, MockFetcher};
    use crate::template_resolver::TemplateResolver;
    use crate::types::TokenConfig;
    use arcview_common::Network;
    use serde_json::json;
    use std::sync::Arc;

    fn extractor(fetcher: MockFetcher) -> OpaqueExtractor {
        let fetcher = Arc::new(fetcher);
        let normalizer = LocatorNormalizer::default();
        OpaqueExtractor::new(
            TemplatedExtractor::new(fetcher.clone(), TemplateResolver::new(normalizer.clone())),
            DirectJsonExtractor::new(fetcher, normalizer.clone()),
            normalizer,
        )
    }

    fn ctx(url: Option<&str>) -> ResolutionContext {
        ResolutionContext::new(
            7,
            Network::MainNet,
            TokenConfig {
                url: url.map(str::to_string),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_templated_attempt_wins_over_direct() {
        // Served as text/plain: the templated attempt parses it as a document
        // while the direct attempt treats the url itself as the image
        let fetcher = MockFetcher::new().content(
            "https://ipfs.io/ipfs/DOC",
            "text/plain",
            br#"{"image": "https://x/doc.png", "name": "custom"}"#,
        );
        let mut ctx = ctx(Some("ipfs://DOC"));
        ctx.config.reserve =
            Some("AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQTCQKRMFYYDENBWHA5DYP7MUPJQE".to_string());

        let partial = extractor(fetcher).extract(&ctx).await.unwrap().unwrap();
        assert_eq!(partial.image.unwrap().url, "https://x/doc.png");
        assert_eq!(partial.document.unwrap()["name"], json!("custom"));
    }

    #[tokio::test]
    async fn test_failed_attempts_logged_as_warnings() {
        let capture = LogCapture::new();
        let _guard = capture.install();

        extractor(MockFetcher::new())
            .extract(&ctx(Some("https://x/missing.json")))
            .await
            .unwrap();

        assert_eq!(
            capture.count_at(tracing::Level::WARN, "Speculative attempt failed"),
            2
        );
    }

    #[tokio::test]
    async fn test_direct_attempt_succeeds_when_templated_fails() {
        let fetcher = MockFetcher::new().json(
            "https://x/custom.json",
            json!({"image": "ipfs://IMG", "animation_url": "https://x/a.mp4"}),
        );

        let partial = extractor(fetcher)
            .extract(&ctx(Some("https://x/custom.json")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(partial.image.unwrap().url, "https://ipfs.io/ipfs/IMG");
        assert_eq!(partial.animation.unwrap().url, "https://x/a.mp4");
        assert!(partial.document.is_some());
    }

    #[tokio::test]
    async fn test_falls_back_to_token_url_as_image() {
        let partial = extractor(MockFetcher::new())
            .extract(&ctx(Some("ipfs://IMG")))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(partial.image.unwrap().url, "https://ipfs.io/ipfs/IMG");
        assert_eq!(partial.document, None);
    }

    #[tokio::test]
    async fn test_never_fails() {
        let partial = extractor(MockFetcher::new())
            .extract(&ctx(None))
            .await
            .unwrap()
            .unwrap();
        assert!(partial.is_empty());
    }
}
