//! Metadata Resolver
//!
//! Ties the pipeline together for one token:
//! 1. Classify the configuration record
//! 2. Run the extractors for that classification, plus History, concurrently
//! 3. Fold the History outcome into the classification
//! 4. Merge by precedence

use crate::classifier::{classify, with_history};
use crate::extractors::{
    DirectJsonExtractor, HistoryExtractor, OpaqueExtractor, ParallelExtractor, TemplatedExtractor,
};
use crate::locator::LocatorNormalizer;
use crate::merger::merge;
use crate::template_resolver::TemplateResolver;
use crate::types::{
    ContentFetcher, ConventionExtractor, ExtractionOutcome, ResolutionContext, ResolutionError,
    ResolvedMetadata, Standard, TransactionLogReader,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub struct MetadataResolver {
    templated: Arc<dyn ConventionExtractor>,
    direct: Arc<dyn ConventionExtractor>,
    history: Arc<dyn ConventionExtractor>,
    opaque: Arc<dyn ConventionExtractor>,
    deadline: Option<Duration>,
}

impl MetadataResolver {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        log: Arc<dyn TransactionLogReader>,
        normalizer: LocatorNormalizer,
    ) -> Self {
        let resolver = TemplateResolver::new(normalizer.clone());
        let opaque = OpaqueExtractor::new(
            TemplatedExtractor::new(Arc::clone(&fetcher), resolver.clone()),
            DirectJsonExtractor::new(Arc::clone(&fetcher), normalizer.clone()),
            normalizer.clone(),
        );

        Self {
            templated: Arc::new(TemplatedExtractor::new(Arc::clone(&fetcher), resolver)),
            direct: Arc::new(DirectJsonExtractor::new(fetcher, normalizer.clone())),
            history: Arc::new(HistoryExtractor::new(log, normalizer)),
            opaque: Arc::new(opaque),
            deadline: None,
        }
    }

    /// Per-extractor deadline; expiry counts as "not applicable"
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    fn extractor_for(&self, standard: Standard) -> Arc<dyn ConventionExtractor> {
        match standard {
            Standard::Templated => Arc::clone(&self.templated),
            Standard::DirectJson => Arc::clone(&self.direct),
            Standard::HistoryDerived => Arc::clone(&self.history),
            Standard::Opaque => Arc::clone(&self.opaque),
        }
    }

    pub async fn resolve(
        &self,
        ctx: &ResolutionContext,
    ) -> Result<ResolvedMetadata, ResolutionError> {
        self.resolve_with_cancellation(ctx, &CancellationToken::new())
            .await
    }

    /// Resolve, abandoning in-flight extractors once `cancel` fires
    ///
    /// # Errors
    /// `ResolutionFailed` when every applicable standard failed.
    pub async fn resolve_with_cancellation(
        &self,
        ctx: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Result<ResolvedMetadata, ResolutionError> {
        let candidates = classify(&ctx.config);
        debug!(
            asset_id = ctx.asset_id,
            candidates = ?candidates,
            "Classified token configuration"
        );

        // History is always attempted; its own success decides membership
        let mut extractors: Vec<_> = candidates
            .iter()
            .filter(|s| **s != Standard::HistoryDerived)
            .map(|s| self.extractor_for(*s))
            .collect();
        extractors.push(Arc::clone(&self.history));

        let outputs = ParallelExtractor::new(extractors)
            .with_deadline(self.deadline)
            .extract_all(ctx, cancel)
            .await;

        let history_found = outputs.iter().any(|o| {
            o.standard == Standard::HistoryDerived
                && matches!(o.outcome, ExtractionOutcome::Resolved(_))
        });
        let standards = with_history(candidates, history_found);

        let metadata = merge(&standards, &outputs)?;
        info!(
            asset_id = ctx.asset_id,
            standards = ?metadata.standards,
            "Resolved token metadata"
        );
        Ok(metadata)
    }
}
