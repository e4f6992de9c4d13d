//! Convention Extractors
//!
//! One extractor per metadata convention, each implementing
//! [`ConventionExtractor`]:
//! 1. **templated** - ARC-19, locator rebuilt from url template + reserve
//! 2. **direct_json** - ARC-3, url points at JSON (or straight at media)
//! 3. **history** - ARC-69, metadata in configuration-transaction notes
//! 4. **opaque** - best-effort fallback combining 1 and 2
//!
//! # Parallel Execution
//! Extractors are independent and run concurrently. A failing extractor never
//! blocks the others; its error is handed to the merger as an outcome.
//! Deadline expiry and cancellation degrade to "not applicable".

pub mod direct_json;
pub mod history;
pub mod opaque;
pub mod templated;

pub use direct_json::DirectJsonExtractor;
pub use history::HistoryExtractor;
pub use opaque::OpaqueExtractor;
pub use templated::TemplatedExtractor;

use crate::locator::LocatorNormalizer;
use crate::types::{
    ConventionExtractor, ExtractionOutcome, PartialMetadata, ResolutionContext, Standard,
};
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Media fields read from every metadata document
pub const IMAGE_FIELD: &str = "image";
pub const ANIMATION_FIELD: &str = "animation_url";

impl PartialMetadata {
    /// Image/animation locators plus the document itself
    pub fn from_document(document: Value, normalizer: &LocatorNormalizer) -> Self {
        Self {
            image: normalizer.normalize_field(document.get(IMAGE_FIELD)),
            animation: normalizer.normalize_field(document.get(ANIMATION_FIELD)),
            document: Some(document),
        }
    }
}

/// Parallel extractor executor
///
/// Runs extractors concurrently and reports one outcome per extractor, in
/// input order.
pub struct ParallelExtractor {
    extractors: Vec<Arc<dyn ConventionExtractor>>,
    deadline: Option<Duration>,
}

impl ParallelExtractor {
    /// Create new parallel extractor with given extractors
    pub fn new(extractors: Vec<Arc<dyn ConventionExtractor>>) -> Self {
        Self {
            extractors,
            deadline: None,
        }
    }

    /// Bound each extractor's run time
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Run all extractors concurrently
    pub async fn extract_all(
        &self,
        ctx: &ResolutionContext,
        cancel: &CancellationToken,
    ) -> Vec<ExtractionOutput> {
        let futures = self.extractors.iter().map(|extractor| {
            let extractor = Arc::clone(extractor);
            async move {
                let standard = extractor.standard();
                let attempt = async {
                    match self.deadline {
                        Some(limit) => tokio::time::timeout(limit, extractor.extract(ctx))
                            .await
                            .ok(),
                        None => Some(extractor.extract(ctx).await),
                    }
                };

                let outcome = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        warn!(
                            asset_id = ctx.asset_id,
                            standard = %standard,
                            "Extraction cancelled, treating as not applicable"
                        );
                        ExtractionOutcome::NotApplicable
                    }
                    result = attempt => match result {
                        None => {
                            warn!(
                                asset_id = ctx.asset_id,
                                standard = %standard,
                                "Extraction deadline expired, treating as not applicable"
                            );
                            ExtractionOutcome::NotApplicable
                        }
                        Some(result) => {
                            match &result {
                                Ok(Some(_)) => debug!(asset_id = ctx.asset_id, standard = %standard, "Extraction successful"),
                                Ok(None) => debug!(asset_id = ctx.asset_id, standard = %standard, "Convention not applicable"),
                                Err(e) => warn!(
                                    asset_id = ctx.asset_id,
                                    standard = %standard,
                                    error = %e,
                                    "Extraction failed"
                                ),
                            }
                            result.into()
                        }
                    }
                };

                ExtractionOutput { standard, outcome }
            }
        });

        join_all(futures).await
    }
}

/// Outcome of one extractor, tagged with its standard
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutput {
    pub standard: Standard,
    pub outcome: ExtractionOutcome,
}

// ============================================================================
// Mocks for Testing
// ============================================================================


// ============================================================================
// Tests
// ============================================================================
