//! Metadata Merger
//!
//! Folds per-standard extraction outcomes into one [`ResolvedMetadata`].
//!
//! **Precedence:** Templated > DirectJSON > HistoryDerived > Opaque. The first
//! standard in that order to produce a locator owns the field; later ones never
//! overwrite it. Documents are never merged across standards, each one lands
//! in its own slot.

use crate::extractors::ExtractionOutput;
use crate::types::{
    ExtractionOutcome, ResolutionError, ResolvedMetadata, Standard, StandardFailure,
};
use std::collections::BTreeSet;
use tracing::debug;

/// Locator precedence, highest first
pub const PRECEDENCE: [Standard; 4] = [
    Standard::Templated,
    Standard::DirectJson,
    Standard::HistoryDerived,
    Standard::Opaque,
];

/// Merge extractor outputs for the given classification
///
/// Outputs for standards outside `standards` are ignored, which is how a
/// speculative Opaque result is discarded once History matched. Input order
/// does not matter.
///
/// # Errors
/// `ResolutionFailed` when no standard resolved and at least one failed.
pub fn merge(
    standards: &BTreeSet<Standard>,
    outputs: &[ExtractionOutput],
) -> Result<ResolvedMetadata, ResolutionError> {
    let mut merged = ResolvedMetadata {
        standards: standards.clone(),
        ..Default::default()
    };
    let mut failures = Vec::new();
    let mut resolved = 0usize;

    for standard in PRECEDENCE.iter().filter(|s| standards.contains(s)) {
        for output in outputs.iter().filter(|o| o.standard == *standard) {
            match &output.outcome {
                ExtractionOutcome::Resolved(partial) => {
                    resolved += 1;
                    if merged.image_locator.is_none() {
                        merged.image_locator = partial.image.clone();
                    }
                    if merged.animation_locator.is_none() {
                        merged.animation_locator = partial.animation.clone();
                    }
                    let slot = merged.document_slot(*standard);
                    if slot.is_none() {
                        *slot = partial.document.clone();
                    }
                }
                ExtractionOutcome::NotApplicable => {}
                ExtractionOutcome::Failed(error) => failures.push(StandardFailure {
                    standard: *standard,
                    error: error.clone(),
                }),
            }
        }
    }

    if resolved == 0 && !failures.is_empty() {
        return Err(ResolutionError::ResolutionFailed { failures });
    }

    debug!(
        resolved,
        failed = failures.len(),
        has_image = merged.image_locator.is_some(),
        has_animation = merged.animation_locator.is_some(),
        "Merged metadata"
    );
    Ok(merged)
}
