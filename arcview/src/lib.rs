//! arcview library interface
//!
//! Resolves NFT metadata for Algorand Standard Assets across the ARC-19,
//! ARC-3, ARC-69 and custom conventions.

pub mod address;
pub mod classifier;
pub mod clients;
pub mod extractors;
pub mod locator;
pub mod merger;
pub mod presentation;
pub mod resolver;
pub mod template_resolver;
pub mod types;
pub mod viewer;

pub use crate::locator::LocatorNormalizer;
pub use crate::resolver::MetadataResolver;
pub use crate::types::{
    ContentLocator, ExtractionError, LedgerError, PartialMetadata, ResolutionContext,
    ResolutionError, ResolvedMetadata, Standard, TokenConfig,
};
pub use crate::viewer::{MediaFile, NftAsset, NftViewer};
