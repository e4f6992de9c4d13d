//! Core Types and Trait Definitions for arcview
//!
//! Defines the data model shared by the resolution pipeline and the seams
//! where external collaborators plug in:
//! - **LedgerReader:** reads a token's configuration record
//! - **TransactionLogReader:** reads historical configuration transactions
//! - **ContentFetcher:** generic HTTP GET for JSON or binary content
//! - **ConventionExtractor:** one implementation per metadata convention
//!
//! # Pipeline
//! Classifier → Extractors (concurrent) → Merger

use arcview_common::Network;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

// ============================================================================
// Token configuration
// ============================================================================

/// Token configuration record as exposed by the ledger
///
/// `url`, `reserve` and `name` drive resolution. The administrative fields are
/// passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TokenConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserve: Option<String>,
    #[serde(default)]
    pub creator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clawback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_name: Option<String>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub decimals: u32,
    /// Remaining ledger fields (default-frozen, metadata-hash, *-b64, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TokenConfig {
    /// Token name, empty when unset
    pub fn name_str(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Token url, empty when unset
    pub fn url_str(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }
}

/// Everything an extractor needs for one resolution
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    pub asset_id: u64,
    pub network: Network,
    pub config: TokenConfig,
}

impl ResolutionContext {
    pub fn new(asset_id: u64, network: Network, config: TokenConfig) -> Self {
        Self {
            asset_id,
            network,
            config,
        }
    }
}

// ============================================================================
// Standards and locators
// ============================================================================

/// Metadata convention a token follows
///
/// Variant order is merge precedence (`Ord` is derived from it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Standard {
    /// ARC-19: locator reconstructed from a url template plus the reserve address
    #[serde(rename = "ARC19")]
    Templated,
    /// ARC-3: url points at a JSON document (or directly at media)
    #[serde(rename = "ARC3")]
    DirectJson,
    /// ARC-69: metadata carried in configuration-transaction notes
    #[serde(rename = "ARC69")]
    HistoryDerived,
    /// No convention matched; best-effort fallback
    #[serde(rename = "CUSTOM")]
    Opaque,
}

impl fmt::Display for Standard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Standard::Templated => write!(f, "ARC19"),
            Standard::DirectJson => write!(f, "ARC3"),
            Standard::HistoryDerived => write!(f, "ARC69"),
            Standard::Opaque => write!(f, "CUSTOM"),
        }
    }
}

/// Transport scheme a locator originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocatorScheme {
    /// `ipfs://`, rewritten to the gateway prefix
    ContentAddressed,
    /// `https://`, passed through
    DirectWeb,
}

/// A dereferenceable URL. Content-addressed references are always already
/// rewritten to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentLocator {
    pub url: String,
    pub scheme: LocatorScheme,
}

// ============================================================================
// Extraction output and merge result
// ============================================================================

/// What a single convention extractor produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialMetadata {
    pub image: Option<ContentLocator>,
    pub animation: Option<ContentLocator>,
    /// Verbatim parsed document for this convention
    pub document: Option<Value>,
}

impl PartialMetadata {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.animation.is_none() && self.document.is_none()
    }

    /// Fill gaps from `other`; values already present are kept.
    ///
    /// Documents combine key-wise when both are JSON objects, existing keys win.
    pub fn absorb(&mut self, other: PartialMetadata) {
        if self.image.is_none() {
            self.image = other.image;
        }
        if self.animation.is_none() {
            self.animation = other.animation;
        }

        self.document = match (self.document.take(), other.document) {
            (None, incoming) => incoming,
            (Some(Value::Object(mut current)), Some(Value::Object(incoming))) => {
                for (key, value) in incoming {
                    current.entry(key).or_insert(value);
                }
                Some(Value::Object(current))
            }
            (current, _) => current,
        };
    }
}

/// Merged metadata for a token
///
/// Unresolved fields are omitted from the serialized record entirely.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMetadata {
    pub standards: BTreeSet<Standard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_locator: Option<ContentLocator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation_locator: Option<ContentLocator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated_doc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_doc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_doc: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opaque_doc: Option<Value>,
}

impl ResolvedMetadata {
    /// Raw document kept for `standard`
    pub fn document(&self, standard: Standard) -> Option<&Value> {
        match standard {
            Standard::Templated => self.templated_doc.as_ref(),
            Standard::DirectJson => self.direct_doc.as_ref(),
            Standard::HistoryDerived => self.history_doc.as_ref(),
            Standard::Opaque => self.opaque_doc.as_ref(),
        }
    }

    pub(crate) fn document_slot(&mut self, standard: Standard) -> &mut Option<Value> {
        match standard {
            Standard::Templated => &mut self.templated_doc,
            Standard::DirectJson => &mut self.direct_doc,
            Standard::HistoryDerived => &mut self.history_doc,
            Standard::Opaque => &mut self.opaque_doc,
        }
    }
}

/// Result of running one extractor, as seen by the merger
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Resolved(PartialMetadata),
    /// The convention does not apply (or its deadline expired)
    NotApplicable,
    Failed(ExtractionError),
}

impl From<Result<Option<PartialMetadata>, ExtractionError>> for ExtractionOutcome {
    fn from(result: Result<Option<PartialMetadata>, ExtractionError>) -> Self {
        match result {
            Ok(Some(partial)) => ExtractionOutcome::Resolved(partial),
            Ok(None) => ExtractionOutcome::NotApplicable,
            Err(e) => ExtractionOutcome::Failed(e),
        }
    }
}

// ============================================================================
// Collaborator seams
// ============================================================================

/// Body returned by a generic GET
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedContent {
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedContent {
    pub fn new(content_type: Option<String>, body: Vec<u8>) -> Self {
        Self { content_type, body }
    }

    /// JSON content convenience constructor
    pub fn json(value: &Value) -> Self {
        Self {
            content_type: Some("application/json".to_string()),
            body: value.to_string().into_bytes(),
        }
    }

    /// True when the declared media type is `application/json`
    /// (parameters such as `charset` are ignored)
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
            .unwrap_or(false)
    }

    /// Parse the body as JSON
    pub fn parse_json(&self) -> Result<Value, ExtractionError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| ExtractionError::MalformedDocument(format!("invalid JSON body: {}", e)))
    }
}

/// Generic fetch capability used by every extractor
#[async_trait::async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedContent, ExtractionError>;
}

/// One configuration transaction from the ledger's history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigTransaction {
    /// Base64-encoded free-text note
    #[serde(default)]
    pub note: Option<String>,
    /// Ledger round time (Unix seconds)
    #[serde(rename = "round-time", default)]
    pub round_time: i64,
}

/// Reader for a token's historical configuration transactions
///
/// Fails soft: transport problems yield an empty sequence.
#[async_trait::async_trait]
pub trait TransactionLogReader: Send + Sync {
    async fn config_transactions(&self, asset_id: u64, network: Network) -> Vec<ConfigTransaction>;
}

/// Reader for a token's current configuration record
#[async_trait::async_trait]
pub trait LedgerReader: Send + Sync {
    async fn token_config(&self, asset_id: u64, network: Network)
        -> Result<TokenConfig, LedgerError>;
}

/// Convention extractor trait
///
/// `Ok(None)` means the convention does not apply to this token, which is a
/// normal outcome and not a failure.
#[async_trait::async_trait]
pub trait ConventionExtractor: Send + Sync {
    fn standard(&self) -> Standard;

    async fn extract(
        &self,
        ctx: &ResolutionContext,
    ) -> Result<Option<PartialMetadata>, ExtractionError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Extractor-local error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    /// Templated convention invoked without url or reserve
    #[error("Missing required field: {0}")]
    MissingRequiredField(&'static str),

    /// Reserve field is not a valid ledger address
    #[error("Invalid reserve address: {0}")]
    InvalidReserveAddress(String),

    /// Network call failed
    #[error("Transport failure: {0}")]
    Transport(String),

    /// JSON parse or field-shape failure
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    /// Url uses a scheme no locator can be built from
    #[error("Unresolvable url: {0}")]
    UnresolvableUrl(String),
}

/// Ledger lookup error
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Asset not found: {0}")]
    NotFound(u64),

    #[error("Ledger transport error: {0}")]
    Transport(String),

    #[error("Ledger response decode error: {0}")]
    Decode(String),
}

/// One standard's failure inside an aggregate error
#[derive(Debug, Clone, PartialEq)]
pub struct StandardFailure {
    pub standard: Standard,
    pub error: ExtractionError,
}

impl fmt::Display for StandardFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.standard, self.error)
    }
}

fn describe_failures(failures: &[StandardFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Resolution error surfaced to callers
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Every applicable standard failed
    #[error("Resolution failed: {}", describe_failures(.failures))]
    ResolutionFailed { failures: Vec<StandardFailure> },

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Downloading resolved media failed
    #[error("Media download failed: {0}")]
    Media(ExtractionError),

    #[error("Resolution cancelled")]
    Cancelled,
}

// ============================================================================
// Tests
// ============================================================================
