//! History Extractor (ARC-69)
//!
//! Metadata lives in the note field of the token's configuration
//! transactions. The most recent note that parses as JSON and declares
//! `"standard": "arc69"` wins. Everything else in the log is noise and is
//! skipped silently.

use crate::locator::LocatorNormalizer;
use crate::types::{
    ConventionExtractor, ExtractionError, PartialMetadata, ResolutionContext, Standard,
    TransactionLogReader,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Value of the `standard` field a note must declare
pub const HISTORY_STANDARD: &str = "arc69";

/// Decode a base64 note and return it if it is a history-convention document
///
/// Bytes outside printable ASCII are dropped before parsing.
pub fn parse_history_note(note_base64: &str) -> Option<Value> {
    let bytes = BASE64.decode(note_base64.trim()).ok()?;
    let printable: String = bytes
        .iter()
        .filter(|b| (0x20..=0x7e).contains(*b))
        .map(|&b| b as char)
        .collect();

    let document: Value = serde_json::from_str(printable.trim()).ok()?;
    let declared = document.get("standard").and_then(Value::as_str);
    (declared == Some(HISTORY_STANDARD)).then_some(document)
}

/// Typed view over a history-convention note
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arc69Note {
    pub standard: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Arc69Attribute>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc69Attribute {
    pub trait_type: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
}

impl Arc69Note {
    /// Typed view of a verbatim note; `None` when field shapes don't fit
    pub fn from_document(document: &Value) -> Option<Self> {
        serde_json::from_value(document.clone()).ok()
    }
}

pub struct HistoryExtractor {
    log: Arc<dyn TransactionLogReader>,
    normalizer: LocatorNormalizer,
}

impl HistoryExtractor {
    pub fn new(log: Arc<dyn TransactionLogReader>, normalizer: LocatorNormalizer) -> Self {
        Self { log, normalizer }
    }
}

#[async_trait]
impl ConventionExtractor for HistoryExtractor {
    fn standard(&self) -> Standard {
        Standard::HistoryDerived
    }

    async fn extract(
        &self,
        ctx: &ResolutionContext,
    ) -> Result<Option<PartialMetadata>, ExtractionError> {
        let mut transactions = self
            .log
            .config_transactions(ctx.asset_id, ctx.network)
            .await;

        // Most recent first; stable so same-time entries keep log order
        transactions.sort_by(|a, b| b.round_time.cmp(&a.round_time));

        let scanned = transactions.len();
        let Some(document) = transactions
            .iter()
            .filter_map(|tx| tx.note.as_deref())
            .find_map(parse_history_note)
        else {
            debug!(asset_id = ctx.asset_id, scanned, "No history-convention note found");
            return Ok(None);
        };

        let media_url = Arc69Note::from_document(&document).and_then(|note| note.media_url);
        let image = ctx
            .config
            .url
            .as_deref()
            .and_then(|url| self.normalizer.normalize(url))
            .or_else(|| media_url.as_deref().and_then(|url| self.normalizer.normalize(url)));

        debug!(asset_id = ctx.asset_id, scanned, "History-convention note found");
        Ok(Some(PartialMetadata {
            image,
            animation: None,
            document: Some(document),
        }))
    }
}
