//! Presentation helpers over resolved metadata
//!
//! Lookups here read the raw per-standard documents in a fixed order that
//! differs from locator precedence: DirectJSON documents carry the richest
//! descriptive fields, so they are consulted first.

use crate::types::{ResolvedMetadata, Standard};
use crate::viewer::NftAsset;
use serde_json::{Map, Value};

/// Fallback mime type for media with no declared type
pub const DEFAULT_MIME_TYPE: &str = "image/png";

/// Document order for property and mime-type lookups
pub const LOOKUP_ORDER: [Standard; 4] = [
    Standard::DirectJson,
    Standard::Templated,
    Standard::HistoryDerived,
    Standard::Opaque,
];

/// Parameters listed first in [`display_fields`], in this order
pub const LEADING_FIELDS: [&str; 9] = [
    "id",
    "creator",
    "manager",
    "reserve",
    "freeze",
    "clawback",
    "unit-name",
    "total",
    "decimals",
];

/// History notes carry a single mime type for whatever media they describe
const HISTORY_MIME_FIELD: &str = "mime_type";
const IMAGE_MIME_FIELD: &str = "image_mimetype";
const ANIMATION_MIME_FIELD: &str = "animation_url_mimetype";

fn mime_type(metadata: &ResolvedMetadata, field: &str) -> String {
    LOOKUP_ORDER
        .iter()
        .filter_map(|standard| {
            let key = match standard {
                Standard::HistoryDerived => HISTORY_MIME_FIELD,
                _ => field,
            };
            metadata.document(*standard)?.get(key)?.as_str()
        })
        .find(|mime| !mime.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string()
}

/// Mime type of the resolved image
pub fn image_mime_type(metadata: &ResolvedMetadata) -> String {
    mime_type(metadata, IMAGE_MIME_FIELD)
}

/// Mime type of the resolved animation
pub fn animation_mime_type(metadata: &ResolvedMetadata) -> String {
    mime_type(metadata, ANIMATION_MIME_FIELD)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// First document defining `key` decides the answer
///
/// An empty value in that document means the property is absent; later
/// documents are not consulted.
pub fn property<'a>(metadata: &'a ResolvedMetadata, key: &str) -> Option<&'a Value> {
    let value = LOOKUP_ORDER
        .iter()
        .filter_map(|standard| metadata.document(*standard)?.get(key))
        .next()?;
    (!is_empty_value(value)).then_some(value)
}

/// `unit-name` → `Unit Name`
pub fn display_key(key: &str) -> String {
    key.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Token parameters plus `id` as ordered, human-readable pairs
pub fn display_fields(asset: &NftAsset) -> Vec<(String, String)> {
    let mut fields = match serde_json::to_value(&asset.params) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    fields.insert("id".to_string(), Value::from(asset.index));

    let rank = |key: &str| {
        LEADING_FIELDS
            .iter()
            .position(|leading| *leading == key)
            .unwrap_or(LEADING_FIELDS.len())
    };
    let mut entries: Vec<(String, Value)> = fields.into_iter().collect();
    entries.sort_by(|(a, _), (b, _)| rank(a).cmp(&rank(b)).then_with(|| a.cmp(b)));

    entries
        .into_iter()
        .map(|(key, value)| (display_key(&key), display_value(&value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenConfig;
    use serde_json::json;

    fn metadata() -> ResolvedMetadata {
        ResolvedMetadata {
            direct_doc: Some(json!({"description": "", "name": "direct"})),
            templated_doc: Some(json!({
                "name": "templated",
                "image_mimetype": "image/jpeg",
                "edition": 3
            })),
            history_doc: Some(json!({"standard": "arc69", "mime_type": "video/mp4"})),
            ..Default::default()
        }
    }

    #[test]
    fn test_property_lookup_order() {
        let metadata = metadata();
        assert_eq!(property(&metadata, "name"), Some(&json!("direct")));
        assert_eq!(property(&metadata, "edition"), Some(&json!(3)));
        assert_eq!(property(&metadata, "standard"), Some(&json!("arc69")));
        assert_eq!(property(&metadata, "missing"), None);
    }

    #[test]
    fn test_empty_property_is_absent() {
        assert_eq!(property(&metadata(), "description"), None);
    }

    #[test]
    fn test_mime_types() {
        let metadata = metadata();
        assert_eq!(image_mime_type(&metadata), "image/jpeg");
        assert_eq!(animation_mime_type(&metadata), "video/mp4");
        assert_eq!(image_mime_type(&ResolvedMetadata::default()), DEFAULT_MIME_TYPE);
        assert_eq!(animation_mime_type(&ResolvedMetadata::default()), DEFAULT_MIME_TYPE);
    }

    #[test]
    fn test_display_key() {
        assert_eq!(display_key("unit-name"), "Unit Name");
        assert_eq!(display_key("id"), "Id");
        assert_eq!(display_key("default-frozen"), "Default Frozen");
    }

    #[test]
    fn test_display_fields_order() {
        let mut params = TokenConfig {
            name: Some("Bird".to_string()),
            creator: "CREATOR".to_string(),
            unit_name: Some("BRD".to_string()),
            total: 1,
            decimals: 0,
            ..Default::default()
        };
        params.extra.insert("default-frozen".to_string(), json!(false));
        let asset = NftAsset {
            index: 42,
            params,
            metadata: ResolvedMetadata::default(),
        };

        let keys: Vec<String> = display_fields(&asset).into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec!["Id", "Creator", "Unit Name", "Total", "Decimals", "Default Frozen", "Name"]
        );

        let fields = display_fields(&asset);
        assert_eq!(fields[0], ("Id".to_string(), "42".to_string()));
        assert_eq!(fields[1], ("Creator".to_string(), "CREATOR".to_string()));
    }
}
