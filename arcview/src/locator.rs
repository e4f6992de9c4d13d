//! Content locator normalization
//!
//! `ipfs://` references become gateway URLs, `https://` passes through,
//! anything else is unresolved.

use crate::types::{ContentLocator, LocatorScheme};
use arcview_common::config::DEFAULT_IPFS_GATEWAY;
use serde_json::Value;

/// Content-addressed network scheme
pub const IPFS_SCHEME: &str = "ipfs://";

/// Direct web scheme
pub const HTTPS_SCHEME: &str = "https://";

/// Rewrites raw url strings into [`ContentLocator`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorNormalizer {
    gateway_prefix: String,
}

impl LocatorNormalizer {
    pub fn new(gateway_prefix: impl Into<String>) -> Self {
        Self {
            gateway_prefix: gateway_prefix.into(),
        }
    }

    /// Gateway URL for a content identifier (plus optional path)
    pub fn gateway_url(&self, identifier_path: &str) -> String {
        format!("{}{}", self.gateway_prefix, identifier_path)
    }

    /// Normalize a raw url, `None` when the scheme is not supported
    pub fn normalize(&self, raw: &str) -> Option<ContentLocator> {
        if let Some(rest) = raw.strip_prefix(IPFS_SCHEME) {
            Some(ContentLocator {
                url: self.gateway_url(rest),
                scheme: LocatorScheme::ContentAddressed,
            })
        } else if raw.starts_with(HTTPS_SCHEME) {
            Some(ContentLocator {
                url: raw.to_string(),
                scheme: LocatorScheme::DirectWeb,
            })
        } else {
            None
        }
    }

    /// Normalize a JSON document field; non-string values are unresolved
    pub fn normalize_field(&self, value: Option<&Value>) -> Option<ContentLocator> {
        value.and_then(Value::as_str).and_then(|raw| self.normalize(raw))
    }
}

impl Default for LocatorNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_IPFS_GATEWAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ipfs_rewritten_to_gateway() {
        let normalizer = LocatorNormalizer::default();
        let locator = normalizer.normalize("ipfs://CID1/image.png").unwrap();
        assert_eq!(locator.url, "https://ipfs.io/ipfs/CID1/image.png");
        assert_eq!(locator.scheme, LocatorScheme::ContentAddressed);
    }

    #[test]
    fn test_https_passes_through() {
        let normalizer = LocatorNormalizer::new("https://gw.example/ipfs/");
        let locator = normalizer.normalize("https://x/meta.json").unwrap();
        assert_eq!(locator.url, "https://x/meta.json");
        assert_eq!(locator.scheme, LocatorScheme::DirectWeb);
    }

    #[test]
    fn test_other_schemes_unresolved() {
        let normalizer = LocatorNormalizer::default();
        assert_eq!(normalizer.normalize("http://x/meta.json"), None);
        assert_eq!(normalizer.normalize("ar://tx"), None);
        assert_eq!(normalizer.normalize(""), None);
    }

    #[test]
    fn test_non_string_field_unresolved() {
        let normalizer = LocatorNormalizer::default();
        assert_eq!(normalizer.normalize_field(Some(&json!(42))), None);
        assert_eq!(normalizer.normalize_field(None), None);
        assert!(normalizer
            .normalize_field(Some(&json!("ipfs://CID")))
            .is_some());
    }
}
