//! Template Resolver
//!
//! Reconstructs a content-addressed locator from a templated url and the
//! token's reserve address, e.g.
//!
//! ```text
//! template-ipfs://{ipfscid:1:raw:reserve:sha2-256}/metadata.json
//!   → ipfs://<CIDv1 over the reserve key>/metadata.json
//!   → {gateway}<CIDv1>/metadata.json
//! ```
//!
//! The reserve's 32 public-key bytes are taken as an already computed
//! sha2-256 digest; nothing is hashed.
//!
//! Unsupported template parameters degrade to echoing the input url. An
//! invalid reserve address is the only error.

use crate::address::decode_address;
use crate::classifier::DIRECT_JSON_URL_SUFFIX;
use crate::locator::LocatorNormalizer;
use crate::types::ExtractionError;
use cid::multihash::Multihash;
use cid::{Cid, Version};
use thiserror::Error;
use tracing::{debug, warn};

/// Scheme of templated urls
pub const TEMPLATE_SCHEME: &str = "template-ipfs";

/// Opening token of the parameterized identifier segment
pub const TEMPLATE_ID_OPEN: &str = "{ipfscid:";

/// Only supported source field
pub const RESERVE_FIELD: &str = "reserve";

/// Only supported hash function, and its multihash code
pub const SHA2_256: &str = "sha2-256";
pub const SHA2_256_CODE: u64 = 0x12;

const SCHEME_DELIMITER: &str = "://";
const IPFS_SCHEME_NAME: &str = "ipfs";

/// Multicodec code for a template codec name
pub fn codec_code(name: &str) -> Option<u64> {
    match name {
        "raw" => Some(0x55),
        "dag-pb" => Some(0x70),
        _ => None,
    }
}

/// Reasons a template cannot be resolved. Logged, never propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateIssue {
    #[error("unsupported identifier format: {0}")]
    UnsupportedIdentifierFormat(String),

    #[error("unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("unsupported field: {0}")]
    UnsupportedField(String),

    #[error("unsupported hash function: {0}")]
    UnsupportedHashFunction(String),
}

/// Parsed `{ipfscid:<version>:<codec>:<field>:<hash>}` segment
#[derive(Debug, Clone, PartialEq, Eq)]
struct TemplateIdentifier<'a> {
    version: u64,
    codec: u64,
    /// Path that followed the identifier segment, without the leading `/`
    path: Option<&'a str>,
}

/// Parse the part of a templated url after `template-ipfs://`
fn parse_identifier(rest: &str) -> Result<TemplateIdentifier<'_>, TemplateIssue> {
    let (segment, tail) = rest
        .split_once('}')
        .ok_or_else(|| TemplateIssue::UnsupportedIdentifierFormat(rest.to_string()))?;

    let components: Vec<&str> = segment.trim_start_matches('{').split(':').collect();
    let [_, version, codec, field, hash] = components.as_slice() else {
        return Err(TemplateIssue::UnsupportedIdentifierFormat(segment.to_string()));
    };

    let version: u64 = version
        .parse()
        .map_err(|_| TemplateIssue::UnsupportedIdentifierFormat(format!("version {}", version)))?;
    let codec = codec_code(codec).ok_or_else(|| TemplateIssue::UnsupportedCodec(codec.to_string()))?;
    if *field != RESERVE_FIELD {
        return Err(TemplateIssue::UnsupportedField(field.to_string()));
    }
    if *hash != SHA2_256 {
        return Err(TemplateIssue::UnsupportedHashFunction(hash.to_string()));
    }

    let path = match tail {
        "" => None,
        _ => match tail.strip_prefix('/') {
            Some("") => None,
            Some(path) => Some(path),
            None => return Err(TemplateIssue::UnsupportedIdentifierFormat(tail.to_string())),
        },
    };

    Ok(TemplateIdentifier {
        version,
        codec,
        path,
    })
}

/// Build a content identifier whose digest is the reserve public key
fn build_cid(identifier: &TemplateIdentifier<'_>, digest: &[u8]) -> Result<Cid, TemplateIssue> {
    let version = Version::try_from(identifier.version).map_err(|e| {
        TemplateIssue::UnsupportedIdentifierFormat(format!("version {}: {}", identifier.version, e))
    })?;
    let multihash = Multihash::<64>::wrap(SHA2_256_CODE, digest)
        .map_err(|e| TemplateIssue::UnsupportedIdentifierFormat(format!("digest: {}", e)))?;

    Cid::new(version, identifier.codec, multihash).map_err(|e| {
        TemplateIssue::UnsupportedIdentifierFormat(format!(
            "version {} with codec 0x{:x}: {}",
            identifier.version, identifier.codec, e
        ))
    })
}

/// Resolves templated, `ipfs://` and `https://` urls into fetchable urls
#[derive(Debug, Clone, Default)]
pub struct TemplateResolver {
    normalizer: LocatorNormalizer,
}

impl TemplateResolver {
    pub fn new(normalizer: LocatorNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn normalizer(&self) -> &LocatorNormalizer {
        &self.normalizer
    }

    /// Resolve `url` against `reserve`
    ///
    /// # Errors
    /// `InvalidReserveAddress` when a supported template meets a reserve that
    /// is not a valid address.
    pub fn resolve(&self, url: &str, reserve: &str) -> Result<String, ExtractionError> {
        let stripped = url.strip_suffix(DIRECT_JSON_URL_SUFFIX).unwrap_or(url);

        let Some((scheme, rest)) = stripped.split_once(SCHEME_DELIMITER) else {
            return Ok(stripped.to_string());
        };

        if scheme == TEMPLATE_SCHEME && rest.starts_with(TEMPLATE_ID_OPEN) {
            let identifier = match parse_identifier(rest) {
                Ok(identifier) => identifier,
                Err(issue) => return Ok(self.degrade(url, issue)),
            };

            let digest = decode_address(reserve)?;
            let cid = match build_cid(&identifier, &digest) {
                Ok(cid) => cid,
                Err(issue) => return Ok(self.degrade(url, issue)),
            };

            let rebuilt = match identifier.path {
                Some(path) => format!("{}/{}", cid, path),
                None => cid.to_string(),
            };
            debug!(template = %url, resolved = %rebuilt, "Resolved templated identifier");
            return Ok(self.normalizer.gateway_url(&rebuilt));
        }

        // https and future schemes pass through verbatim
        if scheme == IPFS_SCHEME_NAME {
            Ok(self.normalizer.gateway_url(rest))
        } else {
            Ok(stripped.to_string())
        }
    }

    fn degrade(&self, url: &str, issue: TemplateIssue) -> String {
        warn!(url = %url, issue = %issue, "Template not resolvable, using url as-is");
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQUENTIAL_ADDRESS: &str = "AAAQEAYEAUDAOCAJBIFQYDIOB4IBCEQTCQKRMFYYDENBWHA5DYP7MUPJQE";
    const RAW_CID: &str = "bafkreiaaaebagbafaydqqcikbmga2dqpcaireeyuculbogazdinryhi6d4";
    const DAG_PB_CID: &str = "bafybeiaaaebagbafaydqqcikbmga2dqpcaireeyuculbogazdinryhi6d4";
    const DAG_PB_CID_V0: &str = "QmNLfbof5rLekrACjeuLk9JmGZD2HDBHCU4z16iYKmx5SE";

    fn resolver() -> TemplateResolver {
        TemplateResolver::default()
    }

    #[test]
    fn test_raw_codec_v1() {
        let resolved = resolver()
            .resolve("template-ipfs://{ipfscid:1:raw:reserve:sha2-256}", SEQUENTIAL_ADDRESS)
            .unwrap();
        assert_eq!(resolved, format!("https://ipfs.io/ipfs/{}", RAW_CID));
    }

    #[test]
    fn test_dag_pb_keeps_path_and_strips_marker() {
        let resolved = resolver()
            .resolve(
                "template-ipfs://{ipfscid:1:dag-pb:reserve:sha2-256}/metadata.json#arc3",
                SEQUENTIAL_ADDRESS,
            )
            .unwrap();
        assert_eq!(
            resolved,
            format!("https://ipfs.io/ipfs/{}/metadata.json", DAG_PB_CID)
        );
    }

    #[test]
    fn test_dag_pb_v0() {
        let resolved = resolver()
            .resolve("template-ipfs://{ipfscid:0:dag-pb:reserve:sha2-256}", SEQUENTIAL_ADDRESS)
            .unwrap();
        assert_eq!(resolved, format!("https://ipfs.io/ipfs/{}", DAG_PB_CID_V0));
    }

    #[test]
    fn test_v0_raw_is_unsupported() {
        let url = "template-ipfs://{ipfscid:0:raw:reserve:sha2-256}";
        assert_eq!(resolver().resolve(url, SEQUENTIAL_ADDRESS).unwrap(), url);
    }

    #[test]
    fn test_unsupported_parameters_echo_url() {
        let urls = [
            "template-ipfs://{ipfscid:1:dag-cbor:reserve:sha2-256}",
            "template-ipfs://{ipfscid:1:raw:manager:sha2-256}",
            "template-ipfs://{ipfscid:1:raw:reserve:sha3-256}",
            "template-ipfs://{ipfscid:x:raw:reserve:sha2-256}",
            "template-ipfs://{ipfscid:1:raw:reserve}",
            "template-ipfs://{ipfscid:1:raw:reserve:sha2-256",
        ];
        for url in urls {
            assert_eq!(resolver().resolve(url, SEQUENTIAL_ADDRESS).unwrap(), url, "{}", url);
        }
    }

    #[test]
    fn test_unsupported_codec_ignores_reserve() {
        let url = "template-ipfs://{ipfscid:1:dag-cbor:reserve:sha2-256}";
        assert_eq!(resolver().resolve(url, "not-an-address").unwrap(), url);
    }

    #[test]
    fn test_invalid_reserve_is_error() {
        let result = resolver().resolve(
            "template-ipfs://{ipfscid:1:raw:reserve:sha2-256}",
            "not-an-address",
        );
        assert!(matches!(result, Err(ExtractionError::InvalidReserveAddress(_))));
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let url = "template-ipfs://{ipfscid:1:raw:reserve:sha2-256}/a.json";
        let first = resolver().resolve(url, SEQUENTIAL_ADDRESS).unwrap();
        let second = resolver().resolve(url, SEQUENTIAL_ADDRESS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_other_schemes() {
        let r = TemplateResolver::new(LocatorNormalizer::new("https://gw.example/ipfs/"));
        assert_eq!(
            r.resolve("ipfs://CID1/meta.json#arc3", "").unwrap(),
            "https://gw.example/ipfs/CID1/meta.json"
        );
        assert_eq!(
            r.resolve("https://x/meta.json#arc3", "").unwrap(),
            "https://x/meta.json"
        );
        assert_eq!(r.resolve("ar://tx-id", "").unwrap(), "ar://tx-id");
        assert_eq!(r.resolve("no-scheme", "").unwrap(), "no-scheme");
        assert_eq!(
            r.resolve("template-ipfs://plain", "").unwrap(),
            "template-ipfs://plain"
        );
    }

    #[test]
    fn test_codec_table() {
        assert_eq!(codec_code("raw"), Some(0x55));
        assert_eq!(codec_code("dag-pb"), Some(0x70));
        assert_eq!(codec_code("dag-cbor"), None);
    }
}
