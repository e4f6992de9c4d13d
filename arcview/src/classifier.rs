//! Standard Classifier
//!
//! Decides from the token configuration which conventions are candidates.
//! Classification is non-exclusive and total: an empty match becomes
//! `{Opaque}`. History-derived membership is decided later, once the
//! transaction log has been searched (see [`with_history`]).

use crate::types::{Standard, TokenConfig};
use std::collections::BTreeSet;

/// Url prefix of the templated-identifier convention
pub const TEMPLATED_URL_PREFIX: &str = "template-ipfs://{ipfscid";

/// Literal that must also appear in a templated url
pub const TEMPLATED_FIELD_MARKER: &str = "reserve";

/// Reserved token name of the direct-JSON convention
pub const DIRECT_JSON_NAME: &str = "arc3";

/// Reserved token name suffix of the direct-JSON convention
pub const DIRECT_JSON_NAME_SUFFIX: &str = "@arc3";

/// Reserved url suffix of the direct-JSON convention
pub const DIRECT_JSON_URL_SUFFIX: &str = "#arc3";

/// Both the template prefix and the reserve marker are required
pub fn is_templated(config: &TokenConfig) -> bool {
    let url = config.url_str();
    url.starts_with(TEMPLATED_URL_PREFIX) && url.contains(TEMPLATED_FIELD_MARKER)
}

/// Name and url signals are independent; either one is enough
pub fn is_direct_json(config: &TokenConfig) -> bool {
    let name = config.name_str();
    let by_name = name == DIRECT_JSON_NAME || name.ends_with(DIRECT_JSON_NAME_SUFFIX);
    let by_url = config.url_str().ends_with(DIRECT_JSON_URL_SUFFIX);
    by_name || by_url
}

/// Config-level classification
pub fn classify(config: &TokenConfig) -> BTreeSet<Standard> {
    let mut standards = BTreeSet::new();

    if is_templated(config) {
        standards.insert(Standard::Templated);
    }
    if is_direct_json(config) {
        standards.insert(Standard::DirectJson);
    }

    if standards.is_empty() {
        standards.insert(Standard::Opaque);
    }
    standards
}

/// Final classification once the transaction log has been searched
///
/// A history match joins the set and displaces the `Opaque` catch-all.
pub fn with_history(mut standards: BTreeSet<Standard>, history_found: bool) -> BTreeSet<Standard> {
    if history_found {
        standards.insert(Standard::HistoryDerived);
        standards.remove(&Standard::Opaque);
    }
    standards
}
