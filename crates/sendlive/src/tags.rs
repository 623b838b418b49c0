//! Tag normalization for vendor resources.
//!
//! Every resource created by this crate carries the provenance tag
//! [`CREATED_BY_KEY`] = [`CREATED_BY_VALUE`]. Vendors disagree on what a
//! legal tag key looks like, so the helpers here rewrite keys into the
//! shape each vendor expects.

use std::collections::BTreeMap;

/// Key/value tags attached to vendor resources.
pub type Tags = BTreeMap<String, String>;

/// Key of the provenance tag.
pub const CREATED_BY_KEY: &str = "Created By";

/// Value of the provenance tag.
pub const CREATED_BY_VALUE: &str = "sendlive";

/// Returns the provenance tag on its own.
pub fn default_tags() -> Tags {
    Tags::from([(CREATED_BY_KEY.to_string(), CREATED_BY_VALUE.to_string())])
}

/// Merges caller tags with the provenance tag.
///
/// On a key collision the provenance value wins.
pub fn normalize(tags: Option<&Tags>) -> Tags {
    let mut merged = tags.cloned().unwrap_or_default();
    merged.extend(default_tags());
    merged
}

/// Replaces spaces in every key with hyphens.
pub fn normalize_keys(tags: &Tags) -> Tags {
    tags.iter()
        .map(|(key, value)| (hyphenate(key), value.clone()))
        .collect()
}

/// Hyphenates and lower-cases every key.
///
/// GCP labels reject spaces and upper-case characters in keys.
pub fn normalize_keys_lowercase(tags: &Tags) -> Tags {
    tags.iter()
        .map(|(key, value)| (hyphenate(key).to_lowercase(), value.clone()))
        .collect()
}

/// Converts tags into key/value pairs, provenance tag included.
pub fn to_pairs(tags: Option<&Tags>) -> Vec<(String, String)> {
    normalize(tags).into_iter().collect()
}

/// Provenance label key as it appears on GCP resources.
pub fn created_by_label_key() -> String {
    hyphenate(CREATED_BY_KEY).to_lowercase()
}

fn hyphenate(key: &str) -> String {
    key.replace(' ', "-")
}
