//! Label selector codec.
//!
//! On the wire a selector is `key=value` pairs joined with commas and escaped
//! as a single query value: `{"name": "web", "tier": "fe"}` becomes
//! `name%3Dweb%2Ctier%3Dfe`. Decoding is best-effort: fragments that are not
//! exactly `key=value` are reported and skipped.

use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::diagnostics::Diagnostics;

/// Label filter, key to required value.
pub type Selector = BTreeMap<String, String>;

/// Encode `selector` as an escaped query value. Empty selectors encode to "".
///
/// Pair order is an artifact of the map type; servers treat the pairs as a
/// set and callers should do the same.
pub fn encode_selector(selector: &Selector) -> String {
    let joined = selector
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(",");
    form_urlencoded::byte_serialize(joined.as_bytes()).collect()
}

/// Decode an unescaped `key=value,key=value` string.
pub fn decode_selector(selector: &str, diagnostics: &dyn Diagnostics) -> Selector {
    let mut result = Selector::new();
    if selector.is_empty() {
        return result;
    }
    for part in selector.split(',') {
        let pieces: Vec<&str> = part.split('=').collect();
        match pieces.as_slice() {
            [key, value] => {
                result.insert((*key).to_string(), (*value).to_string());
            }
            _ => diagnostics.report(&format!("invalid selector fragment {part:?} in {selector:?}")),
        }
    }
    result
}
