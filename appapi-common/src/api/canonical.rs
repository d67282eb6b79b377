//! Canonical request serialization for `HmacV1`
//!
//! The signed byte sequence is
//!
//! ```text
//! UPPERCASE_METHOD || request-target || header-json
//! ```
//!
//! where `request-target` is the path (already percent-encoded, as sent on
//! the wire) plus `?query` when a query is present, and `header-json` is the
//! ordered header set as compact JSON. Signer and verifier must agree
//! byte-for-byte, so everything here is deterministic.

use xxhash_rust::xxh64::xxh64;

/// xxHash64 of zero bytes, as 16 hex chars
pub const EMPTY_CONTENT_HASH: &str = "ef46db3751d8e999";

/// Methods that never carry a meaningful body
pub fn is_safe_read(method: &str) -> bool {
    method.eq_ignore_ascii_case("GET") || method.eq_ignore_ascii_case("HEAD")
}

/// Content hash of a request body
///
/// xxHash64 with seed 0, lowercase hex, zero-padded to 16 chars. Safe reads
/// hash zero bytes regardless of body.
///
/// # Examples
///
/// ```
/// use appapi_common::api::canonical::{content_hash, EMPTY_CONTENT_HASH};
///
/// assert_eq!(content_hash("POST", b""), EMPTY_CONTENT_HASH);
/// assert_eq!(content_hash("GET", b"ignored"), EMPTY_CONTENT_HASH);
/// assert_eq!(content_hash("POST", b"{}").len(), 16);
/// ```
pub fn content_hash(method: &str, body: &[u8]) -> String {
    let data: &[u8] = if is_safe_read(method) { &[] } else { body };
    format!("{:016x}", xxh64(data, 0))
}

/// Path plus `?query` when the query is non-empty
pub fn request_target(path: &str, query: Option<&str>) -> String {
    match query {
        Some(query) if !query.is_empty() => format!("{}?{}", path, query),
        _ => path.to_string(),
    }
}

/// Serialize ordered header pairs as compact JSON
///
/// Key order is the slice order. Strings are escaped the way the reference
/// emitters escape them: `"` `\` and control characters, plus every
/// non-ASCII char as `\uXXXX` (UTF-16 units). `/` is left alone.
///
/// # Examples
///
/// ```
/// use appapi_common::api::canonical::to_canonical_header_json;
///
/// let json = to_canonical_header_json(&[("EX-APP-ID", "to_gif"), ("AE-SIGN-TIME", "1")]);
/// assert_eq!(json, r#"{"EX-APP-ID":"to_gif","AE-SIGN-TIME":"1"}"#);
/// ```
pub fn to_canonical_header_json(pairs: &[(&str, &str)]) -> String {
    let items: Vec<String> = pairs
        .iter()
        .map(|(key, value)| format!("{}:{}", json_string(key), json_string(value)))
        .collect();
    format!("{{{}}}", items.join(","))
}

/// Bytes covered by the `HmacV1` signature
pub fn canonical_request(method: &str, target: &str, header_json: &str) -> Vec<u8> {
    let upper = method.to_ascii_uppercase();
    let mut bytes = Vec::with_capacity(upper.len() + target.len() + header_json.len());
    bytes.extend_from_slice(upper.as_bytes());
    bytes.extend_from_slice(target.as_bytes());
    bytes.extend_from_slice(header_json.as_bytes());
    bytes
}

fn json_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 || !c.is_ascii() => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    out.push_str(&format!("\\u{:04x}", unit));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
