//! `HmacV1`: per-request HMAC-SHA256 signing
//!
//! Signed header set, in order:
//! `AE-VERSION`, `EX-APP-ID`, `EX-APP-VERSION`, `NC-USER-ID` (only when a
//! user is acting), `AE-DATA-HASH`, `AE-SIGN-TIME`.
//!
//! The body itself is not part of the HMAC input; its hash is, through
//! `AE-DATA-HASH`. Tampering with the body therefore requires a new hash
//! header, which breaks the signature.

use super::auth::{check_identity, non_empty, required, AuthError, AuthScheme};
use super::canonical::{canonical_request, content_hash, request_target, to_canonical_header_json};
use super::headers::{
    SignedHeaders, AE_DATA_HASH, AE_SIGNATURE, AE_SIGN_TIME, AE_VERSION, EX_APP_ID,
    EX_APP_VERSION, NC_USER_ID,
};
use super::secret::SharedSecret;
use super::types::{AuthenticatedRequest, InboundRequest};
use crate::config::AuthConfig;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The six signed headers
struct HeaderSet<'a> {
    protocol_version: &'a str,
    app_id: &'a str,
    app_version: &'a str,
    acting_user: Option<&'a str>,
    data_hash: &'a str,
    sign_time: &'a str,
}

impl<'a> HeaderSet<'a> {
    fn pairs(&self) -> Vec<(&'static str, &'a str)> {
        let mut pairs = Vec::with_capacity(6);
        pairs.push((AE_VERSION, self.protocol_version));
        pairs.push((EX_APP_ID, self.app_id));
        pairs.push((EX_APP_VERSION, self.app_version));
        if let Some(user) = self.acting_user {
            pairs.push((NC_USER_ID, user));
        }
        pairs.push((AE_DATA_HASH, self.data_hash));
        pairs.push((AE_SIGN_TIME, self.sign_time));
        pairs
    }

    fn canonical_request(&self, method: &str, target: &str) -> Vec<u8> {
        let json = to_canonical_header_json(&self.pairs());
        canonical_request(method, target, &json)
    }
}

fn keyed_mac(secret: &SharedSecret) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.expose().as_bytes()).expect("HMAC can take key of any size")
}

/// Hex HMAC-SHA256 of the canonical request
pub(crate) fn compute_signature(secret: &SharedSecret, canonical: &[u8]) -> String {
    let mut mac = keyed_mac(secret);
    mac.update(canonical);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a hex signature
///
/// Decodes to bytes and compares through `Mac::verify_slice`, which takes the
/// same time wherever the first differing byte sits.
fn signature_matches(secret: &SharedSecret, canonical: &[u8], signature_hex: &str) -> bool {
    let Ok(provided) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let mut mac = keyed_mac(secret);
    mac.update(canonical);
    mac.verify_slice(&provided).is_ok()
}

/// Build the full `HmacV1` header set for a request signed at `now`
pub(crate) fn sign(
    config: &AuthConfig,
    now: i64,
    method: &str,
    path: &str,
    query: Option<&str>,
    body: &[u8],
    acting_user: Option<&str>,
) -> SignedHeaders {
    let data_hash = content_hash(method, body);
    let sign_time = now.to_string();
    let set = HeaderSet {
        protocol_version: &config.protocol_version,
        app_id: &config.identity.app_id,
        app_version: &config.identity.app_version,
        acting_user,
        data_hash: &data_hash,
        sign_time: &sign_time,
    };

    let canonical = set.canonical_request(method, &request_target(path, query));
    let signature = compute_signature(&config.secret, &canonical);

    let mut headers = SignedHeaders::new();
    for (name, value) in set.pairs() {
        headers.push(name, value);
    }
    headers.push(AE_SIGNATURE, signature);
    headers
}

/// Ordered `HmacV1` checks against a verifier clock reading of `now`
pub(crate) fn verify(
    config: &AuthConfig,
    now: i64,
    request: &InboundRequest<'_>,
) -> Result<AuthenticatedRequest, AuthError> {
    // 1. Presence
    let protocol_version = required(request, AE_VERSION)?;
    let app_id = required(request, EX_APP_ID)?;
    let app_version = required(request, EX_APP_VERSION)?;
    let data_hash = required(request, AE_DATA_HASH)?;
    let sign_time_raw = required(request, AE_SIGN_TIME)?;
    let signature = required(request, AE_SIGNATURE)?;
    let acting_user = non_empty(request.header(NC_USER_ID));

    // 2. Identity
    check_identity(&config.identity, app_id, app_version)?;

    // 3. Replay window
    let sign_time: i64 =
        sign_time_raw
            .trim()
            .parse()
            .map_err(|_| AuthError::MalformedHeader {
                header: AE_SIGN_TIME,
                reason: "not an integer".to_string(),
            })?;
    if now.abs_diff(sign_time) > config.replay_window_secs {
        return Err(AuthError::StaleOrFutureTimestamp {
            timestamp: sign_time,
            now,
            window_secs: config.replay_window_secs,
        });
    }

    // 4. Signature over the received header values
    let set = HeaderSet {
        protocol_version,
        app_id,
        app_version,
        acting_user,
        data_hash,
        sign_time: sign_time_raw,
    };
    let canonical =
        set.canonical_request(request.method, &request_target(request.path, request.query));
    if !signature_matches(&config.secret, &canonical, signature) {
        return Err(AuthError::BadSignature);
    }

    // 5. Body against the signed hash
    let computed = content_hash(request.method, request.body);
    if computed != data_hash {
        return Err(AuthError::BadContentHash {
            received: data_hash.to_string(),
            computed,
        });
    }

    Ok(AuthenticatedRequest {
        app_id: app_id.to_string(),
        acting_user: acting_user.map(str::to_string),
        scheme: AuthScheme::HmacV1,
    })
}
