//! Request authentication between the host and an ExApp
//!
//! # Architecture
//!
//! Two protocol generations, selected by configuration:
//! - [`AuthScheme::HmacV1`]: per-request HMAC-SHA256 over method, target,
//!   an ordered header set and a body hash, bounded by a replay window
//! - [`AuthScheme::CredentialV2`]: static `user:secret` credential in one
//!   base64 header, no per-request signature
//!
//! Each scheme has its own signer/verifier module; the only shared logic is
//! the identity check in [`check_identity`].
//!
//! # Pure Functions
//!
//! Nothing in here performs I/O. Wall-clock time is read through the
//! injected [`Clock`], and the secret is read-only config, so a [`Signer`]
//! or [`Verifier`] can be shared across any number of tasks without locks.

use super::headers::SignedHeaders;
use super::types::{AuthenticatedRequest, InboundRequest};
use super::{credential_v2, hmac_v1};
use crate::config::{AuthConfig, Identity};
use crate::time::{Clock, SystemClock};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

// ========================================
// Scheme Selection
// ========================================

/// Protocol generation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AuthScheme {
    /// HMAC-SHA256 signature with body hash and sign time
    #[default]
    HmacV1,
    /// base64 `user:secret` credential header
    CredentialV2,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::HmacV1 => "hmac-v1",
            AuthScheme::CredentialV2 => "credential-v2",
        }
    }

    /// Header carrying the caller's protocol version
    pub fn protocol_version_header(&self) -> &'static str {
        match self {
            AuthScheme::HmacV1 => super::headers::AE_VERSION,
            AuthScheme::CredentialV2 => super::headers::AA_VERSION,
        }
    }

    /// Header carrying the caller's request id (unsigned, for correlation)
    pub fn request_id_header(&self) -> &'static str {
        match self {
            AuthScheme::HmacV1 => super::headers::AE_REQUEST_ID,
            AuthScheme::CredentialV2 => super::headers::AA_REQUEST_ID,
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthScheme {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hmac-v1" | "hmac" | "v1" => Ok(AuthScheme::HmacV1),
            "credential-v2" | "credential" | "v2" => Ok(AuthScheme::CredentialV2),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown auth scheme '{}'",
                other
            ))),
        }
    }
}

// ========================================
// Error Types
// ========================================

/// Why a request was rejected
///
/// Every variant maps to the same `401 Unauthorized` at the HTTP boundary.
/// The kinds exist for operator logs and tests. No variant ever carries the
/// shared secret, the decoded credential, or the expected signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// A required header is absent
    #[error("Missing required header {0}")]
    MissingHeader(&'static str),

    /// A header is present but cannot be parsed
    #[error("Malformed header {header}: {reason}")]
    MalformedHeader {
        header: &'static str,
        reason: String,
    },

    /// No ExApp registered under this id (host side)
    #[error("ExApp {0} is not registered")]
    UnknownApp(String),

    /// ExApp is registered but disabled (host side)
    #[error("ExApp {0} is disabled")]
    AppDisabled(String),

    /// `EX-APP-ID` differs from the configured app id
    #[error("Invalid EX-APP-ID: {received} <=> {expected}")]
    AppIdMismatch { received: String, expected: String },

    /// `EX-APP-VERSION` differs from the configured version
    #[error("Invalid EX-APP-VERSION: {received} <=> {expected}")]
    VersionMismatch { received: String, expected: String },

    /// Sign time outside the replay window
    #[error("Invalid AE-SIGN-TIME: {timestamp} <=> {now} (window {window_secs}s)")]
    StaleOrFutureTimestamp {
        timestamp: i64,
        now: i64,
        window_secs: u64,
    },

    /// HMAC does not match the canonical request
    #[error("Invalid AE-SIGNATURE")]
    BadSignature,

    /// Body does not hash to the signed `AE-DATA-HASH`
    #[error("Invalid AE-DATA-HASH: {received} != {computed}")]
    BadContentHash { received: String, computed: String },

    /// `AUTHORIZATION-APP-API` is not base64 of `user:secret`
    #[error("Malformed AUTHORIZATION-APP-API: {0}")]
    MalformedCredential(&'static str),

    /// Credential secret differs from the configured secret
    #[error("Invalid shared secret in AUTHORIZATION-APP-API")]
    SecretMismatch,
}

/// Coarse failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// Missing or malformed header
    ProtocolViolation,
    /// App id / version mismatch, unknown or disabled app
    IdentityMismatch,
    /// Sign time outside the window
    ReplayRejected,
    /// Signature or content hash mismatch
    IntegrityFailure,
    /// Credential secret mismatch
    CredentialInvalid,
}

impl AuthError {
    pub fn category(&self) -> FailureCategory {
        use AuthError::*;

        match self {
            MissingHeader(_) | MalformedHeader { .. } | MalformedCredential(_) => {
                FailureCategory::ProtocolViolation
            }
            UnknownApp(_) | AppDisabled(_) | AppIdMismatch { .. } | VersionMismatch { .. } => {
                FailureCategory::IdentityMismatch
            }
            StaleOrFutureTimestamp { .. } => FailureCategory::ReplayRejected,
            BadSignature | BadContentHash { .. } => FailureCategory::IntegrityFailure,
            SecretMismatch => FailureCategory::CredentialInvalid,
        }
    }

    /// Stable identifier for structured logs
    pub fn kind(&self) -> &'static str {
        use AuthError::*;

        match self {
            MissingHeader(_) => "missing_header",
            MalformedHeader { .. } => "malformed_header",
            UnknownApp(_) => "unknown_app",
            AppDisabled(_) => "app_disabled",
            AppIdMismatch { .. } => "app_id_mismatch",
            VersionMismatch { .. } => "version_mismatch",
            StaleOrFutureTimestamp { .. } => "stale_or_future_timestamp",
            BadSignature => "bad_signature",
            BadContentHash { .. } => "bad_content_hash",
            MalformedCredential(_) => "malformed_credential",
            SecretMismatch => "secret_mismatch",
        }
    }
}

// ========================================
// Shared Checks
// ========================================

/// Fetch a header or fail with `MissingHeader`
pub(crate) fn required<'a>(
    request: &InboundRequest<'a>,
    name: &'static str,
) -> Result<&'a str, AuthError> {
    request.header(name).ok_or(AuthError::MissingHeader(name))
}

/// Exact string comparison of the declared identity against config
///
/// App id first, then version. No semantic version ordering: a request from
/// an older or newer build is rejected alike.
pub fn check_identity(
    expected: &Identity,
    app_id: &str,
    app_version: &str,
) -> Result<(), AuthError> {
    if app_id != expected.app_id {
        return Err(AuthError::AppIdMismatch {
            received: app_id.to_string(),
            expected: expected.app_id.clone(),
        });
    }
    if app_version != expected.app_version {
        return Err(AuthError::VersionMismatch {
            received: app_version.to_string(),
            expected: expected.app_version.clone(),
        });
    }
    Ok(())
}

/// Treat `Some("")` the same as `None`
pub(crate) fn non_empty(user: Option<&str>) -> Option<&str> {
    user.filter(|u| !u.is_empty())
}

// ========================================
// Signer
// ========================================

/// Produces the headers that authenticate an outgoing request
#[derive(Clone)]
pub struct Signer {
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl Signer {
    /// Signer reading the system clock
    pub fn new(config: AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_shared(Arc::new(config), clock)
    }

    pub(crate) fn from_shared(config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn scheme(&self) -> AuthScheme {
        self.config.scheme
    }

    pub fn identity(&self) -> &Identity {
        &self.config.identity
    }

    /// Sign a request
    ///
    /// `path` must be the percent-encoded path and `query` the raw query, both
    /// exactly as they will be sent; `body` must be the exact bytes that will
    /// be sent. Returns every header to attach, including the
    /// `OCS-APIRequest` marker.
    ///
    /// # Examples
    ///
    /// ```
    /// use appapi_common::api::{headers, SharedSecret, Signer};
    /// use appapi_common::config::{AuthConfig, Identity};
    ///
    /// let config = AuthConfig::new(Identity::new("to_gif", "1.0.0"), SharedSecret::new("s3cret"));
    /// let signer = Signer::new(config);
    ///
    /// let signed = signer.sign("POST", "/ocs/v1.php/apps/app_api/api/v1/log", Some("format=json"), b"{}", None);
    /// assert_eq!(signed.get(headers::EX_APP_ID), Some("to_gif"));
    /// assert!(signed.get(headers::AE_SIGNATURE).is_some());
    /// assert!(signed.get(headers::NC_USER_ID).is_none());
    /// ```
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        query: Option<&str>,
        body: &[u8],
        acting_user: Option<&str>,
    ) -> SignedHeaders {
        let acting_user = non_empty(acting_user);
        let mut headers = match self.config.scheme {
            AuthScheme::HmacV1 => hmac_v1::sign(
                &self.config,
                self.clock.now_unix(),
                method,
                path,
                query,
                body,
                acting_user,
            ),
            AuthScheme::CredentialV2 => credential_v2::sign(&self.config, acting_user),
        };
        headers.push(super::headers::OCS_API_REQUEST, "true");
        headers
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("scheme", &self.config.scheme)
            .field("identity", &self.config.identity)
            .finish_non_exhaustive()
    }
}

// ========================================
// Verifier
// ========================================

/// Accepts or rejects inbound requests against one configured identity
#[derive(Clone)]
pub struct Verifier {
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl Verifier {
    /// Verifier reading the system clock
    pub fn new(config: AuthConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self::from_shared(Arc::new(config), clock)
    }

    pub(crate) fn from_shared(config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn scheme(&self) -> AuthScheme {
        self.config.scheme
    }

    /// Run the scheme's ordered checks, stopping at the first failure
    pub fn verify(&self, request: &InboundRequest<'_>) -> Result<AuthenticatedRequest, AuthError> {
        match self.config.scheme {
            AuthScheme::HmacV1 => hmac_v1::verify(&self.config, self.clock.now_unix(), request),
            AuthScheme::CredentialV2 => credential_v2::verify(&self.config, request),
        }
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("scheme", &self.config.scheme)
            .field("identity", &self.config.identity)
            .field("replay_window_secs", &self.config.replay_window_secs)
            .finish_non_exhaustive()
    }
}

// ========================================
// Tests
// ========================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_parsing() {
        assert_eq!("hmac-v1".parse::<AuthScheme>().unwrap(), AuthScheme::HmacV1);
        assert_eq!(
            " Credential-V2 ".parse::<AuthScheme>().unwrap(),
            AuthScheme::CredentialV2
        );
        assert!("basic".parse::<AuthScheme>().is_err());
        assert_eq!(AuthScheme::default(), AuthScheme::HmacV1);
        assert_eq!(AuthScheme::CredentialV2.to_string(), "credential-v2");
    }

    #[test]
    fn test_scheme_headers() {
        assert_eq!(AuthScheme::HmacV1.protocol_version_header(), "AE-VERSION");
        assert_eq!(AuthScheme::CredentialV2.protocol_version_header(), "AA-VERSION");
        assert_eq!(AuthScheme::HmacV1.request_id_header(), "AE-REQUEST-ID");
        assert_eq!(AuthScheme::CredentialV2.request_id_header(), "AA-REQUEST-ID");
    }

    #[test]
    fn test_identity_checks_app_id_before_version() {
        let expected = Identity::new("to_gif", "1.0.0");

        assert!(check_identity(&expected, "to_gif", "1.0.0").is_ok());

        let err = check_identity(&expected, "other", "2.0.0").unwrap_err();
        assert_eq!(err.kind(), "app_id_mismatch");

        let err = check_identity(&expected, "to_gif", "1.0.1").unwrap_err();
        assert_eq!(err.kind(), "version_mismatch");
        assert_eq!(err.category(), FailureCategory::IdentityMismatch);
    }

    #[test]
    fn test_version_comparison_is_not_semantic() {
        let expected = Identity::new("to_gif", "1.0.0");
        assert!(check_identity(&expected, "to_gif", "1.0").is_err());
        assert!(check_identity(&expected, "to_gif", "1.0.0 ").is_err());
    }

    #[test]
    fn test_categories_cover_every_kind() {
        let cases = [
            (AuthError::MissingHeader("X"), FailureCategory::ProtocolViolation),
            (
                AuthError::MalformedHeader {
                    header: "X",
                    reason: "bad".to_string(),
                },
                FailureCategory::ProtocolViolation,
            ),
            (AuthError::MalformedCredential("x"), FailureCategory::ProtocolViolation),
            (AuthError::UnknownApp("a".to_string()), FailureCategory::IdentityMismatch),
            (AuthError::AppDisabled("a".to_string()), FailureCategory::IdentityMismatch),
            (
                AuthError::StaleOrFutureTimestamp {
                    timestamp: 0,
                    now: 1000,
                    window_secs: 300,
                },
                FailureCategory::ReplayRejected,
            ),
            (AuthError::BadSignature, FailureCategory::IntegrityFailure),
            (
                AuthError::BadContentHash {
                    received: "a".to_string(),
                    computed: "b".to_string(),
                },
                FailureCategory::IntegrityFailure,
            ),
            (AuthError::SecretMismatch, FailureCategory::CredentialInvalid),
        ];

        for (error, category) in cases {
            assert_eq!(error.category(), category, "{}", error.kind());
        }
    }

    #[test]
    fn test_non_empty_user() {
        assert_eq!(non_empty(Some("alice")), Some("alice"));
        assert_eq!(non_empty(Some("")), None);
        assert_eq!(non_empty(None), None);
    }
}
