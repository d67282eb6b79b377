//! `CredentialV2`: static credential header
//!
//! `AUTHORIZATION-APP-API: base64(user ":" secret)`, plus the identity
//! headers. No sign time, no body hash, no per-request signature: a captured
//! request can be replayed for as long as the install's secret is valid.

use super::auth::{check_identity, non_empty, required, AuthError, AuthScheme};
use super::headers::{SignedHeaders, AA_VERSION, AUTHORIZATION_APP_API, EX_APP_ID, EX_APP_VERSION};
use super::types::{AuthenticatedRequest, InboundRequest};
use crate::config::AuthConfig;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Encode `user:secret`; an absent user encodes as `:secret`
pub(crate) fn encode_credential(acting_user: Option<&str>, secret: &str) -> String {
    let plain = Zeroizing::new(format!("{}:{}", acting_user.unwrap_or(""), secret));
    BASE64_STANDARD.encode(plain.as_bytes())
}

pub(crate) fn sign(config: &AuthConfig, acting_user: Option<&str>) -> SignedHeaders {
    let mut headers = SignedHeaders::new();
    headers.push(AA_VERSION, config.protocol_version.as_str());
    headers.push(EX_APP_ID, config.identity.app_id.as_str());
    headers.push(EX_APP_VERSION, config.identity.app_version.as_str());
    headers.push(
        AUTHORIZATION_APP_API,
        encode_credential(acting_user, config.secret.expose()),
    );
    headers
}

pub(crate) fn verify(
    config: &AuthConfig,
    request: &InboundRequest<'_>,
) -> Result<AuthenticatedRequest, AuthError> {
    required(request, AA_VERSION)?;
    let app_id = required(request, EX_APP_ID)?;
    let app_version = required(request, EX_APP_VERSION)?;
    let credential = required(request, AUTHORIZATION_APP_API)?;

    check_identity(&config.identity, app_id, app_version)?;

    let decoded = Zeroizing::new(
        BASE64_STANDARD
            .decode(credential.trim())
            .map_err(|_| AuthError::MalformedCredential("not valid base64"))?,
    );
    let decoded = std::str::from_utf8(&decoded)
        .map_err(|_| AuthError::MalformedCredential("not valid UTF-8"))?;
    let (user, secret) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedCredential("missing ':' separator"))?;

    let matches: bool = secret
        .as_bytes()
        .ct_eq(config.secret.expose().as_bytes())
        .into();
    if !matches {
        return Err(AuthError::SecretMismatch);
    }

    Ok(AuthenticatedRequest {
        app_id: app_id.to_string(),
        acting_user: non_empty(Some(user)).map(str::to_string),
        scheme: AuthScheme::CredentialV2,
    })
}
