//! Authentication middleware for host → ExApp calls
//!
//! Buffers the body (it is part of what `HmacV1` protects), verifies the
//! request, then hands the same bytes to the handler. The verified identity
//! is stored as an [`AuthenticatedRequest`] request extension.

use axum::{
    body::Body,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use appapi_common::api::{AuthenticatedRequest, InboundRequest};

use crate::AppState;

/// Largest request body accepted on protected routes (10 MiB)
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Reject anything the configured verifier does not accept
///
/// Every failure is a bare `401` so a caller learns nothing about which
/// check failed; the reason is logged here instead.
pub async fn auth_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Rejected request body: {}", e);
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let verified = {
        let inbound = InboundRequest::new(parts.method.as_str(), parts.uri.path(), &parts.headers)
            .with_query(parts.uri.query())
            .with_body(&body_bytes);
        state.verifier.verify(&inbound)
    };

    match verified {
        Ok(authenticated) => {
            debug!(
                app_id = %authenticated.app_id,
                user = ?authenticated.acting_user,
                path = parts.uri.path(),
                "Request authenticated"
            );
            parts.extensions.insert::<AuthenticatedRequest>(authenticated);
            next.run(Request::from_parts(parts, Body::from(body_bytes))).await
        }
        Err(e) => {
            warn!(
                kind = e.kind(),
                category = ?e.category(),
                path = parts.uri.path(),
                "Authentication failed"
            );
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}
