//! Heartbeat endpoint
//!
//! Polled by the host to decide whether the ExApp is up. Never authenticated.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HeartbeatResponse {
    pub status: &'static str,
}

/// GET /heartbeat
pub async fn heartbeat() -> Json<HeartbeatResponse> {
    Json(HeartbeatResponse { status: "ok" })
}

pub fn heartbeat_routes() -> Router<AppState> {
    Router::new().route("/heartbeat", get(heartbeat))
}
