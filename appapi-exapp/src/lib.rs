//! appapi-exapp library - reference ExApp service
//!
//! Verifies signed lifecycle and file-action calls from the host, and calls
//! back into the host's OCS and DAV APIs with signed requests.

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use appapi_common::api::Verifier;

pub mod api;
pub mod client;
pub mod config;
pub mod jobs;
pub mod media;
pub mod services;

use media::MediaConverter;
use services::HostServices;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Checks every call on protected routes
    pub verifier: Arc<Verifier>,
    /// Host callbacks (log, notify, files, menu)
    pub host: Arc<dyn HostServices>,
    pub converter: Arc<dyn MediaConverter>,
}

impl AppState {
    pub fn new(
        verifier: Verifier,
        host: Arc<dyn HostServices>,
        converter: Arc<dyn MediaConverter>,
    ) -> Self {
        Self {
            verifier: Arc::new(verifier),
            host,
            converter,
        }
    }
}

/// Build application router
///
/// `/heartbeat` is public; everything else goes through the auth middleware.
pub fn build_router(state: AppState) -> Router {
    use axum::extract::DefaultBodyLimit;
    use axum::middleware;
    use axum::routing::{post, put};

    let protected = Router::new()
        .route("/enabled", put(api::set_enabled))
        .route("/video_to_gif", post(api::video_to_gif))
        .layer(DefaultBodyLimit::max(api::MAX_BODY_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    Router::new()
        .merge(protected)
        .merge(api::heartbeat_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
