//! appapi-exapp - reference ExApp service
//!
//! Listens for signed host calls (`/enabled`, `/video_to_gif`) and answers
//! the unauthenticated `/heartbeat`. Conversion results are written back to
//! the host over signed DAV calls.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use appapi_common::api::{Signer, Verifier};
use appapi_exapp::client::HostClient;
use appapi_exapp::config::{Args, Settings};
use appapi_exapp::media::FfmpegConverter;
use appapi_exapp::{build_router, AppState};

const DEFAULT_LOG_FILTER: &str = "appapi_exapp=debug,tower_http=debug";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = Settings::resolve(args).context("Failed to load configuration")?;

    // Initialize tracing; RUST_LOG wins over the config file's log_level
    let fallback_filter = settings
        .log_filter
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting appapi-exapp v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        app_id = %settings.auth.identity.app_id,
        app_version = %settings.auth.identity.app_version,
        scheme = %settings.auth.scheme,
        "ExApp identity"
    );

    let host = HostClient::new(&settings.host_url, Signer::new(settings.auth.clone()))
        .context("Failed to create host client")?;
    info!("Host callbacks go to {}", host.base_url());

    let state = AppState::new(
        Verifier::new(settings.auth.clone()),
        Arc::new(host),
        Arc::new(FfmpegConverter::new()),
    );
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", settings.listen_addr))?;
    info!("appapi-exapp listening on http://{}", settings.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
