//! Background conversion job
//!
//! Runs after `/video_to_gif` has already answered. Progress and failures go
//! to the host log and the user's notifications; nothing reaches the HTTP
//! layer. Failures of the log and notify calls themselves are only traced.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use crate::media::MediaConverter;
use crate::services::{HostServices, LogLevel, UiActionFileInfo};

/// `{directory}/{name}` with duplicate separators collapsed
pub fn file_path(directory: &str, name: &str) -> String {
    let directory = directory.trim_matches('/');
    if directory.is_empty() {
        format!("/{}", name)
    } else {
        format!("/{}/{}", directory, name)
    }
}

/// `clip.mp4` → `clip.gif`
pub fn gif_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(name);
    format!("{}.gif", stem)
}

async fn log_to_host(host: &dyn HostServices, level: LogLevel, message: &str) {
    if let Err(e) = host.log(level, message).await {
        warn!("Failed to send log to host: {}", e);
    }
}

async fn notify_user(host: &dyn HostServices, user_id: &str, subject: &str, message: &str) {
    if let Err(e) = host.notify(user_id, subject, message).await {
        warn!(user_id = %user_id, "Failed to send notification: {}", e);
    }
}

/// Convert `file` to a GIF next to the original and tell `user_id` about it
pub async fn convert_video_to_gif(
    host: Arc<dyn HostServices>,
    converter: Arc<dyn MediaConverter>,
    file: UiActionFileInfo,
    user_id: String,
) {
    let source = file_path(&file.directory, &file.name);
    let target = file_path(&file.directory, &gif_name(&file.name));

    log_to_host(
        host.as_ref(),
        LogLevel::Warning,
        &format!("Processing: {} -> {}", source, target),
    )
    .await;

    match convert(host.as_ref(), converter.as_ref(), &user_id, &source, &target).await {
        Ok(()) => {
            info!(user_id = %user_id, target = %target, "Conversion finished");
            notify_user(
                host.as_ref(),
                &user_id,
                &format!("{} finished!", file.name),
                &format!("{} is waiting for you!", gif_name(&file.name)),
            )
            .await;
        }
        Err(e) => {
            error!(user_id = %user_id, source = %source, "Conversion failed: {:#}", e);
            log_to_host(host.as_ref(), LogLevel::Error, &format!("{:#}", e)).await;
            notify_user(
                host.as_ref(),
                &user_id,
                "Error occurred",
                "Error information was written to log file",
            )
            .await;
        }
    }
}

async fn convert(
    host: &dyn HostServices,
    converter: &dyn MediaConverter,
    user_id: &str,
    source: &str,
    target: &str,
) -> Result<()> {
    let input = host
        .read_file(user_id, source)
        .await
        .with_context(|| format!("Failed to download {}", source))?;
    log_to_host(host, LogLevel::Warning, "File downloaded").await;

    let gif = converter
        .convert(input)
        .await
        .context("Failed to convert video")?;
    log_to_host(host, LogLevel::Warning, "GIF is ready").await;

    host.write_file(user_id, target, gif)
        .await
        .with_context(|| format!("Failed to upload {}", target))?;
    log_to_host(host, LogLevel::Warning, "Result uploaded").await;

    Ok(())
}
