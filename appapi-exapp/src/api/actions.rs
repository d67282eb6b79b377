//! File action handler

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::info;

use appapi_common::api::AuthenticatedRequest;

use crate::jobs;
use crate::services::UiFileActionHandlerInfo;
use crate::AppState;

/// POST /video_to_gif
///
/// Answers immediately; the conversion runs as a background task. The
/// signed acting user wins over the `userId` in the body.
pub async fn video_to_gif(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedRequest>,
    Json(info): Json<UiFileActionHandlerInfo>,
) -> StatusCode {
    let user_id = auth
        .acting_user
        .unwrap_or_else(|| info.action_file.user_id.clone());

    info!(
        user_id = %user_id,
        file_id = info.action_file.file_id,
        name = %info.action_file.name,
        "Queued video conversion"
    );

    tokio::spawn(jobs::convert_video_to_gif(
        state.host.clone(),
        state.converter.clone(),
        info.action_file,
        user_id,
    ));

    StatusCode::OK
}
