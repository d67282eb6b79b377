//! Enable / disable callback
//!
//! The host calls `PUT /enabled?enabled=<flag>` when an admin toggles the
//! ExApp. Enabling registers the Files menu action, disabling removes it.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::services::FileActionMenu;
use crate::AppState;

/// Menu action name, also the `actionName` the host sends back
pub const TO_GIF_ACTION: &str = "to_gif";

/// The Files menu entry this ExApp contributes
pub fn to_gif_action() -> FileActionMenu {
    FileActionMenu {
        name: TO_GIF_ACTION.to_string(),
        display_name: "TO GIF".to_string(),
        mime: "video".to_string(),
        permissions: 31,
        order: 0,
        icon: String::new(),
        icon_class: "icon-app-api".to_string(),
        action_handler: "/video_to_gif".to_string(),
    }
}

#[derive(Debug, Deserialize)]
pub struct EnabledQuery {
    #[serde(deserialize_with = "deserialize_flag")]
    pub enabled: bool,
}

/// Accepts `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "invalid boolean flag '{}'",
            other
        ))),
    }
}

/// Always 200; `error` is empty on success
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnabledResponse {
    pub error: String,
}

/// PUT /enabled
pub async fn set_enabled(
    State(state): State<AppState>,
    Query(query): Query<EnabledQuery>,
) -> Json<EnabledResponse> {
    let result = if query.enabled {
        state.host.register(&to_gif_action()).await
    } else {
        state.host.unregister(TO_GIF_ACTION).await
    };

    let error = match result {
        Ok(()) => {
            info!(enabled = query.enabled, "ExApp state changed");
            String::new()
        }
        Err(e) => {
            warn!(enabled = query.enabled, "Failed to update file action: {}", e);
            e.to_string()
        }
    };

    Json(EnabledResponse { error })
}
