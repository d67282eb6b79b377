//! OCS management API calls
//!
//! All endpoints live under `/ocs/v1.php/apps/app_api/api/v1` and always
//! carry `format=json`.

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use super::{ClientError, HostClient};
use crate::services::{ActionMenu, FileActionMenu, HostLogger, LogLevel, Notifier};

const OCS_API_ROOT: [&str; 6] = ["ocs", "v1.php", "apps", "app_api", "api", "v1"];
const NOTIFICATION_OBJECT_ID_LEN: usize = 56;

#[derive(Debug, Serialize)]
struct LogParams<'a> {
    level: LogLevel,
    message: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterMenuParams<'a> {
    file_action_menu_params: &'a FileActionMenu,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnregisterMenuParams<'a> {
    file_action_menu_name: &'a str,
}

/// Random id so each notification is a distinct object on the host
fn notification_object_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NOTIFICATION_OBJECT_ID_LEN)
        .map(char::from)
        .collect()
}

fn notification_params(subject: &str, message: &str) -> serde_json::Value {
    json!({
        "params": {
            "object": "app_api",
            "object_id": notification_object_id(),
            "subject_type": "app_api_ex_app",
            "subject_params": {
                "rich_subject": subject,
                "rich_subject_params": {},
                "rich_message": message,
                "rich_message_params": {},
            },
        }
    })
}

impl HostClient {
    /// Send a JSON body to an OCS endpoint; the body is serialized once and
    /// the same bytes are signed and sent
    async fn ocs_json<T: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &[&str],
        payload: &T,
        acting_user: Option<&str>,
    ) -> Result<(), ClientError> {
        let mut segments: Vec<&str> = OCS_API_ROOT.to_vec();
        segments.extend_from_slice(endpoint);
        let url = self.endpoint(segments, &[("format", "json")])?;
        let body = serde_json::to_vec(payload)?;
        self.send_signed(method, url, body, Some("application/json"), acting_user)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl HostLogger for HostClient {
    async fn log(&self, level: LogLevel, message: &str) -> Result<(), ClientError> {
        self.ocs_json(Method::POST, &["log"], &LogParams { level, message }, None)
            .await
    }
}

#[async_trait]
impl Notifier for HostClient {
    /// Signed as `user_id`, the notification's recipient
    async fn notify(&self, user_id: &str, subject: &str, message: &str) -> Result<(), ClientError> {
        let params = notification_params(subject, message);
        self.ocs_json(Method::POST, &["notification"], &params, Some(user_id))
            .await
    }
}

#[async_trait]
impl ActionMenu for HostClient {
    async fn register(&self, action: &FileActionMenu) -> Result<(), ClientError> {
        let params = RegisterMenuParams {
            file_action_menu_params: action,
        };
        self.ocs_json(Method::POST, &["files", "actions", "menu"], &params, None)
            .await
    }

    async fn unregister(&self, name: &str) -> Result<(), ClientError> {
        let params = UnregisterMenuParams {
            file_action_menu_name: name,
        };
        self.ocs_json(Method::DELETE, &["files", "actions", "menu"], &params, None)
            .await
    }
}
