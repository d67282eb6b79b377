//! Host services the ExApp depends on
//!
//! Each concern is its own trait so tests can swap in recording fakes. The
//! shipped implementation of all four is [`crate::client::HostClient`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize, Serializer};

use crate::client::ClientError;

/// Host log severity, sent as its integer value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
    Fatal = 4,
}

impl Serialize for LogLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

/// Entry in the host's Files dropdown menu
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileActionMenu {
    pub name: String,
    pub display_name: String,
    /// MIME prefix the action is offered for, e.g. `video`
    pub mime: String,
    pub permissions: u32,
    pub order: i32,
    pub icon: String,
    pub icon_class: String,
    /// ExApp route the host calls when the action is picked
    pub action_handler: String,
}

/// File the user picked in the Files UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiActionFileInfo {
    pub file_id: i64,
    pub name: String,
    pub directory: String,
    pub etag: String,
    pub mime: String,
    pub file_type: String,
    pub size: i64,
    pub favorite: String,
    pub permissions: u32,
    pub mtime: i64,
    pub user_id: String,
    #[serde(default)]
    pub share_owner: Option<String>,
    #[serde(default)]
    pub share_owner_id: Option<String>,
    #[serde(default)]
    pub instance_id: Option<String>,
}

/// Body of a file action callback
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiFileActionHandlerInfo {
    pub action_name: String,
    pub action_handler: String,
    pub action_file: UiActionFileInfo,
}

#[async_trait]
pub trait HostLogger: Send + Sync {
    async fn log(&self, level: LogLevel, message: &str) -> Result<(), ClientError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, user_id: &str, subject: &str, message: &str) -> Result<(), ClientError>;
}

/// Files addressed by owner and a path relative to the owner's root
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn read_file(&self, user_id: &str, path: &str) -> Result<Vec<u8>, ClientError>;
    async fn write_file(&self, user_id: &str, path: &str, content: Vec<u8>)
        -> Result<(), ClientError>;
}

#[async_trait]
pub trait ActionMenu: Send + Sync {
    async fn register(&self, action: &FileActionMenu) -> Result<(), ClientError>;
    async fn unregister(&self, name: &str) -> Result<(), ClientError>;
}

/// Everything the request handlers and background jobs call on the host
pub trait HostServices: HostLogger + Notifier + FileStore + ActionMenu {}

impl<T> HostServices for T where T: HostLogger + Notifier + FileStore + ActionMenu {}
