//! Common error types for AppAPI crates

use thiserror::Error;

/// Common result type for AppAPI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the ExApp service and host-side tooling
///
/// Request authentication failures are NOT reported through this type; the
/// verifiers return [`crate::api::AuthError`] so the HTTP boundary can map
/// every rejection to one status.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML config file could not be parsed
    #[error("Config file parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
