//! Authentication configuration and config file resolution
//!
//! Settings resolve in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Steps 1 and 2 are handled by each binary's `clap` definition; this module
//! provides the TOML layer, the defaults, and the validated [`AuthConfig`]
//! that the signer and verifier are constructed from.

use crate::api::{AuthScheme, SharedSecret};
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default replay window for `HmacV1` (5 minutes)
pub const DEFAULT_REPLAY_WINDOW_SECS: u64 = 5 * 60;

/// Default protocol version advertised in `AE-VERSION` / `AA-VERSION`
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.0.0";

/// `{app_id, app_version}` of an ExApp build
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub app_id: String,
    pub app_version: String,
}

impl Identity {
    pub fn new(app_id: impl Into<String>, app_version: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_version: app_version.into(),
        }
    }
}

/// Immutable configuration injected into [`crate::api::Signer`] and
/// [`crate::api::Verifier`]
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub scheme: AuthScheme,
    /// Value sent in the scheme's protocol-version header
    pub protocol_version: String,
    pub identity: Identity,
    pub secret: SharedSecret,
    /// Maximum |now - sign time| accepted by `HmacV1`, in seconds
    pub replay_window_secs: u64,
}

impl AuthConfig {
    /// Create config with default scheme, protocol version and replay window
    pub fn new(identity: Identity, secret: SharedSecret) -> Self {
        Self {
            scheme: AuthScheme::default(),
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            identity,
            secret,
            replay_window_secs: DEFAULT_REPLAY_WINDOW_SECS,
        }
    }

    pub fn with_scheme(mut self, scheme: AuthScheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    pub fn with_replay_window(mut self, seconds: u64) -> Self {
        self.replay_window_secs = seconds;
        self
    }

    /// Reject configurations that could never authenticate anything
    pub fn validate(&self) -> Result<()> {
        if self.identity.app_id.trim().is_empty() {
            return Err(Error::Config("app_id must not be empty".to_string()));
        }
        if self.identity.app_version.trim().is_empty() {
            return Err(Error::Config("app_version must not be empty".to_string()));
        }
        if self.secret.is_empty() {
            return Err(Error::Config("shared secret must not be empty".to_string()));
        }
        if self.protocol_version.trim().is_empty() {
            return Err(Error::Config(
                "protocol_version must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Contents of an optional `config.toml`
///
/// Every field is optional; missing fields fall through to compiled defaults
/// or to a validation error for required settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub app_id: Option<String>,
    pub app_version: Option<String>,
    pub app_secret: Option<SharedSecret>,
    pub host_url: Option<String>,
    pub app_host: Option<String>,
    pub app_port: Option<u16>,
    pub auth_scheme: Option<AuthScheme>,
    pub protocol_version: Option<String>,
    pub replay_window_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Load and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file at `path`, or the platform default if it exists
    ///
    /// Missing default file is not an error; a missing explicit path is.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) => {
                    tracing::debug!("Loading config file {}", path.display());
                    Self::load(&path)
                }
                None => Ok(Self::default()),
            },
        }
    }
}

/// Pick the first value present, CLI/env before TOML before default
pub fn resolve_setting<T>(cli_or_env: Option<T>, toml: Option<T>, default: T) -> T {
    cli_or_env.or(toml).unwrap_or(default)
}

/// Like [`resolve_setting`] but without a compiled default
pub fn require_setting<T>(cli_or_env: Option<T>, toml: Option<T>, name: &str) -> Result<T> {
    cli_or_env
        .or(toml)
        .ok_or_else(|| Error::Config(format!("{} is required", name)))
}

/// Platform config file location, if the file exists
///
/// Linux: `~/.config/appapi/config.toml`, then `/etc/appapi/config.toml`.
/// macOS/Windows: the user config dir only.
fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("appapi").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/appapi/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> AuthConfig {
        AuthConfig::new(
            Identity::new("to_gif", "1.0.0"),
            SharedSecret::new("0123456789abcdef"),
        )
    }

    #[test]
    fn test_defaults() {
        let config = sample_config();
        assert_eq!(config.scheme, AuthScheme::HmacV1);
        assert_eq!(config.protocol_version, "1.0.0");
        assert_eq!(config.replay_window_secs, 300);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let mut config = sample_config();
        config.identity.app_id = " ".to_string();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = sample_config();
        config.identity.app_version = String::new();
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.secret = SharedSecret::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_never_contains_secret() {
        let config = sample_config();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("0123456789abcdef"));
        assert!(debug.contains("to_gif"));
    }

    #[test]
    fn test_resolve_setting_priority() {
        assert_eq!(resolve_setting(Some(1), Some(2), 3), 1);
        assert_eq!(resolve_setting(None, Some(2), 3), 2);
        assert_eq!(resolve_setting(None::<i32>, None, 3), 3);
    }

    #[test]
    fn test_require_setting_names_missing_field() {
        let err = require_setting::<String>(None, None, "app_id").unwrap_err();
        assert!(err.to_string().contains("app_id"));
    }

    #[test]
    fn test_toml_config_parses_scheme() {
        let config: TomlConfig = toml::from_str(
            r#"
            app_id = "to_gif"
            auth_scheme = "credential-v2"
            replay_window_secs = 60
            "#,
        )
        .unwrap();

        assert_eq!(config.app_id.as_deref(), Some("to_gif"));
        assert_eq!(config.auth_scheme, Some(AuthScheme::CredentialV2));
        assert_eq!(config.replay_window_secs, Some(60));
        assert!(config.app_secret.is_none());
    }
}
