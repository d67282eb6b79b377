//! Command-line / environment / TOML settings for the ExApp binary
//!
//! `clap` covers the CLI and environment layers; [`Settings::resolve`] merges
//! them over the TOML file and compiled defaults. The shared secret is read
//! from `APP_SECRET` or the TOML file only, never from the command line.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use appapi_common::api::{AuthScheme, SharedSecret};
use appapi_common::config::{
    require_setting, resolve_setting, AuthConfig, Identity, TomlConfig, DEFAULT_PROTOCOL_VERSION,
    DEFAULT_REPLAY_WINDOW_SECS,
};
use appapi_common::{Error, Result};

pub const DEFAULT_APP_HOST: &str = "127.0.0.1";
pub const DEFAULT_APP_PORT: u16 = 9031;

/// Environment variable holding the shared secret
pub const SECRET_ENV: &str = "APP_SECRET";

/// Command-line arguments for appapi-exapp
#[derive(Parser, Debug, Default)]
#[command(name = "appapi-exapp")]
#[command(about = "Reference ExApp verifying signed host calls")]
#[command(version)]
pub struct Args {
    /// ExApp id registered with the host
    #[arg(long, env = "APP_ID")]
    pub app_id: Option<String>,

    /// ExApp version registered with the host
    #[arg(long, env = "APP_VERSION")]
    pub app_version: Option<String>,

    /// Host base URL for OCS and DAV callbacks
    #[arg(long, env = "NEXTCLOUD_URL")]
    pub host_url: Option<String>,

    /// Address to listen on
    #[arg(long = "host", env = "APP_HOST")]
    pub app_host: Option<String>,

    /// Port to listen on
    #[arg(short, long = "port", env = "APP_PORT")]
    pub app_port: Option<u16>,

    /// Authentication scheme
    #[arg(long, env = "APP_AUTH_SCHEME", value_enum)]
    pub auth_scheme: Option<AuthScheme>,

    /// Protocol version sent in AE-VERSION / AA-VERSION
    #[arg(long, env = "APP_PROTOCOL_VERSION")]
    pub protocol_version: Option<String>,

    /// Accepted sign-time skew in seconds
    #[arg(long = "replay-window", env = "APP_REPLAY_WINDOW")]
    pub replay_window_secs: Option<u64>,

    /// TOML config file
    #[arg(long, env = "APP_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Fully resolved settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub auth: AuthConfig,
    pub host_url: String,
    pub listen_addr: SocketAddr,
    /// `log_level` from the TOML file, used when `RUST_LOG` is unset
    pub log_filter: Option<String>,
}

impl Settings {
    /// Merge CLI/env over TOML over defaults, and validate
    pub fn resolve(args: Args) -> Result<Self> {
        let toml = TomlConfig::load_or_default(args.config.as_deref())?;
        Self::merge(args, toml, secret_from_env())
    }

    /// Merge already-loaded layers
    pub fn merge(args: Args, toml: TomlConfig, env_secret: Option<SharedSecret>) -> Result<Self> {
        let identity = Identity::new(
            require_setting(args.app_id, toml.app_id, "app_id")?,
            require_setting(args.app_version, toml.app_version, "app_version")?,
        );
        let secret = require_setting(env_secret, toml.app_secret, SECRET_ENV)?;
        let host_url = require_setting(args.host_url, toml.host_url, "host_url")?;

        let auth = AuthConfig::new(identity, secret)
            .with_scheme(resolve_setting(args.auth_scheme, toml.auth_scheme, AuthScheme::default()))
            .with_protocol_version(resolve_setting(
                args.protocol_version,
                toml.protocol_version,
                DEFAULT_PROTOCOL_VERSION.to_string(),
            ))
            .with_replay_window(resolve_setting(
                args.replay_window_secs,
                toml.replay_window_secs,
                DEFAULT_REPLAY_WINDOW_SECS,
            ));
        auth.validate()?;

        let app_host = resolve_setting(args.app_host, toml.app_host, DEFAULT_APP_HOST.to_string());
        let app_port = resolve_setting(args.app_port, toml.app_port, DEFAULT_APP_PORT);
        let listen_addr: SocketAddr = format!("{}:{}", app_host, app_port)
            .parse()
            .or_else(|_| format!("[{}]:{}", app_host, app_port).parse())
            .map_err(|_| Error::Config(format!("invalid listen address {}:{}", app_host, app_port)))?;

        Ok(Self {
            auth,
            host_url,
            listen_addr,
            log_filter: toml.log_level,
        })
    }
}

/// `APP_SECRET`, treating an empty value as unset
pub fn secret_from_env() -> Option<SharedSecret> {
    std::env::var(SECRET_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SharedSecret::new)
}
