//! Host-side authentication against a registry of installed ExApps
//!
//! The host shares one secret with each ExApp install. Inbound callbacks are
//! routed to the right per-app verifier by `EX-APP-ID`; outbound calls to an
//! ExApp are signed with that app's secret. Both directions use the same
//! scheme modules as the ExApp side.

use super::auth::{AuthError, AuthScheme, Signer, Verifier};
use super::headers::EX_APP_ID;
use super::secret::SharedSecret;
use super::types::{AuthenticatedRequest, InboundRequest};
use crate::config::{AuthConfig, Identity, DEFAULT_PROTOCOL_VERSION, DEFAULT_REPLAY_WINDOW_SECS};
use crate::time::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// One installed ExApp as the host knows it
#[derive(Debug, Clone)]
pub struct ExAppRegistration {
    pub identity: Identity,
    pub secret: SharedSecret,
    pub scheme: AuthScheme,
    pub enabled: bool,
}

impl ExAppRegistration {
    pub fn new(identity: Identity, secret: SharedSecret, scheme: AuthScheme) -> Self {
        Self {
            identity,
            secret,
            scheme,
            enabled: true,
        }
    }
}

struct RegisteredApp {
    enabled: bool,
    config: Arc<AuthConfig>,
}

/// Registry-backed verifier and signer for the host
///
/// Mutated only while (re)installing apps; wrap in an `Arc` once built.
pub struct HostAuthenticator {
    protocol_version: String,
    replay_window_secs: u64,
    clock: Arc<dyn Clock>,
    apps: HashMap<String, RegisteredApp>,
}

impl HostAuthenticator {
    pub fn new(protocol_version: impl Into<String>) -> Self {
        Self::with_clock(protocol_version, Arc::new(SystemClock))
    }

    pub fn with_clock(protocol_version: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            protocol_version: protocol_version.into(),
            replay_window_secs: DEFAULT_REPLAY_WINDOW_SECS,
            clock,
            apps: HashMap::new(),
        }
    }

    /// Applies to apps registered after this call
    pub fn with_replay_window(mut self, seconds: u64) -> Self {
        self.replay_window_secs = seconds;
        self
    }

    /// Add or replace an ExApp; replacing is how a reinstall rotates the secret
    pub fn register(&mut self, registration: ExAppRegistration) {
        let app_id = registration.identity.app_id.clone();
        let config = AuthConfig::new(registration.identity, registration.secret)
            .with_scheme(registration.scheme)
            .with_protocol_version(self.protocol_version.clone())
            .with_replay_window(self.replay_window_secs);

        debug!(app_id = %app_id, scheme = %config.scheme, "Registered ExApp");
        self.apps.insert(
            app_id,
            RegisteredApp {
                enabled: registration.enabled,
                config: Arc::new(config),
            },
        );
    }

    pub fn unregister(&mut self, app_id: &str) -> bool {
        self.apps.remove(app_id).is_some()
    }

    /// Returns false if the app is not registered
    pub fn set_enabled(&mut self, app_id: &str, enabled: bool) -> bool {
        match self.apps.get_mut(app_id) {
            Some(app) => {
                app.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_registered(&self, app_id: &str) -> bool {
        self.apps.contains_key(app_id)
    }

    /// Verify a callback from an ExApp
    ///
    /// Rejects unknown and disabled apps before any secret-based check.
    pub fn verify(&self, request: &InboundRequest<'_>) -> Result<AuthenticatedRequest, AuthError> {
        let app_id = request
            .header(EX_APP_ID)
            .ok_or(AuthError::MissingHeader(EX_APP_ID))?;

        let app = self.apps.get(app_id).ok_or_else(|| {
            warn!(app_id = %app_id, "ExApp not found");
            AuthError::UnknownApp(app_id.to_string())
        })?;

        if !app.enabled {
            return Err(AuthError::AppDisabled(app_id.to_string()));
        }

        Verifier::from_shared(Arc::clone(&app.config), Arc::clone(&self.clock)).verify(request)
    }

    /// Signer for host → ExApp calls, or `None` if the app is unknown
    pub fn signer_for(&self, app_id: &str) -> Option<Signer> {
        self.apps
            .get(app_id)
            .map(|app| Signer::from_shared(Arc::clone(&app.config), Arc::clone(&self.clock)))
    }
}

impl Default for HostAuthenticator {
    fn default() -> Self {
        Self::new(DEFAULT_PROTOCOL_VERSION)
    }
}
