//! Shared secret handling
//!
//! The secret is established when an ExApp is installed and is known only to
//! the host and that one install. It must never show up in logs, error
//! messages, or `Debug` output.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use std::fmt;
use zeroize::Zeroize;

/// Secret length the host generates at install time
pub const DEFAULT_SECRET_LENGTH: usize = 128;

/// Opaque shared secret
///
/// Deliberately has no `Display` impl. `Debug` is redacted and the buffer is
/// zeroed on drop.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SharedSecret(String);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Generate a random alphanumeric secret
    ///
    /// # Examples
    ///
    /// ```
    /// use appapi_common::api::SharedSecret;
    ///
    /// let secret = SharedSecret::generate(128);
    /// assert_eq!(secret.len(), 128);
    /// ```
    pub fn generate(len: usize) -> Self {
        let secret: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(len)
            .map(char::from)
            .collect();
        Self(secret)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}

impl Drop for SharedSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
