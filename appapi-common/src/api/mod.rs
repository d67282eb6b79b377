//! API module for ExApp request authentication
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies beyond `http` types)
//! - Shared types
//!
//! The ExApp service wraps these with framework-specific middleware (Axum).

pub mod auth;
pub mod canonical;
mod credential_v2;
pub mod headers;
mod hmac_v1;
pub mod host;
mod secret;
pub mod types;

pub use auth::{check_identity, AuthError, AuthScheme, FailureCategory, Signer, Verifier};
pub use headers::{HeaderSource, SignedHeaders};
pub use host::{ExAppRegistration, HostAuthenticator};
pub use secret::{SharedSecret, DEFAULT_SECRET_LENGTH};
pub use types::{AuthenticatedRequest, InboundRequest};
