//! # AppAPI Common Library
//!
//! Shared code for the host and ExApp sides of AppAPI, including:
//! - Request signing and verification (`HmacV1`, `CredentialV2`)
//! - Host-side registry of installed ExApps
//! - Authentication configuration and config file loading
//! - Clock abstraction

pub mod api;
pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
