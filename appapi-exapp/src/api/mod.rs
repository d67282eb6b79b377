//! HTTP API handlers for appapi-exapp

pub mod actions;
pub mod auth;
pub mod heartbeat;
pub mod lifecycle;

pub use actions::video_to_gif;
pub use auth::{auth_middleware, MAX_BODY_BYTES};
pub use heartbeat::heartbeat_routes;
pub use lifecycle::set_enabled;
