//! Request views shared by the verifiers
//!
//! These types carry no HTTP framework dependency beyond the `HeaderSource`
//! lookup trait, so any server can adapt its request into an
//! [`InboundRequest`].

use super::auth::AuthScheme;
use super::headers::HeaderSource;
use serde::Serialize;

/// Borrowed view of an inbound request, as received
pub struct InboundRequest<'a> {
    /// HTTP method as received (case is normalized during signing)
    pub method: &'a str,
    /// Percent-encoded path, exactly as on the wire
    pub path: &'a str,
    /// Raw query string without the leading `?`
    pub query: Option<&'a str>,
    pub headers: &'a dyn HeaderSource,
    /// Full raw body
    pub body: &'a [u8],
}

impl<'a> InboundRequest<'a> {
    pub fn new(method: &'a str, path: &'a str, headers: &'a dyn HeaderSource) -> Self {
        Self {
            method,
            path,
            query: None,
            headers,
            body: &[],
        }
    }

    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: &'a [u8]) -> Self {
        self.body = body;
        self
    }

    pub(crate) fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.header(name)
    }
}

/// Outcome of a successful verification
///
/// Inserted into request extensions by the ExApp auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedRequest {
    pub app_id: String,
    /// `None` when the caller acts without a user context
    pub acting_user: Option<String>,
    pub scheme: AuthScheme,
}
