//! Signed HTTP client for calls back into the host
//!
//! Every request is built to its final URL first, then signed over exactly
//! the path, query and body bytes that go on the wire.
//!
//! - [`ocs`]: management API (log, notifications, file action menu)
//! - [`dav`]: file storage (read / write one file)

use std::time::Duration;

use appapi_common::api::Signer;
use reqwest::{Method, Url};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

pub mod dav;
pub mod ocs;

const USER_AGENT: &str = concat!("appapi-exapp/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Host call failures; none are retried
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Host returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Client for one host instance, signing as one ExApp
#[derive(Debug, Clone)]
pub struct HostClient {
    http: reqwest::Client,
    base_url: Url,
    signer: Signer,
}

impl HostClient {
    /// `base_url` is the host root, e.g. `https://cloud.example.com` or
    /// `http://localhost/nextcloud`
    pub fn new(base_url: &str, signer: Signer) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            base_url,
            signer,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append path segments (each percent-encoded) and query pairs to the base
    pub(crate) fn endpoint<I, S>(&self, segments: I, query: &[(&str, &str)]) -> Result<Url, ClientError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Sign and send; non-2xx statuses become [`ClientError::Status`]
    pub(crate) async fn send_signed(
        &self,
        method: Method,
        url: Url,
        body: Vec<u8>,
        content_type: Option<&'static str>,
        acting_user: Option<&str>,
    ) -> Result<reqwest::Response, ClientError> {
        let signed = self
            .signer
            .sign(method.as_str(), url.path(), url.query(), &body, acting_user);
        let request_id = Uuid::new_v4().to_string();

        debug!(
            method = %method,
            path = url.path(),
            request_id = %request_id,
            "Sending signed request to host"
        );

        let mut request = self
            .http
            .request(method, url)
            .header(self.signer.scheme().request_id_header(), request_id.as_str());
        for (name, value) in signed.iter() {
            request = request.header(name, value);
        }
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}
