//! Header names and header containers
//!
//! Header lookup is case-insensitive everywhere.

/// `HmacV1` protocol version
pub const AE_VERSION: &str = "AE-VERSION";
/// `CredentialV2` protocol version
pub const AA_VERSION: &str = "AA-VERSION";
pub const EX_APP_ID: &str = "EX-APP-ID";
pub const EX_APP_VERSION: &str = "EX-APP-VERSION";
/// Acting user (`HmacV1`); omitted when there is no user
pub const NC_USER_ID: &str = "NC-USER-ID";
/// xxHash64 of the request body, 16 lowercase hex chars
pub const AE_DATA_HASH: &str = "AE-DATA-HASH";
/// Unix seconds at signing time
pub const AE_SIGN_TIME: &str = "AE-SIGN-TIME";
/// Hex HMAC-SHA256 over the canonical request
pub const AE_SIGNATURE: &str = "AE-SIGNATURE";
/// base64(`user:secret`)
pub const AUTHORIZATION_APP_API: &str = "AUTHORIZATION-APP-API";
pub const AE_REQUEST_ID: &str = "AE-REQUEST-ID";
pub const AA_REQUEST_ID: &str = "AA-REQUEST-ID";

/// Marker the host's CSRF gate expects on API calls
pub const OCS_API_REQUEST: &str = "OCS-APIRequest";

/// Read-only, case-insensitive header lookup
pub trait HeaderSource {
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderSource for http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Ordered headers produced by the signer, ready to attach to a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignedHeaders {
    entries: Vec<(&'static str, String)>,
}

impl SignedHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: &'static str, value: impl Into<String>) {
        self.entries.push((name, value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Drop a header, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let index = self
            .entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    /// Replace the value of an existing header, or append it
    pub fn set(&mut self, name: &'static str, value: impl Into<String>) {
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(key, value)| (*key, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy into an `http::HeaderMap`
    ///
    /// Fails only if a value is not a legal header value (e.g. a user id
    /// containing control characters).
    pub fn to_header_map(&self) -> Result<http::HeaderMap, http::Error> {
        let mut map = http::HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            map.insert(
                http::header::HeaderName::from_bytes(name.as_bytes())?,
                http::HeaderValue::from_str(value)?,
            );
        }
        Ok(map)
    }
}

impl HeaderSource for SignedHeaders {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}
