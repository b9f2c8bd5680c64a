use url::Url;

use crate::error::ShortenError;
use crate::key;

/// One validated `shorten` invocation.
///
/// Only [`ShortenRequest::new`] builds one, so holding a `ShortenRequest`
/// means no file has been touched yet and both the URL and any explicit key
/// can be written to the ledger as a single two-field line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenRequest {
    target: String,
    key: Option<String>,
}

impl ShortenRequest {
    /// # Errors
    /// - [`ShortenError::InvalidUrl`] unless `target` is absolute with a scheme
    ///   and a host, and free of whitespace and control characters.
    /// - [`ShortenError::NonAlphanumericKey`] for a bad explicit key.
    pub fn new(target: &str, key: Option<&str>) -> Result<Self, ShortenError> {
        if !is_valid_url(target) {
            return Err(ShortenError::InvalidUrl(target.to_string()));
        }
        if let Some(k) = key {
            key::validate(k)?;
        }
        Ok(ShortenRequest {
            target: target.to_string(),
            key: key.map(str::to_string),
        })
    }

    /// Target URL exactly as given (not re-serialized).
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Explicit short key; `None` asks for a generated one.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn into_parts(self) -> (String, Option<String>) {
        (self.target, self.key)
    }
}

// `Url::parse` tolerates spaces and strips tabs/newlines, but the raw string
// is what lands in the ledger, where whitespace separates fields.
fn is_valid_url(s: &str) -> bool {
    if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    Url::parse(s)
        .map(|u| !u.scheme().is_empty() && u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Result of a successful ledger update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortenOutcome {
    /// Bare short key (without the leading `/`).
    pub key: String,
    pub target: String,
    /// Whether the key was generated rather than supplied.
    pub generated: bool,
}
