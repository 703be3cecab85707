//! Destination endpoint validation

use std::fmt;

use url::Url;

use crate::error::{PopError, Result};

/// A validated destination for a signed proof
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    url: Url,
}

impl Destination {
    /// Accepts absolute `http`/`https` URLs with a host.
    ///
    /// Plain `http` is allowed; use [`Destination::is_secure`] to warn about it.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input.trim())
            .map_err(|e| PopError::InvalidDestination(format!("{}: {}", input, e)))?;

        match url.scheme() {
            "https" | "http" => {}
            other => {
                return Err(PopError::InvalidDestination(format!(
                    "{}: unsupported scheme '{}'",
                    input, other
                )));
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(PopError::InvalidDestination(format!("{}: missing host", input)));
        }

        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// `true` only for TLS destinations
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
