//! Configuration structures for Docker Engine API clients.
//!
//! This module describes where the daemon lives and how to connect to it.
//! Values are validated on construction so a bad endpoint fails early rather
//! than on the first request.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;
use validator::{Validate, ValidationError};

/// Connection settings for a Docker daemon.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DockerClientConfig {
    /// Daemon base URL (e.g. `http://127.0.0.1:2375`)
    #[validate(url)]
    pub endpoint: String,

    /// Engine API version to pin requests to (e.g. `1.24`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_api_version"))]
    pub api_version: Option<String>,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Optional path to custom CA certificate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_ca_cert: Option<std::path::PathBuf>,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    crate::client::DEFAULT_TIMEOUT
}

fn validate_api_version(version: &str) -> Result<(), ValidationError> {
    let mut parts = version.split('.');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(major), Some(minor), None)
            if !major.is_empty()
                && !minor.is_empty()
                && major.chars().all(|c| c.is_ascii_digit())
                && minor.chars().all(|c| c.is_ascii_digit())
    );

    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("api_version"))
    }
}

impl DockerClientConfig {
    /// Create a new client configuration for the given daemon endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(endpoint: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            endpoint: endpoint.into(),
            api_version: None,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
        };

        config.validated()
    }

    /// Pin requests to an API version.
    ///
    /// # Errors
    ///
    /// Returns an error unless `version` looks like `MAJOR.MINOR`.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Result<Self, Error> {
        self.api_version = Some(version.into());
        self.validated()
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set custom CA certificate path.
    #[must_use]
    pub fn with_ca_cert(mut self, path: std::path::PathBuf) -> Self {
        self.tls_ca_cert = Some(path);
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse and validate the endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_endpoint(&self) -> Result<Url, Error> {
        Url::parse(&self.endpoint)
            .map_err(|e| Error::ConfigError(format!("Invalid daemon endpoint: {e}")))
    }

    fn validated(self) -> Result<Self, Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;
        Ok(self)
    }
}

impl Default for DockerClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:2375".to_string(),
            api_version: None,
            tls_verify: default_tls_verify(),
            tls_ca_cert: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
