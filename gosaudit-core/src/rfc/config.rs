//! SAP connection configuration.
//!
//! # Security
//! This struct intentionally does NOT store the logon user or password.
//! Credentials travel separately in [`crate::security::Credentials`].

use crate::error::GosAuditError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Path of the JSON RFC service below the ICM HTTPS port.
pub const DEFAULT_GATEWAY_PATH: &str = "/sap/bc/rfc/json";

/// Configuration for one SAP application server.
///
/// # Example
/// ```rust
/// use gosaudit_core::rfc::ConnectionConfig;
///
/// let config = ConnectionConfig::new("sap.local")
///     .with_sysnr("00")
///     .with_client("100");
///
/// assert!(config.validate().is_ok());
/// assert_eq!(
///     config.gateway_url().unwrap().as_str(),
///     "https://sap.local:44300/sap/bc/rfc/json"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Application server host
    pub host: String,
    /// Two-digit system number
    pub sysnr: String,
    /// Three-digit logon client
    pub client: String,
    /// Logon language
    pub language: String,
    /// Explicit gateway URL; derived from host and sysnr when unset
    pub gateway_url: Option<Url>,
    /// Per-request timeout enforced by the transport
    pub request_timeout: Option<Duration>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            sysnr: "00".to_string(),
            client: "100".to_string(),
            language: "EN".to_string(),
            gateway_url: None,
            request_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl std::fmt::Display for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (sysnr {}, client {})",
            self.host, self.sysnr, self.client
        )
    }
}

fn matches(pattern: &str, value: &str) -> crate::Result<bool> {
    regex::Regex::new(pattern)
        .map(|re| re.is_match(value))
        .map_err(|e| GosAuditError::configuration(format!("Invalid pattern {}: {}", pattern, e)))
}

impl ConnectionConfig {
    /// Creates a new connection config with defaults.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the system number.
    pub fn with_sysnr(mut self, sysnr: impl Into<String>) -> Self {
        self.sysnr = sysnr.into();
        self
    }

    /// Builder method to set the logon client.
    pub fn with_client(mut self, client: impl Into<String>) -> Self {
        self.client = client.into();
        self
    }

    /// Builder method to set the logon language.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Builder method to set an explicit gateway URL.
    ///
    /// # Errors
    /// Returns a configuration error if `url` does not parse.
    pub fn with_gateway_url(mut self, url: &str) -> crate::Result<Self> {
        let parsed = Url::parse(url).map_err(|e| {
            GosAuditError::configuration(format!(
                "Invalid gateway URL {}: {}",
                crate::error::redact_gateway_url(url),
                e
            ))
        })?;
        self.gateway_url = Some(parsed);
        Ok(self)
    }

    /// Returns the gateway base URL.
    ///
    /// Without an explicit URL, the ICM HTTPS port `443<sysnr>` on the
    /// application server is used.
    pub fn gateway_url(&self) -> crate::Result<Url> {
        if let Some(url) = &self.gateway_url {
            return Ok(url.clone());
        }

        let derived = format!(
            "https://{}:443{}{}",
            self.host, self.sysnr, DEFAULT_GATEWAY_PATH
        );
        Url::parse(&derived).map_err(|e| {
            GosAuditError::configuration(format!("Cannot derive gateway URL for {}: {}", self, e))
        })
    }

    /// Validates connection parameters.
    ///
    /// # Errors
    /// Returns error if any value is empty or malformed
    pub fn validate(&self) -> crate::Result<()> {
        if self.host.trim().is_empty() {
            return Err(GosAuditError::configuration("host cannot be empty"));
        }

        if !matches(r"^[0-9]{2}$", &self.sysnr)? {
            return Err(GosAuditError::configuration(format!(
                "sysnr must be two digits, got '{}'",
                self.sysnr
            )));
        }

        if !matches(r"^[0-9]{3}$", &self.client)? {
            return Err(GosAuditError::configuration(format!(
                "client must be three digits, got '{}'",
                self.client
            )));
        }

        if !matches(r"^[A-Za-z0-9]{1,2}$", &self.language)? {
            return Err(GosAuditError::configuration(format!(
                "language must be a one or two character key, got '{}'",
                self.language
            )));
        }

        if let Some(timeout) = self.request_timeout
            && timeout.is_zero()
        {
            return Err(GosAuditError::configuration(
                "request_timeout must be greater than 0",
            ));
        }

        Ok(())
    }
}
