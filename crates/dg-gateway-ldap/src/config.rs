//! LDAP gateway configuration.
//!
//! ## Security Requirements
//!
//! Only LDAPS (LDAP over TLS from connection start) is supported.
//!
//! - Connection URLs MUST start with `ldaps://`
//! - STARTTLS is NOT supported (vulnerable to downgrade attacks)
//! - Plain `ldap://` is NOT supported (credentials transmitted in cleartext)

use std::time::Duration;

use dg_core::config::LdapBackendConfig;
use serde::{Deserialize, Serialize};

use crate::error::{LdapError, LdapResult};

/// Resolved LDAP connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapConfig {
    // === Connection ===
    /// LDAP server URL (MUST be ldaps://).
    pub connection_url: String,

    /// Bind DN for the service account.
    pub bind_dn: String,

    /// Bind credential (password).
    #[serde(skip_serializing)]
    pub bind_credential: String,

    // === TLS ===
    /// Whether to validate server certificates.
    pub validate_certificates: bool,

    // === Pool ===
    /// Maximum concurrent operations.
    pub pool_max_size: usize,

    /// Connection timeout.
    pub connection_timeout: Duration,

    /// Per-operation timeout.
    pub read_timeout: Duration,
}

impl LdapConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> LdapConfigBuilder {
        LdapConfigBuilder::new()
    }

    /// Validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns `LdapError::InsecureProtocol` for non-LDAPS URLs and
    /// `LdapError::Configuration` for missing values.
    pub fn validate(&self) -> LdapResult<()> {
        validate_ldaps_url(&self.connection_url)?;

        if self.bind_dn.is_empty() {
            return Err(LdapError::config("bind_dn cannot be empty"));
        }
        if self.pool_max_size == 0 {
            return Err(LdapError::config("pool_max_size must be positive"));
        }
        if self.read_timeout.is_zero() {
            return Err(LdapError::config("read_timeout must be positive"));
        }
        Ok(())
    }
}

impl TryFrom<&LdapBackendConfig> for LdapConfig {
    type Error = LdapError;

    fn try_from(backend: &LdapBackendConfig) -> LdapResult<Self> {
        Self::builder()
            .connection_url(&backend.url)
            .bind_dn(&backend.bind_dn)
            .bind_credential(&backend.bind_credential)
            .validate_certificates(backend.validate_certificates)
            .connection_timeout(backend.connection_timeout)
            .read_timeout(backend.read_timeout)
            .pool_max_size(backend.pool_max_size)
            .build()
    }
}

/// Rejects anything but `ldaps://host...`.
fn validate_ldaps_url(url: &str) -> LdapResult<()> {
    let url_lower = url.to_lowercase();

    if !url_lower.starts_with("ldaps://") {
        return Err(LdapError::InsecureProtocol);
    }

    // "ldaps://" is 8 chars
    if url.len() <= 8 {
        return Err(LdapError::config("Invalid LDAPS URL: missing host"));
    }

    Ok(())
}

// ============================================================================
// Configuration Builder
// ============================================================================

/// Builder for [`LdapConfig`].
#[derive(Debug)]
pub struct LdapConfigBuilder {
    connection_url: Option<String>,
    bind_dn: Option<String>,
    bind_credential: Option<String>,
    validate_certificates: bool,
    pool_max_size: usize,
    connection_timeout: Duration,
    read_timeout: Duration,
}

impl Default for LdapConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LdapConfigBuilder {
    /// Creates a builder with secure defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connection_url: None,
            bind_dn: None,
            bind_credential: None,
            validate_certificates: true,
            pool_max_size: 10,
            connection_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the connection URL (must be ldaps://).
    #[must_use]
    pub fn connection_url(mut self, url: impl Into<String>) -> Self {
        self.connection_url = Some(url.into());
        self
    }

    /// Sets the service account DN.
    #[must_use]
    pub fn bind_dn(mut self, dn: impl Into<String>) -> Self {
        self.bind_dn = Some(dn.into());
        self
    }

    /// Sets the service account password.
    #[must_use]
    pub fn bind_credential(mut self, credential: impl Into<String>) -> Self {
        self.bind_credential = Some(credential.into());
        self
    }

    /// Sets whether server certificates are validated.
    #[must_use]
    pub const fn validate_certificates(mut self, validate: bool) -> Self {
        self.validate_certificates = validate;
        self
    }

    /// Sets the maximum number of concurrent operations.
    #[must_use]
    pub const fn pool_max_size(mut self, max: usize) -> Self {
        self.pool_max_size = max;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    /// Sets the per-operation timeout.
    #[must_use]
    pub const fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Builds and validates the configuration.
    ///
    /// ## Errors
    ///
    /// Returns an error if:
    /// - Required fields are missing
    /// - Connection URL does not use LDAPS
    pub fn build(self) -> LdapResult<LdapConfig> {
        let config = LdapConfig {
            connection_url: self
                .connection_url
                .ok_or_else(|| LdapError::config("connection_url is required"))?,
            bind_dn: self
                .bind_dn
                .ok_or_else(|| LdapError::config("bind_dn is required"))?,
            bind_credential: self
                .bind_credential
                .ok_or_else(|| LdapError::config("bind_credential is required"))?,
            validate_certificates: self.validate_certificates,
            pool_max_size: self.pool_max_size,
            connection_timeout: self.connection_timeout,
            read_timeout: self.read_timeout,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> LdapConfigBuilder {
        LdapConfig::builder()
            .bind_dn("cn=svc,o=acme")
            .bind_credential("password")
    }

    #[test]
    fn rejects_ldap_url() {
        let result = builder().connection_url("ldap://ldap.example.com:389").build();
        assert!(matches!(result, Err(LdapError::InsecureProtocol)));
    }

    #[test]
    fn rejects_empty_host() {
        let result = builder().connection_url("ldaps://").build();
        assert!(matches!(result, Err(LdapError::Configuration(_))));
    }

    #[test]
    fn accepts_ldaps_url() {
        let config = builder().connection_url("LDAPS://ldap.example.com:636").build().unwrap();
        assert!(config.validate_certificates);
        assert_eq!(config.pool_max_size, 10);
    }

    #[test]
    fn missing_credential_is_reported() {
        let result = LdapConfig::builder()
            .connection_url("ldaps://ldap.example.com")
            .bind_dn("cn=svc,o=acme")
            .build();
        assert!(matches!(result, Err(LdapError::Configuration(msg)) if msg.contains("bind_credential")));
    }

    #[test]
    fn converts_backend_section() {
        let backend = LdapBackendConfig {
            url: "ldaps://ldap.acme.test".to_string(),
            bind_dn: "cn=svc,o=acme".to_string(),
            bind_credential: "secret".to_string(),
            validate_certificates: false,
            connection_timeout: Duration::from_secs(2),
            read_timeout: Duration::from_secs(7),
            pool_max_size: 3,
        };
        let config = LdapConfig::try_from(&backend).unwrap();
        assert_eq!(config.read_timeout, Duration::from_secs(7));
        assert!(!config.validate_certificates);
    }
}
