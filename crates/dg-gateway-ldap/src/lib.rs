//! # dg-gateway-ldap
//!
//! Entry Gateway over LDAPS for dirgate.
//!
//! ## Security Requirements
//!
//! - **LDAPS only**: connections must use `ldaps://` URLs
//! - **No STARTTLS**: STARTTLS is rejected to prevent downgrade attacks
//! - **Credential checks by bind**: passwords are verified by the server
//!   and never logged

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod error;
pub mod filter;
pub mod gateway;

pub use config::{LdapConfig, LdapConfigBuilder};
pub use error::{LdapError, LdapResult};
pub use gateway::LdapGateway;

use dg_core::config::LdapBackendConfig;

/// Builds a gateway from a storage's `ldap` backend section.
///
/// ## Errors
///
/// Returns an error if the section does not describe a valid LDAPS
/// connection.
pub fn connect(backend: &LdapBackendConfig) -> LdapResult<LdapGateway> {
    LdapGateway::new(LdapConfig::try_from(backend)?)
}
