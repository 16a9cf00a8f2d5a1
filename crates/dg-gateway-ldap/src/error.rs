//! LDAP-specific error types.
//!
//! ## Security Note
//!
//! Error messages must not leak sensitive information like
//! passwords, bind credentials, or internal LDAP structure.

use dg_core::GatewayError;
use thiserror::Error;

/// LDAP result code: the addressed entry does not exist.
pub const RC_NO_SUCH_OBJECT: u32 = 32;
/// LDAP result code: wrong credentials on bind.
pub const RC_INVALID_CREDENTIALS: u32 = 49;
/// LDAP result code: the DN is already taken.
pub const RC_ENTRY_ALREADY_EXISTS: u32 = 68;

/// LDAP-specific errors.
#[derive(Debug, Error)]
pub enum LdapError {
    /// Invalid configuration.
    #[error("LDAP configuration error: {0}")]
    Configuration(String),

    /// Connection URL must use LDAPS.
    #[error("Security error: Only LDAPS is supported. URL must start with 'ldaps://'. STARTTLS and plain LDAP are not allowed.")]
    InsecureProtocol,

    /// Connection failed.
    #[error("LDAP connection failed: {0}")]
    Connection(String),

    /// Service account bind failed.
    #[error("LDAP bind failed: {0}")]
    Bind(String),

    /// The server answered with a non-success result code.
    #[error("LDAP operation on '{dn}' failed with code {code}: {message}")]
    Operation {
        /// Target DN.
        dn: String,
        /// LDAP result code.
        code: u32,
        /// Diagnostic message from the server.
        message: String,
    },

    /// Timeout error.
    #[error("LDAP operation timed out")]
    Timeout,

    /// Pool exhausted.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl LdapError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection(_) | Self::Timeout | Self::PoolExhausted | Self::Ldap3(_)
        )
    }

    /// Checks if this is a security-related error.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::InsecureProtocol | Self::Bind(_))
    }
}

/// Result type for LDAP operations.
pub type LdapResult<T> = Result<T, LdapError>;

impl From<LdapError> for GatewayError {
    fn from(err: LdapError) -> Self {
        match err {
            LdapError::Configuration(msg) => Self::InvalidRequest(msg),
            LdapError::InsecureProtocol => Self::InvalidRequest(err.to_string()),
            LdapError::Connection(msg) | LdapError::Bind(msg) => Self::Connection(msg),
            LdapError::Operation { dn, code, message } => match code {
                RC_NO_SUCH_OBJECT => Self::NoSuchEntry(dn),
                RC_ENTRY_ALREADY_EXISTS => Self::AlreadyExists(dn),
                _ => Self::Protocol(format!("code {code} on '{dn}': {message}")),
            },
            LdapError::Timeout => Self::Timeout,
            LdapError::PoolExhausted => Self::Connection("connection pool exhausted".to_string()),
            LdapError::Ldap3(e) => Self::Connection(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_categories() {
        assert!(LdapError::InsecureProtocol.is_security_error());
        assert!(LdapError::Bind("bad password".to_string()).is_security_error());

        assert!(LdapError::connection("refused").is_connection_error());
        assert!(LdapError::Timeout.is_connection_error());
        assert!(LdapError::PoolExhausted.is_connection_error());
    }

    #[test]
    fn result_codes_map_to_gateway_kinds() {
        let missing = LdapError::Operation {
            dn: "uid=x,o=acme".into(),
            code: RC_NO_SUCH_OBJECT,
            message: String::new(),
        };
        assert_eq!(GatewayError::from(missing), GatewayError::NoSuchEntry("uid=x,o=acme".into()));

        let taken = LdapError::Operation {
            dn: "uid=x,o=acme".into(),
            code: RC_ENTRY_ALREADY_EXISTS,
            message: String::new(),
        };
        assert!(matches!(GatewayError::from(taken), GatewayError::AlreadyExists(_)));

        let busy = LdapError::Operation {
            dn: "uid=x,o=acme".into(),
            code: 51,
            message: "busy".into(),
        };
        assert!(matches!(GatewayError::from(busy), GatewayError::Protocol(_)));
        assert_eq!(GatewayError::from(LdapError::Timeout), GatewayError::Timeout);
    }

    #[test]
    fn insecure_protocol_message() {
        let msg = LdapError::InsecureProtocol.to_string();
        assert!(msg.contains("LDAPS"));
        assert!(msg.contains("STARTTLS"));
    }
}
