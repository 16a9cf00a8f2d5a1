//! Error handling for dirgate.
//!
//! [`Error`] is the taxonomy callers see. Each variant maps to a distinct
//! outward result, so `NotFound`-style variants, `UnsupportedForStorage` and
//! `AmbiguousTarget` are never folded together.
//!
//! [`GatewayError`] classifies raw backend failures. When a store wraps one
//! it adds tenant and storage context but keeps the original kind.

use thiserror::Error;

/// Result type alias using the dirgate error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type for Entry Gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Failures reported by an Entry Gateway.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The addressed entry does not exist.
    #[error("no such entry: {0}")]
    NoSuchEntry(String),

    /// An entry with the same name already exists.
    #[error("entry already exists: {0}")]
    AlreadyExists(String),

    /// The backend could not be reached.
    #[error("backend connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed the operation.
    #[error("backend protocol error: {0}")]
    Protocol(String),

    /// The operation did not complete in time.
    #[error("backend operation timed out")]
    Timeout,

    /// The request could not be expressed for this backend.
    #[error("invalid backend request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a protocol error.
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Checks if the addressed entry was missing.
    #[must_use]
    pub const fn is_no_such_entry(&self) -> bool {
        matches!(self, Self::NoSuchEntry(_))
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }
}

/// Main error type for directory operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed configuration, catalog or pattern. Fatal at load time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The tenant is not configured.
    #[error("tenant not found: {0}")]
    TenantNotFound(String),

    /// The storage is not configured for the tenant.
    #[error("storage '{storage}' not found in tenant '{tenant}'")]
    StorageNotFound {
        /// Tenant name.
        tenant: String,
        /// Requested storage name.
        storage: String,
    },

    /// The entity does not exist in the addressed storage(s).
    #[error("{entity_type} not found: {id}")]
    EntityNotFound {
        /// Kind of entity (e.g. "user", "group").
        entity_type: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// The storage does not hold entries of this kind.
    #[error("{entity_type} entries are not configured for storage '{storage}'")]
    UnsupportedForStorage {
        /// Kind of entity.
        entity_type: &'static str,
        /// Storage name.
        storage: String,
    },

    /// A naming or password rule rejected the request.
    #[error("policy violation [{rule}]: {detail}")]
    PolicyViolation {
        /// Identifier of the violated rule.
        rule: String,
        /// Human-readable detail.
        detail: String,
    },

    /// The old credential did not match on a credential change.
    #[error("invalid credential")]
    InvalidCredential,

    /// No storage could be chosen for a write.
    #[error("ambiguous target: tenant '{tenant}' has storages {storages:?} and no default")]
    AmbiguousTarget {
        /// Tenant name.
        tenant: String,
        /// Candidate storages.
        storages: Vec<String>,
    },

    /// The caller lacks the permission a check required.
    #[error("permission denied: {category} on {scope}")]
    Forbidden {
        /// Category that was required.
        category: String,
        /// Scope that was checked, e.g. `acme/main`.
        scope: String,
    },

    /// A continuation token could not be decoded.
    #[error("invalid page token: {0}")]
    InvalidPageToken(String),

    /// The backend failed; the gateway error kind is preserved.
    #[error("backend failure on {tenant}/{storage}: {source}")]
    Backend {
        /// Tenant name.
        tenant: String,
        /// Storage name.
        storage: String,
        /// Original gateway failure.
        #[source]
        source: GatewayError,
    },
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates an entity-not-found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::EntityNotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a policy violation naming the rule.
    #[must_use]
    pub fn policy(rule: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::PolicyViolation {
            rule: rule.into(),
            detail: detail.into(),
        }
    }

    /// Wraps a gateway failure with tenant and storage context.
    #[must_use]
    pub fn backend(tenant: impl Into<String>, storage: impl Into<String>, source: GatewayError) -> Self {
        Self::Backend {
            tenant: tenant.into(),
            storage: storage.into(),
            source,
        }
    }

    /// Checks if this error means something addressed does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TenantNotFound(_) | Self::StorageNotFound { .. } | Self::EntityNotFound { .. }
        )
    }

    /// Returns the wrapped gateway error, if this is a backend failure.
    #[must_use]
    pub const fn gateway_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Backend { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns whether this error represents a caller mistake.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::TenantNotFound(_)
                | Self::StorageNotFound { .. }
                | Self::EntityNotFound { .. }
                | Self::UnsupportedForStorage { .. }
                | Self::PolicyViolation { .. }
                | Self::InvalidCredential
                | Self::AmbiguousTarget { .. }
                | Self::InvalidPageToken(_)
                | Self::Forbidden { .. }
        )
    }
}
