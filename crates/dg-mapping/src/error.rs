//! Mapping catalog errors.

use dg_model::EntityKind;
use thiserror::Error;

/// Errors raised while loading mapping lines.
///
/// Every variant is a configuration problem; the router refuses to start
/// when one occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The line does not follow `<kind>$<path>:<attribute>,<type>,<rw|ro>`.
    #[error("malformed mapping line '{line}': {reason}")]
    MalformedLine {
        /// Offending line.
        line: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Unknown mapping type token.
    #[error("unknown mapping type '{0}'")]
    UnknownType(String),

    /// The model path does not exist on the entity kind.
    #[error("{kind} has no field '{path}'")]
    UnknownPath {
        /// Entity kind.
        kind: EntityKind,
        /// Model path.
        path: String,
    },

    /// The mapping type cannot carry the field's shape.
    #[error("{kind}.{path} cannot be mapped as {mapping_type}")]
    IncompatibleType {
        /// Entity kind.
        kind: EntityKind,
        /// Model path.
        path: String,
        /// Requested type.
        mapping_type: String,
    },

    /// Two lines of one layer target the same model path.
    #[error("duplicate mapping for {kind}.{path}")]
    DuplicatePath {
        /// Entity kind.
        kind: EntityKind,
        /// Model path.
        path: String,
    },

    /// The identifier of a kind is not mapped.
    #[error("{kind} identifier '{path}' has no mapping")]
    MissingIdentifier {
        /// Entity kind.
        kind: EntityKind,
        /// Identifier path.
        path: &'static str,
    },
}

impl MappingError {
    /// Creates a malformed-line error.
    #[must_use]
    pub fn malformed(line: &str, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            line: line.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for catalog operations.
pub type MappingResult<T> = std::result::Result<T, MappingError>;

impl From<MappingError> for dg_core::Error {
    fn from(err: MappingError) -> Self {
        Self::Configuration(err.to_string())
    }
}
