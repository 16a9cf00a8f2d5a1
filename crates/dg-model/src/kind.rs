//! Entity kinds and the common entity contract.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::metadata::EntryMetadata;

/// Kind of directory entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A person.
    User,
    /// An organization, possibly nested under a parent.
    Organization,
    /// A group of users owned by an application.
    Group,
    /// An application owning groups.
    Application,
}

impl EntityKind {
    /// Every kind, in catalog order.
    pub const ALL: [Self; 4] = [Self::User, Self::Organization, Self::Group, Self::Application];

    /// Returns the lowercase name used in mapping lines and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organization => "organization",
            Self::Group => "group",
            Self::Application => "application",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// Behaviour shared by every directory entity.
pub trait Entity: Clone + Send + Sync + 'static {
    /// The kind of this entity.
    const KIND: EntityKind;

    /// Returns the identifier (username, organization id, group or application name).
    fn id(&self) -> &str;

    /// Builds a reference stub carrying only the identifier.
    fn stub(id: &str) -> Self;

    /// Returns the extension attributes.
    fn attributes(&self) -> &Attributes;

    /// Returns the extension attributes mutably.
    fn attributes_mut(&mut self) -> &mut Attributes;

    /// Returns the operational metadata.
    fn metadata(&self) -> &EntryMetadata;

    /// Returns the operational metadata mutably.
    fn metadata_mut(&mut self) -> &mut EntryMetadata;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("User".parse::<EntityKind>(), Ok(EntityKind::User));
        assert_eq!(" group ".parse::<EntityKind>(), Ok(EntityKind::Group));
        assert!("realm".parse::<EntityKind>().is_err());
    }

    #[test]
    fn display_matches_as_str() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }
}
