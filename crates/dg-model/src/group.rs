//! Group domain model.
//!
//! Groups belong to an application and hold user references.

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::kind::{Entity, EntityKind};
use crate::metadata::EntryMetadata;
use crate::user::User;

/// A group of users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group name, unique within the storage.
    pub name: String,

    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Owning application; absent on unresolved references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,

    /// Members.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<User>,

    /// Operational timestamps.
    #[serde(default, skip_serializing_if = "EntryMetadata::is_empty")]
    pub metadata: EntryMetadata,

    /// Extension attributes.
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Group {
    /// Creates a group owned by an application.
    #[must_use]
    pub fn new(name: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            application: Some(application.into()),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a member by username.
    #[must_use]
    pub fn with_member(mut self, username: &str) -> Self {
        self.users.push(User::stub(username));
        self
    }

    /// Checks membership by username.
    #[must_use]
    pub fn has_member(&self, username: &str) -> bool {
        self.users.iter().any(|u| u.username == username)
    }

    /// Returns member usernames.
    #[must_use]
    pub fn member_names(&self) -> Vec<&str> {
        self.users.iter().map(|u| u.username.as_str()).collect()
    }
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;

    fn id(&self) -> &str {
        &self.name
    }

    fn stub(id: &str) -> Self {
        Self {
            name: id.to_string(),
            ..Self::default()
        }
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntryMetadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_by_username() {
        let group = Group::new("sales_crm", "crm")
            .with_member("jdoe")
            .with_member("asmith");

        assert!(group.has_member("jdoe"));
        assert!(!group.has_member("nobody"));
        assert_eq!(group.member_names(), vec!["jdoe", "asmith"]);
    }

    #[test]
    fn stub_has_no_application() {
        let stub = Group::stub("sales_crm");
        assert_eq!(stub.application, None);
        assert!(stub.users.is_empty());
    }
}
