//! Application domain model.

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;
use crate::group::Group;
use crate::kind::{Entity, EntityKind};
use crate::metadata::EntryMetadata;

/// An application owning groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application name, unique within the storage.
    pub name: String,

    /// Owner reference (free text).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Whether group members may manage their own group's membership.
    #[serde(default)]
    pub self_managed_groups: bool,

    /// Groups owned by the application.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,

    /// Operational timestamps.
    #[serde(default, skip_serializing_if = "EntryMetadata::is_empty")]
    pub metadata: EntryMetadata,

    /// Extension attributes.
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Application {
    /// Creates an application.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Sets the self-managed groups flag.
    #[must_use]
    pub const fn with_self_managed_groups(mut self, enabled: bool) -> Self {
        self.self_managed_groups = enabled;
        self
    }

    /// Adds an initial group.
    #[must_use]
    pub fn with_group(mut self, name: impl Into<String>) -> Self {
        let group = Group::new(name, self.name.clone());
        self.groups.push(group);
        self
    }

    /// Finds an owned group by name.
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }
}

impl Entity for Application {
    const KIND: EntityKind = EntityKind::Application;

    fn id(&self) -> &str {
        &self.name
    }

    fn stub(id: &str) -> Self {
        Self::new(id)
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
    fn builder_sets_groups_owned_by_self() {
        let app = Application::new("crm")
            .with_owner("it-dept")
            .with_self_managed_groups(true)
            .with_group("users_crm");

        assert!(app.self_managed_groups);
        assert_eq!(app.group("users_crm").and_then(|g| g.application.as_deref()), Some("crm"));
        assert!(app.group("admins_crm").is_none());
    }

    #[test]
    fn flag_defaults_to_false() {
        let app: Application = serde_json::from_str(r#"{"name":"erp"}"#).unwrap();
        assert!(!app.self_managed_groups);
        assert!(app.groups.is_empty());
    }
}
