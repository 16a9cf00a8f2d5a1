//! User domain model.
//!
//! Users are the primary identity entities of a storage. They may belong
//! to an organization, be members of groups and hold habilitations.

use serde::{Deserialize, Serialize};

use crate::address::PostalAddress;
use crate::attributes::{AttrValue, Attributes};
use crate::group::Group;
use crate::habilitation::Habilitation;
use crate::kind::{Entity, EntityKind};
use crate::metadata::EntryMetadata;
use crate::organization::Organization;

/// A directory user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    // === Identity ===
    /// Unique username within the storage.
    pub username: String,

    // === Profile ===
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,

    // === References ===
    /// Organization the user belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Box<Organization>>,
    /// Group memberships.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
    /// Authorization grants.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub habilitations: Vec<Habilitation>,

    // === Derived ===
    /// Whether a credential is stored. Read-only.
    #[serde(default)]
    pub has_password: bool,
    /// Operational timestamps.
    #[serde(default, skip_serializing_if = "EntryMetadata::is_empty")]
    pub metadata: EntryMetadata,

    // === Custom Attributes ===
    /// Extension attributes.
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl User {
    /// Creates a user with the given username.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }

    /// Sets the mail address.
    #[must_use]
    pub fn with_mail(mut self, mail: impl Into<String>) -> Self {
        self.mail = Some(mail.into());
        self
    }

    /// Sets the first name.
    #[must_use]
    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    /// Sets the last name.
    #[must_use]
    pub fn with_last_name(mut self, name: impl Into<String>) -> Self {
        self.last_name = Some(name.into());
        self
    }

    /// Sets the organization reference.
    #[must_use]
    pub fn with_organization(mut self, organization: Organization) -> Self {
        self.organization = Some(Box::new(organization));
        self
    }

    /// Sets the postal address.
    #[must_use]
    pub fn with_address(mut self, address: PostalAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Adds a habilitation.
    #[must_use]
    pub fn with_habilitation(mut self, habilitation: Habilitation) -> Self {
        self.habilitations.push(habilitation);
        self
    }

    /// Sets an extension attribute.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key, value);
        self
    }

    /// Gets the user's full name.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }

    /// Checks group membership by group name.
    #[must_use]
    pub fn is_member_of(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g.name == group)
    }

    /// Returns the habilitations granted on an application.
    pub fn habilitations_for<'a>(&'a self, application: &'a str) -> impl Iterator<Item = &'a Habilitation> {
        self.habilitations
            .iter()
            .filter(move |h| h.applies_to(application))
    }
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn id(&self) -> &str {
        &self.username
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
    fn new_user_has_defaults() {
        let user = User::new("jdoe");

        assert_eq!(user.username, "jdoe");
        assert!(!user.has_password);
        assert!(user.groups.is_empty());
        assert!(user.attributes.is_empty());
    }

    #[test]
    fn builder_pattern_works() {
        let user = User::new("jdoe")
            .with_mail("jdoe@example.com")
            .with_first_name("John")
            .with_last_name("Doe")
            .with_organization(Organization::new("acme"))
            .with_attribute("room", "B12");

        assert_eq!(user.mail.as_deref(), Some("jdoe@example.com"));
        assert_eq!(user.full_name(), Some("John Doe".to_string()));
        assert_eq!(user.organization.as_deref().map(|o| o.identifier.as_str()), Some("acme"));
        assert_eq!(user.attributes.get_text("room"), Some("B12"));
    }

    #[test]
    fn full_name_handles_partial() {
        assert_eq!(User::new("u1").with_first_name("John").full_name(), Some("John".to_string()));
        assert_eq!(User::new("u2").with_last_name("Doe").full_name(), Some("Doe".to_string()));
        assert_eq!(User::new("u3").full_name(), None);
    }

    #[test]
    fn habilitations_filter_by_application() {
        let user = User::new("jdoe")
            .with_habilitation(Habilitation::new("reader", "crm"))
            .with_habilitation(Habilitation::new("admin", "erp"))
            .with_habilitation(Habilitation::decode("orphan"));

        let roles: Vec<&str> = user.habilitations_for("crm").map(|h| h.role.as_str()).collect();
        assert_eq!(roles, vec!["reader"]);
    }

    #[test]
    fn json_omits_empty_fields() {
        let json = serde_json::to_value(User::new("jdoe")).unwrap();
        assert_eq!(json["username"], "jdoe");
        assert!(json.get("groups").is_none());
        assert!(json.get("mail").is_none());
    }
}
