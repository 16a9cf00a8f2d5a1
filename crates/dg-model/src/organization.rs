//! Organization domain model.
//!
//! Organizations may be nested: `organization` holds the parent, itself
//! possibly carrying its own parent up to the resolution depth used when
//! the entity was read.

use serde::{Deserialize, Serialize};

use crate::address::PostalAddress;
use crate::attributes::Attributes;
use crate::kind::{Entity, EntityKind};
use crate::metadata::EntryMetadata;

/// An organization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier within a storage.
    pub identifier: String,

    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<PostalAddress>,

    /// Parent organization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<Box<Organization>>,

    /// Operational timestamps.
    #[serde(default, skip_serializing_if = "EntryMetadata::is_empty")]
    pub metadata: EntryMetadata,

    /// Extension attributes.
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
}

impl Organization {
    /// Creates an organization with the given identifier.
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    /// Sets the parent organization.
    #[must_use]
    pub fn with_parent(mut self, parent: Organization) -> Self {
        self.organization = Some(Box::new(parent));
        self
    }

    /// Sets the address.
    #[must_use]
    pub fn with_address(mut self, address: PostalAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Returns the parent identifier, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&str> {
        self.organization.as_deref().map(|o| o.identifier.as_str())
    }

    /// Iterates over the resolved ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Organization> {
        std::iter::successors(self.organization.as_deref(), |o| o.organization.as_deref())
    }
}

impl Entity for Organization {
    const KIND: EntityKind = EntityKind::Organization;

    fn id(&self) -> &str {
        &self.identifier
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
