//! Directory tree layout of one storage.

use dg_core::config::{ObjectClassConfig, StorageConfig};
use dg_core::Error;
use dg_gateway::dn;
use dg_model::EntityKind;

/// Naming attribute of postal address child entries.
pub const ADDRESS_RDN: &str = "l";

/// Prefix of the numbered address line attributes.
pub const ADDRESS_LINE_PREFIX: &str = "addressLine";

const APPLICATION_PLACEHOLDER: &str = "{application}";

/// Where each kind of entry lives in a storage's tree.
#[derive(Debug, Clone)]
pub struct DirectoryLayout {
    storage: String,
    users_dn: Option<String>,
    organizations_dn: Option<String>,
    addresses_dn: Option<String>,
    applications_dn: Option<String>,
    group_container_pattern: Option<String>,
    object_classes: ObjectClassConfig,
}

impl DirectoryLayout {
    /// Builds the layout of a configured storage.
    #[must_use]
    pub fn from_storage(config: &StorageConfig) -> Self {
        Self {
            storage: config.name.clone(),
            users_dn: config.users_dn.clone(),
            organizations_dn: config.organizations_dn.clone(),
            addresses_dn: config.addresses_dn.clone(),
            applications_dn: config.applications_dn.clone(),
            group_container_pattern: config.group_container_pattern.clone(),
            object_classes: config.object_classes.clone(),
        }
    }

    /// Storage name.
    #[must_use]
    pub fn storage(&self) -> &str {
        &self.storage
    }

    /// Checks whether the storage holds entries of the kind.
    #[must_use]
    pub fn supports(&self, kind: EntityKind) -> bool {
        match kind {
            EntityKind::User => self.users_dn.is_some(),
            EntityKind::Organization => self.organizations_dn.is_some(),
            EntityKind::Group | EntityKind::Application => self.applications_dn.is_some(),
        }
    }

    /// The error returned for kinds the storage does not hold.
    #[must_use]
    pub fn unsupported(&self, kind: EntityKind) -> Error {
        Error::UnsupportedForStorage {
            entity_type: kind.as_str(),
            storage: self.storage.clone(),
        }
    }

    /// Container of users, organizations or applications.
    ///
    /// Groups have one container per application, see
    /// [`Self::group_container`].
    #[must_use]
    pub fn container(&self, kind: EntityKind) -> Option<&str> {
        match kind {
            EntityKind::User => self.users_dn.as_deref(),
            EntityKind::Organization => self.organizations_dn.as_deref(),
            EntityKind::Application => self.applications_dn.as_deref(),
            EntityKind::Group => None,
        }
    }

    /// Container of address child entries.
    #[must_use]
    pub fn addresses_dn(&self) -> Option<&str> {
        self.addresses_dn.as_deref()
    }

    /// Returns the DN of an application entry.
    #[must_use]
    pub fn application_dn(&self, rdn_attribute: &str, name: &str) -> Option<String> {
        self.applications_dn
            .as_deref()
            .map(|parent| dn::child(rdn_attribute, name, parent))
    }

    /// Returns the container of an application's groups.
    ///
    /// Without a pattern the application entry itself holds its groups.
    #[must_use]
    pub fn group_container(&self, application_rdn: &str, application: &str) -> Option<String> {
        match &self.group_container_pattern {
            Some(pattern) => Some(pattern.replace(APPLICATION_PLACEHOLDER, &dn::escape_value(application))),
            None => self.application_dn(application_rdn, application),
        }
    }

    /// Recovers the application name from a group DN.
    #[must_use]
    pub fn application_of_group(&self, group_dn: &str) -> Option<String> {
        let container = dn::parent(group_dn)?;
        match &self.group_container_pattern {
            Some(pattern) => {
                let (prefix, suffix) = pattern.split_once(APPLICATION_PLACEHOLDER)?;
                let end = container.len().checked_sub(suffix.len())?;
                let head = container.get(..prefix.len())?;
                let tail = container.get(end..)?;
                if end < prefix.len() || !head.eq_ignore_ascii_case(prefix) || !tail.eq_ignore_ascii_case(suffix) {
                    return None;
                }
                container
                    .get(prefix.len()..end)
                    .map(dn::unescape_value)
                    .filter(|name| !name.is_empty())
            }
            None => {
                let applications = self.applications_dn.as_deref()?;
                if !dn::is_child_of(&container, applications) {
                    return None;
                }
                dn::leading_rdn(&container).map(|(_, value)| value)
            }
        }
    }

    /// Returns the DN of an address child entry.
    #[must_use]
    pub fn address_dn(&self, id: &str) -> Option<String> {
        self.addresses_dn
            .as_deref()
            .map(|parent| dn::child(ADDRESS_RDN, id, parent))
    }

    /// Object classes written on create.
    #[must_use]
    pub fn object_classes(&self, kind: EntityKind) -> &[String] {
        match kind {
            EntityKind::User => &self.object_classes.user,
            EntityKind::Organization => &self.object_classes.organization,
            EntityKind::Group => &self.object_classes.group,
            EntityKind::Application => &self.object_classes.application,
        }
    }

    /// Object classes of address child entries.
    #[must_use]
    pub fn address_object_classes(&self) -> &[String] {
        &self.object_classes.address
    }

    /// The class used to select entries of a kind in searches: the last
    /// configured class other than `top` and `extensibleObject`.
    #[must_use]
    pub fn structural_class(&self, kind: EntityKind) -> Option<&str> {
        self.object_classes(kind)
            .iter()
            .rev()
            .map(String::as_str)
            .find(|class| !class.eq_ignore_ascii_case("top") && !class.eq_ignore_ascii_case("extensibleObject"))
    }
}
