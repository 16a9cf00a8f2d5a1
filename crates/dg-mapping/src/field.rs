//! Path-based access to entity fields.
//!
//! Mapping lines name either a typed field (`mail`, `organization`,
//! `metadata.createdAt`) or a key of the open attribute map
//! (`attributes.phone`, `attributes.contact.fax`). [`Mapped`] gives the
//! codec uniform read and write access to both.

use std::fmt;

use chrono::{DateTime, Utc};
use dg_model::{
    AttrValue, Application, Entity, EntityKind, Group, Habilitation, Organization, PostalAddress, User,
};

use crate::catalog::MappingType;

/// First segment of open-map paths.
pub const EXTENSION_PREFIX: &str = "attributes";

/// Types an open-map path can be mapped with.
pub const EXTENSION_TYPES: &[MappingType] = &[
    MappingType::String,
    MappingType::ListString,
    MappingType::Boolean,
    MappingType::Exists,
];

/// A parsed model path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModelPath {
    /// A typed field of the entity.
    Field(String),
    /// A key path inside the open attribute map.
    Extension(Vec<String>),
}

impl ModelPath {
    /// Parses a path. Returns `None` for empty segments or whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.chars().any(char::is_whitespace) {
            return None;
        }
        match raw.strip_prefix(EXTENSION_PREFIX).and_then(|rest| rest.strip_prefix('.')) {
            Some(rest) => {
                let segments: Vec<String> = rest.split('.').map(ToString::to_string).collect();
                segments
                    .iter()
                    .all(|s| !s.is_empty())
                    .then_some(Self::Extension(segments))
            }
            None => raw.split('.').all(|s| !s.is_empty()).then(|| Self::Field(raw.to_string())),
        }
    }

    /// Checks whether this is the named typed field.
    #[must_use]
    pub fn is_field(&self, name: &str) -> bool {
        matches!(self, Self::Field(field) if field == name)
    }
}

impl fmt::Display for ModelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Extension(segments) => write!(f, "{EXTENSION_PREFIX}.{}", segments.join(".")),
        }
    }
}

/// A field value in transit between an entity and the codec.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Single text value.
    Text(String),
    /// Text list.
    TextList(Vec<String>),
    /// Flag.
    Flag(bool),
    /// Postal address.
    Address(PostalAddress),
    /// Organization reference.
    Organization(Organization),
    /// User references.
    Users(Vec<User>),
    /// Group references.
    Groups(Vec<Group>),
    /// Habilitations.
    Habilitations(Vec<Habilitation>),
    /// Timestamp.
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    fn into_text(self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value),
            Self::TextList(values) => values.into_iter().next(),
            _ => None,
        }
    }

    fn into_flag(self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(value),
            _ => None,
        }
    }

    fn into_timestamp(self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(value),
            _ => None,
        }
    }

    fn into_attr_value(self) -> Option<AttrValue> {
        match self {
            Self::Text(value) => Some(AttrValue::Text(value)),
            Self::TextList(values) => Some(AttrValue::List(values)),
            Self::Flag(value) => Some(AttrValue::Bool(value)),
            _ => None,
        }
    }

    fn from_attr_value(value: &AttrValue) -> Option<Self> {
        match value {
            AttrValue::Text(text) => Some(Self::Text(text.clone())),
            AttrValue::List(values) => Some(Self::TextList(values.clone())),
            AttrValue::Bool(flag) => Some(Self::Flag(*flag)),
            AttrValue::Map(_) => None,
        }
    }
}

/// A typed field and the mapping types it accepts.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Path of the field.
    pub path: &'static str,
    /// Accepted mapping types.
    pub accepts: &'static [MappingType],
}

impl FieldSpec {
    const fn new(path: &'static str, accepts: &'static [MappingType]) -> Self {
        Self { path, accepts }
    }
}

const TEXT: &[MappingType] = &[MappingType::String];
const CREATED: FieldSpec = FieldSpec::new("metadata.createdAt", &[MappingType::Timestamp]);
const MODIFIED: FieldSpec = FieldSpec::new("metadata.modifiedAt", &[MappingType::Timestamp]);

/// An entity the codec can read and write by path.
pub trait Mapped: Entity {
    /// Path of the identifier field.
    const IDENTIFIER: &'static str;

    /// Typed fields of the entity.
    const FIELDS: &'static [FieldSpec];

    /// Reads a typed field. `None` means null.
    fn field(&self, path: &str) -> Option<FieldValue>;

    /// Writes a typed field. `None` clears it; values of the wrong shape
    /// are ignored.
    fn set_field(&mut self, path: &str, value: Option<FieldValue>);

    /// Application whose group container names the entry.
    fn parent_application(&self) -> Option<&str> {
        None
    }

    /// Records the application recovered from the entry's DN.
    fn set_parent_application(&mut self, _application: String) {}
}

/// Returns the typed fields of a kind.
#[must_use]
pub fn field_specs(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::User => User::FIELDS,
        EntityKind::Organization => Organization::FIELDS,
        EntityKind::Group => Group::FIELDS,
        EntityKind::Application => Application::FIELDS,
    }
}

/// Returns the identifier path of a kind.
#[must_use]
pub const fn identifier_path(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => User::IDENTIFIER,
        EntityKind::Organization => Organization::IDENTIFIER,
        EntityKind::Group => Group::IDENTIFIER,
        EntityKind::Application => Application::IDENTIFIER,
    }
}

/// Reads a value by model path.
#[must_use]
pub fn read<T: Mapped>(entity: &T, path: &ModelPath) -> Option<FieldValue> {
    match path {
        ModelPath::Field(name) => entity.field(name),
        ModelPath::Extension(segments) => {
            let keys: Vec<&str> = segments.iter().map(String::as_str).collect();
            entity
                .attributes()
                .get_path(&keys)
                .and_then(FieldValue::from_attr_value)
        }
    }
}

/// Writes a value by model path. `None` clears it.
pub fn write<T: Mapped>(entity: &mut T, path: &ModelPath, value: Option<FieldValue>) {
    match path {
        ModelPath::Field(name) => entity.set_field(name, value),
        ModelPath::Extension(segments) => {
            let keys: Vec<&str> = segments.iter().map(String::as_str).collect();
            match value.and_then(FieldValue::into_attr_value) {
                Some(value) => entity.attributes_mut().set_path(&keys, value),
                None => {
                    entity.attributes_mut().remove_path(&keys);
                }
            }
        }
    }
}

fn metadata_field<T: Entity>(entity: &T, path: &str) -> Option<FieldValue> {
    let metadata = entity.metadata();
    match path {
        "metadata.createdAt" => metadata.created_at.map(FieldValue::Timestamp),
        "metadata.modifiedAt" => metadata.modified_at.map(FieldValue::Timestamp),
        _ => None,
    }
}

fn set_metadata_field<T: Entity>(entity: &mut T, path: &str, value: Option<FieldValue>) {
    let value = value.and_then(FieldValue::into_timestamp);
    let metadata = entity.metadata_mut();
    match path {
        "metadata.createdAt" => metadata.created_at = value,
        "metadata.modifiedAt" => metadata.modified_at = value,
        _ => {}
    }
}

fn non_empty<T>(values: &[T]) -> Option<&[T]> {
    (!values.is_empty()).then_some(values)
}

// ============================================================================
// Entity implementations
// ============================================================================

impl Mapped for User {
    const IDENTIFIER: &'static str = "username";

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("username", TEXT),
        FieldSpec::new("lastName", TEXT),
        FieldSpec::new("firstName", TEXT),
        FieldSpec::new("mail", TEXT),
        FieldSpec::new("address", &[MappingType::Address]),
        FieldSpec::new("organization", &[MappingType::Organization]),
        FieldSpec::new("groups", &[MappingType::ListGroup]),
        FieldSpec::new("habilitations", &[MappingType::ListHabilitation]),
        FieldSpec::new("hasPassword", &[MappingType::Exists]),
        CREATED,
        MODIFIED,
    ];

    fn field(&self, path: &str) -> Option<FieldValue> {
        match path {
            "username" => Some(FieldValue::Text(self.username.clone())),
            "lastName" => self.last_name.clone().map(FieldValue::Text),
            "firstName" => self.first_name.clone().map(FieldValue::Text),
            "mail" => self.mail.clone().map(FieldValue::Text),
            "address" => self.address.clone().map(FieldValue::Address),
            "organization" => self
                .organization
                .as_deref()
                .map(|org| FieldValue::Organization(org.clone())),
            "groups" => non_empty(&self.groups).map(|g| FieldValue::Groups(g.to_vec())),
            "habilitations" => non_empty(&self.habilitations).map(|h| FieldValue::Habilitations(h.to_vec())),
            "hasPassword" => Some(FieldValue::Flag(self.has_password)),
            _ => metadata_field(self, path),
        }
    }

    fn set_field(&mut self, path: &str, value: Option<FieldValue>) {
        match (path, value) {
            ("username", value) => {
                if let Some(username) = value.and_then(FieldValue::into_text) {
                    self.username = username;
                }
            }
            ("lastName", value) => self.last_name = value.and_then(FieldValue::into_text),
            ("firstName", value) => self.first_name = value.and_then(FieldValue::into_text),
            ("mail", value) => self.mail = value.and_then(FieldValue::into_text),
            ("address", Some(FieldValue::Address(address))) => self.address = Some(address),
            ("address", _) => self.address = None,
            ("organization", Some(FieldValue::Organization(org))) => self.organization = Some(Box::new(org)),
            ("organization", _) => self.organization = None,
            ("groups", Some(FieldValue::Groups(groups))) => self.groups = groups,
            ("groups", _) => self.groups.clear(),
            ("habilitations", Some(FieldValue::Habilitations(habilitations))) => {
                self.habilitations = habilitations;
            }
            ("habilitations", _) => self.habilitations.clear(),
            ("hasPassword", value) => {
                self.has_password = value.and_then(FieldValue::into_flag).unwrap_or(false);
            }
            (path, value) => set_metadata_field(self, path, value),
        }
    }
}

impl Mapped for Organization {
    const IDENTIFIER: &'static str = "identifier";

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("identifier", TEXT),
        FieldSpec::new("address", &[MappingType::Address]),
        FieldSpec::new("organization", &[MappingType::Organization]),
        CREATED,
        MODIFIED,
    ];

    fn field(&self, path: &str) -> Option<FieldValue> {
        match path {
            "identifier" => Some(FieldValue::Text(self.identifier.clone())),
            "address" => self.address.clone().map(FieldValue::Address),
            "organization" => self
                .organization
                .as_deref()
                .map(|org| FieldValue::Organization(org.clone())),
            _ => metadata_field(self, path),
        }
    }

    fn set_field(&mut self, path: &str, value: Option<FieldValue>) {
        match (path, value) {
            ("identifier", value) => {
                if let Some(identifier) = value.and_then(FieldValue::into_text) {
                    self.identifier = identifier;
                }
            }
            ("address", Some(FieldValue::Address(address))) => self.address = Some(address),
            ("address", _) => self.address = None,
            ("organization", Some(FieldValue::Organization(org))) => self.organization = Some(Box::new(org)),
            ("organization", _) => self.organization = None,
            (path, value) => set_metadata_field(self, path, value),
        }
    }
}

impl Mapped for Group {
    const IDENTIFIER: &'static str = "name";

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("name", TEXT),
        FieldSpec::new("description", TEXT),
        FieldSpec::new("users", &[MappingType::ListUser]),
        CREATED,
        MODIFIED,
    ];

    fn field(&self, path: &str) -> Option<FieldValue> {
        match path {
            "name" => Some(FieldValue::Text(self.name.clone())),
            "description" => self.description.clone().map(FieldValue::Text),
            "users" => non_empty(&self.users).map(|u| FieldValue::Users(u.to_vec())),
            _ => metadata_field(self, path),
        }
    }

    fn set_field(&mut self, path: &str, value: Option<FieldValue>) {
        match (path, value) {
            ("name", value) => {
                if let Some(name) = value.and_then(FieldValue::into_text) {
                    self.name = name;
                }
            }
            ("description", value) => self.description = value.and_then(FieldValue::into_text),
            ("users", Some(FieldValue::Users(users))) => self.users = users,
            ("users", _) => self.users.clear(),
            (path, value) => set_metadata_field(self, path, value),
        }
    }

    fn parent_application(&self) -> Option<&str> {
        self.application.as_deref()
    }

    fn set_parent_application(&mut self, application: String) {
        self.application = Some(application);
    }
}

impl Mapped for Application {
    const IDENTIFIER: &'static str = "name";

    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::new("name", TEXT),
        FieldSpec::new("owner", TEXT),
        FieldSpec::new("selfManagedGroups", &[MappingType::Boolean, MappingType::Exists]),
        CREATED,
        MODIFIED,
    ];

    fn field(&self, path: &str) -> Option<FieldValue> {
        match path {
            "name" => Some(FieldValue::Text(self.name.clone())),
            "owner" => self.owner.clone().map(FieldValue::Text),
            "selfManagedGroups" => Some(FieldValue::Flag(self.self_managed_groups)),
            _ => metadata_field(self, path),
        }
    }

    fn set_field(&mut self, path: &str, value: Option<FieldValue>) {
        match (path, value) {
            ("name", value) => {
                if let Some(name) = value.and_then(FieldValue::into_text) {
                    self.name = name;
                }
            }
            ("owner", value) => self.owner = value.and_then(FieldValue::into_text),
            ("selfManagedGroups", value) => {
                self.self_managed_groups = value.and_then(FieldValue::into_flag).unwrap_or(false);
            }
            (path, value) => set_metadata_field(self, path, value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_paths() {
        assert_eq!(ModelPath::parse("mail"), Some(ModelPath::Field("mail".into())));
        assert_eq!(
            ModelPath::parse("attributes.contact.fax"),
            Some(ModelPath::Extension(vec!["contact".into(), "fax".into()]))
        );
        assert_eq!(
            ModelPath::parse("metadata.createdAt"),
            Some(ModelPath::Field("metadata.createdAt".into()))
        );
        assert_eq!(ModelPath::parse("attributes..x"), None);
        assert_eq!(ModelPath::parse("first name"), None);
        assert_eq!(ModelPath::parse(""), None);
    }

    #[test]
    fn path_display_round_trips() {
        for raw in ["mail", "attributes.contact.fax", "metadata.modifiedAt"] {
            assert_eq!(ModelPath::parse(raw).unwrap().to_string(), raw);
        }
    }

    #[test]
    fn extension_paths_use_the_open_map() {
        let mut user = User::new("jdoe");
        let path = ModelPath::parse("attributes.contact.fax").unwrap();

        write(&mut user, &path, Some(FieldValue::Text("+33 1 00".into())));
        assert_eq!(read(&user, &path), Some(FieldValue::Text("+33 1 00".into())));

        write(&mut user, &path, None);
        assert_eq!(read(&user, &path), None);
        assert!(user.attributes.is_empty());
    }

    #[test]
    fn typed_fields_round_trip_through_paths() {
        let mut user = User::new("jdoe");
        user.set_field("mail", Some(FieldValue::Text("jdoe@acme.test".into())));
        user.set_field("habilitations", Some(FieldValue::Habilitations(vec![Habilitation::new("reader", "crm")])));
        assert_eq!(user.mail.as_deref(), Some("jdoe@acme.test"));
        assert_eq!(user.habilitations.len(), 1);

        user.set_field("mail", None);
        assert_eq!(user.field("mail"), None);
        assert_eq!(user.field("groups"), None);
    }

    #[test]
    fn wrong_shapes_are_ignored_for_identifiers() {
        let mut group = Group::new("crm_readers", "crm");
        group.set_field("name", Some(FieldValue::Flag(true)));
        assert_eq!(group.name, "crm_readers");
    }

    #[test]
    fn every_kind_declares_its_identifier() {
        for kind in EntityKind::ALL {
            let id = identifier_path(kind);
            assert!(field_specs(kind).iter().any(|spec| spec.path == id), "{kind}");
        }
    }
}
