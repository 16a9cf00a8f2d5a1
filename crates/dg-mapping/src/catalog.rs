//! Store mapping catalog.
//!
//! A store mapping binds one model path of an entity kind to one backend
//! attribute, with a value type and a read-only flag. Mappings are written
//! as single lines:
//!
//! ```text
//! user$mail:mail,STRING,rw
//! user$attributes.phone:telephoneNumber,LIST_STRING,rw
//! organization$organization:organizationRef,ORGANIZATION,rw
//! ```
//!
//! A [`Catalog`] is resolved per storage from four layers: the built-in
//! defaults, the global configuration, the tenant and the storage. A later
//! layer replaces an earlier one for the same `(kind, path)`; everything
//! else is inherited.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use dg_model::EntityKind;

use crate::error::{MappingError, MappingResult};
use crate::field::{field_specs, identifier_path, ModelPath, EXTENSION_TYPES};

// ============================================================================
// Mapping types
// ============================================================================

/// How a backend attribute is converted to and from a model value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingType {
    /// First value as text.
    String,
    /// All values as a text list.
    ListString,
    /// `TRUE` / `FALSE`.
    Boolean,
    /// True when the attribute is present. Read-only.
    Exists,
    /// DN of a postal address child entry.
    Address,
    /// DN of an organization entry.
    Organization,
    /// DNs of user entries.
    ListUser,
    /// DNs of group entries.
    ListGroup,
    /// Habilitation tokens.
    ListHabilitation,
    /// Generalized time. Read-only.
    Timestamp,
}

impl MappingType {
    /// All mapping types.
    pub const ALL: [Self; 10] = [
        Self::String,
        Self::ListString,
        Self::Boolean,
        Self::Exists,
        Self::Address,
        Self::Organization,
        Self::ListUser,
        Self::ListGroup,
        Self::ListHabilitation,
        Self::Timestamp,
    ];

    /// Returns the token used in mapping lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::ListString => "LIST_STRING",
            Self::Boolean => "BOOLEAN",
            Self::Exists => "EXISTS",
            Self::Address => "ADDRESS",
            Self::Organization => "ORGANIZATION",
            Self::ListUser => "LIST_USER",
            Self::ListGroup => "LIST_GROUP",
            Self::ListHabilitation => "LIST_HABILITATION",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// Derived types are never written, whatever the line says.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        !matches!(self, Self::Exists | Self::Timestamp)
    }

    /// Checks whether values are DNs of other entries.
    #[must_use]
    pub const fn is_reference(self) -> bool {
        matches!(
            self,
            Self::Address | Self::Organization | Self::ListUser | Self::ListGroup
        )
    }
}

impl fmt::Display for MappingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MappingType {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(token))
            .ok_or_else(|| MappingError::UnknownType(token.to_string()))
    }
}

// ============================================================================
// Store mapping
// ============================================================================

/// One `(kind, model path) -> attribute` binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreMapping {
    /// Entity kind.
    pub kind: EntityKind,
    /// Model path on the entity.
    pub path: ModelPath,
    /// Backend attribute name.
    pub attribute: String,
    /// Value conversion.
    pub mapping_type: MappingType,
    /// Access flag as written on the line.
    pub writable: bool,
}

impl StoreMapping {
    /// Parses a mapping line.
    ///
    /// ## Errors
    ///
    /// Returns an error if the line is malformed, names an unknown kind,
    /// type or field, or pairs a field with a type it cannot carry.
    pub fn parse(line: &str) -> MappingResult<Self> {
        let (kind, rest) = line
            .trim()
            .split_once('$')
            .ok_or_else(|| MappingError::malformed(line, "missing '$' after the entity kind"))?;
        let kind: EntityKind = kind
            .parse()
            .map_err(|e: dg_model::kind::UnknownKind| MappingError::malformed(line, e.to_string()))?;

        let (path, spec) = rest
            .split_once(':')
            .ok_or_else(|| MappingError::malformed(line, "missing ':' after the model path"))?;
        let path = ModelPath::parse(path)
            .ok_or_else(|| MappingError::malformed(line, format!("invalid model path '{path}'")))?;

        let parts: Vec<&str> = spec.split(',').map(str::trim).collect();
        let [attribute, mapping_type, access] = parts.as_slice() else {
            return Err(MappingError::malformed(line, "expected '<attribute>,<type>,<rw|ro>'"));
        };
        if !is_attribute_name(attribute) {
            return Err(MappingError::malformed(line, format!("invalid attribute name '{attribute}'")));
        }
        let mapping_type: MappingType = mapping_type.parse()?;
        let writable = match access.to_ascii_lowercase().as_str() {
            "rw" => true,
            "ro" => false,
            other => return Err(MappingError::malformed(line, format!("access must be rw or ro, got '{other}'"))),
        };

        let mapping = Self {
            kind,
            path,
            attribute: (*attribute).to_string(),
            mapping_type,
            writable,
        };
        mapping.validate()?;
        Ok(mapping)
    }

    /// Checks whether the codec writes this mapping.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.writable && self.mapping_type.is_writable()
    }

    fn validate(&self) -> MappingResult<()> {
        let accepts = match &self.path {
            ModelPath::Extension(_) => EXTENSION_TYPES,
            ModelPath::Field(name) => field_specs(self.kind)
                .iter()
                .find(|spec| spec.path == name)
                .map(|spec| spec.accepts)
                .ok_or_else(|| MappingError::UnknownPath {
                    kind: self.kind,
                    path: name.clone(),
                })?,
        };
        if accepts.contains(&self.mapping_type) {
            Ok(())
        } else {
            Err(MappingError::IncompatibleType {
                kind: self.kind,
                path: self.path.to_string(),
                mapping_type: self.mapping_type.to_string(),
            })
        }
    }

    fn key(&self) -> (EntityKind, String) {
        (self.kind, self.path.to_string())
    }
}

impl fmt::Display for StoreMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}${}:{},{},{}",
            self.kind,
            self.path,
            self.attribute,
            self.mapping_type,
            if self.writable { "rw" } else { "ro" }
        )
    }
}

fn is_attribute_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-' || c == ';')
}

// ============================================================================
// Catalog
// ============================================================================

/// Built-in mapping lines, the first catalog layer.
pub const BUILTIN: &[&str] = &[
    "user$username:uid,STRING,rw",
    "user$lastName:sn,STRING,rw",
    "user$firstName:givenName,STRING,rw",
    "user$mail:mail,STRING,rw",
    "user$address:postalAddressRef,ADDRESS,rw",
    "user$organization:organizationRef,ORGANIZATION,rw",
    "user$groups:memberOf,LIST_GROUP,ro",
    "user$habilitations:habilitation,LIST_HABILITATION,rw",
    "user$hasPassword:userPassword,EXISTS,ro",
    "user$metadata.createdAt:createTimestamp,TIMESTAMP,ro",
    "user$metadata.modifiedAt:modifyTimestamp,TIMESTAMP,ro",
    "user$attributes.common_name:cn,STRING,rw",
    "user$attributes.display_name:displayName,STRING,rw",
    "user$attributes.description:description,STRING,rw",
    "user$attributes.phone:telephoneNumber,LIST_STRING,rw",
    "organization$identifier:uid,STRING,rw",
    "organization$address:postalAddressRef,ADDRESS,rw",
    "organization$organization:organizationRef,ORGANIZATION,rw",
    "organization$attributes.name:o,STRING,rw",
    "organization$attributes.description:description,STRING,rw",
    "organization$metadata.createdAt:createTimestamp,TIMESTAMP,ro",
    "organization$metadata.modifiedAt:modifyTimestamp,TIMESTAMP,ro",
    "group$name:cn,STRING,rw",
    "group$description:description,STRING,rw",
    "group$users:uniqueMember,LIST_USER,rw",
    "group$metadata.createdAt:createTimestamp,TIMESTAMP,ro",
    "group$metadata.modifiedAt:modifyTimestamp,TIMESTAMP,ro",
    "application$name:ou,STRING,rw",
    "application$owner:applicationOwner,STRING,rw",
    "application$selfManagedGroups:selfManagedGroups,BOOLEAN,rw",
    "application$attributes.description:description,STRING,rw",
    "application$metadata.createdAt:createTimestamp,TIMESTAMP,ro",
    "application$metadata.modifiedAt:modifyTimestamp,TIMESTAMP,ro",
];

/// Resolved mappings of one storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    mappings: Vec<StoreMapping>,
    identifiers: BTreeMap<EntityKind, String>,
}

impl Catalog {
    /// Resolves the built-in layer alone.
    ///
    /// ## Errors
    ///
    /// Returns an error only if the built-in lines are inconsistent.
    pub fn builtin() -> MappingResult<Self> {
        Self::layered::<&str>(&[])
    }

    /// Resolves a catalog from layers applied over the built-in defaults,
    /// lowest precedence first.
    ///
    /// Blank lines and lines starting with `#` are skipped.
    ///
    /// ## Errors
    ///
    /// Returns an error on a malformed line, on two lines of one layer
    /// naming the same path, or when a kind loses its identifier mapping.
    pub fn layered<S: AsRef<str>>(layers: &[&[S]]) -> MappingResult<Self> {
        let mut mappings: Vec<StoreMapping> = Vec::new();

        let builtin: Vec<&str> = BUILTIN.to_vec();
        let all_layers = std::iter::once(builtin).chain(
            layers
                .iter()
                .map(|layer| layer.iter().map(AsRef::as_ref).collect::<Vec<&str>>()),
        );

        for layer in all_layers {
            let mut seen = HashSet::new();
            for line in layer {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let mapping = StoreMapping::parse(line)?;
                if !seen.insert(mapping.key()) {
                    return Err(MappingError::DuplicatePath {
                        kind: mapping.kind,
                        path: mapping.path.to_string(),
                    });
                }
                match mappings.iter_mut().find(|m| m.key() == mapping.key()) {
                    Some(existing) => *existing = mapping,
                    None => mappings.push(mapping),
                }
            }
        }

        let mut identifiers = BTreeMap::new();
        for kind in EntityKind::ALL {
            let path = identifier_path(kind);
            let attribute = mappings
                .iter()
                .find(|m| m.kind == kind && m.path.is_field(path))
                .map(|m| m.attribute.clone())
                .ok_or(MappingError::MissingIdentifier { kind, path })?;
            identifiers.insert(kind, attribute);
        }

        Ok(Self {
            mappings,
            identifiers,
        })
    }

    /// Iterates over every mapping.
    pub fn iter(&self) -> impl Iterator<Item = &StoreMapping> {
        self.mappings.iter()
    }

    /// Iterates over the mappings of one kind.
    pub fn for_kind(&self, kind: EntityKind) -> impl Iterator<Item = &StoreMapping> {
        self.mappings.iter().filter(move |m| m.kind == kind)
    }

    /// Looks up the mapping of a model path.
    #[must_use]
    pub fn get(&self, kind: EntityKind, path: &str) -> Option<&StoreMapping> {
        self.for_kind(kind).find(|m| m.path.to_string() == path)
    }

    /// Returns the attribute a model path is stored in.
    #[must_use]
    pub fn attribute(&self, kind: EntityKind, path: &str) -> Option<&str> {
        self.get(kind, path).map(|m| m.attribute.as_str())
    }

    /// Returns the attribute holding the identifier, also used as RDN.
    #[must_use]
    pub fn rdn_attribute(&self, kind: EntityKind) -> &str {
        self.identifiers.get(&kind).map_or("cn", String::as_str)
    }

    /// Checks whether any mapping of the kind reads the attribute.
    #[must_use]
    pub fn is_mapped_attribute(&self, kind: EntityKind, attribute: &str) -> bool {
        self.for_kind(kind)
            .any(|m| m.attribute.eq_ignore_ascii_case(attribute))
    }

    /// Number of mappings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Checks whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
