//! Attribute codec: model entities to attribute sets and back.
//!
//! Decoding never fails as a whole. A value that cannot be converted
//! leaves its field null and is logged at debug level. Attributes no
//! mapping reads are copied into the entity's open attribute map, except
//! `objectClass` and `userPassword`.
//!
//! References are written as DNs. On read, organizations and addresses
//! are resolved from a [`DecodeContext`] the caller fills with the
//! referenced entries; anything missing from it decodes to a stub that
//! only carries the identifier.

use std::collections::HashMap;
use std::sync::Arc;

use dg_core::{Error, Result};
use dg_gateway::entry::AttributeSet;
use dg_gateway::{dn, Filter, Modification, RawEntry, OBJECT_CLASS, USER_PASSWORD};
use dg_model::address::MAX_LINES;
use dg_model::metadata::parse_generalized_time;
use dg_model::{AttrValue, Entity, EntityKind, Group, Habilitation, Organization, PostalAddress, User};

use crate::catalog::{Catalog, MappingType, StoreMapping};
use crate::field::{read, write, FieldValue, Mapped};
use crate::layout::{DirectoryLayout, ADDRESS_LINE_PREFIX, ADDRESS_RDN};

/// Attributes never copied into the open map.
const IGNORED: &[&str] = &[
    OBJECT_CLASS,
    USER_PASSWORD,
    "structuralObjectClass",
    "entryDN",
    "entryCSN",
    "subschemaSubentry",
    "hasSubordinates",
    "creatorsName",
    "modifiersName",
];

const TRUE: &str = "TRUE";
const FALSE: &str = "FALSE";

/// An entry ready to be added, with the child entries it references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedEntry {
    /// DN of the entry.
    pub dn: String,
    /// Attributes of the entry.
    pub attributes: AttributeSet,
    /// Child entries to create first (postal addresses).
    pub children: Vec<RawEntry>,
}

impl EncodedEntry {
    /// Splits into the entry and its children.
    #[must_use]
    pub fn into_parts(self) -> (RawEntry, Vec<RawEntry>) {
        (RawEntry::new(self.dn, self.attributes), self.children)
    }
}

/// Modifications turning one entity state into another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedUpdate {
    /// Attribute modifications.
    pub modifications: Vec<Modification>,
    /// Child entries the new state references.
    pub children: Vec<RawEntry>,
}

impl EncodedUpdate {
    /// Checks whether nothing changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty() && self.children.is_empty()
    }
}

/// Entries available for reference resolution during one decode.
#[derive(Debug, Clone, Default)]
pub struct DecodeContext {
    entries: HashMap<String, RawEntry>,
    organization_depth: usize,
}

impl DecodeContext {
    /// Creates an empty context resolving at most `organization_depth`
    /// organization hops.
    #[must_use]
    pub fn new(organization_depth: usize) -> Self {
        Self {
            entries: HashMap::new(),
            organization_depth,
        }
    }

    /// Adds a fetched entry.
    pub fn insert(&mut self, entry: RawEntry) {
        self.entries.insert(dn::normalize(&entry.dn), entry);
    }

    /// Looks up an entry by DN.
    #[must_use]
    pub fn get(&self, dn: &str) -> Option<&RawEntry> {
        self.entries.get(&dn::normalize(dn))
    }

    /// Checks whether an entry is known.
    #[must_use]
    pub fn contains(&self, dn: &str) -> bool {
        self.entries.contains_key(&dn::normalize(dn))
    }

    /// Maximum organization hops.
    #[must_use]
    pub const fn organization_depth(&self) -> usize {
        self.organization_depth
    }

    /// Number of known entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether no entry is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Remaining organization hops and the DNs already on the chain.
#[derive(Debug, Clone)]
struct Trail {
    remaining: usize,
    visited: Vec<String>,
}

impl Trail {
    fn step(&self, dn: &str) -> Self {
        let mut visited = self.visited.clone();
        visited.push(dn::normalize(dn));
        Self {
            remaining: self.remaining.saturating_sub(1),
            visited,
        }
    }
}

/// Converts entities of one storage using its catalog and layout.
#[derive(Debug, Clone)]
pub struct AttributeCodec {
    catalog: Arc<Catalog>,
    layout: DirectoryLayout,
}

impl AttributeCodec {
    /// Creates a codec.
    #[must_use]
    pub fn new(catalog: Arc<Catalog>, layout: DirectoryLayout) -> Self {
        Self { catalog, layout }
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Returns the layout.
    #[must_use]
    pub fn layout(&self) -> &DirectoryLayout {
        &self.layout
    }

    /// Returns the naming attribute of a kind.
    #[must_use]
    pub fn rdn_attribute(&self, kind: EntityKind) -> &str {
        self.catalog.rdn_attribute(kind)
    }

    // ========================================================================
    // Naming
    // ========================================================================

    /// Returns the DN of an entity.
    ///
    /// ## Errors
    ///
    /// Returns `UnsupportedForStorage` when the storage has no container
    /// for the kind, and a policy violation for a group without
    /// application.
    pub fn entry_dn(&self, kind: EntityKind, id: &str, application: Option<&str>) -> Result<String> {
        let rdn = self.rdn_attribute(kind);
        let container = match kind {
            EntityKind::Group => {
                let application = application
                    .ok_or_else(|| Error::policy("group-application", format!("group '{id}' has no application")))?;
                self.layout
                    .group_container(self.rdn_attribute(EntityKind::Application), application)
            }
            other => self.layout.container(other).map(ToString::to_string),
        };
        container
            .map(|parent| dn::child(rdn, id, &parent))
            .ok_or_else(|| self.layout.unsupported(kind))
    }

    /// Returns the DN of an entity value.
    ///
    /// ## Errors
    ///
    /// See [`Self::entry_dn`].
    pub fn dn_of<T: Mapped>(&self, entity: &T) -> Result<String> {
        self.entry_dn(T::KIND, entity.id(), entity.parent_application())
    }

    /// Returns the identifier of a raw entry: its naming attribute, else
    /// the value of its leading RDN.
    #[must_use]
    pub fn id_of(&self, kind: EntityKind, entry: &RawEntry) -> Option<String> {
        entry
            .first(self.rdn_attribute(kind))
            .map(ToString::to_string)
            .or_else(|| dn::leading_rdn(&entry.dn).map(|(_, value)| value))
    }

    /// Filter selecting entries of a kind.
    #[must_use]
    pub fn kind_filter(&self, kind: EntityKind) -> Filter {
        match self.layout.structural_class(kind) {
            Some(class) => Filter::equals(OBJECT_CLASS, class),
            None => Filter::present(self.rdn_attribute(kind)),
        }
    }

    /// DNs of organizations and addresses an entry refers to.
    ///
    /// Callers fetch these into the [`DecodeContext`] before decoding.
    #[must_use]
    pub fn reference_dns(&self, kind: EntityKind, entry: &RawEntry) -> Vec<String> {
        self.catalog
            .for_kind(kind)
            .filter(|m| matches!(m.mapping_type, MappingType::Organization | MappingType::Address))
            .filter_map(|m| entry.first(&m.attribute))
            .filter(|value| dn::leading_rdn(value).is_some())
            .map(ToString::to_string)
            .collect()
    }

    // ========================================================================
    // Decoding
    // ========================================================================

    /// Decodes an entry.
    #[must_use]
    pub fn decode<T: Mapped>(&self, entry: &RawEntry, context: &DecodeContext) -> T {
        let trail = Trail {
            remaining: context.organization_depth(),
            visited: vec![dn::normalize(&entry.dn)],
        };
        self.decode_with(entry, context, &trail)
    }

    fn decode_with<T: Mapped>(&self, entry: &RawEntry, context: &DecodeContext, trail: &Trail) -> T {
        let id = self.id_of(T::KIND, entry).unwrap_or_default();
        let mut entity = T::stub(&id);

        for mapping in self.catalog.for_kind(T::KIND) {
            let values = entry.attributes.get(&mapping.attribute).unwrap_or(&[]);
            let value = self.decode_value(mapping, values, context, trail);
            if value.is_none() && !values.is_empty() {
                tracing::debug!(
                    dn = %entry.dn,
                    attribute = %mapping.attribute,
                    mapping_type = %mapping.mapping_type,
                    "value not convertible, field left null"
                );
            }
            if value.is_some() {
                write(&mut entity, &mapping.path, value);
            }
        }

        for attribute in entry.attributes.iter() {
            if IGNORED.iter().any(|name| attribute.name.eq_ignore_ascii_case(name))
                || self.catalog.is_mapped_attribute(T::KIND, &attribute.name)
                || entity.attributes().contains(&attribute.name)
            {
                continue;
            }
            let value = match attribute.values.as_slice() {
                [single] => AttrValue::Text(single.clone()),
                many => AttrValue::List(many.to_vec()),
            };
            entity.attributes_mut().insert(attribute.name.clone(), value);
        }

        if T::KIND == EntityKind::Group {
            if let Some(application) = self.layout.application_of_group(&entry.dn) {
                entity.set_parent_application(application);
            }
        }
        entity
    }

    fn decode_value(
        &self,
        mapping: &StoreMapping,
        values: &[String],
        context: &DecodeContext,
        trail: &Trail,
    ) -> Option<FieldValue> {
        let first = values.iter().find(|v| !v.is_empty());
        match mapping.mapping_type {
            MappingType::String => first.cloned().map(FieldValue::Text),
            MappingType::ListString => (!values.is_empty()).then(|| FieldValue::TextList(values.to_vec())),
            MappingType::Boolean => first.and_then(|v| parse_bool(v)).map(FieldValue::Flag),
            MappingType::Exists => Some(FieldValue::Flag(!values.is_empty())),
            MappingType::Timestamp => first
                .and_then(|v| parse_generalized_time(v))
                .map(FieldValue::Timestamp),
            MappingType::Address => first
                .and_then(|v| self.decode_address(v, context))
                .map(FieldValue::Address),
            MappingType::Organization => first
                .and_then(|v| self.decode_organization(v, context, trail))
                .map(FieldValue::Organization),
            MappingType::ListUser => {
                let users: Vec<User> = values.iter().filter_map(|v| reference_id(v)).map(|id| User::stub(&id)).collect();
                (!users.is_empty()).then_some(FieldValue::Users(users))
            }
            MappingType::ListGroup => {
                let groups: Vec<Group> = values
                    .iter()
                    .filter_map(|v| {
                        let name = reference_id(v)?;
                        let mut group = Group::stub(&name);
                        group.application = self.layout.application_of_group(v);
                        Some(group)
                    })
                    .collect();
                (!groups.is_empty()).then_some(FieldValue::Groups(groups))
            }
            MappingType::ListHabilitation => {
                let habilitations: Vec<Habilitation> = values
                    .iter()
                    .filter(|v| !v.trim().is_empty())
                    .map(|v| Habilitation::decode(v))
                    .collect();
                (!habilitations.is_empty()).then_some(FieldValue::Habilitations(habilitations))
            }
        }
    }

    fn decode_address(&self, reference: &str, context: &DecodeContext) -> Option<PostalAddress> {
        let id = reference_id(reference)?;
        let lines = context.get(reference).map(address_lines).unwrap_or_default();
        Some(PostalAddress { id: Some(id), lines })
    }

    fn decode_organization(&self, reference: &str, context: &DecodeContext, trail: &Trail) -> Option<Organization> {
        let id = reference_id(reference)?;
        if trail.remaining == 0 || trail.visited.contains(&dn::normalize(reference)) {
            return Some(Organization::stub(&id));
        }
        match context.get(reference) {
            Some(entry) => Some(self.decode_with(entry, context, &trail.step(reference))),
            None => Some(Organization::stub(&id)),
        }
    }

    // ========================================================================
    // Encoding
    // ========================================================================

    /// Encodes an entity for creation: object classes, naming attribute
    /// and every writable mapped field that is not null.
    ///
    /// ## Errors
    ///
    /// Fails when the entity cannot be named in this storage.
    pub fn encode_for_create<T: Mapped>(&self, entity: &T) -> Result<EncodedEntry> {
        let dn = self.dn_of(entity)?;
        let mut attributes = AttributeSet::new()
            .with(OBJECT_CLASS, self.layout.object_classes(T::KIND).iter().cloned())
            .with(self.rdn_attribute(T::KIND), [entity.id()]);
        let mut children = Vec::new();

        for mapping in self.catalog.for_kind(T::KIND).filter(|m| m.is_writable()) {
            let (values, child) = self.encode_field(entity, mapping);
            if !values.is_empty() {
                attributes.add(&mapping.attribute, values);
            }
            children.extend(child);
        }

        Ok(EncodedEntry {
            dn,
            attributes,
            children,
        })
    }

    /// Computes the modifications from `original` to `updated`.
    ///
    /// Only writable mapped fields are compared. A field cleared to null
    /// removes its attribute; a changed field replaces it. The identifier
    /// is never rewritten.
    #[must_use]
    pub fn encode_for_update<T: Mapped>(&self, original: &T, updated: &T) -> EncodedUpdate {
        let mut update = EncodedUpdate::default();

        for mapping in self
            .catalog
            .for_kind(T::KIND)
            .filter(|m| m.is_writable() && !m.path.is_field(T::IDENTIFIER))
        {
            let (before, _) = self.encode_field(original, mapping);
            let (after, child) = self.encode_field(updated, mapping);
            if before == after {
                continue;
            }
            if after.is_empty() {
                update.modifications.push(Modification::delete_all(&mapping.attribute));
            } else {
                update.modifications.push(Modification::replace(&mapping.attribute, after));
                update.children.extend(child);
            }
        }
        update
    }

    /// Encodes one mapped field of an entity.
    ///
    /// Returns the attribute values and, for addresses, the child entry
    /// the value points to.
    #[must_use]
    pub fn encode_field<T: Mapped>(&self, entity: &T, mapping: &StoreMapping) -> (Vec<String>, Option<RawEntry>) {
        match read(entity, &mapping.path) {
            Some(value) => self.encode_value(mapping, value),
            None => (Vec::new(), None),
        }
    }

    fn encode_value(&self, mapping: &StoreMapping, value: FieldValue) -> (Vec<String>, Option<RawEntry>) {
        let values = match (mapping.mapping_type, value) {
            (MappingType::String, FieldValue::Text(text)) => vec![text],
            (MappingType::String, FieldValue::TextList(list)) => list.into_iter().take(1).collect(),
            (MappingType::ListString, FieldValue::TextList(list)) => list,
            (MappingType::ListString, FieldValue::Text(text)) => vec![text],
            (MappingType::Boolean, FieldValue::Flag(flag)) => vec![if flag { TRUE } else { FALSE }.to_string()],
            (MappingType::Address, FieldValue::Address(address)) => return self.encode_address(&address),
            (MappingType::Organization, FieldValue::Organization(org)) => self
                .entry_dn(EntityKind::Organization, &org.identifier, None)
                .ok()
                .into_iter()
                .collect(),
            (MappingType::ListUser, FieldValue::Users(users)) => users
                .iter()
                .filter_map(|user| self.entry_dn(EntityKind::User, &user.username, None).ok())
                .collect(),
            (MappingType::ListGroup, FieldValue::Groups(groups)) => groups
                .iter()
                .filter_map(|group| {
                    self.entry_dn(EntityKind::Group, &group.name, group.application.as_deref())
                        .ok()
                })
                .collect(),
            (MappingType::ListHabilitation, FieldValue::Habilitations(habilitations)) => {
                habilitations.iter().map(Habilitation::encode).collect()
            }
            _ => Vec::new(),
        };
        (values.into_iter().filter(|v| !v.is_empty()).collect(), None)
    }

    fn encode_address(&self, address: &PostalAddress) -> (Vec<String>, Option<RawEntry>) {
        if address.is_blank() {
            return (Vec::new(), None);
        }
        let id = address.content_id();
        let Some(dn) = self.layout.address_dn(&id) else {
            tracing::warn!(storage = %self.layout.storage(), "no addresses_dn configured, address dropped");
            return (Vec::new(), None);
        };

        let mut attributes = AttributeSet::new()
            .with(OBJECT_CLASS, self.layout.address_object_classes().iter().cloned())
            .with(ADDRESS_RDN, [id.as_str()]);
        for (index, line) in address.lines.iter().enumerate().take(MAX_LINES) {
            if !line.is_empty() {
                attributes.add(&format!("{ADDRESS_LINE_PREFIX}{}", index + 1), [line.as_str()]);
            }
        }
        (vec![dn.clone()], Some(RawEntry::new(dn, attributes)))
    }
}

/// The identifier carried by a reference DN.
fn reference_id(reference: &str) -> Option<String> {
    dn::leading_rdn(reference)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case(TRUE) {
        Some(true)
    } else if value.eq_ignore_ascii_case(FALSE) {
        Some(false)
    } else {
        None
    }
}

fn address_lines(entry: &RawEntry) -> Vec<String> {
    let mut lines: Vec<String> = (1..=MAX_LINES)
        .map(|i| entry.first(&format!("{ADDRESS_LINE_PREFIX}{i}")).unwrap_or_default().to_string())
        .collect();
    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}
