//! # dg-model
//!
//! Domain entities served by dirgate.
//!
//! Entities are plain value objects built per request, either decoded from
//! a backend entry or supplied by a caller. References between entities
//! (a user's organization, a group's members) are held as nested entities;
//! an unresolved reference is a stub carrying only the identifier.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod application;
pub mod attributes;
pub mod group;
pub mod habilitation;
pub mod kind;
pub mod metadata;
pub mod organization;
pub mod user;

pub use address::PostalAddress;
pub use application::Application;
pub use attributes::{AttrValue, Attributes};
pub use group::Group;
pub use habilitation::Habilitation;
pub use kind::{Entity, EntityKind};
pub use metadata::EntryMetadata;
pub use organization::Organization;
pub use user::User;
