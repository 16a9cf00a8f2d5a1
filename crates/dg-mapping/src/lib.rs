//! # dg-mapping
//!
//! Store mappings and the attribute codec.
//!
//! A [`Catalog`] binds entity model paths to backend attributes for one
//! storage. The [`AttributeCodec`] uses it, together with the storage's
//! [`DirectoryLayout`], to turn entities into attribute sets and
//! modification lists and raw entries back into entities.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod codec;
pub mod error;
pub mod field;
pub mod layout;

pub use catalog::{Catalog, MappingType, StoreMapping};
pub use codec::{AttributeCodec, DecodeContext, EncodedEntry, EncodedUpdate};
pub use error::{MappingError, MappingResult};
pub use field::{FieldValue, Mapped, ModelPath};
pub use layout::DirectoryLayout;
