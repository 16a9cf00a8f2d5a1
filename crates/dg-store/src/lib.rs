//! # dg-store
//!
//! Domain-level operations over one (tenant, storage) pair.
//!
//! [`ReaderStore`] and [`WriterStore`] are the contracts the router hands
//! out. [`DirectoryStore`] implements both by running the attribute codec
//! over an Entry Gateway.
//!
//! ## Searching
//!
//! A search takes a probe entity: every set field constrains the result.
//! See [`search`] for how probes become gateway filters.
//!
//! ## Credentials
//!
//! Passwords are hashed with Argon2id unless the storage delegates checks
//! to the gateway. Older salted SHA-2 values still validate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod directory;
pub mod policy;
pub mod search;
pub mod store;

pub use credential::{CredentialHasher, HashPolicy};
pub use directory::DirectoryStore;
pub use policy::{NamingPolicy, PasswordPolicy};
pub use search::{MatchMode, Page, PageRequest, SearchQuery};
pub use store::{DeletionReport, ReaderStore, WriterStore};
