//! # dg-router
//!
//! Resolves `(tenant, storage?)` to the stores serving an operation.
//!
//! The router is built once from the configuration and never changes.
//! Readers may span every storage of a tenant; writers always target
//! exactly one storage.
//!
//! ## Example
//!
//! ```rust,ignore
//! let router = StoreRouter::build(&config, &BackendGatewayFactory)?;
//! let reader = router.resolve_reader("acme", None)?;
//! let user = reader.get_user("jdoe").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod factory;
pub mod router;
pub mod tenant;
pub mod token;

pub use factory::{BackendGatewayFactory, GatewayFactory};
pub use router::StoreRouter;
pub use tenant::{TenantReader, ALL_STORAGES};
pub use token::AggregateToken;
