//! # dg-gateway
//!
//! The Entry Gateway contract: raw attribute-set CRUD, paged search and
//! credential checks against one backend connection.
//!
//! The directory core never builds protocol frames. It hands the gateway
//! distinguished names, [`AttributeSet`]s, [`Modification`]s and
//! [`Filter`] trees; a gateway implementation renders them for its
//! backend. [`MemoryGateway`] keeps entries in process and serves tests
//! and local setups.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dn;
pub mod entry;
pub mod filter;
pub mod gateway;
pub mod memory;
pub mod modification;

pub use entry::{AttributeSet, RawEntry};
pub use filter::Filter;
pub use gateway::{EntryGateway, SearchPage, SearchRequest, SearchScope};
pub use memory::MemoryGateway;
pub use modification::Modification;

/// Attribute holding object classes.
pub const OBJECT_CLASS: &str = "objectClass";

/// Attribute listing the groups an entry belongs to.
pub const MEMBER_OF: &str = "memberOf";

/// Attribute holding the stored credential.
pub const USER_PASSWORD: &str = "userPassword";
