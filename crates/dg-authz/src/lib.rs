//! # dg-authz
//!
//! Permission evaluator for dirgate.
//!
//! Callers present already-verified role strings; the evaluator decides,
//! for a target tenant, storage, application or group, which
//! [`Category`] they hold. Membership-based categories consult the
//! directory through [`DirectoryLookup`], implemented by the store router.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cache;
pub mod caller;
pub mod category;
pub mod evaluator;
pub mod lookup;

pub use cache::PatternCache;
pub use caller::{Caller, Target};
pub use category::Category;
pub use evaluator::PermissionEvaluator;
pub use lookup::DirectoryLookup;
