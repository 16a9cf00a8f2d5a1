//! # dg-core
//!
//! Core building blocks shared by every dirgate crate.
//!
//! - [`error`]: the outward error taxonomy and raw backend failures
//! - [`config`]: the process configuration (tenants, storages, policies)
//! - [`pattern`]: `$(placeholder)` templates compiled to anchored regexes
//! - [`telemetry`]: tracing subscriber bootstrap

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod pattern;
pub mod telemetry;

pub use config::DirectoryConfig;
pub use error::{Error, GatewayError, GatewayResult, Result};
pub use pattern::{PatternTemplate, Placeholders};
