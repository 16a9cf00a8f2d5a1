//! # dg-cli
//!
//! Operator tooling for dirgate.
//!
//! This crate provides command-line utilities for:
//! - Validating a configuration and probing its backends
//! - Dumping the attribute catalog in effect per storage
//! - Encoding and decoding habilitation tokens
//! - Evaluating permission categories for a set of roles
//! - Looking up and searching users

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::{CliError, CliResult};
