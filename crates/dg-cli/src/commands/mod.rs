//! Command implementations.

pub mod can;
pub mod catalog;
pub mod config;
pub mod habilitation;
pub mod user;

use std::sync::Arc;

pub use can::run_can;
pub use catalog::run_catalog;
pub use config::run_check_config;
pub use habilitation::run_habilitation;
pub use user::run_user;

use dg_core::DirectoryConfig;
use dg_router::{BackendGatewayFactory, StoreRouter};

/// Loaded configuration and the stores built from it.
#[derive(Debug)]
pub struct Context {
    /// Validated configuration.
    pub config: DirectoryConfig,
    /// Stores of every tenant.
    pub router: Arc<StoreRouter>,
}

impl Context {
    /// Builds every store of the configuration.
    ///
    /// ## Errors
    ///
    /// Returns an error if a storage cannot be built.
    pub fn build(config: DirectoryConfig) -> crate::CliResult<Self> {
        let router = StoreRouter::build(&config, &BackendGatewayFactory)?;
        Ok(Self {
            config,
            router: Arc::new(router),
        })
    }
}

/// Renders an optional value for tables.
pub(crate) fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}
