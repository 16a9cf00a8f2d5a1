//! Gateway construction per storage backend.

use std::sync::Arc;

use dg_core::config::{BackendConfig, StorageConfig};
use dg_core::{Error, Result};
use dg_gateway::{EntryGateway, MemoryGateway};

/// Builds the Entry Gateway of a storage.
pub trait GatewayFactory: Send + Sync {
    /// Creates the gateway for one storage of a tenant.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if the backend section is invalid.
    fn create(&self, tenant: &str, storage: &StorageConfig) -> Result<Arc<dyn EntryGateway>>;
}

/// Creates a fresh in-memory gateway per `memory` storage and an LDAPS
/// gateway per `ldap` storage.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendGatewayFactory;

impl GatewayFactory for BackendGatewayFactory {
    fn create(&self, tenant: &str, storage: &StorageConfig) -> Result<Arc<dyn EntryGateway>> {
        match &storage.backend {
            BackendConfig::Memory => Ok(Arc::new(MemoryGateway::new())),
            BackendConfig::Ldap(ldap) => {
                let gateway = dg_gateway_ldap::connect(ldap)
                    .map_err(|e| Error::config(format!("{tenant}/{}: {e}", storage.name)))?;
                tracing::info!(
                    tenant,
                    storage = %storage.name,
                    url = %gateway.config().connection_url,
                    "LDAP gateway configured"
                );
                Ok(Arc::new(gateway))
            }
        }
    }
}
