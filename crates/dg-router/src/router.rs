//! The store router: an immutable map from (tenant, storage) to stores,
//! built once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use dg_core::config::{DirectoryConfig, TenantConfig};
use dg_core::{Error, Result};
use dg_store::{DirectoryStore, ReaderStore, WriterStore};

use crate::factory::GatewayFactory;
use crate::tenant::TenantReader;

struct TenantStores {
    config: TenantConfig,
    stores: Vec<Arc<DirectoryStore>>,
    reader: Arc<TenantReader>,
}

impl TenantStores {
    fn store(&self, storage: &str) -> Result<&Arc<DirectoryStore>> {
        self.stores
            .iter()
            .find(|s| s.storage() == storage)
            .ok_or_else(|| Error::StorageNotFound {
                tenant: self.config.name.clone(),
                storage: storage.to_string(),
            })
    }
}

/// Resolves tenants and storages to stores.
pub struct StoreRouter {
    tenants: Vec<TenantStores>,
    index: HashMap<String, usize>,
}

impl std::fmt::Debug for StoreRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreRouter")
            .field("tenants", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl StoreRouter {
    /// Builds every store of every tenant.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if a storage's mappings, patterns or
    /// backend section are invalid.
    pub fn build(config: &DirectoryConfig, factory: &dyn GatewayFactory) -> Result<Self> {
        let mut tenants = Vec::with_capacity(config.tenants.len());
        let mut index = HashMap::new();

        for tenant in &config.tenants {
            let stores = tenant
                .storages
                .iter()
                .map(|storage| {
                    let gateway = factory.create(&tenant.name, storage)?;
                    DirectoryStore::new(config, tenant, storage, gateway).map(Arc::new)
                })
                .collect::<Result<Vec<_>>>()?;

            let readers: Vec<Arc<dyn ReaderStore>> = stores
                .iter()
                .map(|s| Arc::clone(s) as Arc<dyn ReaderStore>)
                .collect();
            tracing::info!(tenant = %tenant.name, storages = stores.len(), "tenant ready");

            index.insert(tenant.name.clone(), tenants.len());
            tenants.push(TenantStores {
                config: tenant.clone(),
                reader: Arc::new(TenantReader::new(&tenant.name, readers)),
                stores,
            });
        }
        Ok(Self { tenants, index })
    }

    fn entry(&self, tenant: &str) -> Result<&TenantStores> {
        self.index
            .get(tenant)
            .map(|&i| &self.tenants[i])
            .ok_or_else(|| Error::TenantNotFound(tenant.to_string()))
    }

    /// Configured tenants, in configuration order.
    pub fn tenants(&self) -> impl Iterator<Item = &TenantConfig> {
        self.tenants.iter().map(|t| &t.config)
    }

    /// Looks up a tenant.
    ///
    /// ## Errors
    ///
    /// Returns `Error::TenantNotFound` if it is not configured.
    pub fn tenant(&self, name: &str) -> Result<&TenantConfig> {
        self.entry(name).map(|t| &t.config)
    }

    /// Storage names of a tenant, in order.
    ///
    /// ## Errors
    ///
    /// Returns `Error::TenantNotFound` if the tenant is not configured.
    pub fn storages(&self, tenant: &str) -> Result<Vec<&str>> {
        Ok(self
            .entry(tenant)?
            .config
            .storages
            .iter()
            .map(|s| s.name.as_str())
            .collect())
    }

    /// Returns the concrete store of a storage.
    ///
    /// ## Errors
    ///
    /// Returns `TenantNotFound` or `StorageNotFound`.
    pub fn store(&self, tenant: &str, storage: &str) -> Result<Arc<DirectoryStore>> {
        self.entry(tenant)?.store(storage).map(Arc::clone)
    }

    /// Resolves a reader: the named storage, or every storage of the
    /// tenant when none is named.
    ///
    /// ## Errors
    ///
    /// Returns `TenantNotFound` or `StorageNotFound`.
    pub fn resolve_reader(&self, tenant: &str, storage: Option<&str>) -> Result<Arc<dyn ReaderStore>> {
        let entry = self.entry(tenant)?;
        match storage {
            Some(storage) => Ok(Arc::clone(entry.store(storage)?) as Arc<dyn ReaderStore>),
            None => Ok(Arc::clone(&entry.reader) as Arc<dyn ReaderStore>),
        }
    }

    /// Resolves exactly one writer.
    ///
    /// Without a storage name the tenant's default storage is used, or its
    /// only storage.
    ///
    /// ## Errors
    ///
    /// Returns `TenantNotFound`, `StorageNotFound`, or `AmbiguousTarget`
    /// when the tenant has several storages and no default.
    pub fn resolve_writer(&self, tenant: &str, storage: Option<&str>) -> Result<Arc<dyn WriterStore>> {
        let entry = self.entry(tenant)?;
        let store = match storage.or(entry.config.default_storage.as_deref()) {
            Some(storage) => entry.store(storage)?,
            None => match entry.stores.as_slice() {
                [only] => only,
                stores => {
                    return Err(Error::AmbiguousTarget {
                        tenant: tenant.to_string(),
                        storages: stores.iter().map(|s| s.storage().to_string()).collect(),
                    })
                }
            },
        };
        Ok(Arc::clone(store) as Arc<dyn WriterStore>)
    }

    /// Looks up whether an application's groups are self-managed.
    ///
    /// `None` when the application does not exist.
    ///
    /// ## Errors
    ///
    /// Returns routing errors and backend failures.
    pub async fn application_self_managed(
        &self,
        tenant: &str,
        storage: Option<&str>,
        application: &str,
    ) -> Result<Option<bool>> {
        let reader = self.resolve_reader(tenant, storage)?;
        Ok(reader
            .get_application(application)
            .await?
            .map(|app| app.self_managed_groups))
    }
}
