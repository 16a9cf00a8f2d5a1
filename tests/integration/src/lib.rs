//! Shared fixtures for the dirgate end-to-end tests.
//!
//! [`TestEnv`] builds the whole stack from a TOML document: configuration,
//! router, stores over in-memory gateways, and the permission evaluator.
//! Every gateway is wrapped in a [`RecordingGateway`] so tests can count
//! the writes a store issues.

#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use dg_authz::PermissionEvaluator;
use dg_core::config::StorageConfig;
use dg_core::{DirectoryConfig, GatewayResult, Result};
use dg_gateway::{EntryGateway, MemoryGateway, Modification, RawEntry, SearchPage, SearchRequest};
use dg_router::{GatewayFactory, StoreRouter};

/// Two tenants: `acme` with two storages holding users, and `solo` with
/// one storage holding everything.
pub const CONFIG: &str = r#"
[logging]
level = "warn"

[policy]
group_name_pattern = "[a-z][a-z0-9-]*"

[policy.password]
min_length = 8

[[tenants]]
name = "acme"
default_storage = "primary"

[[tenants.storages]]
name = "primary"
backend = { type = "memory" }
users_dn = "ou=people,o=acme"
organizations_dn = "ou=orgs,o=acme"
addresses_dn = "ou=addresses,o=acme"
applications_dn = "ou=applications,o=acme"

[[tenants.storages]]
name = "secondary"
backend = { type = "memory" }
users_dn = "ou=people,dc=legacy"

[[tenants]]
name = "solo"

[[tenants.storages]]
name = "only"
backend = { type = "memory" }
users_dn = "ou=people,o=solo"
organizations_dn = "ou=orgs,o=solo"
organization_depth = 3
"#;

/// Forwards to a [`MemoryGateway`] and counts writes.
#[derive(Debug, Default)]
pub struct RecordingGateway {
    inner: MemoryGateway,
    adds: AtomicUsize,
    modifies: AtomicUsize,
}

impl RecordingGateway {
    /// Number of `add` calls so far.
    pub fn adds(&self) -> usize {
        self.adds.load(Ordering::SeqCst)
    }

    /// Number of stored entries.
    pub fn entries(&self) -> usize {
        self.inner.len()
    }

    /// Number of `modify` calls so far.
    pub fn modifies(&self) -> usize {
        self.modifies.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EntryGateway for RecordingGateway {
    fn backend_type(&self) -> &'static str {
        "recording"
    }

    async fn get(&self, dn: &str) -> GatewayResult<Option<RawEntry>> {
        self.inner.get(dn).await
    }

    async fn search(&self, request: &SearchRequest) -> GatewayResult<SearchPage> {
        self.inner.search(request).await
    }

    async fn add(&self, entry: RawEntry) -> GatewayResult<()> {
        self.adds.fetch_add(1, Ordering::SeqCst);
        self.inner.add(entry).await
    }

    async fn modify(&self, dn: &str, modifications: &[Modification]) -> GatewayResult<()> {
        self.modifies.fetch_add(1, Ordering::SeqCst);
        self.inner.modify(dn, modifications).await
    }

    async fn delete(&self, dn: &str) -> GatewayResult<()> {
        self.inner.delete(dn).await
    }

    async fn check_credential(&self, dn: &str, credential: &str) -> GatewayResult<bool> {
        self.inner.check_credential(dn, credential).await
    }

    async fn set_credential(&self, dn: &str, credential: &str) -> GatewayResult<()> {
        self.inner.set_credential(dn, credential).await
    }
}

/// Creates one [`RecordingGateway`] per storage and keeps a handle on it.
#[derive(Debug, Default)]
pub struct RecordingFactory {
    gateways: Mutex<HashMap<(String, String), Arc<RecordingGateway>>>,
}

impl RecordingFactory {
    /// Gateway of a storage, once the router has been built.
    pub fn gateway(&self, tenant: &str, storage: &str) -> Option<Arc<RecordingGateway>> {
        self.gateways
            .lock()
            .ok()?
            .get(&(tenant.to_string(), storage.to_string()))
            .cloned()
    }
}

impl GatewayFactory for RecordingFactory {
    fn create(&self, tenant: &str, storage: &StorageConfig) -> Result<Arc<dyn EntryGateway>> {
        let gateway = Arc::new(RecordingGateway::default());
        if let Ok(mut gateways) = self.gateways.lock() {
            gateways.insert((tenant.to_string(), storage.name.clone()), Arc::clone(&gateway));
        }
        Ok(gateway)
    }
}

/// The assembled stack.
pub struct TestEnv {
    /// Parsed configuration.
    pub config: DirectoryConfig,
    /// Router over every storage.
    pub router: Arc<StoreRouter>,
    /// Evaluator backed by the router.
    pub evaluator: PermissionEvaluator,
    /// Gateways by tenant and storage.
    pub factory: RecordingFactory,
}

impl TestEnv {
    /// Builds the stack from [`CONFIG`].
    pub fn new() -> anyhow::Result<Self> {
        Self::from_toml(CONFIG)
    }

    /// Builds the stack from a TOML document.
    pub fn from_toml(toml: &str) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dg_store=debug,dg_router=debug")
            .with_test_writer()
            .try_init();

        let config = DirectoryConfig::from_toml_str(toml)?;
        let factory = RecordingFactory::default();
        let router = Arc::new(StoreRouter::build(&config, &factory)?);
        let evaluator = PermissionEvaluator::new(&config, Arc::clone(&router) as Arc<dyn dg_authz::DirectoryLookup>)?;
        Ok(Self {
            config,
            router,
            evaluator,
            factory,
        })
    }

    /// Gateway of a storage.
    pub fn gateway(&self, tenant: &str, storage: &str) -> anyhow::Result<Arc<RecordingGateway>> {
        self.factory
            .gateway(tenant, storage)
            .ok_or_else(|| anyhow::anyhow!("no gateway for {tenant}/{storage}"))
    }
}
