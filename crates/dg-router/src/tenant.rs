//! Reader over every storage of a tenant.
//!
//! Lookups by id stop at the first storage, in tenant order, that holds
//! the entity; a later storage holding another record under the same id
//! is never consulted. Searches aggregate all storages, in order, behind
//! one continuation token. Storages that do not hold a kind are skipped.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dg_core::{Error, Result};
use dg_model::{Application, Group, Organization, User};
use dg_store::{Page, PageRequest, ReaderStore, SearchQuery};

use crate::token::AggregateToken;

/// Storage name reported by a tenant-wide reader.
pub const ALL_STORAGES: &str = "*";

/// Reads across all storages of one tenant.
pub struct TenantReader {
    tenant: String,
    stores: Vec<Arc<dyn ReaderStore>>,
}

impl std::fmt::Debug for TenantReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantReader")
            .field("tenant", &self.tenant)
            .field("storages", &self.stores.iter().map(|s| s.storage()).collect::<Vec<_>>())
            .finish()
    }
}

impl TenantReader {
    /// Creates a reader over stores in tenant order.
    #[must_use]
    pub fn new(tenant: impl Into<String>, stores: Vec<Arc<dyn ReaderStore>>) -> Self {
        Self {
            tenant: tenant.into(),
            stores,
        }
    }

    /// The underlying stores.
    #[must_use]
    pub fn stores(&self) -> &[Arc<dyn ReaderStore>] {
        &self.stores
    }

    /// Returns the first store's hit.
    ///
    /// `UnsupportedForStorage` only surfaces when no storage holds the kind.
    async fn first_match<T, F, Fut>(&self, lookup: F) -> Result<Option<(Arc<dyn ReaderStore>, T)>>
    where
        F: Fn(Arc<dyn ReaderStore>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<Option<T>>> + Send,
        T: Send,
    {
        let mut unsupported = None;
        let mut supported = false;
        for store in &self.stores {
            match lookup(Arc::clone(store)).await {
                Ok(Some(found)) => {
                    tracing::debug!(tenant = %self.tenant, storage = %store.storage(), "first match");
                    return Ok(Some((Arc::clone(store), found)));
                }
                Ok(None) => supported = true,
                Err(e @ Error::UnsupportedForStorage { .. }) => {
                    unsupported.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }
        match unsupported {
            Some(e) if !supported => Err(e),
            _ => Ok(None),
        }
    }

    async fn first<T, F, Fut>(&self, lookup: F) -> Result<Option<T>>
    where
        F: Fn(Arc<dyn ReaderStore>) -> Fut + Send + Sync,
        Fut: Future<Output = Result<Option<T>>> + Send,
        T: Send,
    {
        Ok(self.first_match(lookup).await?.map(|(_, found)| found))
    }

    /// Walks the storages page by page behind one token.
    async fn aggregate<T, F, Fut>(&self, query: &SearchQuery, search: F) -> Result<Page<T>>
    where
        F: Fn(Arc<dyn ReaderStore>, SearchQuery) -> Fut + Send + Sync,
        Fut: Future<Output = Result<Page<T>>> + Send,
        T: Send,
    {
        let AggregateToken { storage: mut index, mut inner } = AggregateToken::decode(query.page.token.as_deref())?;
        // A zero size behaves as one, like the single-storage gateways.
        let size = query.page.size.map(|size| size.max(1));
        let mut results = Vec::new();
        let mut unsupported = None;
        let mut supported = false;

        while let Some(store) = self.stores.get(index) {
            let remaining = match size {
                Some(size) if results.len() >= size => {
                    let token = AggregateToken::new(index, inner).encode();
                    return Ok(Page::new(results, Some(token)));
                }
                Some(size) => Some(size - results.len()),
                None => None,
            };

            let mut page_query = query.clone();
            page_query.page = PageRequest {
                size: remaining,
                token: inner.take(),
            };
            match search(Arc::clone(store), page_query).await {
                Ok(page) => {
                    supported = true;
                    results.extend(page.results);
                    match page.next_token {
                        Some(next) if size.is_none() => {
                            let token = AggregateToken::new(index, Some(next)).encode();
                            return Ok(Page::new(results, Some(token)));
                        }
                        Some(next) => inner = Some(next),
                        None => index += 1,
                    }
                }
                Err(e @ Error::UnsupportedForStorage { .. }) => {
                    unsupported.get_or_insert(e);
                    index += 1;
                }
                Err(e) => return Err(e),
            }
        }

        match unsupported {
            Some(e) if !supported => Err(e),
            _ => Ok(Page::new(results, None)),
        }
    }
}

#[async_trait]
impl ReaderStore for TenantReader {
    fn tenant(&self) -> &str {
        &self.tenant
    }

    fn storage(&self) -> &str {
        ALL_STORAGES
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        self.first(|store| async move { store.get_user(username).await }).await
    }

    async fn get_organization(&self, identifier: &str) -> Result<Option<Organization>> {
        self.first(|store| async move { store.get_organization(identifier).await })
            .await
    }

    async fn get_group(&self, application: &str, name: &str) -> Result<Option<Group>> {
        self.first(|store| async move { store.get_group(application, name).await })
            .await
    }

    async fn get_application(&self, name: &str) -> Result<Option<Application>> {
        self.first(|store| async move { store.get_application(name).await }).await
    }

    async fn search_users(&self, probe: &User, query: &SearchQuery) -> Result<Page<User>> {
        self.aggregate(query, |store, query| async move { store.search_users(probe, &query).await })
            .await
    }

    async fn search_organizations(&self, probe: &Organization, query: &SearchQuery) -> Result<Page<Organization>> {
        self.aggregate(query, |store, query| async move {
            store.search_organizations(probe, &query).await
        })
        .await
    }

    async fn search_groups(&self, application: &str, probe: &Group, query: &SearchQuery) -> Result<Page<Group>> {
        self.aggregate(query, |store, query| async move {
            store.search_groups(application, probe, &query).await
        })
        .await
    }

    async fn search_applications(&self, probe: &Application, query: &SearchQuery) -> Result<Page<Application>> {
        self.aggregate(query, |store, query| async move {
            store.search_applications(probe, &query).await
        })
        .await
    }

    async fn get_group_members(&self, application: &str, group: &str) -> Result<Vec<User>> {
        let found = self
            .first_match(|store| async move { store.get_group(application, group).await })
            .await?;
        match found {
            Some((store, _)) => store.get_group_members(application, group).await,
            None => Err(Error::not_found("group", group)),
        }
    }

    async fn validate_credentials(&self, username: &str, candidate: Option<&str>) -> Result<bool> {
        if candidate.is_none() {
            return Ok(false);
        }
        let found = self
            .first_match(|store| async move { store.get_user(username).await })
            .await?;
        match found {
            Some((store, _)) => store.validate_credentials(username, candidate).await,
            None => Ok(false),
        }
    }
}
