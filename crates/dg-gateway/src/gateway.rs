//! The Entry Gateway contract.

use async_trait::async_trait;
use dg_core::GatewayResult;

use crate::entry::RawEntry;
use crate::filter::Filter;
use crate::modification::Modification;

/// Search scope relative to the base DN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
    /// The base entry only.
    Base,
    /// Immediate children of the base.
    #[default]
    OneLevel,
    /// The base and everything below it.
    Subtree,
}

/// A paged search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Base DN.
    pub base: String,
    /// Scope.
    pub scope: SearchScope,
    /// Predicate.
    pub filter: Filter,
    /// Attributes to return; empty means all.
    pub attributes: Vec<String>,
    /// Maximum entries per page.
    pub page_size: usize,
    /// Opaque cookie from the previous page.
    pub cookie: Option<String>,
}

impl SearchRequest {
    /// Creates a one-level search returning all attributes.
    #[must_use]
    pub fn new(base: impl Into<String>, filter: Filter) -> Self {
        Self {
            base: base.into(),
            scope: SearchScope::OneLevel,
            filter,
            attributes: Vec::new(),
            page_size: 100,
            cookie: None,
        }
    }

    /// Sets the scope.
    #[must_use]
    pub const fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the continuation cookie.
    #[must_use]
    pub fn with_cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    /// Restricts the returned attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: Vec<String>) -> Self {
        self.attributes = attributes;
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    /// Entries of this page.
    pub entries: Vec<RawEntry>,
    /// Cookie for the next page; `None` when exhausted.
    pub cookie: Option<String>,
}

/// Raw directory access for one backend connection.
///
/// Implementations must be safe for concurrent use. They surface failures
/// immediately; any retry policy belongs to the implementation itself.
#[async_trait]
pub trait EntryGateway: Send + Sync {
    /// Returns the backend type identifier.
    fn backend_type(&self) -> &'static str;

    /// Reads one entry by DN. A missing entry is `Ok(None)`.
    async fn get(&self, dn: &str) -> GatewayResult<Option<RawEntry>>;

    /// Runs one page of a search.
    async fn search(&self, request: &SearchRequest) -> GatewayResult<SearchPage>;

    /// Creates an entry. Fails with `AlreadyExists` if the DN is taken.
    async fn add(&self, entry: RawEntry) -> GatewayResult<()>;

    /// Applies modifications. Fails with `NoSuchEntry` if the DN is unknown.
    async fn modify(&self, dn: &str, modifications: &[Modification]) -> GatewayResult<()>;

    /// Deletes an entry. Fails with `NoSuchEntry` if the DN is unknown.
    async fn delete(&self, dn: &str) -> GatewayResult<()>;

    /// Checks a credential by binding as `dn`.
    ///
    /// A wrong credential is `Ok(false)`, not an error.
    async fn check_credential(&self, dn: &str, credential: &str) -> GatewayResult<bool>;

    /// Sets a credential through the backend's own password handling.
    async fn set_credential(&self, dn: &str, credential: &str) -> GatewayResult<()>;

    /// Verifies the backend is reachable.
    async fn test_connection(&self) -> GatewayResult<()> {
        Ok(())
    }

    /// Reads every page of a search.
    async fn search_all(&self, request: &SearchRequest) -> GatewayResult<Vec<RawEntry>> {
        let mut request = request.clone();
        let mut entries = Vec::new();
        loop {
            let page = self.search(&request).await?;
            entries.extend(page.entries);
            match page.cookie {
                Some(cookie) => request.cookie = Some(cookie),
                None => return Ok(entries),
            }
        }
    }
}
