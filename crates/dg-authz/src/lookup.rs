//! Directory lookups the evaluator needs for membership-based categories.

use async_trait::async_trait;
use dg_core::Result;
use dg_router::StoreRouter;

/// Read access to application flags and group membership.
#[async_trait]
pub trait DirectoryLookup: Send + Sync {
    /// Whether an application's groups are managed by their own members.
    ///
    /// `None` when the application does not exist.
    async fn application_self_managed(
        &self,
        tenant: &str,
        storage: Option<&str>,
        application: &str,
    ) -> Result<Option<bool>>;

    /// Whether a user currently belongs to a group.
    ///
    /// A missing group is not an error; the user is simply not a member.
    async fn is_group_member(
        &self,
        tenant: &str,
        storage: Option<&str>,
        application: &str,
        group: &str,
        username: &str,
    ) -> Result<bool>;
}

#[async_trait]
impl DirectoryLookup for StoreRouter {
    async fn application_self_managed(
        &self,
        tenant: &str,
        storage: Option<&str>,
        application: &str,
    ) -> Result<Option<bool>> {
        StoreRouter::application_self_managed(self, tenant, storage, application).await
    }

    async fn is_group_member(
        &self,
        tenant: &str,
        storage: Option<&str>,
        application: &str,
        group: &str,
        username: &str,
    ) -> Result<bool> {
        let reader = self.resolve_reader(tenant, storage)?;
        Ok(reader
            .get_group(application, group)
            .await?
            .is_some_and(|g| g.has_member(username)))
    }
}
