//! Reader and writer contracts of one (tenant, storage) pair.
//!
//! Operations on a kind the storage does not hold fail with
//! `Error::UnsupportedForStorage`. Backend failures surface as
//! `Error::Backend` carrying the tenant and storage; they are never
//! retried here.

use async_trait::async_trait;
use dg_core::Result;
use dg_model::{Application, Group, Habilitation, Organization, User};

use crate::search::{Page, SearchQuery};

/// Outcome of a delete that also removes references to the entry.
///
/// Reference cleanup is best effort: the entry is deleted even when some
/// references could not be removed, and those are listed here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionReport {
    /// DNs of entries the reference was removed from.
    pub removed: Vec<String>,
    /// DNs still holding the reference, with the failure.
    pub failed: Vec<(String, String)>,
}

impl DeletionReport {
    /// Checks whether every reference was removed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Read operations.
#[async_trait]
pub trait ReaderStore: Send + Sync {
    /// Tenant name.
    fn tenant(&self) -> &str;

    /// Storage name.
    fn storage(&self) -> &str;

    /// Gets a user by username.
    ///
    /// ## Errors
    ///
    /// Returns an error if the storage holds no users or the backend fails.
    async fn get_user(&self, username: &str) -> Result<Option<User>>;

    /// Gets an organization by identifier, with its parents resolved up to
    /// the configured depth.
    ///
    /// ## Errors
    ///
    /// Returns an error if the storage holds no organizations or the
    /// backend fails.
    async fn get_organization(&self, identifier: &str) -> Result<Option<Organization>>;

    /// Gets a group of an application.
    ///
    /// ## Errors
    ///
    /// Returns an error if the storage holds no applications or the
    /// backend fails.
    async fn get_group(&self, application: &str, name: &str) -> Result<Option<Group>>;

    /// Gets an application with its groups.
    ///
    /// ## Errors
    ///
    /// Returns an error if the storage holds no applications or the
    /// backend fails.
    async fn get_application(&self, name: &str) -> Result<Option<Application>>;

    /// Searches users matching a probe.
    ///
    /// ## Errors
    ///
    /// Returns an error on a malformed page token or backend failure.
    async fn search_users(&self, probe: &User, query: &SearchQuery) -> Result<Page<User>>;

    /// Searches organizations matching a probe.
    ///
    /// ## Errors
    ///
    /// Returns an error on a malformed page token or backend failure.
    async fn search_organizations(&self, probe: &Organization, query: &SearchQuery) -> Result<Page<Organization>>;

    /// Searches the groups of an application matching a probe.
    ///
    /// ## Errors
    ///
    /// Returns an error on a malformed page token or backend failure.
    async fn search_groups(&self, application: &str, probe: &Group, query: &SearchQuery) -> Result<Page<Group>>;

    /// Searches applications matching a probe.
    ///
    /// ## Errors
    ///
    /// Returns an error on a malformed page token or backend failure.
    async fn search_applications(&self, probe: &Application, query: &SearchQuery) -> Result<Page<Application>>;

    /// Lists the members of a group. Members missing from the storage are
    /// dropped.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the group does not exist.
    async fn get_group_members(&self, application: &str, group: &str) -> Result<Vec<User>>;

    /// Checks a user's credential.
    ///
    /// `false` when the candidate is absent, the user is unknown or has no
    /// stored credential.
    ///
    /// ## Errors
    ///
    /// Returns an error if the backend fails.
    async fn validate_credentials(&self, username: &str, candidate: Option<&str>) -> Result<bool>;
}

/// Write operations.
///
/// Writes are not serialized: concurrent updates of one entry race unless
/// the backend provides its own concurrency control.
#[async_trait]
pub trait WriterStore: ReaderStore {
    /// Creates a user.
    ///
    /// ## Errors
    ///
    /// Returns an error if the user exists or the backend fails.
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Applies the difference between the stored user and `user`.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the user does not exist.
    async fn update_user(&self, user: &User) -> Result<()>;

    /// Deletes a user and removes it from the groups it belongs to.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the user does not exist.
    async fn delete_user(&self, username: &str) -> Result<DeletionReport>;

    /// Creates an organization.
    ///
    /// ## Errors
    ///
    /// Returns an error if the organization exists or the backend fails.
    async fn create_organization(&self, organization: &Organization) -> Result<()>;

    /// Applies the difference between the stored organization and
    /// `organization`.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the organization does not exist.
    async fn update_organization(&self, organization: &Organization) -> Result<()>;

    /// Deletes an organization.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the organization does not exist.
    async fn delete_organization(&self, identifier: &str) -> Result<()>;

    /// Creates a group after checking its name.
    ///
    /// ## Errors
    ///
    /// Returns `Error::PolicyViolation` if the name does not match the
    /// group name pattern.
    async fn create_group(&self, group: &Group) -> Result<()>;

    /// Applies the difference between the stored group and `group`.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the group does not exist.
    async fn update_group(&self, group: &Group) -> Result<()>;

    /// Deletes a group.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the group does not exist.
    async fn delete_group(&self, application: &str, name: &str) -> Result<DeletionReport>;

    /// Creates an application, its group container and initial groups.
    ///
    /// ## Errors
    ///
    /// Returns `Error::PolicyViolation` if a name does not match its
    /// pattern.
    async fn create_application(&self, application: &Application) -> Result<()>;

    /// Applies the difference between the stored application and
    /// `application`. Groups are not touched.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the application does not exist.
    async fn update_application(&self, application: &Application) -> Result<()>;

    /// Deletes an application with its groups.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the application does not exist.
    async fn delete_application(&self, name: &str) -> Result<DeletionReport>;

    /// Adds a user to a group. Already a member is not an error.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the user or group does not exist.
    async fn add_user_to_group(&self, username: &str, application: &str, group: &str) -> Result<()>;

    /// Removes a user from a group. Not a member is not an error.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the group does not exist.
    async fn remove_user_from_group(&self, username: &str, application: &str, group: &str) -> Result<()>;

    /// Grants a habilitation. Already granted is not an error.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the user does not exist.
    async fn add_habilitation(&self, username: &str, habilitation: &Habilitation) -> Result<()>;

    /// Revokes a habilitation. Not granted is not an error.
    ///
    /// ## Errors
    ///
    /// Returns `Error::EntityNotFound` if the user does not exist.
    async fn remove_habilitation(&self, username: &str, habilitation: &Habilitation) -> Result<()>;

    /// Sets the first password of a user.
    ///
    /// ## Errors
    ///
    /// Returns `Error::PolicyViolation` if a password is already set and
    /// `force` is false, or if the password breaks the policy.
    async fn init_password(&self, username: &str, password: &str, force: bool) -> Result<()>;

    /// Resets a password, generating one when none is given. Returns the
    /// new password.
    ///
    /// ## Errors
    ///
    /// Returns `Error::PolicyViolation` if a given password breaks the
    /// policy.
    async fn reinit_password(&self, username: &str, password: Option<String>) -> Result<String>;

    /// Changes a password after checking the current one.
    ///
    /// ## Errors
    ///
    /// Returns `Error::InvalidCredential` if `old` does not match and
    /// `Error::PolicyViolation` if `new` breaks the policy.
    async fn change_password(&self, username: &str, old: &str, new: &str) -> Result<()>;
}
