//! Directory-backed store: the attribute codec over one Entry Gateway.
//!
//! Reads cost one gateway round trip, plus one per organization hop when
//! references are resolved by id lookups. Searches return references as
//! stubs.

use std::sync::Arc;

use async_trait::async_trait;
use dg_core::config::{CredentialCheck, DirectoryConfig, StorageConfig, TenantConfig};
use dg_core::{Error, GatewayError, Result};
use dg_gateway::entry::AttributeSet;
use dg_gateway::{
    dn, EntryGateway, Filter, Modification, RawEntry, SearchRequest, SearchScope, OBJECT_CLASS, USER_PASSWORD,
};
use dg_mapping::{AttributeCodec, Catalog, DecodeContext, DirectoryLayout, Mapped};
use dg_model::{Application, EntityKind, Group, Habilitation, Organization, User};

use crate::credential::CredentialHasher;
use crate::policy::{NamingPolicy, PasswordPolicy};
use crate::search::{probe_filter, Page, SearchQuery};
use crate::store::{DeletionReport, ReaderStore, WriterStore};

/// Object classes of group containers created next to applications.
const CONTAINER_CLASSES: [&str; 2] = ["top", "organizationalUnit"];

/// Reader and writer for one (tenant, storage) pair.
pub struct DirectoryStore {
    tenant: String,
    storage: String,
    codec: AttributeCodec,
    gateway: Arc<dyn EntryGateway>,
    credential_check: CredentialCheck,
    naming: NamingPolicy,
    passwords: PasswordPolicy,
    hasher: CredentialHasher,
    organization_depth: usize,
    page_size: usize,
}

impl std::fmt::Debug for DirectoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryStore")
            .field("tenant", &self.tenant)
            .field("storage", &self.storage)
            .field("backend", &self.gateway.backend_type())
            .finish_non_exhaustive()
    }
}

impl DirectoryStore {
    /// Builds the store of one storage.
    ///
    /// The catalog is the built-in mappings overridden by the global,
    /// tenant and storage mapping lines, in that order.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if a mapping line or naming pattern
    /// is invalid.
    pub fn new(
        config: &DirectoryConfig,
        tenant: &TenantConfig,
        storage: &StorageConfig,
        gateway: Arc<dyn EntryGateway>,
    ) -> Result<Self> {
        let catalog = Catalog::layered(&[
            config.mappings.as_slice(),
            tenant.mappings.as_slice(),
            storage.mappings.as_slice(),
        ])?;

        Ok(Self {
            tenant: tenant.name.clone(),
            storage: storage.name.clone(),
            codec: AttributeCodec::new(Arc::new(catalog), DirectoryLayout::from_storage(storage)),
            gateway,
            credential_check: storage.credential_check,
            naming: NamingPolicy::new(&config.policy, tenant)?,
            passwords: PasswordPolicy::new(config.policy.password.clone()),
            hasher: CredentialHasher::default(),
            organization_depth: storage.organization_depth,
            page_size: storage.default_page_size,
        })
    }

    /// Replaces the credential hasher.
    #[must_use]
    pub fn with_hasher(mut self, hasher: CredentialHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// The codec of this storage.
    #[must_use]
    pub fn codec(&self) -> &AttributeCodec {
        &self.codec
    }

    /// The underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn EntryGateway> {
        &self.gateway
    }

    /// Checks that the backend is reachable.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Backend` if it is not.
    pub async fn test_connection(&self) -> Result<()> {
        self.gateway.test_connection().await.map_err(|e| self.backend(e))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn backend(&self, source: GatewayError) -> Error {
        Error::backend(&self.tenant, &self.storage, source)
    }

    fn layout(&self) -> &DirectoryLayout {
        self.codec.layout()
    }

    fn require(&self, kind: EntityKind) -> Result<()> {
        if self.layout().supports(kind) {
            Ok(())
        } else {
            Err(self.layout().unsupported(kind))
        }
    }

    fn member_attribute(&self) -> Result<String> {
        self.codec
            .catalog()
            .attribute(EntityKind::Group, "users")
            .map(ToString::to_string)
            .ok_or_else(|| Error::UnsupportedForStorage {
                entity_type: "group membership",
                storage: self.storage.clone(),
            })
    }

    fn habilitation_attribute(&self) -> Result<String> {
        self.codec
            .catalog()
            .attribute(EntityKind::User, "habilitations")
            .map(ToString::to_string)
            .ok_or_else(|| Error::UnsupportedForStorage {
                entity_type: "habilitation",
                storage: self.storage.clone(),
            })
    }

    fn password_attribute(&self) -> &str {
        self.codec
            .catalog()
            .attribute(EntityKind::User, "hasPassword")
            .unwrap_or(USER_PASSWORD)
    }

    fn application_dn(&self, name: &str) -> Result<String> {
        self.codec.entry_dn(EntityKind::Application, name, None)
    }

    fn group_container(&self, application: &str) -> Result<String> {
        self.require(EntityKind::Group)?;
        self.layout()
            .group_container(self.codec.rdn_attribute(EntityKind::Application), application)
            .ok_or_else(|| self.layout().unsupported(EntityKind::Group))
    }

    async fn fetch(&self, dn: &str) -> Result<Option<RawEntry>> {
        self.gateway.get(dn).await.map_err(|e| self.backend(e))
    }

    async fn fetch_existing(&self, kind: EntityKind, id: &str, dn: &str) -> Result<RawEntry> {
        self.fetch(dn)
            .await?
            .ok_or_else(|| Error::not_found(kind.as_str(), id))
    }

    async fn search_all(&self, request: &SearchRequest) -> Result<Vec<RawEntry>> {
        self.gateway.search_all(request).await.map_err(|e| self.backend(e))
    }

    async fn add(&self, entry: RawEntry) -> Result<()> {
        self.gateway.add(entry).await.map_err(|e| self.backend(e))
    }

    async fn add_children(&self, children: Vec<RawEntry>) -> Result<()> {
        for child in children {
            match self.gateway.add(child).await {
                Ok(()) | Err(GatewayError::AlreadyExists(_)) => {}
                Err(e) => return Err(self.backend(e)),
            }
        }
        Ok(())
    }

    async fn modify(&self, dn: &str, modifications: &[Modification]) -> Result<()> {
        self.gateway
            .modify(dn, modifications)
            .await
            .map_err(|e| self.backend(e))
    }

    async fn delete(&self, dn: &str) -> Result<()> {
        self.gateway.delete(dn).await.map_err(|e| self.backend(e))
    }

    /// Fetches the organizations and addresses an entry refers to,
    /// following organization parents up to the depth cap.
    async fn context_for(&self, kind: EntityKind, entry: &RawEntry) -> Result<DecodeContext> {
        let mut context = DecodeContext::new(self.organization_depth);
        let mut frontier = self.codec.reference_dns(kind, entry);

        for _ in 0..=self.organization_depth {
            let mut next = Vec::new();
            for reference in frontier {
                if context.contains(&reference) || dn::same(&reference, &entry.dn) {
                    continue;
                }
                if let Some(found) = self.fetch(&reference).await? {
                    next.extend(self.codec.reference_dns(EntityKind::Organization, &found));
                    context.insert(found);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }
        Ok(context)
    }

    async fn load<T: Mapped>(&self, dn: &str) -> Result<Option<T>> {
        let Some(entry) = self.fetch(dn).await? else {
            return Ok(None);
        };
        let context = self.context_for(T::KIND, &entry).await?;
        Ok(Some(self.codec.decode(&entry, &context)))
    }

    async fn search_page<T: Mapped>(
        &self,
        base: &str,
        scope: SearchScope,
        probe: &T,
        query: &SearchQuery,
    ) -> Result<Page<T>> {
        let request = SearchRequest::new(base, probe_filter(&self.codec, probe, query))
            .with_scope(scope)
            .with_page_size(query.page.size.unwrap_or(self.page_size))
            .with_cookie(query.page.token.clone());

        let page = self.gateway.search(&request).await.map_err(|e| self.backend(e))?;
        let context = DecodeContext::new(self.organization_depth);
        tracing::debug!(
            tenant = %self.tenant,
            storage = %self.storage,
            kind = %T::KIND,
            results = page.entries.len(),
            "search page"
        );
        Ok(Page::new(
            page.entries.iter().map(|entry| self.codec.decode(entry, &context)).collect(),
            page.cookie,
        ))
    }

    async fn create<T: Mapped>(&self, entity: &T) -> Result<()> {
        self.require(T::KIND)?;
        let (entry, children) = self.codec.encode_for_create(entity)?.into_parts();
        self.add_children(children).await?;
        let dn = entry.dn.clone();
        self.add(entry).await?;
        tracing::info!(tenant = %self.tenant, storage = %self.storage, kind = %T::KIND, dn = %dn, "entry created");
        Ok(())
    }

    async fn update<T: Mapped>(&self, original: Option<T>, updated: &T) -> Result<()> {
        let original = original.ok_or_else(|| Error::not_found(T::KIND.as_str(), updated.id()))?;
        let update = self.codec.encode_for_update(&original, updated);
        let dn = self.codec.dn_of(updated)?;
        if update.is_empty() {
            tracing::debug!(dn = %dn, "no change");
            return Ok(());
        }
        self.add_children(update.children).await?;
        self.modify(&dn, &update.modifications).await?;
        tracing::info!(
            tenant = %self.tenant,
            storage = %self.storage,
            kind = %T::KIND,
            dn = %dn,
            operations = update.modifications.len(),
            "entry updated"
        );
        Ok(())
    }

    async fn group_entry(&self, application: &str, name: &str) -> Result<RawEntry> {
        let dn = self.codec.entry_dn(EntityKind::Group, name, Some(application))?;
        self.fetch_existing(EntityKind::Group, name, &dn).await
    }

    async fn user_entry(&self, username: &str) -> Result<RawEntry> {
        let dn = self.codec.entry_dn(EntityKind::User, username, None)?;
        self.fetch_existing(EntityKind::User, username, &dn).await
    }

    async fn store_password(&self, dn: &str, password: &str) -> Result<()> {
        match self.credential_check {
            CredentialCheck::Local => {
                let hash = self.hasher.hash(password)?;
                self.modify(dn, &[Modification::replace(self.password_attribute(), vec![hash])])
                    .await?;
            }
            CredentialCheck::Gateway => {
                self.gateway
                    .set_credential(dn, password)
                    .await
                    .map_err(|e| self.backend(e))?;
            }
        }
        tracing::info!(tenant = %self.tenant, storage = %self.storage, dn, "password set");
        Ok(())
    }

    async fn remove_references(&self, base: &str, attribute: &str, target: &str) -> Result<DeletionReport> {
        let request = SearchRequest::new(base, Filter::equals(attribute, target))
            .with_scope(SearchScope::Subtree)
            .with_attributes(vec![attribute.to_string()]);
        let mut report = DeletionReport::default();

        for holder in self.search_all(&request).await? {
            let values: Vec<String> = holder
                .attributes
                .get(attribute)
                .unwrap_or_default()
                .iter()
                .filter(|value| dn::same(value, target))
                .cloned()
                .collect();
            match self
                .gateway
                .modify(&holder.dn, &[Modification::delete(attribute, values)])
                .await
            {
                Ok(()) => report.removed.push(holder.dn),
                Err(e) => {
                    tracing::warn!(dn = %holder.dn, reference = %target, error = %e, "reference not removed");
                    report.failed.push((holder.dn, e.to_string()));
                }
            }
        }
        Ok(report)
    }
}

// ============================================================================
// Reader
// ============================================================================

#[async_trait]
impl ReaderStore for DirectoryStore {
    fn tenant(&self) -> &str {
        &self.tenant
    }

    fn storage(&self) -> &str {
        &self.storage
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>> {
        let dn = self.codec.entry_dn(EntityKind::User, username, None)?;
        self.load(&dn).await
    }

    async fn get_organization(&self, identifier: &str) -> Result<Option<Organization>> {
        let dn = self.codec.entry_dn(EntityKind::Organization, identifier, None)?;
        self.load(&dn).await
    }

    async fn get_group(&self, application: &str, name: &str) -> Result<Option<Group>> {
        let dn = self.codec.entry_dn(EntityKind::Group, name, Some(application))?;
        self.load(&dn).await
    }

    async fn get_application(&self, name: &str) -> Result<Option<Application>> {
        let app_dn = self.application_dn(name)?;
        let container = self.group_container(name)?;
        let group_filter = self.codec.kind_filter(EntityKind::Group);

        let (entry, groups) = if dn::same(&container, &app_dn) {
            let request = SearchRequest::new(
                &app_dn,
                Filter::or(vec![self.codec.kind_filter(EntityKind::Application), group_filter]),
            )
            .with_scope(SearchScope::Subtree);
            let mut entries = self.search_all(&request).await?;
            let Some(position) = entries.iter().position(|e| dn::same(&e.dn, &app_dn)) else {
                return Ok(None);
            };
            let entry = entries.remove(position);
            let groups: Vec<RawEntry> = entries
                .into_iter()
                .filter(|e| dn::is_child_of(&e.dn, &app_dn))
                .collect();
            (entry, groups)
        } else {
            let Some(entry) = self.fetch(&app_dn).await? else {
                return Ok(None);
            };
            let groups = self.search_all(&SearchRequest::new(&container, group_filter)).await?;
            (entry, groups)
        };

        let context = DecodeContext::new(self.organization_depth);
        let mut application: Application = self.codec.decode(&entry, &context);
        application.groups = groups
            .iter()
            .map(|group| self.codec.decode::<Group>(group, &context))
            .collect();
        Ok(Some(application))
    }

    async fn search_users(&self, probe: &User, query: &SearchQuery) -> Result<Page<User>> {
        self.require(EntityKind::User)?;
        let base = self.layout().container(EntityKind::User).unwrap_or_default().to_string();
        self.search_page(&base, SearchScope::OneLevel, probe, query).await
    }

    async fn search_organizations(&self, probe: &Organization, query: &SearchQuery) -> Result<Page<Organization>> {
        self.require(EntityKind::Organization)?;
        let base = self
            .layout()
            .container(EntityKind::Organization)
            .unwrap_or_default()
            .to_string();
        self.search_page(&base, SearchScope::OneLevel, probe, query).await
    }

    async fn search_groups(&self, application: &str, probe: &Group, query: &SearchQuery) -> Result<Page<Group>> {
        let base = self.group_container(application)?;
        self.search_page(&base, SearchScope::OneLevel, probe, query).await
    }

    async fn search_applications(&self, probe: &Application, query: &SearchQuery) -> Result<Page<Application>> {
        self.require(EntityKind::Application)?;
        let base = self
            .layout()
            .container(EntityKind::Application)
            .unwrap_or_default()
            .to_string();
        self.search_page(&base, SearchScope::OneLevel, probe, query).await
    }

    async fn get_group_members(&self, application: &str, group: &str) -> Result<Vec<User>> {
        let attribute = self.member_attribute()?;
        let entry = self.group_entry(application, group).await?;
        let Some(users_dn) = self.layout().container(EntityKind::User) else {
            return Ok(Vec::new());
        };

        let rdn = self.codec.rdn_attribute(EntityKind::User);
        let terms: Vec<Filter> = entry
            .attributes
            .get(&attribute)
            .unwrap_or_default()
            .iter()
            .filter(|member| dn::is_child_of(member, users_dn))
            .filter_map(|member| dn::leading_rdn(member))
            .map(|(_, id)| Filter::equals(rdn, id))
            .collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let request = SearchRequest::new(
            users_dn,
            Filter::and(vec![self.codec.kind_filter(EntityKind::User), Filter::or(terms)]),
        );
        let context = DecodeContext::new(self.organization_depth);
        Ok(self
            .search_all(&request)
            .await?
            .iter()
            .map(|user| self.codec.decode(user, &context))
            .collect())
    }

    async fn validate_credentials(&self, username: &str, candidate: Option<&str>) -> Result<bool> {
        let Some(candidate) = candidate.filter(|c| !c.is_empty()) else {
            return Ok(false);
        };
        let dn = self.codec.entry_dn(EntityKind::User, username, None)?;

        match self.credential_check {
            CredentialCheck::Local => {
                let Some(entry) = self.fetch(&dn).await? else {
                    return Ok(false);
                };
                Ok(entry
                    .attributes
                    .get(self.password_attribute())
                    .unwrap_or_default()
                    .iter()
                    .any(|stored| self.hasher.verify(candidate, stored)))
            }
            CredentialCheck::Gateway => self
                .gateway
                .check_credential(&dn, candidate)
                .await
                .or_else(|e| if e.is_no_such_entry() { Ok(false) } else { Err(self.backend(e)) }),
        }
    }
}

// ============================================================================
// Writer
// ============================================================================

#[async_trait]
impl WriterStore for DirectoryStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        self.create(user).await
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        let original = self.get_user(&user.username).await?;
        self.update(original, user).await
    }

    async fn delete_user(&self, username: &str) -> Result<DeletionReport> {
        let entry = self.user_entry(username).await?;
        let report = match (self.member_attribute(), self.layout().container(EntityKind::Application)) {
            (Ok(attribute), Some(applications)) => {
                self.remove_references(applications, &attribute, &entry.dn).await?
            }
            _ => DeletionReport::default(),
        };
        self.delete(&entry.dn).await?;
        tracing::info!(
            tenant = %self.tenant,
            storage = %self.storage,
            dn = %entry.dn,
            removed = report.removed.len(),
            failed = report.failed.len(),
            "user deleted"
        );
        Ok(report)
    }

    async fn create_organization(&self, organization: &Organization) -> Result<()> {
        self.create(organization).await
    }

    async fn update_organization(&self, organization: &Organization) -> Result<()> {
        let original = self.get_organization(&organization.identifier).await?;
        self.update(original, organization).await
    }

    async fn delete_organization(&self, identifier: &str) -> Result<()> {
        let dn = self.codec.entry_dn(EntityKind::Organization, identifier, None)?;
        self.fetch_existing(EntityKind::Organization, identifier, &dn).await?;
        self.delete(&dn).await?;
        tracing::info!(tenant = %self.tenant, storage = %self.storage, dn = %dn, "organization deleted");
        Ok(())
    }

    async fn create_group(&self, group: &Group) -> Result<()> {
        let application = group_application(group)?;
        self.naming.check_group(application, &group.name)?;
        let app_dn = self.application_dn(application)?;
        self.fetch_existing(EntityKind::Application, application, &app_dn).await?;
        self.create(group).await
    }

    async fn update_group(&self, group: &Group) -> Result<()> {
        let application = group_application(group)?;
        let original = self.get_group(application, &group.name).await?;
        self.update(original, group).await
    }

    async fn delete_group(&self, application: &str, name: &str) -> Result<DeletionReport> {
        let entry = self.group_entry(application, name).await?;
        self.delete(&entry.dn).await?;
        tracing::info!(tenant = %self.tenant, storage = %self.storage, dn = %entry.dn, "group deleted");
        Ok(DeletionReport::default())
    }

    async fn create_application(&self, application: &Application) -> Result<()> {
        self.naming.check_application(&application.name)?;
        for group in &application.groups {
            self.naming.check_group(&application.name, &group.name)?;
        }

        self.create(application).await?;

        let app_dn = self.application_dn(&application.name)?;
        let container = self.group_container(&application.name)?;
        if !dn::same(&container, &app_dn) {
            if let Some((attribute, value)) = dn::leading_rdn(&container) {
                let attributes = AttributeSet::new()
                    .with(OBJECT_CLASS, CONTAINER_CLASSES)
                    .with(&attribute, [value]);
                self.add_children(vec![RawEntry::new(container.clone(), attributes)])
                    .await?;
            }
        }

        for group in &application.groups {
            let mut group = group.clone();
            group.application = Some(application.name.clone());
            self.create(&group).await?;
        }
        Ok(())
    }

    async fn update_application(&self, application: &Application) -> Result<()> {
        let original = self.get_application(&application.name).await?;
        self.update(original, application).await
    }

    async fn delete_application(&self, name: &str) -> Result<DeletionReport> {
        let app_dn = self.application_dn(name)?;
        self.fetch_existing(EntityKind::Application, name, &app_dn).await?;
        let container = self.group_container(name)?;

        let mut report = DeletionReport::default();
        let groups = self
            .search_all(&SearchRequest::new(&container, self.codec.kind_filter(EntityKind::Group)))
            .await?;
        for group in groups {
            match self.gateway.delete(&group.dn).await {
                Ok(()) => report.removed.push(group.dn),
                Err(e) => {
                    tracing::warn!(dn = %group.dn, error = %e, "group not deleted");
                    report.failed.push((group.dn, e.to_string()));
                }
            }
        }
        if !dn::same(&container, &app_dn) {
            match self.gateway.delete(&container).await {
                Ok(()) | Err(GatewayError::NoSuchEntry(_)) => {}
                Err(e) => report.failed.push((container, e.to_string())),
            }
        }

        self.delete(&app_dn).await?;
        tracing::info!(tenant = %self.tenant, storage = %self.storage, dn = %app_dn, "application deleted");
        Ok(report)
    }

    async fn add_user_to_group(&self, username: &str, application: &str, group: &str) -> Result<()> {
        let attribute = self.member_attribute()?;
        let user = self.user_entry(username).await?;
        let entry = self.group_entry(application, group).await?;

        let present = entry
            .attributes
            .get(&attribute)
            .unwrap_or_default()
            .iter()
            .any(|member| dn::same(member, &user.dn));
        if present {
            return Ok(());
        }
        self.modify(&entry.dn, &[Modification::add(&attribute, vec![user.dn.clone()])])
            .await?;
        tracing::info!(group = %entry.dn, user = %user.dn, "member added");
        Ok(())
    }

    async fn remove_user_from_group(&self, username: &str, application: &str, group: &str) -> Result<()> {
        let attribute = self.member_attribute()?;
        let user_dn = self.codec.entry_dn(EntityKind::User, username, None)?;
        let entry = self.group_entry(application, group).await?;

        let values: Vec<String> = entry
            .attributes
            .get(&attribute)
            .unwrap_or_default()
            .iter()
            .filter(|member| dn::same(member, &user_dn))
            .cloned()
            .collect();
        if values.is_empty() {
            return Ok(());
        }
        self.modify(&entry.dn, &[Modification::delete(&attribute, values)])
            .await?;
        tracing::info!(group = %entry.dn, user = %user_dn, "member removed");
        Ok(())
    }

    async fn add_habilitation(&self, username: &str, habilitation: &Habilitation) -> Result<()> {
        let attribute = self.habilitation_attribute()?;
        let entry = self.user_entry(username).await?;
        let token = habilitation.encode();
        if entry.attributes.has_value(&attribute, &token) {
            return Ok(());
        }
        self.modify(&entry.dn, &[Modification::add(&attribute, vec![token])])
            .await
    }

    async fn remove_habilitation(&self, username: &str, habilitation: &Habilitation) -> Result<()> {
        let attribute = self.habilitation_attribute()?;
        let entry = self.user_entry(username).await?;
        let token = habilitation.encode();
        if !entry.attributes.has_value(&attribute, &token) {
            return Ok(());
        }
        self.modify(&entry.dn, &[Modification::delete(&attribute, vec![token])])
            .await
    }

    async fn init_password(&self, username: &str, password: &str, force: bool) -> Result<()> {
        let entry = self.user_entry(username).await?;
        if !force && entry.attributes.contains(self.password_attribute()) {
            return Err(Error::policy("password-exists", format!("'{username}' already has a password")));
        }
        self.passwords.check(password)?;
        self.store_password(&entry.dn, password).await
    }

    async fn reinit_password(&self, username: &str, password: Option<String>) -> Result<String> {
        let entry = self.user_entry(username).await?;
        let password = match password {
            Some(password) => {
                self.passwords.check(&password)?;
                password
            }
            None => self.passwords.generate(),
        };
        self.store_password(&entry.dn, &password).await?;
        Ok(password)
    }

    async fn change_password(&self, username: &str, old: &str, new: &str) -> Result<()> {
        let entry = self.user_entry(username).await?;
        if !self.validate_credentials(username, Some(old)).await? {
            return Err(Error::InvalidCredential);
        }
        self.passwords.check(new)?;
        self.store_password(&entry.dn, new).await
    }
}

fn group_application(group: &Group) -> Result<&str> {
    group
        .application
        .as_deref()
        .ok_or_else(|| Error::policy("group-application", format!("group '{}' has no application", group.name)))
}
