//! The permission evaluator.
//!
//! Each category has role pattern templates. A template is instantiated
//! against the target (its tenant, storage, application and group, plus
//! the tenant's properties) and matched, anchored and case-insensitively,
//! against every caller role. A storage-scoped check also tries the
//! tenant-wide scope, so a tenant grant satisfies it.
//!
//! Categories imply each other (see [`Category::implied_by`]) and a
//! matching admin pattern grants everything.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dg_core::config::DirectoryConfig;
use dg_core::pattern::PatternTemplate;
use dg_core::{Error, Result};

use crate::cache::PatternCache;
use crate::caller::{Caller, Target};
use crate::category::Category;
use crate::lookup::DirectoryLookup;

/// Decides permission categories for callers.
pub struct PermissionEvaluator {
    templates: HashMap<Category, Vec<PatternTemplate>>,
    tenants: Vec<(String, BTreeMap<String, String>)>,
    cache: PatternCache,
    lookup: Arc<dyn DirectoryLookup>,
}

impl std::fmt::Debug for PermissionEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionEvaluator")
            .field("templates", &self.templates)
            .field("tenants", &self.tenants.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl PermissionEvaluator {
    /// Creates an evaluator from the configured patterns.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if a pattern or category is malformed.
    pub fn new(config: &DirectoryConfig, lookup: Arc<dyn DirectoryLookup>) -> Result<Self> {
        let mut templates = HashMap::new();
        for (name, raw) in config.permissions.categories() {
            let category: Category = name.parse().map_err(Error::config)?;
            let parsed = raw
                .iter()
                .map(|t| PatternTemplate::parse_checked(t))
                .collect::<Result<Vec<_>>>()?;
            templates.insert(category, parsed);
        }

        Ok(Self {
            templates,
            tenants: config
                .tenants
                .iter()
                .map(|t| (t.name.clone(), t.properties.clone()))
                .collect(),
            cache: PatternCache::default(),
            lookup,
        })
    }

    fn properties(&self, tenant: Option<&str>) -> Option<&BTreeMap<String, String>> {
        let tenant = tenant?;
        self.tenants.iter().find(|(name, _)| name == tenant).map(|(_, p)| p)
    }

    fn matches_at(&self, category: Category, caller: &Caller, target: &Target) -> bool {
        let Some(templates) = self.templates.get(&category) else {
            return false;
        };
        let mut values = target.placeholders();
        if let Some(properties) = self.properties(target.tenant.as_deref()) {
            values = values.with_defaults(properties);
        }

        templates
            .iter()
            .filter_map(|template| template.instantiate(&values))
            .any(|pattern| match self.cache.get(&pattern) {
                Ok(regex) => caller.roles.iter().any(|role| regex.is_match(role)),
                Err(e) => {
                    tracing::warn!(category = %category, %pattern, error = %e, "permission pattern rejected");
                    false
                }
            })
    }

    fn matches(&self, category: Category, caller: &Caller, target: &Target) -> bool {
        if self.matches_at(category, caller, target) {
            return true;
        }
        target.storage.is_some() && self.matches_at(category, caller, &target.tenant_wide())
    }

    /// Decides a pattern-based category.
    ///
    /// Always false for [`Category::SelfManagedGroupMember`], which needs
    /// a directory lookup; use [`Self::evaluate`] for it.
    #[must_use]
    pub fn grants(&self, category: Category, caller: &Caller, target: &Target) -> bool {
        if !category.is_pattern_based() {
            return false;
        }
        if self.matches(Category::Admin, caller, target) {
            return true;
        }
        self.grants_without_admin(category, caller, target)
    }

    fn grants_without_admin(&self, category: Category, caller: &Caller, target: &Target) -> bool {
        category != Category::Admin
            && (self.matches(category, caller, target)
                || category
                    .implied_by()
                    .iter()
                    .any(|&implied| self.grants_without_admin(implied, caller, target)))
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Checks for the global administrator.
    #[must_use]
    pub fn is_admin(&self, caller: &Caller) -> bool {
        self.grants(Category::Admin, caller, &Target::global())
    }

    /// Checks for the administrator of a tenant.
    #[must_use]
    pub fn is_tenant_admin(&self, caller: &Caller, tenant: &str) -> bool {
        self.grants(Category::TenantAdmin, caller, &Target::tenant(tenant))
    }

    /// Checks read access to a tenant, or to one of its storages.
    #[must_use]
    pub fn is_reader(&self, caller: &Caller, tenant: &str, storage: Option<&str>) -> bool {
        self.grants(Category::Reader, caller, &Target::tenant(tenant).storage_opt(storage))
    }

    /// Checks write access to a tenant, or to one of its storages.
    #[must_use]
    pub fn is_writer(&self, caller: &Caller, tenant: &str, storage: Option<&str>) -> bool {
        self.grants(Category::Writer, caller, &Target::tenant(tenant).storage_opt(storage))
    }

    /// Checks whether the caller may validate credentials.
    #[must_use]
    pub fn is_password_validator(&self, caller: &Caller, tenant: &str, storage: Option<&str>) -> bool {
        self.grants(
            Category::PasswordValidator,
            caller,
            &Target::tenant(tenant).storage_opt(storage),
        )
    }

    /// Checks whether the caller manages an application.
    #[must_use]
    pub fn is_application_manager(&self, caller: &Caller, tenant: &str, application: &str) -> bool {
        self.grants(
            Category::ApplicationManager,
            caller,
            &Target::tenant(tenant).application(application),
        )
    }

    /// Checks whether the caller belongs to the manager group of a group.
    ///
    /// This is not membership of the group itself.
    #[must_use]
    pub fn is_group_manager(&self, caller: &Caller, tenant: &str, application: &str, group: &str) -> bool {
        self.grants(
            Category::GroupManager,
            caller,
            &Target::tenant(tenant).application(application).group(group),
        )
    }

    /// Checks whether the caller is a current member of a group whose
    /// application lets members manage it.
    ///
    /// False when the flag is off, when the application or group does not
    /// exist, or when the caller has no subject.
    ///
    /// ## Errors
    ///
    /// Returns backend failures from the lookup.
    pub async fn is_member_of_self_managed_group(&self, caller: &Caller, target: &Target) -> Result<bool> {
        let (Some(tenant), Some(application), Some(group), Some(subject)) = (
            target.tenant.as_deref(),
            target.application.as_deref(),
            target.group.as_deref(),
            caller.subject.as_deref(),
        ) else {
            return Ok(false);
        };
        let storage = target.storage.as_deref();

        match self
            .lookup
            .application_self_managed(tenant, storage, application)
            .await
        {
            Ok(Some(true)) => {}
            Ok(_) => return Ok(false),
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        }

        match self
            .lookup
            .is_group_member(tenant, storage, application, group, subject)
            .await
        {
            Ok(member) => Ok(member),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Generic checks
    // ========================================================================

    /// Decides any category.
    ///
    /// ## Errors
    ///
    /// Returns backend failures from membership lookups.
    pub async fn evaluate(&self, category: Category, caller: &Caller, target: &Target) -> Result<bool> {
        if category.is_pattern_based() {
            return Ok(self.grants(category, caller, target));
        }
        if self.grants(Category::Admin, caller, target) {
            return Ok(true);
        }
        self.is_member_of_self_managed_group(caller, target).await
    }

    /// Requires a category.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Forbidden` when the caller lacks it, or the lookup's
    /// failure.
    pub async fn check(&self, category: Category, caller: &Caller, target: &Target) -> Result<()> {
        if self.evaluate(category, caller, target).await? {
            return Ok(());
        }
        tracing::debug!(category = %category, scope = %scope_of(target), "permission denied");
        Err(Error::Forbidden {
            category: category.to_string(),
            scope: scope_of(target),
        })
    }

    /// Tenants the caller may read, tenant-wide or in at least one storage.
    #[must_use]
    pub fn authorized_tenants<'a>(&'a self, caller: &Caller, config: &'a DirectoryConfig) -> Vec<&'a str> {
        config
            .tenants
            .iter()
            .filter(|tenant| {
                self.is_reader(caller, &tenant.name, None)
                    || tenant
                        .storages
                        .iter()
                        .any(|s| self.is_reader(caller, &tenant.name, Some(&s.name)))
            })
            .map(|tenant| tenant.name.as_str())
            .collect()
    }
}

fn scope_of(target: &Target) -> String {
    let parts: Vec<&str> = [
        target.tenant.as_deref(),
        target.storage.as_deref(),
        target.application.as_deref(),
        target.group.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();
    if parts.is_empty() {
        "*".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct FixedLookup {
        self_managed: Option<bool>,
        members: Vec<(&'static str, &'static str)>,
    }

    #[async_trait]
    impl DirectoryLookup for FixedLookup {
        async fn application_self_managed(&self, _: &str, _: Option<&str>, _: &str) -> Result<Option<bool>> {
            Ok(self.self_managed)
        }

        async fn is_group_member(
            &self,
            _: &str,
            _: Option<&str>,
            _: &str,
            group: &str,
            username: &str,
        ) -> Result<bool> {
            Ok(self.members.iter().any(|&(g, u)| g == group && u == username))
        }
    }

    const CONFIG: &str = r#"
[[tenants]]
name = "acme"
properties = { region = "EU" }

[[tenants.storages]]
name = "main"
backend = { type = "memory" }
users_dn = "ou=people,o=acme"

[[tenants]]
name = "globex"

[[tenants.storages]]
name = "main"
backend = { type = "memory" }
users_dn = "ou=people,o=globex"
"#;

    fn config() -> DirectoryConfig {
        DirectoryConfig::from_toml_str(CONFIG).unwrap()
    }

    fn evaluator(self_managed: Option<bool>) -> PermissionEvaluator {
        let lookup = FixedLookup {
            self_managed,
            members: vec![("crm-sales", "jdoe")],
        };
        PermissionEvaluator::new(&config(), Arc::new(lookup)).unwrap()
    }

    #[test]
    fn admin_wildcard_grants_everything() {
        let ev = evaluator(None);
        let admin = Caller::with_roles(["dir_admin"]);
        assert!(ev.is_admin(&admin));
        assert!(ev.is_reader(&admin, "anything", Some("anywhere")));
        assert!(ev.is_writer(&admin, "acme", None));
        assert!(ev.is_group_manager(&admin, "acme", "crm", "sales"));
    }

    #[test]
    fn storage_checks_accept_tenant_grants() {
        let ev = evaluator(None);
        let tenant_reader = Caller::with_roles(["DIR_ACME_READER"]);
        assert!(ev.is_reader(&tenant_reader, "acme", Some("main")));
        assert!(ev.is_reader(&tenant_reader, "acme", None));
        assert!(!ev.is_reader(&tenant_reader, "globex", None));
        assert!(!ev.is_writer(&tenant_reader, "acme", Some("main")));

        let storage_reader = Caller::with_roles(["DIR_ACME_MAIN_READER"]);
        assert!(ev.is_reader(&storage_reader, "acme", Some("main")));
        assert!(!ev.is_reader(&storage_reader, "acme", Some("archive")));
        assert!(!ev.is_reader(&storage_reader, "acme", None));
    }

    #[test]
    fn implications_follow_the_hierarchy() {
        let ev = evaluator(None);
        let tenant_admin = Caller::with_roles(["DIR_ACME_ADMIN"]);
        assert!(!ev.is_admin(&tenant_admin));
        assert!(ev.is_writer(&tenant_admin, "acme", Some("main")));
        assert!(ev.is_reader(&tenant_admin, "acme", None));
        assert!(ev.is_password_validator(&tenant_admin, "acme", None));
        assert!(ev.is_group_manager(&tenant_admin, "acme", "crm", "sales"));
        assert!(!ev.is_reader(&tenant_admin, "globex", None));

        let writer = Caller::with_roles(["DIR_ACME_WRITER"]);
        assert!(ev.is_reader(&writer, "acme", Some("main")));
        assert!(!ev.is_password_validator(&writer, "acme", None));

        let manager = Caller::with_roles(["DIR_ACME_CRM_MANAGER"]);
        assert!(ev.is_group_manager(&manager, "acme", "crm", "sales"));
        assert!(!ev.is_group_manager(&manager, "acme", "erp", "sales"));
        assert!(!ev.is_reader(&manager, "acme", None));
    }

    #[test]
    fn group_manager_is_not_group_membership() {
        let ev = evaluator(None);
        let manager = Caller::with_roles(["SALES_MANAGERS"]);
        assert!(ev.is_group_manager(&manager, "acme", "crm", "sales"));
        assert!(!ev.is_group_manager(&manager, "acme", "crm", "support"));

        let member = Caller::with_roles(["SALES"]);
        assert!(!ev.is_group_manager(&member, "acme", "crm", "sales"));
    }

    #[test]
    fn values_are_matched_literally() {
        let ev = evaluator(None);
        let caller = Caller::with_roles(["DIR_AXME_READER"]);
        assert!(!ev.is_reader(&caller, "a.me", None));
        let literal = Caller::with_roles(["DIR_A.ME_READER"]);
        assert!(ev.is_reader(&literal, "a.me", None));
    }

    #[test]
    fn tenant_properties_are_placeholders() {
        let mut config = config();
        config.permissions.reader.push("$(region)_AUDITOR".to_string());
        let ev = PermissionEvaluator::new(
            &config,
            Arc::new(FixedLookup {
                self_managed: None,
                members: vec![],
            }),
        )
        .unwrap();

        let auditor = Caller::with_roles(["EU_AUDITOR"]);
        assert!(ev.is_reader(&auditor, "acme", None));
        assert!(!ev.is_reader(&auditor, "globex", None));
        assert_eq!(ev.authorized_tenants(&auditor, &config), ["acme"]);
    }

    #[tokio::test]
    async fn self_managed_requires_flag_and_membership() {
        let target = Target::tenant("acme").application("crm").group("crm-sales");
        let member = Caller::new(Some("jdoe"), Vec::<String>::new());
        let outsider = Caller::new(Some("asmith"), Vec::<String>::new());

        let on = evaluator(Some(true));
        assert!(on.is_member_of_self_managed_group(&member, &target).await.unwrap());
        assert!(!on.is_member_of_self_managed_group(&outsider, &target).await.unwrap());
        assert!(on
            .evaluate(Category::SelfManagedGroupMember, &member, &target)
            .await
            .unwrap());

        let off = evaluator(Some(false));
        assert!(!off.is_member_of_self_managed_group(&member, &target).await.unwrap());

        let missing = evaluator(None);
        assert!(!missing.is_member_of_self_managed_group(&member, &target).await.unwrap());
    }

    #[tokio::test]
    async fn check_reports_category_and_scope() {
        let ev = evaluator(None);
        let reader = Caller::with_roles(["DIR_ACME_READER"]);
        let target = Target::tenant("acme").storage("main");

        ev.check(Category::Reader, &reader, &target).await.unwrap();
        match ev.check(Category::Writer, &reader, &target).await {
            Err(Error::Forbidden { category, scope }) => {
                assert_eq!(category, "writer");
                assert_eq!(scope, "acme/main");
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }
}
