//! Configuration management for dirgate.
//!
//! The whole process configuration is one TOML document loaded at startup
//! and never reloaded. Tenants list their storages in lookup order; each
//! storage names its backend, its directory layout and its mapping
//! overrides.
//!
//! ```toml
//! [permissions]
//! admin = ["DIR_ADMIN"]
//!
//! [[tenants]]
//! name = "acme"
//! default_storage = "main"
//!
//! [[tenants.storages]]
//! name = "main"
//! users_dn = "ou=people,o=acme"
//! backend = { type = "memory" }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pattern::PatternTemplate;

/// Environment variable holding the configuration file path.
pub const CONFIG_ENV: &str = "DIRGATE_CONFIG";

/// Fallback configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "dirgate.toml";

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Global mapping lines layered over the built-in catalog.
    #[serde(default)]
    pub mappings: Vec<String>,

    /// Permission pattern templates per category.
    #[serde(default)]
    pub permissions: PermissionPatternsConfig,

    /// Naming and password policies.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Configured tenants.
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

impl DirectoryConfig {
    /// Loads and validates the configuration.
    ///
    /// The path is taken from `path`, else from `DIRGATE_CONFIG`, else
    /// `dirgate.toml` in the working directory. A `.env` file is honored.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if the file cannot be read, parsed
    /// or validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let _ = dotenvy::dotenv();

        let path = path.map_or_else(
            || {
                std::env::var(CONFIG_ENV)
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
            },
            Path::to_path_buf,
        );

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        let config = Self::from_toml_str(&content)?;

        tracing::info!(
            path = %path.display(),
            tenants = config.tenants.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Parses and validates a TOML document.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` on parse or validation failure.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates cross-field invariants.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` on the first violation found.
    pub fn validate(&self) -> Result<()> {
        self.permissions.validate()?;
        self.policy.validate()?;

        let mut tenant_names = HashSet::new();
        for tenant in &self.tenants {
            if tenant.name.trim().is_empty() {
                return Err(Error::config("tenant name cannot be empty"));
            }
            if !tenant_names.insert(tenant.name.as_str()) {
                return Err(Error::config(format!("duplicate tenant '{}'", tenant.name)));
            }
            tenant.validate()?;
        }
        Ok(())
    }

    /// Looks up a tenant by name.
    #[must_use]
    pub fn tenant(&self, name: &str) -> Option<&TenantConfig> {
        self.tenants.iter().find(|t| t.name == name)
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ============================================================================
// Permissions
// ============================================================================

/// Pattern templates per permission category.
///
/// Each category accepts several templates; a caller role matching any
/// applicable one grants the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PermissionPatternsConfig {
    /// Global administrators. Short-circuits every other check.
    pub admin: Vec<String>,
    /// Administrators of one tenant.
    pub tenant_admin: Vec<String>,
    /// Readers of a tenant or storage.
    pub reader: Vec<String>,
    /// Writers of a tenant or storage.
    pub writer: Vec<String>,
    /// Callers allowed to validate credentials.
    pub password_validator: Vec<String>,
    /// Managers of an application.
    pub application_manager: Vec<String>,
    /// Members of a group's manager group.
    pub group_manager: Vec<String>,
}

impl Default for PermissionPatternsConfig {
    fn default() -> Self {
        Self {
            admin: vec!["DIR_ADMIN".to_string()],
            tenant_admin: vec!["DIR_$(tenant)_ADMIN".to_string()],
            reader: vec![
                "DIR_$(tenant)_READER".to_string(),
                "DIR_$(tenant)_$(storage)_READER".to_string(),
            ],
            writer: vec![
                "DIR_$(tenant)_WRITER".to_string(),
                "DIR_$(tenant)_$(storage)_WRITER".to_string(),
            ],
            password_validator: vec![
                "DIR_$(tenant)_PASSWORD_VALIDATOR".to_string(),
                "DIR_$(tenant)_$(storage)_PASSWORD_VALIDATOR".to_string(),
            ],
            application_manager: vec!["DIR_$(tenant)_$(application)_MANAGER".to_string()],
            group_manager: vec!["$(group)_MANAGERS".to_string()],
        }
    }
}

impl PermissionPatternsConfig {
    /// Iterates over `(category, templates)` pairs.
    pub fn categories(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        [
            ("admin", self.admin.as_slice()),
            ("tenant_admin", self.tenant_admin.as_slice()),
            ("reader", self.reader.as_slice()),
            ("writer", self.writer.as_slice()),
            ("password_validator", self.password_validator.as_slice()),
            ("application_manager", self.application_manager.as_slice()),
            ("group_manager", self.group_manager.as_slice()),
        ]
        .into_iter()
    }

    fn validate(&self) -> Result<()> {
        for (category, templates) in self.categories() {
            for template in templates {
                PatternTemplate::parse_checked(template)
                    .map_err(|e| Error::config(format!("permissions.{category}: {e}")))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Policies
// ============================================================================

/// Naming and password policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Template a new group name must match; `$(application)` is available.
    pub group_name_pattern: String,
    /// Template a new application name must match.
    pub application_name_pattern: String,
    /// Password rules.
    pub password: PasswordPolicyConfig,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            group_name_pattern: "[A-Za-z0-9-]+_$(application)".to_string(),
            application_name_pattern: "[A-Za-z0-9-]+".to_string(),
            password: PasswordPolicyConfig::default(),
        }
    }
}

impl PolicyConfig {
    fn validate(&self) -> Result<()> {
        PatternTemplate::parse_checked(&self.group_name_pattern)
            .map_err(|e| Error::config(format!("policy.group_name_pattern: {e}")))?;
        PatternTemplate::parse_checked(&self.application_name_pattern)
            .map_err(|e| Error::config(format!("policy.application_name_pattern: {e}")))?;
        self.password.validate()
    }
}

/// Password rules applied on credential changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PasswordPolicyConfig {
    /// Minimum number of characters.
    pub min_length: usize,
    /// Require at least one uppercase letter.
    pub require_uppercase: bool,
    /// Require at least one lowercase letter.
    pub require_lowercase: bool,
    /// Require at least one digit.
    pub require_digit: bool,
    /// Require at least one non-alphanumeric character.
    pub require_special: bool,
    /// Length of generated passwords.
    pub generated_length: usize,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: 12,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: false,
            generated_length: 16,
        }
    }
}

impl PasswordPolicyConfig {
    fn validate(&self) -> Result<()> {
        if self.generated_length < self.min_length {
            return Err(Error::config(
                "policy.password.generated_length must be at least min_length",
            ));
        }
        let classes = [
            self.require_uppercase,
            self.require_lowercase,
            self.require_digit,
            self.require_special,
        ];
        if classes.iter().filter(|c| **c).count() > self.generated_length {
            return Err(Error::config(
                "policy.password.generated_length too short for required classes",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Tenants
// ============================================================================

/// One tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    /// Unique tenant name.
    pub name: String,

    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,

    /// Storage receiving writes when none is named.
    #[serde(default)]
    pub default_storage: Option<String>,

    /// Free-form properties, usable as pattern placeholders.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,

    /// Tenant-level mapping lines.
    #[serde(default)]
    pub mappings: Vec<String>,

    /// Storages in lookup order.
    pub storages: Vec<StorageConfig>,
}

impl TenantConfig {
    fn validate(&self) -> Result<()> {
        if self.storages.is_empty() {
            return Err(Error::config(format!("tenant '{}' has no storage", self.name)));
        }

        let mut names = HashSet::new();
        for storage in &self.storages {
            if storage.name.trim().is_empty() {
                return Err(Error::config(format!(
                    "tenant '{}': storage name cannot be empty",
                    self.name
                )));
            }
            if !names.insert(storage.name.as_str()) {
                return Err(Error::config(format!(
                    "tenant '{}': duplicate storage '{}'",
                    self.name, storage.name
                )));
            }
            storage.validate(&self.name)?;
        }

        if let Some(default) = &self.default_storage {
            if !names.contains(default.as_str()) {
                return Err(Error::config(format!(
                    "tenant '{}': default storage '{default}' is not configured",
                    self.name
                )));
            }
        }

        for key in ["group_name_pattern", "application_name_pattern"] {
            if let Some(template) = self.properties.get(key) {
                PatternTemplate::parse_checked(template)
                    .map_err(|e| Error::config(format!("tenant '{}' property {key}: {e}", self.name)))?;
            }
        }
        Ok(())
    }

    /// Looks up a storage by name.
    #[must_use]
    pub fn storage(&self, name: &str) -> Option<&StorageConfig> {
        self.storages.iter().find(|s| s.name == name)
    }
}

// ============================================================================
// Storages
// ============================================================================

/// How credentials are checked for a storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialCheck {
    /// Read the stored hash and verify it locally.
    #[default]
    Local,
    /// Ask the gateway (e.g. an LDAP bind).
    Gateway,
}

/// One backing store within a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Name, unique within the tenant.
    pub name: String,

    /// Backend connection.
    pub backend: BackendConfig,

    /// Container of user entries. Absent: users unsupported.
    #[serde(default)]
    pub users_dn: Option<String>,

    /// Container of organization entries. Absent: organizations unsupported.
    #[serde(default)]
    pub organizations_dn: Option<String>,

    /// Container of postal address child entries.
    #[serde(default)]
    pub addresses_dn: Option<String>,

    /// Container of application entries. Absent: applications and groups unsupported.
    #[serde(default)]
    pub applications_dn: Option<String>,

    /// Container of an application's groups, `{application}` is substituted.
    /// Defaults to the application entry itself.
    #[serde(default)]
    pub group_container_pattern: Option<String>,

    /// Object classes written on create, per entity kind.
    #[serde(default)]
    pub object_classes: ObjectClassConfig,

    /// Storage-level mapping lines.
    #[serde(default)]
    pub mappings: Vec<String>,

    /// Credential verification mode.
    #[serde(default)]
    pub credential_check: CredentialCheck,

    /// Maximum organization parent hops resolved on read.
    #[serde(default = "default_organization_depth")]
    pub organization_depth: usize,

    /// Page size used when a caller does not ask for one.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
}

fn default_organization_depth() -> usize {
    5
}

fn default_page_size() -> usize {
    100
}

impl StorageConfig {
    fn validate(&self, tenant: &str) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(Error::config(format!(
                "{tenant}/{}: default_page_size must be positive",
                self.name
            )));
        }
        if let Some(pattern) = &self.group_container_pattern {
            if !pattern.contains("{application}") {
                return Err(Error::config(format!(
                    "{tenant}/{}: group_container_pattern must contain {{application}}",
                    self.name
                )));
            }
        }
        if self.applications_dn.is_none() && self.group_container_pattern.is_some() {
            return Err(Error::config(format!(
                "{tenant}/{}: group_container_pattern requires applications_dn",
                self.name
            )));
        }
        Ok(())
    }
}

/// Object classes per entity kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectClassConfig {
    /// User entries.
    pub user: Vec<String>,
    /// Organization entries.
    pub organization: Vec<String>,
    /// Group entries.
    pub group: Vec<String>,
    /// Application entries.
    pub application: Vec<String>,
    /// Postal address child entries.
    pub address: Vec<String>,
}

impl Default for ObjectClassConfig {
    fn default() -> Self {
        let classes = |names: &[&str]| names.iter().map(ToString::to_string).collect();
        Self {
            user: classes(&["top", "person", "organizationalPerson", "inetOrgPerson"]),
            organization: classes(&["top", "organization", "extensibleObject"]),
            group: classes(&["top", "groupOfUniqueNames", "extensibleObject"]),
            application: classes(&["top", "organizationalUnit", "extensibleObject"]),
            address: classes(&["top", "locality", "extensibleObject"]),
        }
    }
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Process-local in-memory directory.
    Memory,
    /// LDAPS directory server.
    Ldap(LdapBackendConfig),
}

/// LDAP backend parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdapBackendConfig {
    /// Server URL, must be `ldaps://`.
    pub url: String,

    /// Service account DN.
    pub bind_dn: String,

    /// Service account password.
    #[serde(skip_serializing, default)]
    pub bind_credential: String,

    /// Validate server certificates.
    #[serde(default = "default_true")]
    pub validate_certificates: bool,

    /// Connection timeout.
    #[serde(default = "default_connection_timeout", with = "humantime_serde")]
    pub connection_timeout: Duration,

    /// Per-operation timeout.
    #[serde(default = "default_read_timeout", with = "humantime_serde")]
    pub read_timeout: Duration,

    /// Maximum concurrent operations.
    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: usize,
}

const fn default_true() -> bool {
    true
}

const fn default_connection_timeout() -> Duration {
    Duration::from_secs(5)
}

const fn default_read_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_pool_max_size() -> usize {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        mappings = ["user$attributes.room:roomNumber,STRING,rw"]

        [permissions]
        admin = ["DIR_ADMIN", "ROOT_.*"]

        [[tenants]]
        name = "acme"
        default_storage = "main"
        properties = { region = "eu" }

        [[tenants.storages]]
        name = "main"
        users_dn = "ou=people,o=acme"
        applications_dn = "ou=applications,o=acme"
        backend = { type = "memory" }

        [[tenants.storages]]
        name = "partners"
        users_dn = "ou=partners,o=acme"
        backend = { type = "ldap", url = "ldaps://ldap.acme.test", bind_dn = "cn=svc,o=acme", bind_credential = "secret", read_timeout = "10s" }
    "#;

    #[test]
    fn parses_sample_document() {
        let config = DirectoryConfig::from_toml_str(SAMPLE).unwrap();
        let tenant = config.tenant("acme").unwrap();

        assert_eq!(tenant.storages.len(), 2);
        assert_eq!(tenant.default_storage.as_deref(), Some("main"));
        assert_eq!(tenant.properties.get("region").map(String::as_str), Some("eu"));
        assert_eq!(config.permissions.admin.len(), 2);
        assert!(matches!(tenant.storages[0].backend, BackendConfig::Memory));

        match &tenant.storages[1].backend {
            BackendConfig::Ldap(ldap) => {
                assert_eq!(ldap.read_timeout, Duration::from_secs(10));
                assert!(ldap.validate_certificates);
            }
            BackendConfig::Memory => panic!("expected ldap backend"),
        }
    }

    #[test]
    fn rejects_duplicate_storage() {
        let doc = r#"
            [[tenants]]
            name = "acme"
            [[tenants.storages]]
            name = "main"
            backend = { type = "memory" }
            [[tenants.storages]]
            name = "main"
            backend = { type = "memory" }
        "#;
        let err = DirectoryConfig::from_toml_str(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate storage"));
    }

    #[test]
    fn rejects_unknown_default_storage() {
        let doc = r#"
            [[tenants]]
            name = "acme"
            default_storage = "missing"
            [[tenants.storages]]
            name = "main"
            backend = { type = "memory" }
        "#;
        assert!(DirectoryConfig::from_toml_str(doc).is_err());
    }

    #[test]
    fn rejects_malformed_permission_pattern() {
        let doc = r#"
            [permissions]
            reader = ["DIR_$(tenant_READER"]
        "#;
        assert!(matches!(
            DirectoryConfig::from_toml_str(doc),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn default_password_policy_is_consistent() {
        assert!(PasswordPolicyConfig::default().validate().is_ok());
    }
}
