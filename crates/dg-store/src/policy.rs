//! Naming and password policies.

use dg_core::config::{PasswordPolicyConfig, PolicyConfig, TenantConfig};
use dg_core::pattern::{PatternTemplate, Placeholders};
use dg_core::{Error, Result};
use rand::seq::SliceRandom;
use rand::Rng;

/// Tenant property overriding the group name pattern.
pub const GROUP_NAME_PROPERTY: &str = "group_name_pattern";

/// Tenant property overriding the application name pattern.
pub const APPLICATION_NAME_PROPERTY: &str = "application_name_pattern";

const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SPECIAL: &[u8] = b"!#$%&*+-=?@_";

// ============================================================================
// Naming
// ============================================================================

/// Validates group and application names of one tenant.
///
/// Patterns may use `$(application)`, `$(tenant)` and any tenant property.
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    group: PatternTemplate,
    application: PatternTemplate,
    placeholders: Placeholders,
}

impl NamingPolicy {
    /// Builds the policy of a tenant. Tenant properties override the
    /// global patterns.
    ///
    /// ## Errors
    ///
    /// Returns `Error::Configuration` if a pattern is malformed.
    pub fn new(policy: &PolicyConfig, tenant: &TenantConfig) -> Result<Self> {
        let pick = |key: &str, fallback: &str| -> Result<PatternTemplate> {
            PatternTemplate::parse_checked(tenant.properties.get(key).map_or(fallback, String::as_str))
        };
        Ok(Self {
            group: pick(GROUP_NAME_PROPERTY, &policy.group_name_pattern)?,
            application: pick(APPLICATION_NAME_PROPERTY, &policy.application_name_pattern)?,
            placeholders: Placeholders::new()
                .with("tenant", &tenant.name)
                .with_defaults(&tenant.properties),
        })
    }

    /// Checks an application name.
    ///
    /// ## Errors
    ///
    /// Returns `Error::PolicyViolation` with rule `application-name` on a
    /// mismatch.
    pub fn check_application(&self, name: &str) -> Result<()> {
        self.check(&self.application, self.placeholders.clone(), name, "application-name")
    }

    /// Checks a group name in the context of its application.
    ///
    /// ## Errors
    ///
    /// Returns `Error::PolicyViolation` with rule `group-name` on a
    /// mismatch.
    pub fn check_group(&self, application: &str, name: &str) -> Result<()> {
        let values = self.placeholders.clone().with("application", application);
        self.check(&self.group, values, name, "group-name")
    }

    fn check(&self, template: &PatternTemplate, values: Placeholders, name: &str, rule: &str) -> Result<()> {
        let regex = template.compile(&values)?.ok_or_else(|| {
            Error::config(format!("pattern '{template}' refers to a placeholder with no value"))
        })?;
        if regex.is_match(name) {
            Ok(())
        } else {
            Err(Error::policy(rule, format!("'{name}' does not match '{template}'")))
        }
    }
}

// ============================================================================
// Passwords
// ============================================================================

/// Password rules.
#[derive(Debug, Clone, Default)]
pub struct PasswordPolicy {
    config: PasswordPolicyConfig,
}

impl PasswordPolicy {
    /// Creates a policy.
    #[must_use]
    pub const fn new(config: PasswordPolicyConfig) -> Self {
        Self { config }
    }

    /// Checks a password.
    ///
    /// ## Errors
    ///
    /// Returns `Error::PolicyViolation` naming the first failed rule.
    pub fn check(&self, password: &str) -> Result<()> {
        let c = &self.config;
        if password.chars().count() < c.min_length {
            return Err(Error::policy(
                "password-min-length",
                format!("at least {} characters required", c.min_length),
            ));
        }
        let rules: [(bool, &str, fn(char) -> bool); 4] = [
            (c.require_uppercase, "password-uppercase", char::is_uppercase),
            (c.require_lowercase, "password-lowercase", char::is_lowercase),
            (c.require_digit, "password-digit", |ch| ch.is_ascii_digit()),
            (c.require_special, "password-special", is_special),
        ];
        for (required, rule, class) in rules {
            if required && !password.chars().any(class) {
                return Err(Error::policy(rule, "required character class missing"));
            }
        }
        Ok(())
    }

    /// Generates a password satisfying the policy.
    #[must_use]
    pub fn generate(&self) -> String {
        let c = &self.config;
        let mut rng = rand::thread_rng();
        let mut classes: Vec<&[u8]> = vec![UPPER, LOWER, DIGITS];
        if c.require_special {
            classes.push(SPECIAL);
        }
        let pool: Vec<u8> = classes.concat();

        let mut chars: Vec<u8> = classes
            .iter()
            .map(|class| class[rng.gen_range(0..class.len())])
            .collect();
        let length = c.generated_length.max(c.min_length).max(chars.len());
        while chars.len() < length {
            chars.push(pool[rng.gen_range(0..pool.len())]);
        }
        chars.shuffle(&mut rng);
        chars.into_iter().map(char::from).collect()
    }
}

fn is_special(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn tenant(properties: &[(&str, &str)]) -> TenantConfig {
        let mut tenant: TenantConfig = toml::from_str(
            r#"
name = "acme"
[[storages]]
name = "main"
backend = { type = "memory" }
"#,
        )
        .unwrap();
        tenant.properties = properties
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect::<BTreeMap<_, _>>();
        tenant
    }

    fn rule(err: Error) -> String {
        match err {
            Error::PolicyViolation { rule, .. } => rule,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn default_group_names_carry_the_application() {
        let naming = NamingPolicy::new(&PolicyConfig::default(), &tenant(&[])).unwrap();
        assert!(naming.check_group("crm", "readers_crm").is_ok());
        assert!(naming.check_group("crm", "READERS_CRM").is_ok());
        assert_eq!(rule(naming.check_group("crm", "readers_erp").unwrap_err()), "group-name");
        assert_eq!(rule(naming.check_group("crm", "readers crm").unwrap_err()), "group-name");
    }

    #[test]
    fn application_names() {
        let naming = NamingPolicy::new(&PolicyConfig::default(), &tenant(&[])).unwrap();
        assert!(naming.check_application("crm-2").is_ok());
        assert_eq!(rule(naming.check_application("crm.2").unwrap_err()), "application-name");
    }

    #[test]
    fn tenant_properties_override_and_feed_patterns() {
        let naming = NamingPolicy::new(
            &PolicyConfig::default(),
            &tenant(&[("group_name_pattern", "$(prefix)_[a-z]+_$(application)"), ("prefix", "ACME")]),
        )
        .unwrap();
        assert!(naming.check_group("crm", "acme_readers_crm").is_ok());
        assert!(naming.check_group("crm", "readers_crm").is_err());
    }

    #[test]
    fn application_values_are_literal() {
        let naming = NamingPolicy::new(&PolicyConfig::default(), &tenant(&[])).unwrap();
        assert!(naming.check_group("c.m", "readers_c.m").is_ok());
        assert!(naming.check_group("c.m", "readers_cxm").is_err());
    }

    #[test]
    fn unknown_placeholder_is_a_configuration_error() {
        let naming = NamingPolicy::new(
            &PolicyConfig::default(),
            &tenant(&[("application_name_pattern", "$(missing)-[a-z]+")]),
        )
        .unwrap();
        assert!(matches!(
            naming.check_application("x-app"),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn password_rules_are_named() {
        let policy = PasswordPolicy::default();
        assert_eq!(rule(policy.check("Short1").unwrap_err()), "password-min-length");
        assert_eq!(rule(policy.check("alllowercase123").unwrap_err()), "password-uppercase");
        assert_eq!(rule(policy.check("ALLUPPERCASE123").unwrap_err()), "password-lowercase");
        assert_eq!(rule(policy.check("NoDigitsAtAllHere").unwrap_err()), "password-digit");
        assert!(policy.check("Valid-Password-42").is_ok());

        let strict = PasswordPolicy::new(PasswordPolicyConfig {
            require_special: true,
            ..PasswordPolicyConfig::default()
        });
        assert_eq!(rule(strict.check("ValidPassword42").unwrap_err()), "password-special");
    }

    #[test]
    fn generated_passwords_pass_the_policy() {
        for special in [false, true] {
            let policy = PasswordPolicy::new(PasswordPolicyConfig {
                require_special: special,
                ..PasswordPolicyConfig::default()
            });
            for _ in 0..20 {
                let password = policy.generate();
                assert_eq!(password.len(), 16);
                assert!(policy.check(&password).is_ok(), "{password}");
            }
        }
    }
}
