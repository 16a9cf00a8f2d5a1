//! Habilitations: `(property, role, application)` grants.
//!
//! A habilitation is stored as a single `_`-separated token,
//! `[<property>_]<role>_<application>`. Decoding never fails: a token
//! without separator is a bare role.

use std::fmt;

use serde::{Deserialize, Serialize};

const SEPARATOR: char = '_';
const SEPARATOR_STR: &str = "_";

/// An authorization grant held by a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Habilitation {
    /// Optional qualifier (site, region, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Granted role.
    pub role: String,
    /// Application the role applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<String>,
}

impl Habilitation {
    /// Creates a role grant on an application.
    #[must_use]
    pub fn new(role: impl Into<String>, application: impl Into<String>) -> Self {
        Self {
            property: None,
            role: role.into(),
            application: Some(application.into()),
        }
    }

    /// Sets the property.
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Decodes a token.
    ///
    /// One segment is a bare role; two are role and application; three are
    /// property, role and application. With more segments the last is the
    /// application, the one before it the role, and the leading ones form
    /// the property.
    #[must_use]
    pub fn decode(token: &str) -> Self {
        let segments: Vec<&str> = token.split(SEPARATOR).collect();
        match segments.as_slice() {
            [role] => Self {
                property: None,
                role: (*role).to_string(),
                application: None,
            },
            [role, application] => Self::new(*role, *application),
            [property @ .., role, application] => Self::new(*role, *application)
                .with_property(property.join(SEPARATOR_STR)),
            [] => Self {
                property: None,
                role: String::new(),
                application: None,
            },
        }
    }

    /// Encodes to the token form. Absent parts are omitted.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut token = String::new();
        if let Some(property) = &self.property {
            token.push_str(property);
            token.push(SEPARATOR);
        }
        token.push_str(&self.role);
        if let Some(application) = &self.application {
            token.push(SEPARATOR);
            token.push_str(application);
        }
        token
    }

    /// Checks whether the grant targets an application.
    #[must_use]
    pub fn applies_to(&self, application: &str) -> bool {
        self.application
            .as_deref()
            .is_some_and(|app| app.eq_ignore_ascii_case(application))
    }
}

impl fmt::Display for Habilitation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_segments_round_trip() {
        let hab = Habilitation::decode("prop_role_app");
        assert_eq!(hab.property.as_deref(), Some("prop"));
        assert_eq!(hab.role, "role");
        assert_eq!(hab.application.as_deref(), Some("app"));
        assert_eq!(hab.encode(), "prop_role_app");
    }

    #[test]
    fn two_segments_have_no_property() {
        let hab = Habilitation::decode("role_app");
        assert_eq!(hab.property, None);
        assert_eq!(hab.role, "role");
        assert_eq!(hab.application.as_deref(), Some("app"));
    }

    #[test]
    fn malformed_is_role_only() {
        let hab = Habilitation::decode("malformed");
        assert_eq!(hab.role, "malformed");
        assert_eq!(hab.application, None);
        assert_eq!(hab.property, None);
        assert_eq!(hab.encode(), "malformed");
    }

    #[test]
    fn long_tokens_keep_leading_segments_in_property() {
        let hab = Habilitation::decode("site_paris_admin_crm");
        assert_eq!(hab.property.as_deref(), Some("site_paris"));
        assert_eq!(hab.role, "admin");
        assert_eq!(hab.application.as_deref(), Some("crm"));
        assert_eq!(hab.encode(), "site_paris_admin_crm");
    }

    #[test]
    fn empty_segments_do_not_panic() {
        for token in ["", "_", "__", "a__b", "_x_"] {
            assert_eq!(Habilitation::decode(token).encode(), token);
        }
    }

    #[test]
    fn applies_to_ignores_case() {
        assert!(Habilitation::new("reader", "CRM").applies_to("crm"));
        assert!(!Habilitation::decode("reader").applies_to("crm"));
    }
}
