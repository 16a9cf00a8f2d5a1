//! The caller and the target of a permission check.

use dg_core::pattern::Placeholders;

/// An authenticated caller.
///
/// Roles come from an already verified token; they are uppercased once
/// here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// Username of the caller, when known.
    pub subject: Option<String>,
    /// Uppercased role names.
    pub roles: Vec<String>,
}

impl Caller {
    /// Creates a caller.
    #[must_use]
    pub fn new<I, S>(subject: Option<&str>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            subject: subject.map(ToString::to_string),
            roles: roles
                .into_iter()
                .map(|r| r.as_ref().trim().to_uppercase())
                .filter(|r| !r.is_empty())
                .collect(),
        }
    }

    /// A caller known only by roles.
    #[must_use]
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(None, roles)
    }
}

/// What a check is about. Unset parts are not substituted, which makes
/// templates referring to them inapplicable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// Tenant name.
    pub tenant: Option<String>,
    /// Storage name.
    pub storage: Option<String>,
    /// Application name.
    pub application: Option<String>,
    /// Group name.
    pub group: Option<String>,
}

impl Target {
    /// A target with no scope (global checks).
    #[must_use]
    pub fn global() -> Self {
        Self::default()
    }

    /// A tenant-wide target.
    #[must_use]
    pub fn tenant(tenant: impl Into<String>) -> Self {
        Self {
            tenant: Some(tenant.into()),
            ..Self::default()
        }
    }

    /// Narrows to a storage.
    #[must_use]
    pub fn storage(mut self, storage: impl Into<String>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    /// Narrows to a storage when one is given.
    #[must_use]
    pub fn storage_opt(mut self, storage: Option<&str>) -> Self {
        self.storage = storage.map(ToString::to_string);
        self
    }

    /// Narrows to an application.
    #[must_use]
    pub fn application(mut self, application: impl Into<String>) -> Self {
        self.application = Some(application.into());
        self
    }

    /// Narrows to a group.
    #[must_use]
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// The same target without its storage.
    #[must_use]
    pub fn tenant_wide(&self) -> Self {
        Self {
            storage: None,
            ..self.clone()
        }
    }

    pub(crate) fn placeholders(&self) -> Placeholders {
        Placeholders::new()
            .with_opt("tenant", self.tenant.as_deref())
            .with_opt("storage", self.storage.as_deref())
            .with_opt("application", self.application.as_deref())
            .with_opt("group", self.group.as_deref())
    }
}
