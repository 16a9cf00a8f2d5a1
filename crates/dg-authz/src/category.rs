//! Permission categories and how they imply each other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A permission category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Global administrator.
    Admin,
    /// Administrator of one tenant.
    TenantAdmin,
    /// May read a tenant or storage.
    Reader,
    /// May write a tenant or storage.
    Writer,
    /// May validate credentials.
    PasswordValidator,
    /// Manages an application and its groups.
    ApplicationManager,
    /// Manages the membership of one group.
    GroupManager,
    /// Member of a group its own members may change.
    SelfManagedGroupMember,
}

impl Category {
    /// Every category.
    pub const ALL: [Self; 8] = [
        Self::Admin,
        Self::TenantAdmin,
        Self::Reader,
        Self::Writer,
        Self::PasswordValidator,
        Self::ApplicationManager,
        Self::GroupManager,
        Self::SelfManagedGroupMember,
    ];

    /// Returns the kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::TenantAdmin => "tenant-admin",
            Self::Reader => "reader",
            Self::Writer => "writer",
            Self::PasswordValidator => "password-validator",
            Self::ApplicationManager => "application-manager",
            Self::GroupManager => "group-manager",
            Self::SelfManagedGroupMember => "self-managed-group-member",
        }
    }

    /// Categories that grant this one on the same target.
    ///
    /// `Admin` implies everything and is checked separately.
    #[must_use]
    pub const fn implied_by(self) -> &'static [Self] {
        match self {
            Self::Reader => &[Self::TenantAdmin, Self::Writer],
            Self::Writer | Self::PasswordValidator | Self::ApplicationManager => &[Self::TenantAdmin],
            Self::GroupManager => &[Self::ApplicationManager],
            Self::Admin | Self::TenantAdmin | Self::SelfManagedGroupMember => &[],
        }
    }

    /// Checks whether the category is decided by role patterns alone.
    #[must_use]
    pub const fn is_pattern_based(self) -> bool {
        !matches!(self, Self::SelfManagedGroupMember)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown permission category '{s}'"))
    }
}
