//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dg_authz::Category;

use crate::output::OutputFormat;

/// dirgate - directory gateway administration.
#[derive(Debug, Parser)]
#[command(name = "dirgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to `dirgate.toml`).
    #[arg(short, long, env = "DIRGATE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Validate the configuration and build every store.
    CheckConfig(CheckConfigArgs),

    /// Show the merged attribute catalog of a tenant's storages.
    Catalog {
        /// Tenant name.
        tenant: String,

        /// Storage name (all storages when omitted).
        storage: Option<String>,
    },

    /// Habilitation token utilities.
    #[command(subcommand)]
    Habilitation(HabilitationCommand),

    /// Decide whether roles grant a permission category.
    Can(CanArgs),

    /// User lookups.
    #[command(subcommand)]
    User(UserCommand),
}

/// Arguments of `check-config`.
#[derive(Debug, Args)]
pub struct CheckConfigArgs {
    /// Also probe every backend.
    #[arg(long)]
    pub connect: bool,
}

/// Habilitation commands.
#[derive(Debug, Subcommand)]
pub enum HabilitationCommand {
    /// Split tokens into property, role and application.
    Decode {
        /// Tokens as stored on users.
        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Build a token.
    Encode {
        /// Granted role.
        #[arg(long)]
        role: String,

        /// Application the role applies to.
        #[arg(long)]
        application: Option<String>,

        /// Optional qualifier.
        #[arg(long)]
        property: Option<String>,
    },
}

/// Arguments of `can`.
#[derive(Debug, Args)]
pub struct CanArgs {
    /// Permission category, e.g. `reader` or `group-manager`.
    pub category: Category,

    /// Caller roles, comma separated.
    #[arg(long, value_delimiter = ',')]
    pub roles: Vec<String>,

    /// Caller username, needed for self-managed group checks.
    #[arg(long)]
    pub subject: Option<String>,

    /// Target tenant.
    #[arg(long)]
    pub tenant: Option<String>,

    /// Target storage.
    #[arg(long, requires = "tenant")]
    pub storage: Option<String>,

    /// Target application.
    #[arg(long, requires = "tenant")]
    pub application: Option<String>,

    /// Target group.
    #[arg(long, requires = "application")]
    pub group: Option<String>,
}

/// User commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Get a user by username.
    Get {
        /// Username.
        username: String,

        /// Tenant and storage.
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// Search users by example.
    Search {
        /// Tenant and storage.
        #[command(flatten)]
        scope: ScopeArgs,

        /// Last name (`*` wildcards allowed).
        #[arg(long)]
        last_name: Option<String>,

        /// First name.
        #[arg(long)]
        first_name: Option<String>,

        /// Mail address.
        #[arg(long)]
        mail: Option<String>,

        /// Match any criterion instead of all.
        #[arg(long)]
        any: bool,

        /// Tolerate separators and partial names.
        #[arg(long)]
        fuzzy: bool,

        /// Page size.
        #[arg(long)]
        size: Option<usize>,

        /// Continuation token from a previous page.
        #[arg(long)]
        token: Option<String>,
    },
}

/// Tenant and optional storage of a lookup.
#[derive(Debug, Args)]
pub struct ScopeArgs {
    /// Tenant name.
    #[arg(long)]
    pub tenant: String,

    /// Storage name (all storages when omitted).
    #[arg(long)]
    pub storage: Option<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_permission_check() {
        let cli = Cli::parse_from([
            "dirgate",
            "can",
            "group-manager",
            "--roles",
            "sales_managers,dir_acme_reader",
            "--tenant",
            "acme",
            "--application",
            "crm",
            "--group",
            "sales",
        ]);
        let Command::Can(args) = cli.command else {
            panic!("expected can");
        };
        assert_eq!(args.category, Category::GroupManager);
        assert_eq!(args.roles, ["sales_managers", "dir_acme_reader"]);
        assert_eq!(args.group.as_deref(), Some("sales"));
    }

    #[test]
    fn group_requires_application() {
        let parsed = Cli::try_parse_from(["dirgate", "can", "reader", "--tenant", "acme", "--group", "sales"]);
        assert!(parsed.is_err());
    }
}
