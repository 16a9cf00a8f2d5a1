//! User lookups.

use dg_model::User;
use dg_store::SearchQuery;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::UserCommand;
use crate::output::{info, output, output_single, OutputFormat};
use crate::CliError;

use super::{or_dash, Context};

/// User representation for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct UserDisplay {
    /// Username.
    pub username: String,
    /// Full name.
    pub name: String,
    /// Mail address.
    pub mail: String,
    /// Organization identifier.
    pub organization: String,
}

impl From<&User> for UserDisplay {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            name: or_dash(user.full_name().as_deref()),
            mail: or_dash(user.mail.as_deref()),
            organization: or_dash(user.organization.as_ref().map(|o| o.identifier.as_str())),
        }
    }
}

/// Builds a search probe from the given criteria.
#[must_use]
pub fn probe(last_name: Option<&str>, first_name: Option<&str>, mail: Option<&str>) -> User {
    let mut probe = User::new("");
    probe.last_name = last_name.map(ToString::to_string);
    probe.first_name = first_name.map(ToString::to_string);
    probe.mail = mail.map(ToString::to_string);
    probe
}

/// Runs a user command.
///
/// ## Errors
///
/// Returns routing, lookup and output failures, or `NotFound` for an
/// unknown username.
pub async fn run_user(cmd: &UserCommand, ctx: &Context, format: OutputFormat) -> crate::CliResult<()> {
    match cmd {
        UserCommand::Get { username, scope } => {
            let reader = ctx.router.resolve_reader(&scope.tenant, scope.storage.as_deref())?;
            let user = reader
                .get_user(username)
                .await?
                .ok_or_else(|| CliError::not_found("user", username))?;
            output_single(&user, format)
        }
        UserCommand::Search {
            scope,
            last_name,
            first_name,
            mail,
            any,
            fuzzy,
            size,
            token,
        } => {
            let reader = ctx.router.resolve_reader(&scope.tenant, scope.storage.as_deref())?;
            let probe = probe(last_name.as_deref(), first_name.as_deref(), mail.as_deref());

            let mut query = SearchQuery::new().with_token(token.clone());
            if let Some(size) = size {
                query = query.with_size(*size);
            }
            if *any {
                query = query.any();
            }
            if *fuzzy {
                query = query.fuzzy();
            }

            let page = reader.search_users(&probe, &query).await?;
            tracing::debug!(tenant = %scope.tenant, results = page.len(), "user search");

            match format {
                OutputFormat::Text => {
                    let rows: Vec<UserDisplay> = page.results.iter().map(UserDisplay::from).collect();
                    output(&rows, format)?;
                    if let Some(next) = &page.next_token {
                        info(&format!("more results: --token {next}"));
                    }
                    Ok(())
                }
                OutputFormat::Json => output_single(
                    &serde_json::json!({
                        "results": page.results,
                        "next_token": page.next_token,
                    }),
                    format,
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dg_model::Organization;

    use super::*;

    #[test]
    fn display_fills_missing_fields() {
        let user = User::new("jdoe")
            .with_first_name("John")
            .with_last_name("Doe")
            .with_organization(Organization::new("acme-hq"));
        let row = UserDisplay::from(&user);
        assert_eq!(row.organization, "acme-hq");
        assert_eq!(row.mail, "-");
        assert!(row.name.contains("Doe"));
    }

    #[test]
    fn probe_carries_only_given_criteria() {
        let probe = probe(Some("Do*"), None, None);
        assert_eq!(probe.last_name.as_deref(), Some("Do*"));
        assert!(probe.first_name.is_none());
        assert!(probe.username.is_empty());
    }
}
