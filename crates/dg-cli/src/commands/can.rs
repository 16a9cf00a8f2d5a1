//! `can`: evaluates a permission category for a set of roles.

use std::sync::Arc;

use dg_authz::{Caller, DirectoryLookup, PermissionEvaluator, Target};
use serde::Serialize;

use crate::cli::CanArgs;
use crate::output::{info, output_single, success, warning, OutputFormat};

use super::Context;

/// Outcome of a permission check.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    /// Category that was evaluated.
    pub category: String,
    /// Checked scope, `tenant/storage/application/group` as given.
    pub scope: String,
    /// Whether the caller holds the category.
    pub allowed: bool,
    /// Tenants the caller may read.
    pub readable_tenants: Vec<String>,
}

fn target_of(args: &CanArgs) -> Target {
    Target {
        tenant: args.tenant.clone(),
        storage: args.storage.clone(),
        application: args.application.clone(),
        group: args.group.clone(),
    }
}

fn scope_of(target: &Target) -> String {
    let parts: Vec<&str> = [&target.tenant, &target.storage, &target.application, &target.group]
        .into_iter()
        .filter_map(Option::as_deref)
        .collect();
    if parts.is_empty() {
        "*".to_string()
    } else {
        parts.join("/")
    }
}

/// Runs `can`.
///
/// ## Errors
///
/// Returns an error if the evaluator cannot be built or a membership
/// lookup fails.
pub async fn run_can(args: &CanArgs, ctx: &Context, format: OutputFormat) -> crate::CliResult<bool> {
    let lookup: Arc<dyn DirectoryLookup> = Arc::clone(&ctx.router) as Arc<dyn DirectoryLookup>;
    let evaluator = PermissionEvaluator::new(&ctx.config, lookup)?;
    let caller = Caller::new(args.subject.as_deref(), &args.roles);
    let target = target_of(args);

    let decision = Decision {
        category: args.category.to_string(),
        scope: scope_of(&target),
        allowed: evaluator.evaluate(args.category, &caller, &target).await?,
        readable_tenants: evaluator
            .authorized_tenants(&caller, &ctx.config)
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    };

    match format {
        OutputFormat::Text => {
            let message = format!("{} on {}", decision.category, decision.scope);
            if decision.allowed {
                success(&format!("granted: {message}"));
            } else {
                warning(&format!("denied: {message}"));
            }
            if !decision.readable_tenants.is_empty() {
                info(&format!("readable tenants: {}", decision.readable_tenants.join(", ")));
            }
        }
        OutputFormat::Json => output_single(&decision, format)?,
    }
    Ok(decision.allowed)
}

#[cfg(test)]
mod tests {
    use dg_authz::Category;

    use super::*;

    #[test]
    fn scope_lists_given_parts() {
        let args = CanArgs {
            category: Category::GroupManager,
            roles: vec![],
            subject: None,
            tenant: Some("acme".into()),
            storage: None,
            application: Some("crm".into()),
            group: Some("sales".into()),
        };
        assert_eq!(scope_of(&target_of(&args)), "acme/crm/sales");
        assert_eq!(scope_of(&Target::global()), "*");
    }
}
