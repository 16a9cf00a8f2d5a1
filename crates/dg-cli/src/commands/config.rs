//! `check-config`: validates the configuration and optionally probes backends.

use dg_core::config::BackendConfig;
use dg_model::EntityKind;
use dg_store::ReaderStore;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::CheckConfigArgs;
use crate::output::{output, success, warning, OutputFormat};

use super::Context;

/// One storage of the configuration.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct StorageRow {
    /// Tenant name.
    pub tenant: String,
    /// Storage name.
    pub storage: String,
    /// Backend type or URL.
    pub backend: String,
    /// Entity kinds the storage holds.
    pub kinds: String,
    /// Number of catalog mappings in effect.
    pub mappings: usize,
    /// Probe result.
    pub status: String,
}

/// Runs `check-config`.
///
/// Returns `false` when a probed backend failed.
///
/// ## Errors
///
/// Returns an error if output fails.
pub async fn run_check_config(
    args: &CheckConfigArgs,
    ctx: &Context,
    format: OutputFormat,
) -> crate::CliResult<bool> {
    let mut rows = Vec::new();
    let mut healthy = true;

    for tenant in ctx.router.tenants() {
        for storage in &tenant.storages {
            let store = ctx.router.store(&tenant.name, &storage.name)?;
            let codec = store.codec();

            let status = if args.connect {
                match store.test_connection().await {
                    Ok(()) => "ok".to_string(),
                    Err(e) => {
                        warning(&format!("{}/{}: {e}", store.tenant(), store.storage()));
                        healthy = false;
                        "unreachable".to_string()
                    }
                }
            } else {
                "not probed".to_string()
            };

            rows.push(StorageRow {
                tenant: tenant.name.clone(),
                storage: storage.name.clone(),
                backend: match &storage.backend {
                    BackendConfig::Memory => "memory".to_string(),
                    BackendConfig::Ldap(ldap) => ldap.url.clone(),
                },
                kinds: EntityKind::ALL
                    .into_iter()
                    .filter(|&kind| codec.layout().supports(kind))
                    .map(EntityKind::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                mappings: codec.catalog().len(),
                status,
            });
        }
    }

    output(&rows, format)?;
    if format == OutputFormat::Text && healthy {
        success(&format!(
            "configuration valid: {} tenant(s), {} storage(s)",
            ctx.config.tenants.len(),
            rows.len()
        ));
    }
    Ok(healthy)
}
