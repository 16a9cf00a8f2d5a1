//! `catalog`: dumps the merged mapping catalog.

use serde::Serialize;
use tabled::Tabled;

use crate::output::{output, OutputFormat};

use super::Context;

/// One catalog line in effect for a storage.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct MappingRow {
    /// Storage name.
    pub storage: String,
    /// Entity kind.
    pub kind: String,
    /// Model path.
    pub path: String,
    /// Backend attribute.
    pub attribute: String,
    /// Value conversion.
    #[tabled(rename = "type")]
    #[serde(rename = "type")]
    pub mapping_type: String,
    /// `rw` or `ro`, after derived types are forced read-only.
    pub access: String,
}

/// Runs `catalog`.
///
/// ## Errors
///
/// Returns an error if the tenant or storage is unknown.
pub fn run_catalog(
    tenant: &str,
    storage: Option<&str>,
    ctx: &Context,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let storages = match storage {
        Some(storage) => vec![storage.to_string()],
        None => ctx
            .router
            .storages(tenant)?
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    };

    let mut rows = Vec::new();
    for name in &storages {
        let store = ctx.router.store(tenant, name)?;
        rows.extend(store.codec().catalog().iter().map(|mapping| MappingRow {
            storage: name.clone(),
            kind: mapping.kind.as_str().to_string(),
            path: mapping.path.to_string(),
            attribute: mapping.attribute.clone(),
            mapping_type: mapping.mapping_type.to_string(),
            access: if mapping.writable && mapping.mapping_type.is_writable() {
                "rw".to_string()
            } else {
                "ro".to_string()
            },
        }));
    }
    output(&rows, format)
}
