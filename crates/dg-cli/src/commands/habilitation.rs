//! `habilitation`: token encoding and decoding.

use dg_model::Habilitation;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::HabilitationCommand;
use crate::output::{output, output_single, OutputFormat};
use crate::CliError;

use super::or_dash;

/// A decoded token.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct HabilitationRow {
    /// Token as given.
    pub token: String,
    /// Qualifier.
    pub property: String,
    /// Granted role.
    pub role: String,
    /// Application.
    pub application: String,
}

impl HabilitationRow {
    fn decode(token: &str) -> Self {
        let habilitation = Habilitation::decode(token);
        Self {
            token: token.to_string(),
            property: or_dash(habilitation.property.as_deref()),
            role: habilitation.role,
            application: or_dash(habilitation.application.as_deref()),
        }
    }
}

/// Builds a token, rejecting parts that would not decode back.
///
/// ## Errors
///
/// Returns `CliError::InvalidArgument` if the role is empty, or the role or
/// application contains the `_` separator.
pub fn encode(role: &str, application: Option<&str>, property: Option<&str>) -> crate::CliResult<String> {
    if role.is_empty() {
        return Err(CliError::InvalidArgument("role must not be empty".to_string()));
    }
    if role.contains('_') || application.is_some_and(|a| a.contains('_')) {
        return Err(CliError::InvalidArgument(
            "role and application must not contain '_'".to_string(),
        ));
    }
    if property.is_some() && application.is_none() {
        return Err(CliError::InvalidArgument(
            "a property needs an application".to_string(),
        ));
    }

    let habilitation = Habilitation {
        property: property.map(ToString::to_string),
        role: role.to_string(),
        application: application.map(ToString::to_string),
    };
    Ok(habilitation.encode())
}

/// Runs a habilitation command.
///
/// ## Errors
///
/// Returns an error on invalid parts or output failure.
pub fn run_habilitation(cmd: &HabilitationCommand, format: OutputFormat) -> crate::CliResult<()> {
    match cmd {
        HabilitationCommand::Decode { tokens } => {
            let rows: Vec<HabilitationRow> = tokens.iter().map(|t| HabilitationRow::decode(t)).collect();
            output(&rows, format)
        }
        HabilitationCommand::Encode {
            role,
            application,
            property,
        } => {
            let token = encode(role, application.as_deref(), property.as_deref())?;
            match format {
                OutputFormat::Text => {
                    println!("{token}");
                    Ok(())
                }
                OutputFormat::Json => output_single(&serde_json::json!({ "token": token }), format),
            }
        }
    }
}
