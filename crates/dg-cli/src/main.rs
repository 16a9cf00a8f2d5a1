//! # dirgate
//!
//! Command-line tools for dirgate administration.

#![forbid(unsafe_code)]

use anyhow::Context as _;
use clap::Parser;
use dg_cli::{
    cli::{Cli, Command},
    commands::{run_can, run_catalog, run_check_config, run_habilitation, run_user, Context},
    output::error,
};
use dg_core::{telemetry, DirectoryConfig};

/// Exit code when a check completed with a negative answer.
const EXIT_DENIED: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(EXIT_DENIED),
        Err(e) => {
            error(&format!("{e:#}"));
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    if let Command::Habilitation(cmd) = &cli.command {
        run_habilitation(cmd, cli.output)?;
        return Ok(true);
    }

    let config = DirectoryConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    telemetry::init(&logging).context("failed to initialize logging")?;

    let ctx = Context::build(config).context("failed to build stores")?;
    let outcome = match &cli.command {
        Command::CheckConfig(args) => run_check_config(args, &ctx, cli.output).await?,
        Command::Catalog { tenant, storage } => {
            run_catalog(tenant, storage.as_deref(), &ctx, cli.output)?;
            true
        }
        Command::Can(args) => run_can(args, &ctx, cli.output).await?,
        Command::User(cmd) => {
            run_user(cmd, &ctx, cli.output).await?;
            true
        }
        Command::Habilitation(_) => true,
    };
    Ok(outcome)
}
