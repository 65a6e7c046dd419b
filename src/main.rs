//! Packmule CLI - asset packager with content-derived versioning
//!
//! Usage: packmule <COMMAND>
//!
//! Commands:
//!   build   Build packages into versioned artifacts
//!   list    List resolved packages and their member files

mod cli;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let default_filter = match args.verbose {
        0 => "packmule=warn",
        1 => "packmule=info",
        _ => "packmule=debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    let config = cli::load_config(args.config.as_ref())?;

    match args.command {
        cli::Commands::Build { force, kind, names } => cli::run_build(config, force, kind, &names),
        cli::Commands::List => cli::run_list(config),
    }
}
