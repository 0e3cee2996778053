//! Vaultlink CLI
//!
//! Entry point for the `vaultlink` binary.

mod cli;
mod commands;

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Register(args) => commands::register::run(args, config).await,
        Commands::GetSecret(args) => commands::get_secret::run(args, config).await,
        Commands::StoreSecret(args) => commands::store_secret::run(args, config).await,
        Commands::DeleteSecret(args) => commands::delete_secret::run(args, config).await,
        Commands::List => commands::list::run(config).await,
        Commands::Deregister(args) => commands::deregister::run(args, config).await,
        Commands::Resolve(args) => commands::resolve::run(args, config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.verbose > 0 {
                error!("{:?}", e);
            } else {
                error!("{:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}
