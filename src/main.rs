mod cli;
mod config;
mod domain;
mod error;
mod infra;
mod workflows;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Command};
use config::Config;
use workflows::sync;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    tracing::debug!("Using data directory {}", config.data_dir.display());

    match cli.command {
        Command::Sync => sync::sync(&config),
        Command::Auth => sync::authorize(&config),
        Command::Add { id, title } => sync::add(&config, &id, title.as_deref()),
    }
}
