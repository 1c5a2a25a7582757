mod cli;
mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use hostfacts_core::config::{load_dotenv, Config};

use crate::cli::CliArgs;

fn main() -> Result<ExitCode> {
    load_dotenv();
    let config = Config::from_env();

    // RUST_LOG wins over LOG_LEVEL
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    config.log_summary();

    let args = CliArgs::parse();
    commands::run(args.command, &config)
}
