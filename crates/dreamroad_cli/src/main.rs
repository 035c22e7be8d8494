//! `dreamroad` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration and start file logging when requested.
//! - Dispatch subcommands; print errors to stderr with exit code 1.

mod cli;
mod commands;
mod config;
mod error;
mod http_advice;

use clap::Parser;
use cli::Cli;
use config::CliConfig;
use dreamroad_core::init_logging;
use error::CliError;
use log::error;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = CliConfig::from_cli(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)?;
    }
    commands::run(cli.command, &config)
}
