//! fidi CLI entry point.

use std::{process::ExitCode, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use fidi_cli::{Args, error_adapter};

fn main() -> ExitCode {
    // Install miette's pretty panic hook early for better panic reports
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting fidi");
    debug!(args:?; "Parsed arguments");

    match fidi_cli::run(&args) {
        Ok(completion) => {
            info!(completion:?; "Completed");
            completion.into()
        }
        Err(err) => {
            let report = error_adapter::render(error_adapter::to_reportables(&err, ""));
            error!("Failed\n{report}");
            ExitCode::FAILURE
        }
    }
}
