mod app;
mod commands;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;

use crate::app::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_file = cli
        .global
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_file);
    logging::init(cli.global.verbose, &log_file);

    if let Err(error) = ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    }) {
        log::warn!("Failed to set Ctrl+C handler: {error}");
    }

    match commands::dump::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{error:#}");
            ExitCode::FAILURE
        }
    }
}
