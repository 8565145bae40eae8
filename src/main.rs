//! Casebook: shared case records with expiring soft edit locks.
//!
//! This is the main entry point for the `casebook` CLI. It parses arguments,
//! dispatches to the appropriate command handler, and handles errors with
//! proper exit codes.

mod cli;
mod commands;
pub mod clock;
pub mod config;
pub mod error;
pub mod exit_codes;
pub mod fanout;
pub mod fs;
pub mod locks;
pub mod records;
pub mod server;
pub mod service;
pub mod store;
pub mod telemetry;

use cli::Cli;
use error::CasebookError;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {:#}", err);

            let code = err
                .downcast_ref::<CasebookError>()
                .map(CasebookError::exit_code)
                .unwrap_or(exit_codes::SERVER_FAILURE);
            ExitCode::from(code as u8)
        }
    }
}
