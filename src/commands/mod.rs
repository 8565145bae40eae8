//! Command implementations for casebook.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations.

mod locks;
mod serve;

use crate::cli::{Command, LocksAction};

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Serve(args) => serve::cmd_serve(args),
        Command::Locks(cmd) => {
            let config = locks::resolve_config(&cmd.config)?;
            match cmd.action {
                LocksAction::List => locks::cmd_locks_list(&config)?,
                LocksAction::Clear(args) => locks::cmd_locks_clear(&config, args)?,
            }
            Ok(())
        }
    }
}
