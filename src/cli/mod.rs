//! CLI module for walletapps
//!
//! Provides command-line interface for:
//! - check: Validate a settings document
//! - info: Print an installed app's settings
//! - items: List, read, write and delete items
//! - action: Run an app action

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, ItemTarget, ItemsAction};
pub use commands::{
    boot_from_config, boot_service, check, check_settings, items, items_from_input, run, run_command,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_optional_request, write_error, write_response};
