//! CLI module for ndblock
//!
//! Provides command-line interface for:
//! - init: Create an empty container
//! - validate: Structural validation report
//! - unit: Unit normalization and scaling

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, run, run_command, unit, validate, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
