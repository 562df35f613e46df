//! CLI command implementations
//!
//! Every command writes exactly one JSON object to stdout. Configuration
//! problems and missing containers are returned as errors; data-level
//! rejections (an invalid unit) are reported as error responses.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::file::{File, FileMode};
use crate::manifest::Manifest;
use crate::observability::{log_event_with_fields, Event, Logger, Severity};
use crate::units;
use crate::validation::{self, ValidationResult};

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Container directory (required)
    pub data_dir: String,

    /// Mode used by `init` (optional, default "read_write")
    #[serde(default = "default_mode")]
    pub default_mode: FileMode,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_mode() -> FileMode {
    FileMode::ReadWrite
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }

        if Severity::parse(&self.log_level).is_none() {
            return Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Must be one of trace, info, warn, error, fatal.",
                self.log_level
            )));
        }

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    pub fn severity(&self) -> Severity {
        Severity::parse(&self.log_level).unwrap_or(Severity::Info)
    }
}

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Validate {
            config,
            block,
            array,
        } => validate(&config, &block, array.as_deref()),
        Command::Unit { unit: u, to } => unit(&u, to.as_deref()),
    }
}

/// Load the config and apply its log level before anything is logged
fn load_config(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity());
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", &config.data_dir)]);
    Ok(config)
}

/// Create an empty container.
///
/// With `default_mode: overwrite` any existing container is discarded.
pub fn init(config_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    match config.default_mode {
        FileMode::ReadOnly => {
            return Err(CliError::config_error(
                "init needs a writable default_mode (read_write or overwrite)",
            ))
        }
        FileMode::ReadWrite if Manifest::exists(data_dir) => {
            return Err(CliError::already_initialized());
        }
        _ => {}
    }

    let file = File::open(data_dir, config.default_mode)?;
    let location = file.location();
    file.close()?;

    write_response(json!({"initialized": true, "location": location}))?;
    Ok(())
}

/// Validate one array, or every array of a block
pub fn validate(config_path: &Path, block_name: &str, array_name: Option<&str>) -> CliResult<()> {
    let config = load_config(config_path)?;
    let data_dir = config.data_path();

    if !Manifest::exists(data_dir) {
        return Err(CliError::not_initialized());
    }

    let file = File::open(data_dir, FileMode::ReadOnly)?;
    let block = file
        .block(block_name)
        .ok_or_else(|| CliError::not_found(format!("block '{}'", block_name)))?;

    let (result, checked): (ValidationResult, usize) = match array_name {
        Some(name) => {
            let array = block.data_array(name).ok_or_else(|| {
                CliError::not_found(format!("data array '{}' in block '{}'", name, block_name))
            })?;
            (validation::validate(array), 1)
        }
        None => (validation::validate_block(block), block.data_array_count()),
    };

    write_response(json!({
        "block": block.name(),
        "arrays_checked": checked,
        "ok": result.is_ok(),
        "error_count": result.error_count(),
        "warning_count": result.warning_count(),
        "errors": result.errors(),
        "warnings": result.warnings(),
    }))?;

    file.close()?;
    Ok(())
}

/// Normalize a unit and optionally report its scaling into `to`
pub fn unit(input: &str, to: Option<&str>) -> CliResult<()> {
    let normalized = match units::normalize(input) {
        Ok(n) => n,
        Err(e) => return write_error(e.code(), &e.to_string()),
    };

    let mut data = json!({
        "unit": normalized,
        "atomic": units::is_atomic(&normalized),
    });

    if let Some(target) = to {
        match units::scaling(&normalized, target) {
            Ok(factor) => {
                data["to"] = json!(target);
                data["factor"] = json!(factor);
            }
            Err(e) => return write_error(e.code(), &e.to_string()),
        }
    }

    write_response(data)
}
