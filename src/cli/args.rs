//! CLI argument definitions using clap
//!
//! Commands:
//! - ndblock init --config <path>
//! - ndblock validate --config <path> --block <name> [--array <name>]
//! - ndblock unit <unit> [--to <unit>]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ndblock - N-dimensional measurement arrays with integrity checks
#[derive(Parser, Debug)]
#[command(name = "ndblock")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty container in the configured data directory
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./ndblock.json")]
        config: PathBuf,
    },

    /// Structurally validate a block, or one array in it
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./ndblock.json")]
        config: PathBuf,

        /// Block name or id
        #[arg(long)]
        block: String,

        /// Array name or id; all arrays of the block when omitted
        #[arg(long)]
        array: Option<String>,
    },

    /// Check and normalize a unit string
    Unit {
        unit: String,

        /// Report the scaling factor into this unit
        #[arg(long)]
        to: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let cli = Cli::try_parse_from([
            "ndblock", "validate", "--config", "c.json", "--block", "b1", "--array", "a1",
        ])
        .unwrap();
        match cli.command {
            Command::Validate { config, block, array } => {
                assert_eq!(config, PathBuf::from("c.json"));
                assert_eq!(block, "b1");
                assert_eq!(array.as_deref(), Some("a1"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_unit_defaults() {
        let cli = Cli::try_parse_from(["ndblock", "unit", "mV^2"]).unwrap();
        assert!(matches!(cli.command, Command::Unit { ref unit, to: None } if unit == "mV^2"));
    }

    #[test]
    fn test_init_default_config() {
        let cli = Cli::try_parse_from(["ndblock", "init"]).unwrap();
        assert!(matches!(cli.command, Command::Init { ref config } if config == &PathBuf::from("./ndblock.json")));
    }
}
