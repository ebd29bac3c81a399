//! CLI argument definitions using clap
//!
//! Commands:
//! - quarterclose init --config <path>
//! - quarterclose serve --config <path>
//! - quarterclose exec --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// quarterclose - quarterly readiness and finalization for incident data
#[derive(Parser, Debug)]
#[command(name = "quarterclose")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory layout
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./quarterclose.json")]
        config: PathBuf,
    },

    /// Answer one JSON request per stdin line until EOF
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./quarterclose.json")]
        config: PathBuf,
    },

    /// Answer a single JSON request and exit
    Exec {
        /// Path to configuration file
        #[arg(long, default_value = "./quarterclose.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
