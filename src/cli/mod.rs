//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// TAP output for Rust test suites
#[derive(Parser, Debug)]
#[command(name = "simpletap")]
#[command(version)]
#[command(about = "Run the demonstration suite and print TAP results")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the built-in demonstration suite
    Run(RunArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Stop after the first failing test
    #[arg(short, long)]
    pub fail_fast: bool,

    /// Colorize status tokens (auto, always, never)
    #[arg(long)]
    pub color: Option<String>,

    /// Configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the JSON run summary to this path
    #[arg(short, long)]
    pub summary: Option<PathBuf>,

    /// Skip frames under this path prefix when locating the failing line
    #[arg(long, value_name = "PREFIX")]
    pub exclude: Vec<PathBuf>,

    /// Only run tests whose identity contains this text
    #[arg(long)]
    pub filter: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write an example configuration file
    Init {
        /// Output path
        #[arg(default_value = "./simpletap.yaml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Configuration file
        path: Option<PathBuf>,

        /// Output format (yaml, json)
        #[arg(long, default_value = "yaml")]
        format: String,

        /// List the recognized environment variables instead
        #[arg(long)]
        env: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file (defaults to the first one found)
        file: Option<PathBuf>,
    },
}
