//! simpletap - TAP output for Rust test suites
//!
//! Runs a built-in demonstration suite and prints its TAP stream.
//!
//! ## Usage
//!
//! ```bash
//! # Run the demonstration suite
//! simpletap run
//!
//! # Stop at the first failure, always colorize
//! simpletap run --fail-fast --color always
//!
//! # Run a subset and keep a JSON summary
//! simpletap run --filter Basics --summary target/summary.json
//!
//! # Write an example configuration file
//! simpletap config init
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::info;

mod cli;
mod demo;

use cli::Args;
use simpletap::config::{env_help, ConfigFile};
use simpletap::utils::{init_logger, LogLevel};
use simpletap::{ColorMode, RunnerConfig, TapTestRunner};

fn main() -> Result<()> {
    let args = Args::parse();

    init_logger(if args.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    });

    match args.command {
        cli::Command::Run(run_args) => {
            let code = run_demo(run_args)?;
            std::process::exit(code);
        }
        cli::Command::Config(config_args) => {
            manage_config(config_args)?;
        }
    }

    Ok(())
}

fn run_demo(args: cli::RunArgs) -> Result<i32> {
    let mut config = RunnerConfig::load_layered(args.config.as_deref())?;

    if args.fail_fast {
        config.fail_fast = true;
    }
    if let Some(color) = &args.color {
        config.color = ColorMode::from_str(color)
            .ok_or_else(|| anyhow::anyhow!("Unknown color mode: {color}"))?;
    }
    if let Some(path) = args.summary {
        config.summary_path = Some(path);
    }
    config.exclude.extend(args.exclude);

    let mut suite = demo::suite();
    if let Some(pattern) = &args.filter {
        suite = suite.filter(pattern);
        info!("Filter '{}' selected {} tests", pattern, suite.count_tests());
    }

    let mut runner = TapTestRunner::new().with_config(config);
    let summary = runner.run(&suite).context("Test run failed")?;

    Ok(summary.exit_code())
}

fn manage_config(args: cli::ConfigArgs) -> Result<()> {
    match args.action {
        cli::ConfigAction::Init { output, force } => {
            if output.exists() && !force {
                anyhow::bail!(
                    "Configuration file already exists: {}. Use --force to overwrite.",
                    output.display()
                );
            }

            ConfigFile::example().save(&output)?;
            println!("Configuration file created: {}", output.display());
        }

        cli::ConfigAction::Show { path, format, env } => {
            if env {
                println!("Environment Variables:\n");
                print!("{}", env_help());
            } else {
                let config = ConfigFile::new(RunnerConfig::load_layered(path.as_deref())?);
                println!("{}", config.render(format != "json")?);
            }
        }

        cli::ConfigAction::Validate { file } => {
            let path = file
                .or_else(ConfigFile::find)
                .unwrap_or_else(|| Path::new("./simpletap.yaml").to_path_buf());

            match ConfigFile::load(&path) {
                Ok(_) => {
                    println!("Configuration file is valid: {}", path.display());
                }
                Err(e) => {
                    println!("Configuration file is invalid: {}", path.display());
                    println!("  Error: {e:#}");
                    return Err(e);
                }
            }
        }
    }

    Ok(())
}
