//! Configuration module
//!
//! Runner settings, layered as defaults, then a config file, then the
//! environment.

mod env;
mod file;

pub use env::{env_help, EnvConfig};
pub use file::ConfigFile;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::output::ColorMode;

/// Runner configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Stop scheduling tests after the first failing outcome
    pub fail_fast: bool,

    /// Accepted for compatibility, no effect on TAP output
    pub buffer: bool,

    /// Accepted for compatibility, no effect on TAP output
    pub descriptions: bool,

    /// Accepted for compatibility, no effect on TAP output
    pub verbosity: u8,

    /// When to colorize status tokens
    pub color: ColorMode,

    /// Directory source snippets are resolved against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_root: Option<PathBuf>,

    /// Path prefixes treated as framework code in diagnostics
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<PathBuf>,

    /// Where to write the JSON run summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            buffer: false,
            descriptions: true,
            verbosity: 1,
            color: ColorMode::Auto,
            source_root: None,
            exclude: Vec::new(),
            summary_path: None,
        }
    }
}

impl RunnerConfig {
    /// Resolve the effective configuration from the process environment.
    pub fn load_layered(explicit: Option<&Path>) -> Result<Self> {
        Self::layered(explicit, EnvConfig::load())
    }

    /// Layer a config file and `env` over the defaults.
    ///
    /// The config file is `explicit` when given, else the one named by
    /// `SIMPLETAP_CONFIG`, else the first one found in the standard locations.
    /// Environment overrides are applied last.
    pub fn layered(explicit: Option<&Path>, env: EnvConfig) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env.config_file.clone())
            .or_else(ConfigFile::find);

        let mut config = match path {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                ConfigFile::load(&path)?.runner
            }
            None => Self::default(),
        };

        if env.has_any() {
            debug!("Applying SIMPLETAP_ environment overrides");
        }
        env.apply_to(&mut config);

        Ok(config)
    }
}
