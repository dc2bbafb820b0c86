//! Environment variable configuration
//!
//! Provides environment variable overrides for configuration.

use std::env;
use std::path::PathBuf;
use tracing::warn;

use super::RunnerConfig;
use crate::output::ColorMode;

/// Environment variable prefix
const ENV_PREFIX: &str = "SIMPLETAP";

/// Environment configuration from environment variables
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvConfig {
    /// From SIMPLETAP_FAIL_FAST
    pub fail_fast: Option<bool>,
    /// From SIMPLETAP_BUFFER
    pub buffer: Option<bool>,
    /// From SIMPLETAP_DESCRIPTIONS
    pub descriptions: Option<bool>,
    /// From SIMPLETAP_VERBOSITY
    pub verbosity: Option<u8>,
    /// From SIMPLETAP_COLOR
    pub color: Option<ColorMode>,
    /// From SIMPLETAP_SOURCE_ROOT
    pub source_root: Option<PathBuf>,
    /// From SIMPLETAP_EXCLUDE, a path list like `PATH`
    pub exclude: Option<Vec<PathBuf>>,
    /// From SIMPLETAP_SUMMARY
    pub summary_path: Option<PathBuf>,
    /// From SIMPLETAP_CONFIG
    pub config_file: Option<PathBuf>,
}

impl EnvConfig {
    /// Load configuration from environment variables
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any variable source; `lookup` receives the full name,
    /// e.g. `SIMPLETAP_COLOR`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let vars = Vars { lookup };
        Self {
            fail_fast: vars.get_bool("FAIL_FAST"),
            buffer: vars.get_bool("BUFFER"),
            descriptions: vars.get_bool("DESCRIPTIONS"),
            verbosity: vars.get_parse("VERBOSITY"),
            color: vars.get("COLOR").and_then(|v| {
                let mode = ColorMode::from_str(&v);
                if mode.is_none() {
                    warn!("Ignoring {}_COLOR={:?}", ENV_PREFIX, v);
                }
                mode
            }),
            source_root: vars.get("SOURCE_ROOT").map(PathBuf::from),
            exclude: vars
                .get("EXCLUDE")
                .map(|v| env::split_paths(&v).collect()),
            summary_path: vars.get("SUMMARY").map(PathBuf::from),
            config_file: vars.get("CONFIG").map(PathBuf::from),
        }
    }

    /// Check if any environment variables are set
    pub fn has_any(&self) -> bool {
        self.fail_fast.is_some()
            || self.buffer.is_some()
            || self.descriptions.is_some()
            || self.verbosity.is_some()
            || self.color.is_some()
            || self.source_root.is_some()
            || self.exclude.is_some()
            || self.summary_path.is_some()
            || self.config_file.is_some()
    }

    /// Override the settings that are present in the environment
    pub fn apply_to(&self, config: &mut RunnerConfig) {
        if let Some(fail_fast) = self.fail_fast {
            config.fail_fast = fail_fast;
        }
        if let Some(buffer) = self.buffer {
            config.buffer = buffer;
        }
        if let Some(descriptions) = self.descriptions {
            config.descriptions = descriptions;
        }
        if let Some(verbosity) = self.verbosity {
            config.verbosity = verbosity;
        }
        if let Some(color) = self.color {
            config.color = color;
        }
        if let Some(root) = &self.source_root {
            config.source_root = Some(root.clone());
        }
        if let Some(exclude) = &self.exclude {
            config.exclude = exclude.clone();
        }
        if let Some(path) = &self.summary_path {
            config.summary_path = Some(path.clone());
        }
    }
}

/// Prefixed variable access over a lookup function
struct Vars<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(&format!("{ENV_PREFIX}_{name}"))
    }

    fn get_parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }
}

/// Describe the recognized environment variables
pub fn env_help() -> String {
    [
        ("FAIL_FAST", "Stop after the first failing test (true/false)"),
        ("BUFFER", "Accepted for compatibility (true/false)"),
        ("DESCRIPTIONS", "Accepted for compatibility (true/false)"),
        ("VERBOSITY", "Accepted for compatibility (0-3)"),
        ("COLOR", "Colorize status tokens (auto, always, never)"),
        ("SOURCE_ROOT", "Directory source snippets are resolved against"),
        ("EXCLUDE", "Path prefixes skipped in diagnostics (path list)"),
        ("SUMMARY", "Path of the JSON run summary"),
        ("CONFIG", "Path to configuration file"),
    ]
    .iter()
    .map(|(name, help)| format!("  {ENV_PREFIX}_{name:<14}{help}\n"))
    .collect()
}
