//! Configuration file management
//!
//! Handles finding, loading, and validating configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::RunnerConfig;
use crate::output::ColorMode;

/// Configuration file locations (in order of precedence)
const CONFIG_LOCATIONS: &[&str] = &[
    "./simpletap.yaml",
    "./simpletap.yml",
    "./.simpletap.yaml",
    "~/.config/simpletap/config.yaml",
];

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Full configuration file structure
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Version of config file format
    #[serde(default = "default_version")]
    pub version: String,

    /// Runner settings
    #[serde(default)]
    pub runner: RunnerConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            runner: RunnerConfig::default(),
        }
    }
}

impl ConfigFile {
    pub fn new(runner: RunnerConfig) -> Self {
        Self {
            version: default_version(),
            runner,
        }
    }

    /// Find configuration file in standard locations
    pub fn find() -> Option<PathBuf> {
        CONFIG_LOCATIONS
            .iter()
            .map(|location| expand_path(location))
            .find(|path| path.exists())
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if is_yaml_file(path) {
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = self.render(is_yaml_file(path))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Serialize as YAML or pretty JSON
    pub fn render(&self, yaml: bool) -> Result<String> {
        if yaml {
            serde_yaml::to_string(self).context("Failed to serialize config")
        } else {
            serde_json::to_string_pretty(self).context("Failed to serialize config")
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_VERSIONS.contains(&self.version.as_str()) {
            anyhow::bail!("Unsupported config version: {}", self.version);
        }

        if self.runner.verbosity > 3 {
            anyhow::bail!(
                "Invalid verbosity {}. Valid range: 0-3",
                self.runner.verbosity
            );
        }

        Ok(())
    }

    /// Generate example configuration
    pub fn example() -> Self {
        Self::new(RunnerConfig {
            fail_fast: false,
            buffer: false,
            descriptions: true,
            verbosity: 1,
            color: ColorMode::Auto,
            source_root: Some(PathBuf::from(".")),
            exclude: Vec::new(),
            summary_path: Some(PathBuf::from("target/simpletap/summary.json")),
        })
    }
}

/// Expand ~ to home directory
fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

/// Check if file is YAML based on extension
fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .map(|e| e == "yaml" || e == "yml")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.runner, RunnerConfig::default());
    }

    #[test]
    fn test_config_file_save_load_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = ConfigFile::example();
        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_file_load_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"version": "1.0", "runner": {"color": "always", "summary_path": "out.json"}}"#,
        )
        .unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.runner.color, ColorMode::Always);
        assert_eq!(loaded.runner.summary_path, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_validate_version() {
        let config = ConfigFile {
            version: "2.0".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_verbosity() {
        let mut config = ConfigFile::default();
        config.runner.verbosity = 9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_rejects_bad_yaml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "runner: [not, a, map]\n").unwrap();

        let err = ConfigFile::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse YAML config"));
    }

    #[test]
    fn test_expand_path() {
        let path = expand_path("./test.yaml");
        assert_eq!(path, PathBuf::from("./test.yaml"));
    }
}
