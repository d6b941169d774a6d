//! CLI configuration management
//!
//! Optional `~/.config/blueprintctl/config.toml`. Every key has a default and
//! command-line flags take precedence over the file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::git::Author;

/// Overrides the config file location
pub const CONFIG_ENV: &str = "BLUEPRINTCTL_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the platform GitOps repository
    pub repo_path: PathBuf,
    /// Commit and push after every change
    pub auto_push: bool,
    /// Default output format (table, json, yaml)
    pub output: String,
    /// Git remote to push to
    pub remote: String,
    pub author_name: String,
    pub author_email: String,
    pub log_level: String,
    /// Directory for JSON log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repo_path: PathBuf::from("."),
            auto_push: false,
            output: "table".to_string(),
            remote: "origin".to_string(),
            author_name: "blueprintctl".to_string(),
            author_email: "blueprintctl@kube-saas.local".to_string(),
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when the file
    /// does not exist
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("invalid config file {}", path.display()))?;

        Ok(config)
    }

    pub fn author(&self) -> Author {
        Author {
            name: self.author_name.clone(),
            email: self.author_email.clone(),
        }
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".config/blueprintctl/config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.remote, "origin");
        assert!(!config.auto_push);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "repo_path = \"/srv/platform-gitops\"\nauto_push = true\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.repo_path, PathBuf::from("/srv/platform-gitops"));
        assert!(config.auto_push);
        assert_eq!(config.output, "table");
        assert_eq!(config.author().name, "blueprintctl");
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "auto_push = \"sometimes\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
