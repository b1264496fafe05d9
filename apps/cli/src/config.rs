//! CLI configuration.
//!
//! Loaded from `<config dir>/study-cards/config.json` when present, then
//! overridden by `STUDY_LOG`, `STUDY_LIST` and `STUDY_SEED`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Default tracing filter when RUST_LOG is unset.
    pub log_level: String,
    /// List studied by `study run` when no file is given.
    pub default_list: Option<PathBuf>,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_list: None,
            seed: None,
        }
    }
}

impl CliConfig {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("study-cards").join("config.json"))
    }

    /// Load the config file at `path`, or the default location, then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))
    }

    /// Apply overrides from a variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup("STUDY_LOG") {
            self.log_level = level;
        }
        if let Some(list) = lookup("STUDY_LIST") {
            self.default_list = Some(PathBuf::from(list));
        }
        if let Some(seed) = lookup("STUDY_SEED") {
            let seed = seed
                .trim()
                .parse()
                .with_context(|| format!("STUDY_SEED is not a number: {seed}"))?;
            self.seed = Some(seed);
        }
        Ok(self)
    }
}
