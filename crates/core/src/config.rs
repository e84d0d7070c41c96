//! Application configuration.
//!
//! Defaults, then an optional TOML file under the user's config
//! directory, then `PELOTON_*` environment overrides.

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::roster::{RosterRules, DEFAULT_MAX_BUDGET, DEFAULT_MAX_RIDERS};

/// Directory name under the user's config dir.
pub const CONFIG_DIR: &str = "peloton";
/// Configuration file name.
pub const CONFIG_FILE: &str = "config.toml";

const DEFAULT_CATALOG_SOURCE: &str = "data/riders.csv";

/// Runtime configuration for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path or URL of the semicolon-delimited rider list.
    pub catalog_source: String,
    /// Optional path or URL of the scoring overlay feed.
    pub overlay_source: Option<String>,
    /// Directory holding persisted state.
    pub data_dir: PathBuf,
    /// Budget cap override.
    pub max_budget: u32,
    /// Roster size cap override.
    pub max_riders: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_source: DEFAULT_CATALOG_SOURCE.to_string(),
            overlay_source: None,
            data_dir: default_data_dir(),
            max_budget: DEFAULT_MAX_BUDGET,
            max_riders: DEFAULT_MAX_RIDERS,
        }
    }
}

impl AppConfig {
    /// Path of the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load configuration from defaults, file, and environment.
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("catalog_source", DEFAULT_CATALOG_SOURCE)
            .context("default catalog_source")?
            .set_default(
                "data_dir",
                default_data_dir().to_string_lossy().to_string(),
            )
            .context("default data_dir")?
            .set_default("max_budget", i64::from(DEFAULT_MAX_BUDGET))
            .context("default max_budget")?
            .set_default("max_riders", DEFAULT_MAX_RIDERS as i64)
            .context("default max_riders")?;

        let path = Self::config_path();
        if path.exists() {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix("PELOTON"));

        let config = builder.build().context("failed to assemble configuration")?;
        config
            .try_deserialize()
            .context("failed to deserialize configuration")
    }

    /// Roster rules derived from the configured caps.
    pub fn rules(&self) -> RosterRules {
        RosterRules {
            max_budget: self.max_budget,
            max_riders: self.max_riders,
        }
    }
}

/// Write a commented default configuration file when none exists.
pub fn ensure_default_config() -> Result<()> {
    let path = AppConfig::config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let contents = format!(
        "\
# peloton configuration

# Path or URL of the semicolon-delimited rider list.
catalog_source = \"{DEFAULT_CATALOG_SOURCE}\"

# Optional scoring overlay feed (name;stagePoints;gcPoints;leaderBonus).
# overlay_source = \"data/scoring-updates.csv\"

# Draft constraints.
max_budget = {DEFAULT_MAX_BUDGET}
max_riders = {DEFAULT_MAX_RIDERS}
"
    );
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}

fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_draft_constants() {
        let config = AppConfig::default();
        assert_eq!(config.max_budget, 4000);
        assert_eq!(config.max_riders, 8);
        assert!(config.overlay_source.is_none());
        assert_eq!(config.rules(), RosterRules::default());
    }
}
