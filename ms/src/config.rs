//! Memorystore configuration

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Memorystore configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the sessions database file
    #[serde(rename = "store-path")]
    pub store_path: PathBuf,

    /// Default age threshold for prune, in days
    #[serde(rename = "prune-days")]
    pub prune_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        let store_path = dirs::data_dir()
            .map(|d| d.join("answerdaemon"))
            .unwrap_or_else(|| PathBuf::from(".answerdaemon"))
            .join("sessions.db");

        Self {
            store_path,
            prune_days: 30,
        }
    }
}

impl Config {
    /// Load configuration from an explicit path, or fall back to defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)
                .context(format!("Failed to read config from {}", path.display()))?;
            let config = serde_yaml::from_str(&content).context("Failed to parse config file")?;
            return Ok(config);
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.store_path.ends_with("sessions.db"));
        assert_eq!(config.prune_days, 30);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
store-path: /tmp/ms/sessions.db
prune-days: 7
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.store_path, PathBuf::from("/tmp/ms/sessions.db"));
        assert_eq!(config.prune_days, 7);
    }
}
