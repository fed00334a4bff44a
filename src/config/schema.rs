//! Configuration schema for ledger-index
//!
//! Configuration is stored at `~/.config/ledger-index/config.toml`

use crate::cache::DEFAULT_LOCK_STRIPES;
use crate::fileinfo::header::{HEADER_VERSION_0, HEADER_VERSION_1};
use crate::fileinfo::CURRENT_HEADER_VERSION;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Index storage settings
    pub storage: StorageConfig,
}

impl Config {
    /// Check values serde cannot validate on its own
    pub fn validate(&self) -> Result<(), String> {
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                self.general.log_format
            ));
        }

        if !matches!(
            self.storage.header_version,
            HEADER_VERSION_0 | HEADER_VERSION_1
        ) {
            return Err(format!(
                "storage.header_version must be 0 or 1, got {}",
                self.storage.header_version
            ));
        }

        if self.storage.lock_stripes == 0 {
            return Err("storage.lock_stripes must be at least 1".to_string());
        }

        Ok(())
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Index storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory for ledger index files
    pub ledger_dir: PathBuf,

    /// Header version written into new index files
    pub header_version: u32,

    /// Number of per-ledger lock stripes in the backing cache
    pub lock_stripes: usize,
}

impl StorageConfig {
    /// Default ledger directory under the platform data dir
    pub fn default_ledger_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ledger-index")
            .join("ledgers")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            ledger_dir: Self::default_ledger_dir(),
            header_version: CURRENT_HEADER_VERSION,
            lock_stripes: DEFAULT_LOCK_STRIPES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[storage]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.storage.header_version, CURRENT_HEADER_VERSION);
        assert_eq!(config.storage.lock_stripes, DEFAULT_LOCK_STRIPES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [storage]
            ledger_dir = "/var/lib/bookie/ledgers"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.storage.ledger_dir,
            PathBuf::from("/var/lib/bookie/ledgers")
        );
        assert_eq!(config.general.log_format, "text"); // default preserved
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = Config::default();
        config.storage.header_version = 9;
        assert!(config.validate().unwrap_err().contains("header_version"));

        let mut config = Config::default();
        config.storage.lock_stripes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.general.log_format = "xml".to_string();
        assert!(config.validate().is_err());
    }
}
