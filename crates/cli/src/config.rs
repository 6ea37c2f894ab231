//! CLI configuration file
//!
//! ```toml
//! [ledger]
//! conversion_rate = "0.1"
//! min_stake_days = 30
//! reward_rate = "0.05"
//!
//! [database]
//! path = "data/stakeledger.db"
//! max_connections = 5
//! busy_timeout_ms = 5000
//! ```

use serde::{Deserialize, Serialize};
use stakeledger_core::LedgerConfig;
use stakeledger_persistence::DatabaseOptions;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Full CLI configuration; every section and key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ledger: LedgerConfig,
    pub database: DatabaseOptions,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from string
    pub fn load_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.ledger
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::load_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.ledger.conversion_rate, dec!(0.1));
        assert_eq!(config.ledger.min_stake_days, 30);
        assert_eq!(config.ledger.reward_rate, dec!(0.05));
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::load_str(
            r#"
            [ledger]
            min_stake_days = 60

            [database]
            path = "/tmp/ledger.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.min_stake_days, 60);
        assert_eq!(config.ledger.reward_rate, dec!(0.05));
        assert_eq!(config.database.path, PathBuf::from("/tmp/ledger.db"));
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_decimal_rates_as_strings() {
        let config = AppConfig::load_str(
            r#"
            [ledger]
            conversion_rate = "0.25"
            reward_rate = "0.1"
            "#,
        )
        .unwrap();

        assert_eq!(config.ledger.conversion_rate, dec!(0.25));
        assert_eq!(config.ledger.reward_rate, dec!(0.1));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = AppConfig::load_str("[ledger]\nmin_stake_days = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = AppConfig::load_str("[database]\nmax_connections = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));

        let err = AppConfig::load_str("[ledger\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stakeledger.toml");
        std::fs::write(&path, "[ledger]\nmin_stake_days = 45\n").unwrap();

        let config = AppConfig::load_file(&path).unwrap();
        assert_eq!(config.ledger.min_stake_days, 45);

        let err = AppConfig::load_file(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
