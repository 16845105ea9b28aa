//! Configuration handling for batch_insert

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Chunk size used when the configuration does not set one
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Load configuration from a TOML or YAML file
pub fn load_from_file(path: &str) -> Result<Config> {
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let is_yaml = Path::new(path)
        .extension()
        .map_or(false, |ext| ext == "yaml" || ext == "yml");

    let config: Config = if is_yaml {
        serde_yaml::from_str(&config_str)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?
    } else {
        toml::from_str(&config_str)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?
    };

    config.validate()?;
    Ok(config)
}

/// Represents the complete batch_insert configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub tables: Vec<TableMapping>,
    #[serde(default)]
    pub naming: NamingConfig,
    pub logging: Option<LoggingConfig>,
}

impl Config {
    /// Reject settings the compositor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.batch.chunk_size == 0 {
            return Err(Error::ConfigError(
                "batch.chunk_size must be greater than zero".to_string(),
            ));
        }

        match self.database.driver.as_str() {
            "mysql" | "sqlite" => {}
            other => {
                return Err(Error::ConfigError(format!(
                    "Unsupported database driver: {}",
                    other
                )))
            }
        }

        for mapping in &self.tables {
            if mapping.entity.trim().is_empty() {
                return Err(Error::ConfigError(
                    "tables.entity must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub driver: String,
    pub url: String,
    pub pool_size: Option<u32>,
    pub timeout_seconds: Option<u64>,
}

/// Batching behaviour
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BatchConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_true")]
    pub validate_rows: bool,
    #[serde(default)]
    pub use_transaction: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            validate_rows: true,
            use_transaction: false,
        }
    }
}

/// Maps an entity type to its table and real columns
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TableMapping {
    pub entity: String,
    pub table: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// Naming conventions configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NamingConfig {
    #[serde(default = "default_table_style")]
    pub table_style: String,
    #[serde(default)]
    pub pluralize_tables: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            table_style: default_table_style(),
            pluralize_tables: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub format: String,
    pub stdout: bool,
    #[serde(default = "default_true")]
    pub mask_urls: bool,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_true() -> bool {
    true
}

fn default_table_style() -> String {
    "snake_case".to_string()
}
