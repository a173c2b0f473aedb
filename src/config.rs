use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_DB_FILE: &str = "log.sqlite";
pub const DEFAULT_TABLE_NAME: &str = "log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// On-disk JSON config. Every key is optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    db: Option<PathBuf>,
    table: Option<String>,
    qpar: Option<Vec<String>>,
}

/// Resolved settings, immutable for the rest of the run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db: PathBuf,
    pub table: String,
    /// URL query parameters extracted into extra columns, in order: config
    /// file entries first, then command-line additions. Never deduplicated;
    /// a duplicate shows up as a duplicate-column error at table creation.
    pub query_params: Vec<String>,
}

impl Settings {
    /// Layers command-line overrides on top of the optional config file.
    /// A missing config file leaves the defaults in place; a file that
    /// exists but does not parse is an error.
    pub fn resolve(
        config_path: &Path,
        db: Option<PathBuf>,
        table: Option<String>,
        qpar: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let file: ConfigFile = if config_path.exists() {
            serde_json::from_str(&fs::read_to_string(config_path)?)?
        } else {
            ConfigFile::default()
        };

        let mut query_params = file.qpar.unwrap_or_default();
        query_params.extend(qpar);

        Ok(Settings {
            db: db
                .or(file.db)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE)),
            table: table
                .or(file.table)
                .unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string()),
            query_params,
        })
    }
}
