//! Pipeline configuration
//!
//! Every value has a built-in default, so an empty YAML document (or no file
//! at all) gives the stock run: `./parquet/` into `testdb` on
//! `bolt://neodb:7687`, 5000 rows per batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Connection profile for the graph database
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionProfile {
    pub user: String,
    pub password: String,
    /// Bolt URL, e.g. `bolt://neodb:7687`
    pub url: String,
    /// Target database name
    pub database: String,
    /// Rows per write round trip
    pub batch_size: usize,
}

impl Default for ConnectionProfile {
    fn default() -> Self {
        Self {
            user: "neo4j".to_string(),
            password: "password123".to_string(),
            url: "bolt://neodb:7687".to_string(),
            database: "testdb".to_string(),
            batch_size: 5000,
        }
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("url", &self.url)
            .field("database", &self.database)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// Where the source rows come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory of Parquet files (a single file is accepted too)
    pub path: PathBuf,
    /// Rows per Arrow batch while decoding
    pub read_batch_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./parquet/"),
            read_batch_size: 8192,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source: SourceConfig,
    pub neo4j: ConnectionProfile,
    /// Statements run once before the first write (constraints, indexes)
    pub schema_script: Vec<String>,
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        // An empty document deserializes as unit, not as an empty map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.neo4j.batch_size == 0 {
            return Err(ConfigError::Invalid("neo4j.batch_size must be at least 1".into()));
        }
        if self.source.read_batch_size == 0 {
            return Err(ConfigError::Invalid(
                "source.read_batch_size must be at least 1".into(),
            ));
        }
        if self.neo4j.url.trim().is_empty() {
            return Err(ConfigError::Invalid("neo4j.url must not be empty".into()));
        }
        Ok(())
    }
}
