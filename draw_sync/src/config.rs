//! TOML configuration for `draw-sync`.
//!
//! Every section is optional; anything left out falls back to its default. Command-line
//! flags are applied on top by the binary.
//!
//! ```toml
//! [source]
//! base_url = "https://api.lottery.example/v1/"
//! api_key_env = "LOTTERY_API_KEY"
//! requests_per_second = 5
//!
//! [store]
//! path = "data/results.db"
//!
//! [backfill]
//! batch_size = 10
//! workers = 5
//! cooldown_ms = 2000
//!
//! [log]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use draw_ingestor::providers::lottery_rest::LotteryRestConfig;
use serde::{Deserialize, Serialize};

use crate::{backfill::BackfillConfig, store::DEFAULT_STORE_PATH};

#[derive(thiserror::Error, Debug)]
/// Errors raised while loading the configuration file.
pub enum ConfigError {
    #[error("cannot read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: LotteryRestConfig,
    pub store: StoreConfig,
    pub backfill: BackfillConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive. `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads and parses a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
