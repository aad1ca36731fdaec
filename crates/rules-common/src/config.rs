//! Engine configuration.
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. The cache factory only needs `CACHE_TYPE`;
//! the remaining keys configure the Redis backend and the local data service.
//!
//! # Example
//!
//! ```
//! use rules_common::{CacheType, EngineConfig};
//!
//! let config = EngineConfig::from_lookup(|key| match key {
//!     "CACHE_TYPE" => Some("redis".to_string()),
//!     "REDIS_HOST_NAME" => Some("cache.internal".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(config.cache_type, CacheType::Redis);
//! assert_eq!(config.redis.host_name, "cache.internal");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable selecting the cache backend.
pub const CACHE_TYPE_VAR: &str = "CACHE_TYPE";
/// Environment variable for the Redis host.
pub const REDIS_HOST_VAR: &str = "REDIS_HOST_NAME";
/// Environment variable for the Redis port.
pub const REDIS_PORT_VAR: &str = "REDIS_PORT";
/// Environment variable for the Redis password.
pub const REDIS_ACCESS_KEY_VAR: &str = "REDIS_ACCESS_KEY";
/// Environment variable for the Redis connect timeout in seconds.
pub const REDIS_TIMEOUT_VAR: &str = "REDIS_TIMEOUT_SECS";
/// Environment variable for the local dataset directory.
pub const DATA_DIR_VAR: &str = "RULES_DATA_DIR";
/// Environment variable for the local library metadata directory.
pub const LIBRARY_DIR_VAR: &str = "RULES_LIBRARY_DIR";

const KNOWN_KEYS: &[&str] = &[
    CACHE_TYPE_VAR,
    REDIS_HOST_VAR,
    REDIS_PORT_VAR,
    REDIS_ACCESS_KEY_VAR,
    REDIS_TIMEOUT_VAR,
    DATA_DIR_VAR,
    LIBRARY_DIR_VAR,
];

/// Errors raised while assembling an [`EngineConfig`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`EngineConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration key holds a value that cannot be interpreted.
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Cache backend kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// Process-local map.
    #[default]
    InMemory,
    /// Networked Redis store.
    Redis,
}

impl CacheType {
    /// Returns the configuration spelling of this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheType::InMemory => "in_memory",
            CacheType::Redis => "redis",
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "in_memory" => Ok(CacheType::InMemory),
            "redis" => Ok(CacheType::Redis),
            other => Err(format!("Unknown cache type: {other}")),
        }
    }
}

/// Connection settings for the Redis cache backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub host_name: String,
    pub port: u16,
    pub access_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host_name: "localhost".to_string(),
            port: 6379,
            access_key: None,
            timeout_secs: 5,
        }
    }
}

impl RedisConfig {
    /// Connection URL understood by the `redis` crate.
    pub fn url(&self) -> String {
        match &self.access_key {
            Some(key) if !key.is_empty() => {
                format!("redis://:{}@{}:{}/", key, self.host_name, self.port)
            }
            _ => format!("redis://{}:{}/", self.host_name, self.port),
        }
    }
}

/// Configuration for the operation engine and its collaborators.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Which cache backend the factory hands out.
    pub cache_type: CacheType,
    /// Redis connection settings (only used when `cache_type` is Redis).
    pub redis: RedisConfig,
    /// Directory that relative dataset references resolve against.
    pub data_dir: Option<PathBuf>,
    /// Directory holding offline library metadata (`{standard}/{version}/*.json`).
    pub library_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Defaults overridden by process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::default().with_overrides(lookup)
    }

    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read a TOML file and apply environment overrides on top of it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), "loaded engine config file");
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply key/value overrides (environment-variable names) to this config.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get(CACHE_TYPE_VAR) {
            self.cache_type = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: CACHE_TYPE_VAR,
                value,
            })?;
        }
        if let Some(value) = get(REDIS_HOST_VAR) {
            self.redis.host_name = value;
        }
        if let Some(value) = get(REDIS_PORT_VAR) {
            self.redis.port = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: REDIS_PORT_VAR,
                value,
            })?;
        }
        if let Some(value) = get(REDIS_ACCESS_KEY_VAR) {
            self.redis.access_key = Some(value);
        }
        if let Some(value) = get(REDIS_TIMEOUT_VAR) {
            self.redis.timeout_secs =
                value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: REDIS_TIMEOUT_VAR,
                    value,
                })?;
        }
        if let Some(value) = get(DATA_DIR_VAR) {
            self.data_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = get(LIBRARY_DIR_VAR) {
            self.library_dir = Some(PathBuf::from(value));
        }
        Ok(self)
    }

    /// Raw string value for a configuration key, by environment-variable name.
    ///
    /// Returns `None` for unknown keys and unset optional values.
    pub fn get_value(&self, key: &str) -> Option<String> {
        if !KNOWN_KEYS.contains(&key) {
            return None;
        }
        match key {
            CACHE_TYPE_VAR => Some(self.cache_type.to_string()),
            REDIS_HOST_VAR => Some(self.redis.host_name.clone()),
            REDIS_PORT_VAR => Some(self.redis.port.to_string()),
            REDIS_ACCESS_KEY_VAR => self.redis.access_key.clone(),
            REDIS_TIMEOUT_VAR => Some(self.redis.timeout_secs.to_string()),
            DATA_DIR_VAR => self.data_dir.as_ref().map(|p| p.display().to_string()),
            LIBRARY_DIR_VAR => self.library_dir.as_ref().map(|p| p.display().to_string()),
            _ => None,
        }
    }
}
