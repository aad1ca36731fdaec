//! Shared utilities for the rules operation engine.
//!
//! This crate provides the engine configuration surface (cache backend
//! selection, Redis connection settings, data and library directories) and
//! Polars `AnyValue` helpers used across the workspace.

pub mod config;
pub mod polars;

pub use config::{
    CACHE_TYPE_VAR, CacheType, ConfigError, DATA_DIR_VAR, EngineConfig, LIBRARY_DIR_VAR,
    REDIS_ACCESS_KEY_VAR, REDIS_HOST_VAR, REDIS_PORT_VAR, REDIS_TIMEOUT_VAR, RedisConfig,
};
pub use polars::{any_to_i64, any_to_string};
