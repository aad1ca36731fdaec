//! Redis cache backend.
//!
//! Values are stored as JSON strings. A single blocking connection is opened
//! on first use and reused; a command that fails with an I/O error drops the
//! connection so the next call reconnects.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;
use redis::{Client, Commands, Connection};
use rules_common::RedisConfig;
use serde_json::Value;

use crate::error::{CacheError, CacheResult};
use crate::service::CacheService;

const BACKEND: &str = "redis";

/// Cache stored in Redis.
pub struct RedisCacheService {
    client: Client,
    timeout: Duration,
    connection: Mutex<Option<Connection>>,
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheService")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RedisCacheService {
    /// Create a service for `config`. No connection is made until first use.
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.url())?;
        tracing::debug!(host = %config.host_name, port = config.port, "configured redis cache");
        Ok(Self {
            client,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            connection: Mutex::new(None),
        })
    }

    fn with_connection<T>(
        &self,
        command: impl FnOnce(&mut Connection) -> redis::RedisResult<T>,
    ) -> CacheResult<T> {
        let mut guard = self.connection.lock();
        if guard.is_none() {
            let connection = self.client.get_connection_with_timeout(self.timeout)?;
            connection.set_read_timeout(Some(self.timeout))?;
            connection.set_write_timeout(Some(self.timeout))?;
            *guard = Some(connection);
        }
        let Some(connection) = guard.as_mut() else {
            return Err(CacheError::unavailable(BACKEND, "no connection"));
        };
        match command(connection) {
            Ok(value) => Ok(value),
            Err(err) => {
                if err.is_io_error() || err.is_connection_dropped() {
                    *guard = None;
                }
                Err(err.into())
            }
        }
    }

    fn decode(key: &str, raw: &str) -> CacheResult<Value> {
        serde_json::from_str(raw).map_err(|source| CacheError::serialization(key, source))
    }
}

/// Escape glob metacharacters so a prefix matches literally in `KEYS`.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len() + 1);
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('*');
    escaped
}

impl CacheService for RedisCacheService {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        let raw: Option<String> = self.with_connection(|con| con.get(key))?;
        raw.map(|raw| Self::decode(key, &raw)).transpose()
    }

    fn set(&self, key: &str, value: Value) -> CacheResult<()> {
        let raw = value.to_string();
        self.with_connection(|con| con.set::<_, _, ()>(key, raw))
    }

    fn has(&self, key: &str) -> CacheResult<bool> {
        self.with_connection(|con| con.exists(key))
    }

    fn get_by_prefix(&self, prefix: &str) -> CacheResult<BTreeMap<String, Value>> {
        let keys: Vec<String> = self.with_connection(|con| con.keys(escape_glob(prefix)))?;
        self.get_all(&keys)
    }

    fn get_all(&self, keys: &[String]) -> CacheResult<BTreeMap<String, Value>> {
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }
        let raw: Vec<Option<String>> =
            self.with_connection(|con| redis::cmd("MGET").arg(keys).query(con))?;
        let mut found = BTreeMap::new();
        for (key, value) in keys.iter().zip(raw) {
            if let Some(value) = value {
                found.insert(key.clone(), Self::decode(key, &value)?);
            }
        }
        Ok(found)
    }

    fn add_all(&self, entries: BTreeMap<String, Value>) -> CacheResult<()> {
        if entries.is_empty() {
            return Ok(());
        }
        let pairs: Vec<(String, String)> = entries
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        self.with_connection(|con| con.mset::<_, _, ()>(pairs.as_slice()))
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.with_connection(|con| con.del::<_, ()>(key))
    }

    fn clear(&self) -> CacheResult<()> {
        self.with_connection(|con| redis::cmd("FLUSHDB").query::<()>(con))
    }
}
