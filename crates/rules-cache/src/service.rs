//! The cache contract shared by all backends.

use std::collections::BTreeMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CacheError, CacheResult};

/// Key/value store for library metadata.
///
/// Values are JSON documents. A `get` after a `set` on the same instance
/// returns an equal value. Writes are visible to every holder of the same
/// instance immediately; concurrent writes to one key are last-writer-wins.
pub trait CacheService: Send + Sync {
    /// Backend name used in logs and errors.
    fn backend(&self) -> &'static str;

    /// Value stored under `key`, or `None` on a miss.
    fn get(&self, key: &str) -> CacheResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> CacheResult<()>;

    /// Whether `key` is present.
    fn has(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Every entry whose key starts with `prefix`.
    fn get_by_prefix(&self, prefix: &str) -> CacheResult<BTreeMap<String, Value>>;

    /// Entries for the given keys; missing keys are left out.
    fn get_all(&self, keys: &[String]) -> CacheResult<BTreeMap<String, Value>> {
        let mut found = BTreeMap::new();
        for key in keys {
            if let Some(value) = self.get(key)? {
                found.insert(key.clone(), value);
            }
        }
        Ok(found)
    }

    /// Store several entries.
    fn add_all(&self, entries: BTreeMap<String, Value>) -> CacheResult<()> {
        for (key, value) in entries {
            self.set(&key, value)?;
        }
        Ok(())
    }

    /// Remove `key` if present.
    fn delete(&self, key: &str) -> CacheResult<()>;

    /// Remove every entry.
    fn clear(&self) -> CacheResult<()>;
}

/// Typed access on top of [`CacheService`].
pub trait CacheServiceExt: CacheService {
    /// Deserialize the value under `key`.
    fn get_typed<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| CacheError::serialization(key, source)),
            None => Ok(None),
        }
    }

    /// Serialize `value` and store it under `key`.
    fn set_typed<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> CacheResult<()> {
        let value =
            serde_json::to_value(value).map_err(|source| CacheError::serialization(key, source))?;
        self.set(key, value)
    }
}

impl<C: CacheService + ?Sized> CacheServiceExt for C {}
