//! Process-local cache backend.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;
use serde_json::Value;

use crate::error::CacheResult;
use crate::service::CacheService;

/// Cache backed by a map guarded by a read/write lock.
#[derive(Debug, Default)]
pub struct InMemoryCacheService {
    entries: RwLock<HashMap<String, Value>>,
}

impl InMemoryCacheService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheService for InMemoryCacheService {
    fn backend(&self) -> &'static str {
        "in_memory"
    }

    fn get(&self, key: &str) -> CacheResult<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> CacheResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    fn has(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.read().contains_key(key))
    }

    fn get_by_prefix(&self, prefix: &str) -> CacheResult<BTreeMap<String, Value>> {
        Ok(self
            .entries
            .read()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn add_all(&self, entries: BTreeMap<String, Value>) -> CacheResult<()> {
        self.entries.write().extend(entries);
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }

    fn clear(&self) -> CacheResult<()> {
        self.entries.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::CacheServiceExt;
    use serde_json::json;

    #[test]
    fn miss_is_none_not_error() {
        let cache = InMemoryCacheService::new();
        assert_eq!(cache.get("model_details:sdtm1-5").unwrap(), None);
        assert!(!cache.has("model_details:sdtm1-5").unwrap());
    }

    #[test]
    fn prefix_lookup_only_returns_matching_keys() {
        let cache = InMemoryCacheService::new();
        cache.set("sdtmct-2020-03-27", json!({"package": "sdtmct-2020-03-27"})).unwrap();
        cache.set("sdtmct-2022-12-16", json!({"package": "sdtmct-2022-12-16"})).unwrap();
        cache.set("adamct-2022-12-16", json!({"package": "adamct-2022-12-16"})).unwrap();

        let found = cache.get_by_prefix("sdtmct-").unwrap();
        assert_eq!(
            found.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["sdtmct-2020-03-27", "sdtmct-2022-12-16"]
        );
    }

    #[test]
    fn delete_and_clear() {
        let cache = InMemoryCacheService::new();
        cache
            .add_all(BTreeMap::from([
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!(2)),
            ]))
            .unwrap();
        assert_eq!(cache.len(), 2);

        cache.delete("a").unwrap();
        assert_eq!(cache.get_all(&["a".into(), "b".into()]).unwrap().len(), 1);

        cache.clear().unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn typed_round_trip() {
        let cache = InMemoryCacheService::new();
        cache.set_typed("domains", &vec!["AE", "DM"]).unwrap();
        let domains: Option<Vec<String>> = cache.get_typed("domains").unwrap();
        assert_eq!(domains, Some(vec!["AE".to_string(), "DM".to_string()]));
    }

    #[test]
    fn typed_get_reports_bad_shape() {
        let cache = InMemoryCacheService::new();
        cache.set("domains", json!({"not": "a list"})).unwrap();
        assert!(cache.get_typed::<Vec<String>>("domains").is_err());
    }
}
