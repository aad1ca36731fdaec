//! Library metadata container.
//!
//! A typed, memoized view of standards metadata over the metadata cache.
//! Each metadata kind has its own memo table keyed by cache key; a key is
//! resolved at most once per container (cache first, then the data service's
//! remote source) and every resolved value is also written to the cache, so a
//! fresh container over the same cache sees it without fetching again.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use rules_cache::{CacheService, CacheServiceExt};
use rules_data::DataService;
use rules_model::{EngineError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::model::{CtPackage, ModelMetadata, StandardMetadata};

type MemoTable<T> = Mutex<HashMap<String, Arc<OnceCell<Arc<T>>>>>;

/// Cache key for model metadata, e.g. `model_details:sdtm1-5`.
pub fn model_cache_key(standard: &str, version: &str) -> String {
    format!("model_details:{}{}", standard.to_lowercase(), version)
}

/// Cache key for standard metadata, e.g. `standard_details:sdtmig3-4`.
pub fn standard_cache_key(standard: &str, version: &str) -> String {
    format!("standard_details:{}{}", standard.to_lowercase(), version)
}

fn memo_cell<T>(table: &MemoTable<T>, key: &str) -> Arc<OnceCell<Arc<T>>> {
    Arc::clone(table.lock().entry(key.to_string()).or_default())
}

fn replace_cell<T>(table: &MemoTable<T>, key: &str, value: Arc<T>) {
    table
        .lock()
        .insert(key.to_string(), Arc::new(OnceCell::with_value(value)));
}

/// Memoized, cache-backed access to library metadata.
pub struct LibraryMetadataContainer {
    cache: Arc<dyn CacheService>,
    data_service: Option<Arc<dyn DataService>>,
    models: MemoTable<ModelMetadata>,
    standards: MemoTable<StandardMetadata>,
    ct_packages: MemoTable<CtPackage>,
}

impl std::fmt::Debug for LibraryMetadataContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryMetadataContainer")
            .field("cache", &self.cache.backend())
            .field("has_data_service", &self.data_service.is_some())
            .field("models", &self.models.lock().len())
            .field("standards", &self.standards.lock().len())
            .field("ct_packages", &self.ct_packages.lock().len())
            .finish()
    }
}

impl LibraryMetadataContainer {
    /// A container reading only from `cache`. Misses are NotFound.
    pub fn new(cache: Arc<dyn CacheService>) -> Self {
        Self {
            cache,
            data_service: None,
            models: Mutex::default(),
            standards: Mutex::default(),
            ct_packages: Mutex::default(),
        }
    }

    /// Fall back to `data_service` when the cache misses.
    #[must_use]
    pub fn with_data_service(mut self, data_service: Arc<dyn DataService>) -> Self {
        self.data_service = Some(data_service);
        self
    }

    pub fn cache(&self) -> &Arc<dyn CacheService> {
        &self.cache
    }

    /// Model metadata for `standard`/`version`.
    ///
    /// # Errors
    ///
    /// NotFound when neither the cache nor the remote source has it.
    pub fn get_model_metadata(&self, standard: &str, version: &str) -> Result<Arc<ModelMetadata>> {
        let key = model_cache_key(standard, version);
        self.resolve(&self.models, &key, "Model metadata", |ds| {
            ds.fetch_model_metadata(standard, version)
        })
    }

    /// Standard metadata (domain and class membership) for `standard`/`version`.
    pub fn get_standard_metadata(
        &self,
        standard: &str,
        version: &str,
    ) -> Result<Arc<StandardMetadata>> {
        let key = standard_cache_key(standard, version);
        self.resolve(&self.standards, &key, "Standard metadata", |ds| {
            ds.fetch_standard_metadata(standard, version)
        })
    }

    pub fn set_model_metadata(
        &self,
        standard: &str,
        version: &str,
        model: ModelMetadata,
    ) -> Result<()> {
        let key = model_cache_key(standard, version);
        self.cache.set_typed(&key, &model)?;
        replace_cell(&self.models, &key, Arc::new(model));
        Ok(())
    }

    pub fn set_standard_metadata(
        &self,
        standard: &str,
        version: &str,
        metadata: StandardMetadata,
    ) -> Result<()> {
        let key = standard_cache_key(standard, version);
        self.cache.set_typed(&key, &metadata)?;
        replace_cell(&self.standards, &key, Arc::new(metadata));
        Ok(())
    }

    /// Store a CT package under its package id.
    pub fn set_ct_package_metadata(&self, package_id: &str, package: CtPackage) -> Result<()> {
        self.cache.set_typed(package_id, &package)?;
        replace_cell(&self.ct_packages, package_id, Arc::new(package));
        Ok(())
    }

    /// A previously stored CT package. Never fetched remotely.
    pub fn get_ct_package_metadata(&self, package_id: &str) -> Result<Option<Arc<CtPackage>>> {
        let cell = memo_cell(&self.ct_packages, package_id);
        if let Some(package) = cell.get() {
            return Ok(Some(Arc::clone(package)));
        }
        match self.cache.get_typed::<CtPackage>(package_id)? {
            Some(package) => {
                tracing::debug!(package = package_id, "ct package cache hit");
                Ok(Some(Arc::clone(cell.get_or_init(|| Arc::new(package)))))
            }
            None => Ok(None),
        }
    }

    /// Ids of cached CT packages whose id starts with `prefix`.
    pub fn cached_ct_packages(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.cache.get_by_prefix(prefix)?.into_keys().collect())
    }

    fn resolve<T, F>(
        &self,
        table: &MemoTable<T>,
        key: &str,
        what: &'static str,
        fetch: F,
    ) -> Result<Arc<T>>
    where
        T: DeserializeOwned + serde::Serialize,
        F: FnOnce(&dyn DataService) -> Result<Option<Value>>,
    {
        let cell = memo_cell(table, key);
        let value = cell.get_or_try_init(|| -> Result<Arc<T>> {
            if let Some(cached) = self.cache.get_typed::<T>(key)? {
                tracing::debug!(key, "library metadata cache hit");
                return Ok(Arc::new(cached));
            }
            let Some(data_service) = &self.data_service else {
                return Err(EngineError::not_found(what, key));
            };
            tracing::debug!(key, "library metadata cache miss, fetching");
            let raw = fetch(data_service.as_ref())?
                .ok_or_else(|| EngineError::not_found(what, key))?;
            let typed: T = serde_json::from_value(raw)?;
            self.cache.set_typed(key, &typed)?;
            Ok(Arc::new(typed))
        })?;
        Ok(Arc::clone(value))
    }
}
