//! In-memory data service.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use rules_model::{DatasetFrame, EngineError, Result};
use serde_json::Value;

use crate::service::DataService;

/// Datasets and metadata held in memory, keyed by name.
///
/// A dataset reference resolves by exact name first, then by its final path
/// segment, so `study/bundle/AE` finds a frame registered as `AE`.
#[derive(Debug, Default)]
pub struct InMemoryDataService {
    datasets: HashMap<String, DatasetFrame>,
    models: HashMap<(String, String), Value>,
    standards: HashMap<(String, String), Value>,
    fetches: AtomicUsize,
}

impl InMemoryDataService {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_dataset(mut self, name: impl Into<String>, frame: impl Into<DatasetFrame>) -> Self {
        self.datasets.insert(name.into(), frame.into());
        self
    }

    #[must_use]
    pub fn with_model_metadata(mut self, standard: &str, version: &str, model: Value) -> Self {
        self.models.insert(metadata_key(standard, version), model);
        self
    }

    #[must_use]
    pub fn with_standard_metadata(mut self, standard: &str, version: &str, metadata: Value) -> Self {
        self.standards.insert(metadata_key(standard, version), metadata);
        self
    }

    /// Number of metadata fetches served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }
}

fn metadata_key(standard: &str, version: &str) -> (String, String) {
    (standard.to_lowercase(), version.to_string())
}

fn file_name(reference: &str) -> &str {
    reference
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(reference)
}

impl DataService for InMemoryDataService {
    fn get_dataset(&self, reference: &str) -> Result<DatasetFrame> {
        self.datasets
            .get(reference)
            .or_else(|| self.datasets.get(file_name(reference)))
            .cloned()
            .ok_or_else(|| EngineError::not_found("Dataset", reference))
    }

    fn fetch_model_metadata(&self, standard: &str, version: &str) -> Result<Option<Value>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.models.get(&metadata_key(standard, version)).cloned())
    }

    fn fetch_standard_metadata(&self, standard: &str, version: &str) -> Result<Option<Value>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);
        Ok(self.standards.get(&metadata_key(standard, version)).cloned())
    }
}
