//! Filesystem-backed data service.
//!
//! Datasets are CSV files resolved against a data directory. Library
//! metadata, when available offline, lives under a library directory as
//! `{standard}/{version}/model.json` and `{standard}/{version}/standard.json`.

use std::path::{Path, PathBuf};

use polars::prelude::{CsvReadOptions, LazyCsvReader, LazyFileListReader, PlPath, SerReader};
use rules_common::EngineConfig;
use rules_model::{DatasetFrame, EngineError, Result};
use serde_json::Value;

use crate::service::DataService;

const MODEL_FILE: &str = "model.json";
const STANDARD_FILE: &str = "standard.json";

/// Reads CSV datasets and JSON library metadata from disk.
#[derive(Debug, Clone, Default)]
pub struct LocalDataService {
    data_dir: Option<PathBuf>,
    library_dir: Option<PathBuf>,
    lazy: bool,
}

impl LocalDataService {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    /// Data and library directories from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            library_dir: config.library_dir.clone(),
            lazy: false,
        }
    }

    #[must_use]
    pub fn with_library_dir(mut self, library_dir: impl Into<PathBuf>) -> Self {
        self.library_dir = Some(library_dir.into());
        self
    }

    /// Scan datasets lazily instead of reading them up front.
    #[must_use]
    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Absolute references are used as-is; relative ones join the data directory.
    pub fn resolve(&self, reference: &str) -> PathBuf {
        let path = Path::new(reference);
        match &self.data_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn read_csv(&self, path: &Path) -> Result<DatasetFrame> {
        if self.lazy {
            let path_str = path.to_string_lossy();
            let lf = LazyCsvReader::new(PlPath::new(&path_str))
                .with_has_header(true)
                .finish()?;
            return Ok(DatasetFrame::Lazy(lf));
        }
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(100))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Ok(DatasetFrame::Eager(df))
    }

    fn read_metadata(&self, standard: &str, version: &str, file: &str) -> Result<Option<Value>> {
        let Some(dir) = &self.library_dir else {
            return Ok(None);
        };
        let path = dir.join(standard.to_lowercase()).join(version).join(file);
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "no offline library metadata");
            return Ok(None);
        }
        let source = std::fs::read_to_string(&path)?;
        tracing::debug!(path = %path.display(), "read library metadata");
        Ok(Some(serde_json::from_str(&source)?))
    }
}

impl DataService for LocalDataService {
    fn get_dataset(&self, reference: &str) -> Result<DatasetFrame> {
        let path = self.resolve(reference);
        if !path.is_file() {
            return Err(EngineError::not_found("Dataset", path.display().to_string()));
        }
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        match extension.as_deref() {
            Some("csv") => {
                tracing::debug!(path = %path.display(), lazy = self.lazy, "loading dataset");
                self.read_csv(&path)
            }
            other => Err(EngineError::invalid(
                "get_dataset",
                "reference",
                format!(
                    "unsupported dataset format '{}' for {}",
                    other.unwrap_or(""),
                    path.display()
                ),
            )),
        }
    }

    fn fetch_model_metadata(&self, standard: &str, version: &str) -> Result<Option<Value>> {
        self.read_metadata(standard, version, MODEL_FILE)
    }

    fn fetch_standard_metadata(&self, standard: &str, version: &str) -> Result<Option<Value>> {
        self.read_metadata(standard, version, STANDARD_FILE)
    }
}
