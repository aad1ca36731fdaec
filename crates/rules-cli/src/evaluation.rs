//! One operation evaluated against a local dataset.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rules_cache::{CacheService, CacheServiceFactory};
use rules_common::EngineConfig;
use rules_data::{DataService, LocalDataService};
use rules_library::LibraryMetadataContainer;
use rules_model::OperationParams;
use rules_operations::evaluate;
use serde_json::Value;
use tracing::{info, info_span};

use crate::bundle::{load_ct_package, load_manifest, parse_filter};

/// Inputs for a single evaluation.
#[derive(Debug, Clone, Default)]
pub struct EvaluationRequest {
    pub dataset: PathBuf,
    pub operation: String,
    pub operation_id: String,
    pub domain: Option<String>,
    pub standard: Option<String>,
    pub standard_version: Option<String>,
    pub target: Option<String>,
    pub grouping: Vec<String>,
    pub filter: Vec<String>,
    pub manifest: Option<PathBuf>,
    pub target_domains: Vec<String>,
    pub ct_attribute: Option<String>,
    pub ct_version: Option<String>,
    pub ct_packages: Vec<PathBuf>,
    pub library_dir: Option<PathBuf>,
    pub lazy: bool,
}

/// Row-aligned values of one evaluation.
#[derive(Debug, Clone)]
pub struct EvaluationOutcome {
    pub operation_id: String,
    pub values: Vec<Value>,
}

/// Evaluate `request` with services built from `config`.
pub fn run_evaluation(request: &EvaluationRequest, config: &EngineConfig) -> Result<EvaluationOutcome> {
    let span = info_span!("evaluate", operation = %request.operation);
    let _guard = span.enter();

    let mut local = LocalDataService::from_config(config).with_lazy(request.lazy);
    if let Some(dir) = &request.library_dir {
        local = local.with_library_dir(dir);
    }
    let data: Arc<dyn DataService> = Arc::new(local);
    let cache: Arc<dyn CacheService> = CacheServiceFactory::new(config.clone())
        .get_cache_service()
        .context("create metadata cache")?;
    let library = LibraryMetadataContainer::new(Arc::clone(&cache))
        .with_data_service(Arc::clone(&data));

    let dataset = request.dataset.to_string_lossy();
    let frame = data
        .get_dataset(&dataset)
        .with_context(|| format!("load dataset {dataset}"))?;

    let mut params = OperationParams::new(request.operation_id.clone(), frame.clone())
        .with_grouping(request.grouping.iter().cloned())
        .with_dataset_path(dataset.to_string());
    params.target = request.target.clone();
    params.domain = request.domain.clone();
    params.standard = request.standard.clone();
    params.standard_version = request.standard_version.clone();
    params.filter = parse_filter(&frame, &request.filter)?;
    if !request.target_domains.is_empty() {
        params.target_domains = Some(request.target_domains.clone());
    }
    if let Some(path) = &request.manifest {
        params.datasets = load_manifest(path)?;
    }
    params.ct_attribute = request.ct_attribute.clone();
    params.ct_version = request.ct_version.clone();
    if !request.ct_packages.is_empty() {
        let mut ids = Vec::with_capacity(request.ct_packages.len());
        for path in &request.ct_packages {
            let package = load_ct_package(path)?;
            let id = package.package.clone();
            library.set_ct_package_metadata(&id, package)?;
            ids.push(id);
        }
        params.ct_packages = Some(ids);
    }

    let results = evaluate(&request.operation, &params, &frame, &cache, &data, Some(&library))?;
    let aligned = results
        .get(&params.operation_id)
        .with_context(|| format!("no result for {}", params.operation_id))?;
    let values = aligned.to_json_values()?;
    info!(rows = values.len(), "operation evaluated");
    Ok(EvaluationOutcome {
        operation_id: params.operation_id,
        values,
    })
}
