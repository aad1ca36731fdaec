//! Operation registry, dispatcher and implementations.
//!
//! An operation computes one named, parameterized value for a dataset and
//! returns it aligned to the dataset's rows so it can be read like a column.
//!
//! # Architecture
//!
//! - [`operation`]: the [`Operation`] trait and the [`OperationContext`] it runs with
//! - [`registry`]: [`OperationRegistry`], name lookup and dispatch
//! - [`align`]: re-expansion of scalar, column and grouped outputs to row granularity
//! - [`ops`]: the operation implementations
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use polars::prelude::*;
//! use rules_cache::{CacheService, InMemoryCacheService};
//! use rules_data::{DataService, InMemoryDataService};
//! use rules_model::OperationParams;
//! use rules_operations::evaluate;
//!
//! let df = DataFrame::new(vec![Series::new("USUBJID".into(), ["01", "02"]).into()]).unwrap();
//! let params = OperationParams::new("$count", df.clone());
//! let cache: Arc<dyn CacheService> = Arc::new(InMemoryCacheService::new());
//! let data: Arc<dyn DataService> = Arc::new(InMemoryDataService::new());
//!
//! let results = evaluate("record_count", &params, &df.into(), &cache, &data, None).unwrap();
//! assert_eq!(results.get("$count").unwrap().len(), 2);
//! ```

pub mod align;
pub mod operation;
pub mod ops;
pub mod registry;

pub use align::align_output;
pub use operation::{Operation, OperationContext};
pub use registry::{
    OperationRegistry, build_default_registry, default_registry, evaluate, evaluate_params,
};
