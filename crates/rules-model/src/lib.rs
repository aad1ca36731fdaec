//! Core data model for the rules operation engine.
//!
//! - [`frame`]: [`DatasetFrame`], the eager or lazy tabular frame operations run against
//! - [`params`]: [`OperationParams`], the parameter bundle handed to one operation
//! - [`result`]: operation outputs and their row-aligned form
//! - [`error`]: the engine error taxonomy shared by every crate

pub mod error;
pub mod frame;
pub mod params;
pub mod result;

pub use error::{EngineError, ErrorKind, Result};
pub use frame::DatasetFrame;
pub use params::{DatasetManifestEntry, FilterValue, OperationParams, RowFilter};
pub use result::{AlignedResult, OperationOutput, OperationResults, OperationValue};
