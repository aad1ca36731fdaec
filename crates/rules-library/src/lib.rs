//! Standards library metadata.
//!
//! - [`model`]: typed model, standard and controlled-terminology metadata
//! - [`container`]: [`LibraryMetadataContainer`], a memoized read-through view
//!   of that metadata over the metadata cache

pub mod container;
pub mod model;

pub use container::{LibraryMetadataContainer, model_cache_key, standard_cache_key};
pub use model::{
    Codelist, CtPackage, GENERAL_OBSERVATIONS_CLASS, ModelClass, ModelDataset, ModelMetadata,
    ModelVariable, ObservationClass, StandardClass, StandardDataset, StandardMetadata,
    VariableRole, names_by_ordinal,
};
