//! Dataset and library metadata access.
//!
//! Operations never read files directly. They ask a [`DataService`] for a
//! dataset by reference, and the library metadata container asks it for
//! model and standard metadata when the cache misses.
//!
//! - [`LocalDataService`]: CSV datasets and JSON metadata on the local filesystem
//! - [`InMemoryDataService`]: named frames and metadata held in memory

pub mod in_memory;
pub mod local;
pub mod service;

pub use in_memory::InMemoryDataService;
pub use local::LocalDataService;
pub use service::{DataService, DatasetLoader, concat_frames};
