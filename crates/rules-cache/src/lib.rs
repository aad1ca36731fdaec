//! Metadata cache for the rules operation engine.
//!
//! Library metadata is expensive to fetch, so every lookup goes through a
//! [`CacheService`]. Two backends exist:
//!
//! - [`InMemoryCacheService`]: a process-local map
//! - [`RedisCacheService`]: a shared Redis store
//!
//! [`CacheServiceFactory`] hands out one shared instance per backend kind,
//! selected by the `CACHE_TYPE` configuration key.

pub mod error;
pub mod factory;
pub mod in_memory;
pub mod redis_cache;
pub mod service;

pub use error::{CacheError, CacheResult};
pub use factory::CacheServiceFactory;
pub use in_memory::InMemoryCacheService;
pub use redis_cache::RedisCacheService;
pub use service::{CacheService, CacheServiceExt};
