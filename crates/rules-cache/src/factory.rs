//! Cache backend selection.
//!
//! The factory owns one lazily constructed instance per backend kind, so
//! every caller asking for the same kind shares the same store. Create the
//! factory once at start-up and pass the returned handles down.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use rules_common::{CacheType, EngineConfig};

use crate::error::CacheResult;
use crate::in_memory::InMemoryCacheService;
use crate::redis_cache::RedisCacheService;
use crate::service::CacheService;

/// Hands out shared cache instances by backend kind.
#[derive(Debug)]
pub struct CacheServiceFactory {
    config: EngineConfig,
    in_memory: OnceCell<Arc<InMemoryCacheService>>,
    redis: OnceCell<Arc<RedisCacheService>>,
}

impl CacheServiceFactory {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            in_memory: OnceCell::new(),
            redis: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The backend selected by the configuration's cache type.
    pub fn get_cache_service(&self) -> CacheResult<Arc<dyn CacheService>> {
        self.get_service(self.config.cache_type)
    }

    /// Shared instance for `kind`; constructed on first request.
    pub fn get_service(&self, kind: CacheType) -> CacheResult<Arc<dyn CacheService>> {
        match kind {
            CacheType::InMemory => {
                let service = self.in_memory.get_or_init(|| {
                    tracing::debug!("creating in-memory cache");
                    Arc::new(InMemoryCacheService::new())
                });
                Ok(Arc::clone(service) as Arc<dyn CacheService>)
            }
            CacheType::Redis => {
                let service = self.redis.get_or_try_init(|| {
                    tracing::debug!("creating redis cache");
                    RedisCacheService::new(&self.config.redis).map(Arc::new)
                })?;
                Ok(Arc::clone(service) as Arc<dyn CacheService>)
            }
        }
    }
}

impl Default for CacheServiceFactory {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
