//! Key → URL caches
//!
//! - `LfuCache`: in-process, fixed capacity, least-frequently-used eviction
//! - `RedisLinkCache`: shared across processes, optional TTL

pub mod lfu;
pub mod redis;
pub mod traits;

use std::sync::Arc;

use tracing::info;

use crate::config::{CacheConfig, CacheType};
use crate::errors::Result;

pub use lfu::LfuCache;
pub use self::redis::RedisLinkCache;
pub use traits::LinkCache;

/// 缓存工厂
pub struct CacheFactory;

impl CacheFactory {
    /// Builds the configured cache, or `None` when caching is disabled.
    pub fn create(config: &CacheConfig) -> Result<Option<Arc<dyn LinkCache>>> {
        let cache: Arc<dyn LinkCache> = match config.cache_type {
            CacheType::None => {
                info!("Link cache disabled");
                return Ok(None);
            }
            CacheType::Lfu => Arc::new(LfuCache::new(config.capacity)),
            CacheType::Redis => Arc::new(RedisLinkCache::new(&config.redis)?),
        };

        info!("Using {} link cache", cache.cache_name());
        Ok(Some(cache))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_respects_cache_type() {
        let mut config = CacheConfig::default();
        let cache = CacheFactory::create(&config).unwrap().unwrap();
        assert_eq!(cache.cache_name(), "lfu");

        config.cache_type = CacheType::None;
        assert!(CacheFactory::create(&config).unwrap().is_none());

        config.cache_type = CacheType::Redis;
        let cache = CacheFactory::create(&config).unwrap().unwrap();
        assert_eq!(cache.cache_name(), "redis");
    }
}
