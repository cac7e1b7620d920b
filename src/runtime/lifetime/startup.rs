use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cache::CacheFactory;
use crate::config::StaticConfig;
use crate::keys::{KeyGenerator, KeySpaceCoordinator};
use crate::services::{CachedLinkResolver, LinkCollection};
use crate::storage::{LinkStore, StorageFactory};
use crate::system::background::{BackgroundRunner, set_global_runner};

pub struct StartupContext {
    pub runner: BackgroundRunner,
    pub store: Arc<dyn LinkStore>,
    pub links: Arc<dyn LinkCollection>,
}

/// 按配置组装存储、协调器与缓存
///
/// Without a cache the coordinator is returned as is; otherwise it is
/// wrapped in a [`CachedLinkResolver`].
pub fn build_links(
    config: &StaticConfig,
    runner: &BackgroundRunner,
) -> crate::errors::Result<(Arc<dyn LinkStore>, Arc<dyn LinkCollection>)> {
    let store = StorageFactory::create(&config.storage, runner)?;

    let generator = KeyGenerator::new(config.keys.max_key_length);
    info!(
        "Key space: up to {} symbols, {} keys",
        generator.max_key_length(),
        generator.capacity()
    );

    let coordinator: Arc<dyn LinkCollection> =
        Arc::new(KeySpaceCoordinator::new(generator, Arc::clone(&store)));

    let links = match CacheFactory::create(&config.cache)? {
        Some(cache) => Arc::new(CachedLinkResolver::new(coordinator, cache)) as Arc<dyn LinkCollection>,
        None => coordinator,
    };

    Ok((store, links))
}

/// 准备启动上下文
pub async fn prepare_startup(config: &StaticConfig) -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let runner = BackgroundRunner::new();
    if !set_global_runner(runner.clone()) {
        debug!("Global background runner already installed, using a local one");
    }

    let (store, links) = build_links(config, &runner).context("Failed to build link collection")?;

    if let Some(last_key) = store
        .last_assigned_key()
        .await
        .context("Failed to read last assigned key")?
    {
        info!("Resuming key assignment after '{}'", last_key);
    }

    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(StartupContext {
        runner,
        store,
        links,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CacheType, StorageBackend};

    fn memory_config(cache_type: CacheType) -> StaticConfig {
        let mut config = StaticConfig::default();
        config.storage.backend = StorageBackend::Memory;
        config.cache.cache_type = cache_type;
        config
    }

    #[tokio::test]
    async fn test_build_links_without_cache() {
        let runner = BackgroundRunner::new();
        let (store, links) = build_links(&memory_config(CacheType::None), &runner).unwrap();

        let key = links.generate_key("https://a.example").await.unwrap();
        assert_eq!(key, "0");
        assert_eq!(store.backend_name(), "memory");
    }

    #[tokio::test]
    async fn test_prepare_startup_with_lfu_cache() {
        let context = prepare_startup(&memory_config(CacheType::Lfu)).await.unwrap();

        let key = context.links.generate_key("https://a.example").await.unwrap();
        assert_eq!(
            context.links.get_url(&key).await.unwrap().as_deref(),
            Some("https://a.example")
        );
        assert_eq!(context.runner.outstanding(), 0);
    }
}
