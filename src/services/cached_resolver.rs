//! Read-through cache in front of a link collection
//!
//! Misses are filled from the inner collection and written back to the cache.
//! Concurrent misses on the same key are not coalesced: each one reaches the
//! inner collection and each one writes the result back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::traits::LinkCollection;
use crate::cache::LinkCache;
use crate::errors::Result;

pub struct CachedLinkResolver {
    inner: Arc<dyn LinkCollection>,
    cache: Arc<dyn LinkCache>,
}

impl CachedLinkResolver {
    pub fn new(inner: Arc<dyn LinkCollection>, cache: Arc<dyn LinkCache>) -> Self {
        debug!("CachedLinkResolver using {} cache", cache.cache_name());
        Self { inner, cache }
    }
}

#[async_trait]
impl LinkCollection for CachedLinkResolver {
    async fn generate_keys(&self, urls: &[String]) -> Result<HashMap<String, String>> {
        self.inner.generate_keys(urls).await
    }

    async fn get_url(&self, key: &str) -> Result<Option<String>> {
        // 缓存错误直接返回，不回退到存储
        if let Some(url) = self.cache.get(key).await? {
            trace!("Cache hit for key: {}", key);
            return Ok(Some(url));
        }

        trace!("Cache miss for key: {}", key);
        let url = self.inner.get_url(key).await?;
        if let Some(ref url) = url {
            self.cache.put(key, url).await?;
        }

        Ok(url)
    }

    async fn get_urls(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        let mut urls = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(url) = self.get_url(key).await? {
                urls.insert(key.clone(), url);
            }
        }
        Ok(urls)
    }
}
