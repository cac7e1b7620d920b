//! Key-space coordination
//!
//! Serializes "read last key → generate batch → persist batch" so that keys
//! are handed out without gaps or duplicates under concurrent callers. The
//! store's own last-key record is the only cursor; nothing is cached here, so
//! a failed persist cannot leave the key space half-advanced.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, error};

use super::generator::KeyGenerator;
use crate::errors::Result;
use crate::services::LinkCollection;
use crate::storage::LinkStore;

pub struct KeySpaceCoordinator {
    generator: KeyGenerator,
    store: Arc<dyn LinkStore>,
    lock: Mutex<()>,
}

impl KeySpaceCoordinator {
    pub fn new(generator: KeyGenerator, store: Arc<dyn LinkStore>) -> Self {
        Self {
            generator,
            store,
            lock: Mutex::new(()),
        }
    }
}

#[async_trait]
impl LinkCollection for KeySpaceCoordinator {
    async fn generate_keys(&self, urls: &[String]) -> Result<HashMap<String, String>> {
        if urls.is_empty() {
            return Ok(HashMap::new());
        }

        // 整个 读取→生成→持久化 过程持锁，分配顺序即加锁顺序
        let _guard = self.lock.lock().await;

        let last_key = self.store.last_assigned_key().await?.unwrap_or_default();
        let batch = self.generator.generate_batch(&last_key, urls)?;

        if let Err(e) = self.store.store_many(&batch).await {
            error!(
                "Failed to persist {} keys after '{}' to {} store: {}",
                batch.len(),
                last_key,
                self.store.backend_name(),
                e
            );
            return Err(e);
        }

        if let (Some((first, _)), Some((last, _))) = (batch.first(), batch.last()) {
            debug!("Assigned keys {}..={} to {} URLs", first, last, batch.len());
        }

        // 同一批次中重复的 URL 以最后分配的 key 为准
        Ok(batch.into_iter().map(|(key, url)| (url, key)).collect())
    }

    async fn get_url(&self, key: &str) -> Result<Option<String>> {
        self.store.get_one(key).await
    }

    async fn get_urls(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        self.store.get_many(keys).await
    }
}
