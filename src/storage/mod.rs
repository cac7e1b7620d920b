//! Link storage
//!
//! The key-space coordinator only needs four operations from a store, all
//! captured by [`LinkStore`]. Two backends ship with the crate: an in-memory
//! map and a CSV append log.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::errors::Result;
use crate::system::background::BackgroundRunner;

pub mod file;
pub mod memory;

pub use file::{FileLinkStore, Persistence};
pub use memory::MemoryLinkStore;

/// Durable key → URL mapping.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// 持久化一批 (key, url)，返回 url → key
    async fn store_many(&self, batch: &[(String, String)]) -> Result<HashMap<String, String>>;

    async fn get_one(&self, key: &str) -> Result<Option<String>>;

    /// Only keys that exist appear in the result.
    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>>;

    /// Greatest key assigned so far, `None` for an empty store.
    async fn last_assigned_key(&self) -> Result<Option<String>>;

    fn backend_name(&self) -> &'static str;
}

/// 按生成顺序（先长度后字典序）推进 last key
pub(crate) fn advance_last_key(last: &mut Option<String>, key: &str) {
    let is_newer = match last.as_deref() {
        Some(current) => (key.len(), key) > (current.len(), current),
        None => true,
    };
    if is_newer {
        *last = Some(key.to_string());
    }
}

pub(crate) fn keys_by_url(batch: &[(String, String)]) -> HashMap<String, String> {
    batch
        .iter()
        .map(|(key, url)| (url.clone(), key.clone()))
        .collect()
}

pub struct StorageFactory;

impl StorageFactory {
    pub fn create(config: &StorageConfig, runner: &BackgroundRunner) -> Result<Arc<dyn LinkStore>> {
        let store: Arc<dyn LinkStore> = match config.backend {
            StorageBackend::Memory => Arc::new(MemoryLinkStore::new()),
            StorageBackend::File => {
                let persistence = if config.async_persistence {
                    Persistence::Background(runner.clone())
                } else {
                    Persistence::Immediate
                };
                Arc::new(FileLinkStore::open(&config.file_path, persistence)?)
            }
        };

        info!("Using storage backend: {}", store.backend_name());
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_last_key_orders_by_length_first() {
        let mut last = None;
        advance_last_key(&mut last, "z");
        advance_last_key(&mut last, "00");
        advance_last_key(&mut last, "y");
        assert_eq!(last.as_deref(), Some("00"));
    }

    #[test]
    fn test_keys_by_url_inverts_pairs() {
        let batch = vec![
            ("0".to_string(), "https://a.example".to_string()),
            ("1".to_string(), "https://b.example".to_string()),
        ];
        let map = keys_by_url(&batch);
        assert_eq!(map.get("https://b.example").map(String::as_str), Some("1"));
    }

    #[tokio::test]
    async fn test_factory_builds_memory_store() {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            ..StorageConfig::default()
        };
        let store = StorageFactory::create(&config, &BackgroundRunner::new()).unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert_eq!(store.last_assigned_key().await.unwrap(), None);
    }
}
