use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{LinkStore, advance_last_key, keys_by_url};
use crate::errors::Result;

#[derive(Default)]
struct MemoryState {
    links: HashMap<String, String>,
    last_key: Option<String>,
}

/// Volatile store, mostly for tests and throwaway runs.
#[derive(Default)]
pub struct MemoryLinkStore {
    state: RwLock<MemoryState>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.state.read().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn store_many(&self, batch: &[(String, String)]) -> Result<HashMap<String, String>> {
        let mut state = self.state.write();
        for (key, url) in batch {
            state.links.insert(key.clone(), url.clone());
            advance_last_key(&mut state.last_key, key);
        }
        Ok(keys_by_url(batch))
    }

    async fn get_one(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().links.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>> {
        let state = self.state.read();
        Ok(keys
            .iter()
            .filter_map(|key| state.links.get(key).map(|url| (key.clone(), url.clone())))
            .collect())
    }

    async fn last_assigned_key(&self) -> Result<Option<String>> {
        Ok(self.state.read().last_key.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
