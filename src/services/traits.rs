use std::collections::HashMap;

use async_trait::async_trait;

use crate::errors::{LinkError, Result};

/// A collection of short links: assigns keys to URLs and resolves them back.
#[async_trait]
pub trait LinkCollection: Send + Sync {
    /// Assigns a fresh key to every URL, returning `{url: key}`.
    async fn generate_keys(&self, urls: &[String]) -> Result<HashMap<String, String>>;

    /// Resolves a key, `None` when it was never assigned.
    async fn get_url(&self, key: &str) -> Result<Option<String>>;

    /// Resolves several keys; unknown keys are absent from the result.
    async fn get_urls(&self, keys: &[String]) -> Result<HashMap<String, String>>;

    async fn generate_key(&self, url: &str) -> Result<String> {
        let mut keys = self.generate_keys(&[url.to_string()]).await?;
        keys.remove(url)
            .ok_or_else(|| LinkError::store_failure(format!("no key acknowledged for {}", url)))
    }
}
