use async_trait::async_trait;

use crate::errors::Result;

/// Key → URL cache placed in front of a link collection.
///
/// Errors mean the cache itself could not be consulted (transport failure);
/// a plain miss is `Ok(None)`.
#[async_trait]
pub trait LinkCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Caches `url` under `key`. Implementations may keep an existing value.
    async fn put(&self, key: &str, url: &str) -> Result<()>;

    fn cache_name(&self) -> &'static str;
}
