use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, trace};

use crate::cache::traits::LinkCache;
use crate::config::RedisConfig;
use crate::errors::{LinkError, Result};

/// Shared key → URL cache backed by Redis.
///
/// Every transport error is returned to the caller; the connection is
/// dropped and re-established lazily on the next call.
pub struct RedisLinkCache {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
    ttl: Option<u64>,
}

impl RedisLinkCache {
    /// Creates the client without connecting.
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            LinkError::cache_transport(format!("invalid Redis URL '{}': {}", config.url, e))
        })?;

        debug!(
            "RedisLinkCache created with prefix: '{}', TTL: {:?}",
            config.key_prefix, config.ttl
        );

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: config.key_prefix.clone(),
            ttl: config.ttl.filter(|ttl| *ttl > 0),
        })
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> Result<MultiplexedConnection> {
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn connection_or_reset(&self) -> Result<MultiplexedConnection> {
        match self.get_connection().await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let redis_key = self.make_key(key);
        let mut conn = self.connection_or_reset().await?;

        let result: redis::RedisResult<Option<String>> = conn.get(&redis_key).await;

        match result {
            Ok(value) => {
                trace!("Redis cache {} for key: {}", if value.is_some() { "hit" } else { "miss" }, key);
                Ok(value)
            }
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                // 连接可能已断开，重置连接
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    async fn put(&self, key: &str, url: &str) -> Result<()> {
        let redis_key = self.make_key(key);
        let mut conn = self.connection_or_reset().await?;

        let result: redis::RedisResult<()> = match self.ttl {
            Some(ttl) => conn.set_ex(&redis_key, url, ttl).await,
            None => conn.set(&redis_key, url).await,
        };

        match result {
            Ok(()) => {
                trace!("Successfully inserted key into cache: {}", key);
                Ok(())
            }
            Err(e) => {
                error!("Failed to insert key '{}' into cache: {}", key, e);
                self.reset_connection().await;
                Err(e.into())
            }
        }
    }

    fn cache_name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> RedisConfig {
        RedisConfig {
            url: url.to_string(),
            key_prefix: "test:".to_string(),
            ttl: Some(0),
        }
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = RedisLinkCache::new(&config("not a redis url"));
        assert!(matches!(result, Err(LinkError::CacheTransportFailure(_))));
    }

    #[test]
    fn test_prefix_and_zero_ttl() {
        let cache = RedisLinkCache::new(&config("redis://127.0.0.1:1/")).unwrap();
        assert_eq!(cache.make_key("abc"), "test:abc");
        assert_eq!(cache.ttl, None);
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_closed() {
        // 端口 1 上没有 Redis
        let cache = RedisLinkCache::new(&config("redis://127.0.0.1:1/")).unwrap();

        assert!(matches!(
            cache.get("0").await,
            Err(LinkError::CacheTransportFailure(_))
        ));
        assert!(matches!(
            cache.put("0", "https://a.example").await,
            Err(LinkError::CacheTransportFailure(_))
        ));
        assert!(cache.connection.read().await.is_none());
    }
}
