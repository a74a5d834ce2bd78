use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::backend::{CacheBackend, CacheError};
use crate::config::RedisConfig;
use crate::errors::{LinkpulseError, Result};

/// SCAN 每批数量
const SCAN_BATCH: usize = 200;

/// Redis 缓存，所有键带 `key_prefix` 命名空间
pub struct RedisCacheBackend {
    client: redis::Client,
    /// 懒连接，出错后置空，下次调用重连
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
}

impl RedisCacheBackend {
    /// 创建客户端并 PING 一次，失败返回 `CacheConnection`
    pub async fn connect(config: &RedisConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            LinkpulseError::cache_connection(format!("无效的 Redis URL {}: {}", config.url, e))
        })?;

        let backend = Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: config.key_prefix.clone(),
        };

        let mut conn = backend.get_connection().await.map_err(|e| {
            LinkpulseError::cache_connection(format!("无法连接 Redis {}: {}", config.url, e))
        })?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| LinkpulseError::cache_connection(format!("Redis PING 失败: {}", e)))?;
        debug!(
            "Redis cache ready ({}), key prefix '{}'",
            pong, backend.key_prefix
        );

        Ok(backend)
    }

    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        {
            let guard = self.connection.read().await;
            if let Some(ref conn) = *guard {
                return Ok(conn.clone());
            }
        }

        let mut guard = self.connection.write().await;
        // 双重检查
        if let Some(ref conn) = *guard {
            return Ok(conn.clone());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        *guard = Some(conn.clone());
        debug!("Redis connection established");
        Ok(conn)
    }

    async fn reset_connection(&self) {
        *self.connection.write().await = None;
        debug!("Redis connection reset");
    }

    async fn conn(&self) -> std::result::Result<MultiplexedConnection, CacheError> {
        match self.get_connection().await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                self.reset_connection().await;
                Err(CacheError::Unavailable(e.to_string()))
            }
        }
    }

    /// 命令失败后重置连接，连接类错误归为 Unavailable
    async fn fail(&self, err: redis::RedisError) -> CacheError {
        self.reset_connection().await;
        if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
            CacheError::Unavailable(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

/// 转义 glob 特殊字符
fn escape_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> std::result::Result<Option<String>, CacheError> {
        let mut conn = self.conn().await?;
        match conn.get::<String, Option<String>>(self.make_key(key)).await {
            Ok(value) => {
                trace!("Redis GET {} -> {}", key, value.is_some());
                Ok(value)
            }
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> std::result::Result<(), CacheError> {
        let secs = ttl.as_secs();
        if secs == 0 {
            // SET EX 不接受 0
            return self.delete(key).await.map(|_| ());
        }

        let mut conn = self.conn().await?;
        match conn
            .set_ex::<String, String, ()>(self.make_key(key), value, secs)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn delete(&self, key: &str) -> std::result::Result<bool, CacheError> {
        let mut conn = self.conn().await?;
        match conn.del::<String, i64>(self.make_key(key)).await {
            Ok(deleted) => Ok(deleted > 0),
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn exists(&self, key: &str) -> std::result::Result<bool, CacheError> {
        let mut conn = self.conn().await?;
        match conn.exists::<String, bool>(self.make_key(key)).await {
            Ok(found) => Ok(found),
            Err(e) => Err(self.fail(e).await),
        }
    }

    async fn evict_prefix(&self, prefix: &str) -> std::result::Result<u64, CacheError> {
        let pattern = format!("{}*", escape_glob(&self.make_key(prefix)));
        let mut conn = self.conn().await?;
        let mut cursor: u64 = 0;
        let mut evicted: u64 = 0;

        loop {
            let scanned: redis::RedisResult<(u64, Vec<String>)> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await;
            let (next, keys) = match scanned {
                Ok(batch) => batch,
                Err(e) => return Err(self.fail(e).await),
            };

            if !keys.is_empty() {
                match conn.del::<Vec<String>, u64>(keys).await {
                    Ok(n) => evicted += n,
                    Err(e) => return Err(self.fail(e).await),
                }
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Redis evicted {} keys matching {}", evicted, pattern);
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("linkpulse:stats:"), "linkpulse:stats:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let config = RedisConfig {
            url: "not-a-redis-url".into(),
            key_prefix: "t:".into(),
        };
        assert!(matches!(
            RedisCacheBackend::connect(&config).await,
            Err(LinkpulseError::CacheConnection(_))
        ));
    }
}
