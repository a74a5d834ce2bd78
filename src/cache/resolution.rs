//! Cache-aside 包装
//!
//! 后端的任何失败（不可用、命令错误、超时、反序列化失败）都在这里被吞掉并记录日志，
//! 调用方看到的只是未命中或空操作。

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use super::backend::{CacheBackend, CacheError};
use crate::storage::ShortLink;

pub const LINK_PREFIX: &str = "url:";
pub const STATS_PREFIX: &str = "stats:";

pub fn link_key(code: &str) -> String {
    format!("{}{}", LINK_PREFIX, code)
}

pub fn stats_key(code: &str) -> String {
    format!("{}{}", STATS_PREFIX, code)
}

/// 命中与降级计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub failures: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    failures: AtomicU64,
}

pub struct ResolutionCache {
    backend: Arc<dyn CacheBackend>,
    op_timeout: Duration,
    counters: Counters,
}

impl ResolutionCache {
    pub fn new(backend: Arc<dyn CacheBackend>, op_timeout: Duration) -> Self {
        Self {
            backend,
            op_timeout,
            counters: Counters::default(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }

    /// 限时执行一次后端调用，失败返回 None
    async fn guarded<T, F>(&self, op: &'static str, key: &str, call: F) -> Option<T>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        let outcome = match tokio::time::timeout(self.op_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        };

        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                match e {
                    CacheError::Backend(_) => error!(
                        "Cache {} '{}' failed on {}: {}",
                        op,
                        key,
                        self.backend.name(),
                        e
                    ),
                    CacheError::Unavailable(_) | CacheError::Timeout(_) => warn!(
                        "Cache {} '{}' degraded on {}: {}",
                        op,
                        key,
                        self.backend.name(),
                        e
                    ),
                }
                None
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.guarded("get", key, self.backend.get(key)).await.flatten();

        let Some(raw) = raw else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            debug!("Cache miss: {}", key);
            return None;
        };

        match serde_json::from_str(&raw) {
            Ok(value) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit: {}", key);
                Some(value)
            }
            Err(e) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                warn!("Discarding undecodable cache entry '{}': {}", key, e);
                None
            }
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to serialize cache entry '{}': {}", key, e);
                return;
            }
        };
        self.guarded("put", key, self.backend.set(key, payload, ttl))
            .await;
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.guarded("delete", key, self.backend.delete(key))
            .await
            .unwrap_or(false)
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.guarded("exists", key, self.backend.exists(key))
            .await
            .unwrap_or(false)
    }

    pub async fn evict_prefix(&self, prefix: &str) -> u64 {
        self.guarded("evict_prefix", prefix, self.backend.evict_prefix(prefix))
            .await
            .unwrap_or(0)
    }

    pub async fn get_link(&self, code: &str) -> Option<ShortLink> {
        self.get(&link_key(code)).await
    }

    pub async fn put_link(&self, link: &ShortLink, ttl: Duration) {
        self.put(&link_key(&link.code), link, ttl).await
    }

    pub async fn delete_link(&self, code: &str) -> bool {
        self.delete(&link_key(code)).await
    }

    pub async fn link_exists(&self, code: &str) -> bool {
        self.exists(&link_key(code)).await
    }
}
