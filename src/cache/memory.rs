use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::policy::Expiry;
use tracing::debug;

use super::backend::{CacheBackend, CacheError};

#[derive(Clone)]
struct CachedEntry {
    payload: String,
    ttl: Duration,
}

/// 每个条目按写入时给定的 TTL 过期
struct PerEntryExpiry;

impl Expiry<String, CachedEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// 进程内缓存
pub struct MokaCacheBackend {
    inner: Cache<String, CachedEntry>,
}

impl MokaCacheBackend {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();

        debug!("MokaCacheBackend initialized with max capacity: {}", max_capacity);
        Self { inner }
    }

    /// 当前条目数（近似值）
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[async_trait]
impl CacheBackend for MokaCacheBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.inner.get(key).await.map(|entry| entry.payload))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            self.inner.invalidate(key).await;
            return Ok(());
        }
        self.inner
            .insert(key.to_string(), CachedEntry { payload: value, ttl })
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.inner.remove(key).await.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.inner.contains_key(key))
    }

    async fn evict_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let keys: Vec<String> = self
            .inner
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        let mut evicted = 0;
        for key in keys {
            if self.inner.remove(&key).await.is_some() {
                evicted += 1;
            }
        }
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MokaCacheBackend::new(100);
        cache
            .set("url:a", "\"x\"".into(), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(cache.get("url:a").await.unwrap().as_deref(), Some("\"x\""));
        assert!(cache.exists("url:a").await.unwrap());
        assert!(cache.delete("url:a").await.unwrap());
        assert!(!cache.delete("url:a").await.unwrap());
        assert_eq!(cache.get("url:a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_per_entry_ttl() {
        let cache = MokaCacheBackend::new(100);
        cache
            .set("short", "1".into(), Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set("long", "2".into(), Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(cache.get("short").await.unwrap(), None);
        assert_eq!(cache.get("long").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_not_stored() {
        let cache = MokaCacheBackend::new(100);
        cache.set("k", "1".into(), Duration::ZERO).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_evict_prefix() {
        let cache = MokaCacheBackend::new(100);
        let ttl = Duration::from_secs(60);
        cache.set("stats:a", "1".into(), ttl).await.unwrap();
        cache.set("stats:b", "1".into(), ttl).await.unwrap();
        cache.set("url:a", "1".into(), ttl).await.unwrap();

        assert_eq!(cache.evict_prefix("stats:").await.unwrap(), 2);
        assert!(!cache.exists("stats:a").await.unwrap());
        assert!(cache.exists("url:a").await.unwrap());
    }
}
