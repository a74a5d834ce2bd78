use std::time::Duration;

use async_trait::async_trait;

use super::backend::{CacheBackend, CacheError};

/// 关闭缓存时使用，所有读取都未命中
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCacheBackend;

#[async_trait]
impl CacheBackend for NullCacheBackend {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn exists(&self, _key: &str) -> Result<bool, CacheError> {
        Ok(false)
    }

    async fn evict_prefix(&self, _prefix: &str) -> Result<u64, CacheError> {
        Ok(0)
    }
}
