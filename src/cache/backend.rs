use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

/// 缓存后端错误，只在 `ResolutionCache` 内部流转
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// 连接不可用
    Unavailable(String),
    /// 后端执行命令出错
    Backend(String),
    Timeout(Duration),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "cache unavailable: {}", msg),
            Self::Backend(msg) => write!(f, "cache backend error: {}", msg),
            Self::Timeout(after) => write!(f, "cache operation timed out after {:?}", after),
        }
    }
}

impl std::error::Error for CacheError {}

/// 键值缓存后端。值为已序列化的 JSON 字符串
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// 返回键是否存在并被删除
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// 删除所有以 `prefix` 开头的键，返回删除数量
    async fn evict_prefix(&self, prefix: &str) -> Result<u64, CacheError>;
}
