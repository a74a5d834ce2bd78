//! 解析缓存
//!
//! `ResolutionCache` 包装一个 `CacheBackend`：
//! - `memory`: moka 进程内缓存
//! - `redis`: Redis
//! - `none`: 不缓存

pub mod backend;
pub mod memory;
pub mod null;
pub mod redis_cache;
pub mod resolution;

use std::sync::Arc;

use tracing::{info, warn};

pub use backend::{CacheBackend, CacheError};
pub use memory::MokaCacheBackend;
pub use null::NullCacheBackend;
pub use redis_cache::RedisCacheBackend;
pub use resolution::{CacheStats, LINK_PREFIX, ResolutionCache, STATS_PREFIX, link_key, stats_key};

use crate::config::{CacheConfig, CacheKind};
use crate::errors::Result;

pub struct CacheFactory;

impl CacheFactory {
    /// 按 `cache.type` 创建后端。Redis 连接失败时返回 `CacheConnection`
    pub async fn create(config: &CacheConfig) -> Result<Arc<dyn CacheBackend>> {
        let backend: Arc<dyn CacheBackend> = match CacheKind::parse(&config.cache_type)? {
            CacheKind::Memory => Arc::new(MokaCacheBackend::new(config.memory.max_capacity)),
            CacheKind::Redis => Arc::new(RedisCacheBackend::connect(&config.redis).await?),
            CacheKind::None => {
                warn!("Resolution cache disabled, every lookup goes to storage");
                Arc::new(NullCacheBackend)
            }
        };
        info!("Cache backend: {}", backend.name());
        Ok(backend)
    }
}
