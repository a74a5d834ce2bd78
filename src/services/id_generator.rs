//! 短码生成
//!
//! 以时钟毫秒数加随机抖动为种子做 base62 编码，撞码时种子 +1 继续探测。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{LinkpulseError, Result};
use crate::storage::LinkStore;
use crate::utils::{Clock, base62};

/// 种子抖动上限（不含）
pub const SEED_JITTER: u64 = 10_000;

pub struct IdGenerator {
    links: Arc<dyn LinkStore>,
    clock: Arc<dyn Clock>,
    probe_limit: u32,
}

impl IdGenerator {
    pub fn new(links: Arc<dyn LinkStore>, clock: Arc<dyn Clock>, probe_limit: u32) -> Self {
        Self {
            links,
            clock,
            probe_limit: probe_limit.max(1),
        }
    }

    /// 生成一个当前未被占用的短码
    pub async fn generate_unique(&self) -> Result<String> {
        let millis = u64::try_from(self.clock.now().timestamp_millis()).unwrap_or_default();
        let seed = millis.wrapping_add(rand::random_range(0..SEED_JITTER));
        self.generate_from(seed).await
    }

    /// 从指定种子开始探测
    pub async fn generate_from(&self, seed: u64) -> Result<String> {
        let mut current = seed;
        for attempt in 0..self.probe_limit {
            let code = base62::encode(current);
            if code.len() > base62::MAX_CODE_LEN {
                return Err(LinkpulseError::invalid_input(format!(
                    "Seed {} encodes to more than {} characters",
                    current,
                    base62::MAX_CODE_LEN
                )));
            }
            if !self.links.exists(&code).await? {
                if attempt > 0 {
                    debug!("Generated code '{}' after {} collisions", code, attempt);
                }
                return Ok(code);
            }
            current = current.wrapping_add(1);
        }

        warn!(
            "Code generation gave up after {} probes from seed {}",
            self.probe_limit, seed
        );
        Err(LinkpulseError::database_operation(format!(
            "No free short code after {} probes",
            self.probe_limit
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, ShortLink};
    use crate::utils::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
        ))
    }

    async fn occupy(store: &MemoryStorage, code: &str) {
        let link = ShortLink::new(code, "https://example.com", None, Utc::now(), None);
        store.insert(&link, false).await.unwrap();
    }

    #[tokio::test]
    async fn test_generate_from_free_seed() {
        let store = Arc::new(MemoryStorage::new());
        let generator = IdGenerator::new(store, clock(), 10);
        assert_eq!(generator.generate_from(61).await.unwrap(), "z");
    }

    #[tokio::test]
    async fn test_generate_from_skips_taken_codes() {
        let store = Arc::new(MemoryStorage::new());
        occupy(&store, &base62::encode(1000)).await;
        occupy(&store, &base62::encode(1001)).await;

        let generator = IdGenerator::new(store, clock(), 10);
        let code = generator.generate_from(1000).await.unwrap();
        assert_eq!(code, base62::encode(1002));
    }

    #[tokio::test]
    async fn test_probe_limit_reached() {
        let store = Arc::new(MemoryStorage::new());
        for n in 0..3 {
            occupy(&store, &base62::encode(n)).await;
        }
        let generator = IdGenerator::new(store, clock(), 3);
        let err = generator.generate_from(0).await.unwrap_err();
        assert!(matches!(err, LinkpulseError::DatabaseOperation(_)));
    }

    #[tokio::test]
    async fn test_seed_beyond_code_length_is_rejected() {
        let store = Arc::new(MemoryStorage::new());
        let limit = 62u64.pow(base62::MAX_CODE_LEN as u32);
        let generator = IdGenerator::new(store.clone(), clock(), 10);

        for seed in [limit, u64::MAX] {
            let err = generator.generate_from(seed).await.unwrap_err();
            assert!(matches!(err, LinkpulseError::InvalidInput(_)));
        }

        // 最后一个 10 位短码被占用时不会越界到 11 位
        occupy(&store, &base62::encode(limit - 1)).await;
        let err = generator.generate_from(limit - 1).await.unwrap_err();
        assert!(matches!(err, LinkpulseError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_generate_unique_never_returns_taken_code() {
        let store = Arc::new(MemoryStorage::new());
        let clock = clock();
        let millis = clock.now().timestamp_millis() as u64;
        // 占满整个抖动区间的前半段
        for n in millis..millis + SEED_JITTER / 2 {
            occupy(&store, &base62::encode(n)).await;
        }

        let generator = IdGenerator::new(store.clone(), clock, 20_000);
        for _ in 0..20 {
            let code = generator.generate_unique().await.unwrap();
            assert!(!store.exists(&code).await.unwrap());
            let decoded = base62::decode(&code).unwrap();
            assert!(decoded >= millis);
        }
    }
}
