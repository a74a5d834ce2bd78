//! LinkService integration tests
//!
//! 用内存存储组装完整的服务图，覆盖缓存命中、缓存故障降级和并发解析。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use linkpulse::cache::{CacheBackend, CacheError, MokaCacheBackend, NullCacheBackend, link_key};
use linkpulse::config::StaticConfig;
use linkpulse::errors::LinkpulseError;
use linkpulse::runtime::AppContext;
use linkpulse::storage::{LinkStore, MemoryStorage};
use linkpulse::utils::clock::ManualClock;
use linkpulse::utils::{Clock, base62};

/// 每次调用都失败的缓存后端
struct FailingBackend;

#[async_trait]
impl CacheBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }
    async fn get(&self, _: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
    async fn set(&self, _: &str, _: String, _: Duration) -> Result<(), CacheError> {
        Err(CacheError::Backend("READONLY".into()))
    }
    async fn delete(&self, _: &str) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
    async fn exists(&self, _: &str) -> Result<bool, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
    async fn evict_prefix(&self, _: &str) -> Result<u64, CacheError> {
        Err(CacheError::Unavailable("connection refused".into()))
    }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2026, 7, 15, 8, 30, 0).unwrap(),
    ))
}

fn context(backend: Arc<dyn CacheBackend>) -> (AppContext, Arc<MemoryStorage>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStorage::new());
    let clock = clock();
    let ctx = AppContext::with_parts(StaticConfig::default(), store.clone(), backend, clock.clone());
    (ctx, store, clock)
}

#[tokio::test]
async fn test_create_resolve_roundtrip_cached_and_uncached() {
    let (ctx, _store, _) = context(Arc::new(MokaCacheBackend::new(100)));
    let link = ctx
        .link_service
        .create("https://example.com/docs", None, None)
        .await
        .unwrap();

    assert!(base62::decode(&link.code).is_ok());
    assert!(ctx.cache.exists(&link_key(&link.code)).await);
    assert_eq!(
        ctx.link_service.resolve(&link.code).await.unwrap(),
        "https://example.com/docs"
    );

    // 清掉缓存后从存储读取并回填
    ctx.cache.delete_link(&link.code).await;
    assert_eq!(
        ctx.link_service.resolve(&link.code).await.unwrap(),
        "https://example.com/docs"
    );
    assert!(ctx.cache.link_exists(&link.code).await);
}

#[tokio::test]
async fn test_failing_cache_does_not_change_results() {
    let (ctx, store, _) = context(Arc::new(FailingBackend));

    let link = ctx
        .link_service
        .create("https://example.com/resilient", Some(1), None)
        .await
        .unwrap();
    assert_eq!(store.link_count(), 1);
    assert_eq!(
        ctx.link_service.resolve(&link.code).await.unwrap(),
        "https://example.com/resilient"
    );

    let again = ctx
        .link_service
        .create("https://example.com/resilient", Some(1), None)
        .await
        .unwrap();
    assert_eq!(again.code, link.code);

    let err = ctx.link_service.resolve("missing").await.unwrap_err();
    assert!(matches!(err, LinkpulseError::NotFound(_)));
    assert!(ctx.cache.stats().failures > 0);
}

#[tokio::test]
async fn test_expired_vs_not_found() {
    let (ctx, _store, clock) = context(Arc::new(NullCacheBackend));
    let link = ctx
        .link_service
        .create(
            "https://example.com/flash",
            None,
            Some(clock.now() + chrono::Duration::minutes(30)),
        )
        .await
        .unwrap();

    clock.advance(chrono::Duration::hours(1));
    let err = ctx.link_service.resolve(&link.code).await.unwrap_err();
    assert!(matches!(err, LinkpulseError::Expired(_)));

    let err = ctx.link_service.resolve("Zz9").await.unwrap_err();
    assert!(matches!(err, LinkpulseError::NotFound(_)));
}

#[tokio::test]
async fn test_cached_link_expires_by_time() {
    let (ctx, _store, clock) = context(Arc::new(MokaCacheBackend::new(100)));
    let link = ctx
        .link_service
        .create(
            "https://example.com/cached",
            None,
            Some(clock.now() + chrono::Duration::minutes(10)),
        )
        .await
        .unwrap();
    assert!(ctx.cache.link_exists(&link.code).await);

    // 缓存条目还在，但判定时间已过
    clock.advance(chrono::Duration::minutes(11));
    let err = ctx.link_service.resolve(&link.code).await.unwrap_err();
    assert!(matches!(err, LinkpulseError::Expired(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolves_agree() {
    let (ctx, _store, _) = context(Arc::new(MokaCacheBackend::new(100)));
    let ctx = Arc::new(ctx);
    let link = ctx
        .link_service
        .create("https://example.com/hot", None, None)
        .await
        .unwrap();
    ctx.cache.delete_link(&link.code).await;

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let ctx = ctx.clone();
            let code = link.code.clone();
            tokio::spawn(async move { ctx.link_service.resolve(&code).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), "https://example.com/hot");
    }
    assert!(ctx.cache.link_exists(&link.code).await);
}

#[tokio::test]
async fn test_concurrent_creates_same_target_share_code() {
    let (ctx, store, _) = context(Arc::new(NullCacheBackend));
    let ctx = Arc::new(ctx);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                ctx.link_service
                    .create("https://example.com/race", Some(4), None)
                    .await
            })
        })
        .collect();

    let mut codes = Vec::new();
    for handle in handles {
        codes.push(handle.await.unwrap().unwrap().code);
    }
    codes.dedup();
    assert_eq!(codes.len(), 1);
    assert_eq!(store.link_count(), 1);
    assert!(store.exists(&codes[0]).await.unwrap());
}

#[tokio::test]
async fn test_sweeper_twice() {
    let (ctx, store, clock) = context(Arc::new(MokaCacheBackend::new(100)));
    for i in 0..3 {
        ctx.link_service
            .create(
                &format!("https://example.com/tmp/{i}"),
                None,
                Some(clock.now() + chrono::Duration::minutes(5)),
            )
            .await
            .unwrap();
    }
    ctx.link_service
        .create("https://example.com/keep", None, None)
        .await
        .unwrap();

    clock.advance(chrono::Duration::minutes(6));
    assert_eq!(ctx.sweeper.run_once().await.unwrap(), 3);
    assert_eq!(ctx.sweeper.run_once().await.unwrap(), 0);
    assert_eq!(store.link_count(), 4);
}
