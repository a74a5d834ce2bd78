//! End-to-end tests
//!
//! 通过 `AppContext::build` 连接临时 SQLite 数据库，走完整的创建、解析、采集和统计流程。

use std::time::Duration;

use linkpulse::analytics::ClientMetadata;
use linkpulse::config::StaticConfig;
use linkpulse::errors::LinkpulseError;
use linkpulse::runtime::AppContext;
use linkpulse::utils::Clock;
use tempfile::TempDir;

const FIREFOX_LINUX: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
const GOOGLEBOT: &str = "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

async fn build_context(dir: &TempDir) -> AppContext {
    let mut config = StaticConfig::default();
    config.database.database_url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("e2e.db").display()
    );
    config.cache.cache_type = "memory".into();
    config.pipeline.worker_count = 2;
    config.pipeline.shutdown_grace_secs = 5;
    config.analytics.retention_days = 90;

    AppContext::build(config).await.expect("Failed to build context")
}

#[tokio::test]
async fn test_create_resolve_track_and_report() {
    let dir = TempDir::new().unwrap();
    let ctx = build_context(&dir).await;
    assert_eq!(ctx.background_task_count(), 2);

    let link = ctx
        .link_service
        .create("https://example.com/launch", Some(100), None)
        .await
        .unwrap();

    for i in 0..5 {
        let ua = if i == 4 { GOOGLEBOT } else { FIREFOX_LINUX };
        let target = ctx
            .resolve_and_record(
                &link.code,
                ClientMetadata::new(format!("192.0.2.{i}")).with_user_agent(ua),
            )
            .await
            .unwrap();
        assert_eq!(target, "https://example.com/launch");
    }
    assert!(ctx.pipeline.wait_idle(Duration::from_secs(10)).await);

    let stats = ctx.analytics_service.get_stats(&link.code).await.unwrap();
    assert_eq!(stats.total_clicks, 5);
    assert_eq!(stats.devices[0].name, "Desktop");
    assert_eq!(stats.devices[0].count, 4);
    assert!(stats.devices.iter().any(|d| d.name == "Bot" && d.count == 1));
    assert_eq!(stats.browsers[0].name, "Firefox");

    let stored = ctx.link_service.get_link(&link.code).await.unwrap().unwrap();
    assert_eq!(stored.click_count, 5);

    let recent = ctx.analytics_service.recent_clicks(&link.code, 10).await.unwrap();
    assert_eq!(recent.len(), 5);
    assert!(recent.iter().all(|e| e.ip_hash.len() == 64 && !e.ip_hash.contains('.')));

    let report = ctx.shutdown().await;
    assert!(report.drained);
    assert_eq!(ctx.background_task_count(), 0);
}

#[tokio::test]
async fn test_unknown_and_expired_do_not_record() {
    let dir = TempDir::new().unwrap();
    let ctx = build_context(&dir).await;

    let err = ctx
        .resolve_and_record("nope", ClientMetadata::new("192.0.2.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkpulseError::NotFound(_)));

    let link = ctx
        .link_service
        .create(
            "https://example.com/brief",
            None,
            Some(ctx.clock.now() + chrono::Duration::seconds(1)),
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(1100)).await;

    let err = ctx
        .resolve_and_record(&link.code, ClientMetadata::new("192.0.2.1"))
        .await
        .unwrap_err();
    assert!(matches!(err, LinkpulseError::Expired(_)));

    assert_eq!(ctx.sweeper.run_once().await.unwrap(), 1);
    assert_eq!(ctx.sweeper.run_once().await.unwrap(), 0);
    assert_eq!(ctx.analytics_service.total_clicks(&link.code).await.unwrap(), 0);

    ctx.shutdown().await;
}

#[tokio::test]
async fn test_data_survives_restart() {
    let dir = TempDir::new().unwrap();
    let code = {
        let ctx = build_context(&dir).await;
        let link = ctx
            .link_service
            .create("https://example.com/persist", None, None)
            .await
            .unwrap();
        ctx.resolve_and_record(&link.code, ClientMetadata::new("198.51.100.1"))
            .await
            .unwrap();
        ctx.shutdown().await;
        link.code
    };

    let ctx = build_context(&dir).await;
    assert_eq!(
        ctx.link_service.resolve(&code).await.unwrap(),
        "https://example.com/persist"
    );
    assert_eq!(ctx.analytics_service.total_clicks(&code).await.unwrap(), 1);
    ctx.shutdown().await;
}
