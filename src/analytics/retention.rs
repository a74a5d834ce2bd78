//! 点击事件保留期清理
//!
//! 删除早于 `now - retention_days` 的点击事件。链接本身不受影响。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::{debug, info};

use super::periodic::PeriodicJob;
use crate::errors::{LinkpulseError, Result};
use crate::storage::ClickEventStore;
use crate::utils::Clock;

pub struct ClickRetentionTask {
    events: Arc<dyn ClickEventStore>,
    clock: Arc<dyn Clock>,
    retention_days: u64,
}

impl ClickRetentionTask {
    pub fn new(
        events: Arc<dyn ClickEventStore>,
        clock: Arc<dyn Clock>,
        retention_days: u64,
    ) -> Self {
        Self {
            events,
            clock,
            retention_days,
        }
    }

    pub fn retention_days(&self) -> u64 {
        self.retention_days
    }

    /// 删除过期点击事件，返回删除数量。`retention_days == 0` 表示永久保留
    pub async fn run_once(&self) -> Result<u64> {
        if self.retention_days == 0 {
            return Ok(0);
        }

        let days = i64::try_from(self.retention_days).map_err(|_| {
            LinkpulseError::config(format!(
                "retention_days out of range: {}",
                self.retention_days
            ))
        })?;
        let window = Duration::try_days(days).ok_or_else(|| {
            LinkpulseError::config(format!("retention_days out of range: {}", days))
        })?;
        let cutoff = self.clock.now() - window;

        let deleted = self.events.delete_events_before(cutoff).await?;
        if deleted > 0 {
            info!(
                "Click retention removed {} events older than {}",
                deleted, cutoff
            );
        } else {
            debug!("Click retention: nothing older than {}", cutoff);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl PeriodicJob for ClickRetentionTask {
    fn name(&self) -> &'static str {
        "click-retention"
    }

    async fn run_once(&self) -> Result<u64> {
        ClickRetentionTask::run_once(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, NewClickEvent};
    use crate::utils::clock::ManualClock;
    use chrono::{TimeZone, Utc};

    fn event_at(code: &str, at: chrono::DateTime<Utc>) -> NewClickEvent {
        NewClickEvent {
            code: code.to_string(),
            occurred_at: at,
            ip_hash: "h".into(),
            user_agent: None,
            referrer: None,
            device_type: "Desktop".into(),
            browser: "Other".into(),
            operating_system: "Other".into(),
            country: None,
            city: None,
        }
    }

    #[tokio::test]
    async fn test_deletes_only_old_events() {
        let now = Utc.with_ymd_and_hms(2026, 5, 20, 12, 0, 0).unwrap();
        let store = Arc::new(MemoryStorage::new());
        store
            .save_event(event_at("a", now - Duration::days(40)))
            .await
            .unwrap();
        store
            .save_event(event_at("a", now - Duration::days(10)))
            .await
            .unwrap();

        let clock = Arc::new(ManualClock::new(now));
        let task = ClickRetentionTask::new(store.clone(), clock, 30);
        assert_eq!(task.run_once().await.unwrap(), 1);
        assert_eq!(store.event_count(), 1);
        assert_eq!(task.run_once().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_zero_days_keeps_everything() {
        let store = Arc::new(MemoryStorage::new());
        store
            .save_event(event_at("a", Utc::now() - Duration::days(4000)))
            .await
            .unwrap();
        let task = ClickRetentionTask::new(store.clone(), Arc::new(crate::utils::SystemClock), 0);
        assert_eq!(task.run_once().await.unwrap(), 0);
        assert_eq!(store.event_count(), 1);
    }
}
