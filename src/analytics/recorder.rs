//! 单条点击的落库流程：查链接、哈希 IP、分类 UA、写事件、点击数 +1

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::classifier;
use crate::errors::Result;
use crate::storage::{ClickEventStore, LinkStore, NewClickEvent};
use crate::utils::hash_ip;

/// 请求侧采集到的客户端信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMetadata {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl ClientMetadata {
    pub fn new(ip: impl Into<String>) -> Self {
        Self {
            ip: Some(ip.into()),
            ..Default::default()
        }
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_geo(mut self, country: Option<String>, city: Option<String>) -> Self {
        self.country = country;
        self.city = city;
        self
    }
}

/// 排队中的一次点击，时间在提交时确定
#[derive(Debug, Clone)]
pub struct ClickJob {
    pub code: String,
    pub metadata: ClientMetadata,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    /// 链接不存在
    Skipped,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub struct ClickRecorder {
    links: Arc<dyn LinkStore>,
    events: Arc<dyn ClickEventStore>,
}

impl ClickRecorder {
    pub fn new(links: Arc<dyn LinkStore>, events: Arc<dyn ClickEventStore>) -> Self {
        Self { links, events }
    }

    pub fn build_event(job: &ClickJob) -> NewClickEvent {
        let meta = &job.metadata;
        let user_agent = non_empty(&meta.user_agent);
        let profile = classifier::classify(meta.user_agent.as_deref());

        NewClickEvent {
            code: job.code.clone(),
            occurred_at: job.occurred_at,
            ip_hash: hash_ip(meta.ip.as_deref().unwrap_or_default().trim()),
            user_agent,
            referrer: non_empty(&meta.referrer),
            device_type: profile.device.to_string(),
            browser: profile.browser.to_string(),
            operating_system: profile.os.to_string(),
            country: non_empty(&meta.country),
            city: non_empty(&meta.city),
        }
    }

    pub async fn record(&self, job: &ClickJob) -> Result<RecordOutcome> {
        if self.links.find_by_code(&job.code).await?.is_none() {
            warn!("Click for unknown code '{}' skipped", job.code);
            return Ok(RecordOutcome::Skipped);
        }

        let saved = self.events.save_event(Self::build_event(job)).await?;
        self.links.increment_click_count(&job.code).await?;

        debug!("Click recorded: {} (event {})", job.code, saved.id);
        Ok(RecordOutcome::Recorded)
    }
}
