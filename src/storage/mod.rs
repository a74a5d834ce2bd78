//! 持久化层
//!
//! 两个存储接口：`LinkStore`（短链接）和 `ClickEventStore`（点击事件）。
//! `SeaOrmStorage` 面向 SQLite / MySQL / PostgreSQL，`MemoryStorage` 用于嵌入式场景和测试。

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::config::DatabaseConfig;
use crate::errors::Result;

pub mod backend;
pub mod memory;
pub mod models;

pub use backend::SeaOrmStorage;
pub use memory::MemoryStorage;
pub use models::{
    ClickDimension, ClickEvent, DailyCount, NewClickEvent, OwnerId, ShortLink, dedup_key,
};

#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>>;

    async fn exists(&self, code: &str) -> Result<bool>;

    /// 按目标地址查找。`owner` 为 `None` 时不限定 owner
    async fn find_by_target(
        &self,
        target: &str,
        owner: Option<OwnerId>,
    ) -> Result<Option<ShortLink>>;

    async fn find_by_code_and_owner(&self, code: &str, owner: OwnerId)
    -> Result<Option<ShortLink>>;

    /// 插入新链接。短码已存在，或 `dedup` 时同 (target, owner) 已存在，返回 `Conflict`
    async fn insert(&self, link: &ShortLink, dedup: bool) -> Result<()>;

    /// `click_count = click_count + 1`，返回受影响行数
    async fn increment_click_count(&self, code: &str) -> Result<u64>;

    /// 停用所有 `active && expires_at < now` 的链接
    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64>;

    /// 分页列出 owner 的链接，按创建时间倒序。`page` 从 1 开始
    async fn list_by_owner(
        &self,
        owner: OwnerId,
        active_only: bool,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ShortLink>, u64)>;

    async fn count_by_owner(&self, owner: OwnerId, active_only: bool) -> Result<u64>;

    /// 启用中且 `from <= expires_at <= to`，按到期时间升序
    async fn find_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ShortLink>>;

    /// owner 名下点击数大于 `min_clicks` 的链接，点击数降序
    async fn find_popular_by_owner(&self, owner: OwnerId, min_clicks: u64)
    -> Result<Vec<ShortLink>>;
}

/// 时间范围参数均为闭区间
#[async_trait]
pub trait ClickEventStore: Send + Sync {
    async fn save_event(&self, event: NewClickEvent) -> Result<ClickEvent>;

    async fn count_by_link(&self, code: &str) -> Result<u64>;

    async fn count_by_link_between(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64>;

    /// 有点击的日期才返回，按日期升序
    async fn daily_counts(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>>;

    async fn grouped_counts(
        &self,
        code: &str,
        dimension: ClickDimension,
    ) -> Result<Vec<(Option<String>, u64)>>;

    /// 最新的在前
    async fn recent_events(&self, code: &str, limit: u64) -> Result<Vec<ClickEvent>>;

    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

/// 同时实现两个接口的存储
pub trait Storage: LinkStore + ClickEventStore {}

impl<T: LinkStore + ClickEventStore> Storage for T {}

pub struct StorageFactory;

impl StorageFactory {
    /// 按 URL 推断数据库类型并连接，连接后自动迁移
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<SeaOrmStorage>> {
        let backend_type = backend::infer_backend_from_url(&config.database_url)?;
        let storage = SeaOrmStorage::new(config, &backend_type).await?;
        Ok(Arc::new(storage))
    }
}
