//! SeaORM storage backend
//!
//! SQLite、MySQL/MariaDB、PostgreSQL 三种数据库共用一套实现，连接后自动迁移。

mod connection;
mod converters;
mod events;
mod mutations;
mod query;
pub mod retry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbErr, SqlErr};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{LinkpulseError, Result};
use crate::storage::models::{
    ClickDimension, ClickEvent, DailyCount, NewClickEvent, OwnerId, ShortLink,
};
use crate::storage::{ClickEventStore, LinkStore};

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use retry::RetryPolicy;

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite:")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(LinkpulseError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 唯一约束冲突转为 `Conflict`，其余转为 `DatabaseOperation`
fn map_write_err(context: &str, err: DbErr) -> LinkpulseError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            LinkpulseError::conflict(format!("{}: {}", context, detail))
        }
        _ => LinkpulseError::database_operation(format!("{}: {}", context, err)),
    }
}

fn map_read_err(context: &str, err: DbErr) -> LinkpulseError {
    LinkpulseError::database_operation(format!("{}: {}", context, err))
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    retry_policy: RetryPolicy,
}

impl SeaOrmStorage {
    pub async fn new(config: &DatabaseConfig, backend_name: &str) -> Result<Self> {
        if config.database_url.is_empty() {
            return Err(LinkpulseError::database_config("database_url 未设置"));
        }

        let backend_name = match backend_name {
            "mariadb" => "mysql",
            other => other,
        };

        let db = if backend_name == "sqlite" {
            connect_sqlite(config).await?
        } else {
            connect_generic(config, backend_name).await?
        };

        run_migrations(&db).await?;

        info!("{} storage initialized", backend_name.to_uppercase());
        Ok(Self {
            db,
            backend_name: backend_name.to_string(),
            retry_policy: RetryPolicy::from(config),
        })
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl LinkStore for SeaOrmStorage {
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>> {
        self.get_link(code).await
    }

    async fn exists(&self, code: &str) -> Result<bool> {
        self.code_exists(code).await
    }

    async fn find_by_target(
        &self,
        target: &str,
        owner: Option<OwnerId>,
    ) -> Result<Option<ShortLink>> {
        self.get_link_by_target(target, owner).await
    }

    async fn find_by_code_and_owner(
        &self,
        code: &str,
        owner: OwnerId,
    ) -> Result<Option<ShortLink>> {
        self.get_owned_link(code, owner).await
    }

    async fn insert(&self, link: &ShortLink, dedup: bool) -> Result<()> {
        self.insert_link(link, dedup).await
    }

    async fn increment_click_count(&self, code: &str) -> Result<u64> {
        self.bump_click_count(code).await
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.deactivate_expired_links(now).await
    }

    async fn list_by_owner(
        &self,
        owner: OwnerId,
        active_only: bool,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ShortLink>, u64)> {
        self.load_owner_page(owner, active_only, page, page_size)
            .await
    }

    async fn count_by_owner(&self, owner: OwnerId, active_only: bool) -> Result<u64> {
        self.count_owner_links(owner, active_only).await
    }

    async fn find_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ShortLink>> {
        self.load_expiring(from, to).await
    }

    async fn find_popular_by_owner(
        &self,
        owner: OwnerId,
        min_clicks: u64,
    ) -> Result<Vec<ShortLink>> {
        self.load_popular(owner, min_clicks).await
    }
}

#[async_trait]
impl ClickEventStore for SeaOrmStorage {
    async fn save_event(&self, event: NewClickEvent) -> Result<ClickEvent> {
        self.insert_event(event).await
    }

    async fn count_by_link(&self, code: &str) -> Result<u64> {
        self.count_events(code, None).await
    }

    async fn count_by_link_between(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64> {
        self.count_events(code, Some((from, to))).await
    }

    async fn daily_counts(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>> {
        self.query_daily_counts(code, from, to).await
    }

    async fn grouped_counts(
        &self,
        code: &str,
        dimension: ClickDimension,
    ) -> Result<Vec<(Option<String>, u64)>> {
        self.query_grouped_counts(code, dimension).await
    }

    async fn recent_events(&self, code: &str, limit: u64) -> Result<Vec<ClickEvent>> {
        self.load_recent_events(code, limit).await
    }

    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.purge_events_before(cutoff).await
    }
}
