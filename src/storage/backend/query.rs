//! 短链接读操作

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select};

use super::converters::model_to_link;
use super::{SeaOrmStorage, map_read_err, retry};
use crate::errors::Result;
use crate::storage::models::{OwnerId, ShortLink};

use migration::entities::short_link;

impl SeaOrmStorage {
    async fn fetch_one(
        &self,
        op_name: &str,
        query: Select<short_link::Entity>,
    ) -> Result<Option<ShortLink>> {
        let db = &self.db;
        retry::with_retry(op_name, self.retry_policy, || async {
            query.clone().one(db).await
        })
        .await
        .map(|m| m.map(model_to_link))
        .map_err(|e| map_read_err(op_name, e))
    }

    async fn fetch_all(
        &self,
        op_name: &str,
        query: Select<short_link::Entity>,
    ) -> Result<Vec<ShortLink>> {
        let db = &self.db;
        retry::with_retry(op_name, self.retry_policy, || async {
            query.clone().all(db).await
        })
        .await
        .map(|models| models.into_iter().map(model_to_link).collect())
        .map_err(|e| map_read_err(op_name, e))
    }

    async fn fetch_count(&self, op_name: &str, query: Select<short_link::Entity>) -> Result<u64> {
        let db = &self.db;
        retry::with_retry(op_name, self.retry_policy, || async {
            query.clone().count(db).await
        })
        .await
        .map_err(|e| map_read_err(op_name, e))
    }

    fn owner_query(owner: OwnerId, active_only: bool) -> Select<short_link::Entity> {
        let query = short_link::Entity::find().filter(short_link::Column::OwnerId.eq(owner));
        if active_only {
            query.filter(short_link::Column::IsActive.eq(true))
        } else {
            query
        }
    }

    pub(super) async fn get_link(&self, code: &str) -> Result<Option<ShortLink>> {
        self.fetch_one(
            "find_by_code",
            short_link::Entity::find_by_id(code.to_string()),
        )
        .await
    }

    pub(super) async fn code_exists(&self, code: &str) -> Result<bool> {
        let count = self
            .fetch_count("exists", short_link::Entity::find_by_id(code.to_string()))
            .await?;
        Ok(count > 0)
    }

    pub(super) async fn get_link_by_target(
        &self,
        target: &str,
        owner: Option<OwnerId>,
    ) -> Result<Option<ShortLink>> {
        let mut query =
            short_link::Entity::find().filter(short_link::Column::TargetUrl.eq(target));
        if let Some(owner) = owner {
            query = query.filter(short_link::Column::OwnerId.eq(owner));
        }
        let query = query
            .order_by_asc(short_link::Column::CreatedAt)
            .order_by_asc(short_link::Column::ShortCode);

        self.fetch_one("find_by_target", query).await
    }

    pub(super) async fn get_owned_link(
        &self,
        code: &str,
        owner: OwnerId,
    ) -> Result<Option<ShortLink>> {
        let query = short_link::Entity::find_by_id(code.to_string())
            .filter(short_link::Column::OwnerId.eq(owner));
        self.fetch_one("find_by_code_and_owner", query).await
    }

    pub(super) async fn load_owner_page(
        &self,
        owner: OwnerId,
        active_only: bool,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ShortLink>, u64)> {
        let total = self
            .fetch_count("list_by_owner(count)", Self::owner_query(owner, active_only))
            .await?;

        let page_size = page_size.max(1);
        let page_index = page.saturating_sub(1);
        let query = Self::owner_query(owner, active_only)
            .order_by_desc(short_link::Column::CreatedAt)
            .order_by_asc(short_link::Column::ShortCode);

        let db = &self.db;
        let models = retry::with_retry("list_by_owner(data)", self.retry_policy, || async {
            query
                .clone()
                .paginate(db, page_size)
                .fetch_page(page_index)
                .await
        })
        .await
        .map_err(|e| map_read_err("list_by_owner", e))?;

        Ok((models.into_iter().map(model_to_link).collect(), total))
    }

    pub(super) async fn count_owner_links(&self, owner: OwnerId, active_only: bool) -> Result<u64> {
        self.fetch_count("count_by_owner", Self::owner_query(owner, active_only))
            .await
    }

    pub(super) async fn load_expiring(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ShortLink>> {
        let query = short_link::Entity::find()
            .filter(short_link::Column::IsActive.eq(true))
            .filter(short_link::Column::ExpiresAt.gte(from))
            .filter(short_link::Column::ExpiresAt.lte(to))
            .order_by_asc(short_link::Column::ExpiresAt);
        self.fetch_all("find_expiring_between", query).await
    }

    pub(super) async fn load_popular(
        &self,
        owner: OwnerId,
        min_clicks: u64,
    ) -> Result<Vec<ShortLink>> {
        let min_clicks = min_clicks.min(i64::MAX as u64) as i64;
        let query = Self::owner_query(owner, false)
            .filter(short_link::Column::ClickCount.gt(min_clicks))
            .order_by_desc(short_link::Column::ClickCount)
            .order_by_asc(short_link::Column::ShortCode);
        self.fetch_all("find_popular_by_owner", query).await
    }
}
