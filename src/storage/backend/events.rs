//! 点击事件读写与聚合
//!
//! 按日分组使用各数据库自己的日期格式化函数。

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DbBackend, EntityTrait, FromQueryResult, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use tracing::warn;

use super::converters::{event_to_active_model, model_to_event};
use super::{SeaOrmStorage, map_read_err, map_write_err, retry};
use crate::errors::Result;
use crate::storage::models::{ClickDimension, ClickEvent, DailyCount, NewClickEvent};

use migration::entities::click_event;

#[derive(Debug, FromQueryResult)]
struct DayRow {
    day: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct GroupRow {
    label: Option<String>,
    count: i64,
}

fn dimension_column(dimension: ClickDimension) -> click_event::Column {
    match dimension {
        ClickDimension::Device => click_event::Column::DeviceType,
        ClickDimension::Browser => click_event::Column::Browser,
        ClickDimension::OperatingSystem => click_event::Column::OperatingSystem,
        ClickDimension::Country => click_event::Column::Country,
        ClickDimension::Referrer => click_event::Column::Referrer,
    }
}

impl SeaOrmStorage {
    fn day_expr(&self) -> Expr {
        match self.db.get_database_backend() {
            DbBackend::Sqlite => Expr::cust("strftime('%Y-%m-%d', occurred_at)"),
            DbBackend::MySql => Expr::cust("DATE_FORMAT(occurred_at, '%Y-%m-%d')"),
            _ => Expr::cust("TO_CHAR(occurred_at, 'YYYY-MM-DD')"),
        }
    }

    pub(super) async fn insert_event(&self, event: NewClickEvent) -> Result<ClickEvent> {
        let db = &self.db;
        let model = event_to_active_model(&event);

        let inserted = retry::with_retry("save_event", self.retry_policy, || async {
            click_event::Entity::insert(model.clone()).exec(db).await
        })
        .await
        .map_err(|e| map_write_err("写入点击事件失败", e))?;

        Ok(ClickEvent::from_new(inserted.last_insert_id, event))
    }

    pub(super) async fn count_events(
        &self,
        code: &str,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<u64> {
        let mut query =
            click_event::Entity::find().filter(click_event::Column::ShortCode.eq(code));
        if let Some((from, to)) = range {
            query = query
                .filter(click_event::Column::OccurredAt.gte(from))
                .filter(click_event::Column::OccurredAt.lte(to));
        }

        let db = &self.db;
        retry::with_retry("count_events", self.retry_policy, || async {
            query.clone().count(db).await
        })
        .await
        .map_err(|e| map_read_err("统计点击数失败", e))
    }

    pub(super) async fn query_daily_counts(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>> {
        let day = self.day_expr();
        let query = click_event::Entity::find()
            .select_only()
            .column_as(day.clone(), "day")
            .column_as(click_event::Column::Id.count(), "count")
            .filter(click_event::Column::ShortCode.eq(code))
            .filter(click_event::Column::OccurredAt.gte(from))
            .filter(click_event::Column::OccurredAt.lte(to))
            .group_by(day)
            .order_by_asc(Expr::cust("day"));

        let db = &self.db;
        let rows = retry::with_retry("daily_counts", self.retry_policy, || async {
            query.clone().into_model::<DayRow>().all(db).await
        })
        .await
        .map_err(|e| map_read_err("按日统计失败", e))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match NaiveDate::parse_from_str(&row.day, "%Y-%m-%d") {
                Ok(date) => Some(DailyCount {
                    date,
                    count: row.count.max(0) as u64,
                }),
                Err(e) => {
                    warn!("Unparseable day label '{}': {}", row.day, e);
                    None
                }
            })
            .collect())
    }

    pub(super) async fn query_grouped_counts(
        &self,
        code: &str,
        dimension: ClickDimension,
    ) -> Result<Vec<(Option<String>, u64)>> {
        let column = dimension_column(dimension);
        let query = click_event::Entity::find()
            .select_only()
            .column_as(column, "label")
            .column_as(click_event::Column::Id.count(), "count")
            .filter(click_event::Column::ShortCode.eq(code))
            .group_by(column);

        let db = &self.db;
        let rows = retry::with_retry("grouped_counts", self.retry_policy, || async {
            query.clone().into_model::<GroupRow>().all(db).await
        })
        .await
        .map_err(|e| map_read_err(&format!("按 {} 分组统计失败", dimension), e))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.label, row.count.max(0) as u64))
            .collect())
    }

    pub(super) async fn load_recent_events(&self, code: &str, limit: u64) -> Result<Vec<ClickEvent>> {
        let query = click_event::Entity::find()
            .filter(click_event::Column::ShortCode.eq(code))
            .order_by_desc(click_event::Column::OccurredAt)
            .order_by_desc(click_event::Column::Id)
            .limit(limit);

        let db = &self.db;
        let models = retry::with_retry("recent_events", self.retry_policy, || async {
            query.clone().all(db).await
        })
        .await
        .map_err(|e| map_read_err("查询最近点击失败", e))?;

        Ok(models.into_iter().map(model_to_event).collect())
    }

    pub(super) async fn purge_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;
        let result = retry::with_retry("delete_events_before", self.retry_policy, || async {
            click_event::Entity::delete_many()
                .filter(click_event::Column::OccurredAt.lt(cutoff))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| map_write_err("清理点击事件失败", e))?;

        Ok(result.rows_affected)
    }
}
