//! 短链接写操作

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, ExprTrait, QueryFilter, sea_query::Expr};
use tracing::{debug, info};

use super::converters::link_to_active_model;
use super::{SeaOrmStorage, map_write_err, retry};
use crate::errors::Result;
use crate::storage::models::ShortLink;

use migration::entities::short_link;

impl SeaOrmStorage {
    /// 唯一约束冲突（短码或去重键）返回 `Conflict`
    pub(super) async fn insert_link(&self, link: &ShortLink, dedup: bool) -> Result<()> {
        let db = &self.db;
        let model = link_to_active_model(link, dedup);

        retry::with_retry(&format!("insert({})", link.code), self.retry_policy, || async {
            short_link::Entity::insert(model.clone())
                .exec_without_returning(db)
                .await
        })
        .await
        .map_err(|e| map_write_err("插入短链接失败", e))?;

        debug!("Short link inserted: {}", link.code);
        Ok(())
    }

    pub(super) async fn bump_click_count(&self, code: &str) -> Result<u64> {
        let db = &self.db;
        let code_owned = code.to_string();

        let result = retry::with_retry("increment_click_count", self.retry_policy, || async {
            short_link::Entity::update_many()
                .col_expr(
                    short_link::Column::ClickCount,
                    Expr::col(short_link::Column::ClickCount).add(Expr::val(1i64)),
                )
                .filter(short_link::Column::ShortCode.eq(code_owned.as_str()))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| map_write_err("更新点击数失败", e))?;

        Ok(result.rows_affected)
    }

    pub(super) async fn deactivate_expired_links(&self, now: DateTime<Utc>) -> Result<u64> {
        let db = &self.db;

        let result = retry::with_retry("deactivate_expired", self.retry_policy, || async {
            short_link::Entity::update_many()
                .col_expr(short_link::Column::IsActive, Expr::val(false))
                .filter(short_link::Column::IsActive.eq(true))
                .filter(short_link::Column::ExpiresAt.lt(now))
                .exec(db)
                .await
        })
        .await
        .map_err(|e| map_write_err("停用过期链接失败", e))?;

        if result.rows_affected > 0 {
            info!("Deactivated {} expired links", result.rows_affected);
        }
        Ok(result.rows_affected)
    }
}
