//! Analytics service layer
//!
//! 单链接统计：总点击数、按天序列、设备/浏览器/国家/来源分布。
//! 快照以 JSON 缓存在 `stats:{code}`，`refresh` 时显式失效。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::link_service::LinkService;
use crate::cache::{ResolutionCache, STATS_PREFIX, stats_key};
use crate::config::AnalyticsConfig;
use crate::errors::{LinkpulseError, Result};
use crate::storage::{
    ClickDimension, ClickEvent, ClickEventStore, DailyCount, OwnerId, ShortLink,
};
use crate::utils::Clock;

/// 缺少来源时的分组名
pub const DIRECT_REFERRER: &str = "(direct)";
/// 缺少其它维度值时的分组名
pub const UNKNOWN_BUCKET: &str = "Unknown";

/// 分类统计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub name: String,
    pub count: u64,
    pub percentage: f64,
}

/// 单链接统计快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStats {
    pub code: String,
    pub target: String,
    pub total_clicks: u64,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub daily: Vec<DailyCount>,
    pub devices: Vec<CategoryStats>,
    pub browsers: Vec<CategoryStats>,
    pub countries: Vec<CategoryStats>,
    pub referrers: Vec<CategoryStats>,
    pub generated_at: DateTime<Utc>,
}

/// 合并同名分组并按 `total` 计算占比，按数量降序、名称升序
pub fn build_breakdown(
    rows: Vec<(Option<String>, u64)>,
    missing: &str,
    total: u64,
) -> Vec<CategoryStats> {
    let mut merged: HashMap<String, u64> = HashMap::new();
    for (name, count) in rows {
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| missing.to_string());
        *merged.entry(name).or_default() += count;
    }

    let mut stats: Vec<CategoryStats> = merged
        .into_iter()
        .map(|(name, count)| CategoryStats {
            percentage: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
            name,
            count,
        })
        .collect();
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    stats
}

/// 把稀疏的按天结果补齐为 `[from, to]` 内每天一项
pub fn fill_daily_series(sparse: &[DailyCount], from: NaiveDate, to: NaiveDate) -> Vec<DailyCount> {
    let by_date: HashMap<NaiveDate, u64> = sparse.iter().map(|d| (d.date, d.count)).collect();
    from.iter_days()
        .take_while(|date| *date <= to)
        .map(|date| DailyCount {
            date,
            count: by_date.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

// ============ AnalyticsService ============

/// Analytics 服务
pub struct AnalyticsService {
    links: Arc<LinkService>,
    events: Arc<dyn ClickEventStore>,
    cache: Arc<ResolutionCache>,
    clock: Arc<dyn Clock>,
    config: AnalyticsConfig,
}

impl AnalyticsService {
    pub fn new(
        links: Arc<LinkService>,
        events: Arc<dyn ClickEventStore>,
        cache: Arc<ResolutionCache>,
        clock: Arc<dyn Clock>,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            links,
            events,
            cache,
            clock,
            config,
        }
    }

    fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.config.cache_ttl)
    }

    fn check_range(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<()> {
        if from > to {
            return Err(LinkpulseError::invalid_input(format!(
                "Invalid date range: {} is after {}",
                from, to
            )));
        }
        Ok(())
    }

    /// 按天序列的范围额外受 `max_range_days` 限制
    fn check_series_range(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Result<()> {
        Self::check_range(from, to)?;
        let days = (to.date_naive() - from.date_naive()).num_days();
        if days > self.config.max_range_days {
            return Err(LinkpulseError::invalid_input(format!(
                "Date range spans {} days, limit is {}",
                days, self.config.max_range_days
            )));
        }
        Ok(())
    }

    fn days_back(&self, days: i64) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        if days <= 0 {
            return Err(LinkpulseError::invalid_input(format!(
                "Day count must be positive, got {}",
                days
            )));
        }
        if days > self.config.max_range_days {
            return Err(LinkpulseError::invalid_input(format!(
                "Day count {} exceeds limit {}",
                days, self.config.max_range_days
            )));
        }
        let to = self.clock.now();
        let from = chrono::Duration::try_days(days)
            .and_then(|span| to.checked_sub_signed(span))
            .ok_or_else(|| LinkpulseError::invalid_input(format!("Day count too large: {}", days)))?;
        Ok((from, to))
    }

    async fn ensure_link(&self, code: &str) -> Result<ShortLink> {
        self.links
            .get_link(code)
            .await?
            .ok_or_else(|| LinkpulseError::not_found(format!("Link '{}' not found", code)))
    }

    async fn daily_series(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>> {
        let sparse = self.events.daily_counts(code, from, to).await?;
        Ok(fill_daily_series(&sparse, from.date_naive(), to.date_naive()))
    }

    /// 计算完整快照（不读缓存）
    async fn compute_stats(&self, code: &str) -> Result<LinkStats> {
        let link = self.ensure_link(code).await?;

        let (from, to) = self.days_back(self.config.default_days)?;
        let total_clicks = self.events.count_by_link(code).await?;
        let daily = self.daily_series(code, from, to).await?;

        let devices = self
            .breakdown(code, ClickDimension::Device, UNKNOWN_BUCKET, total_clicks)
            .await?;
        let browsers = self
            .breakdown(code, ClickDimension::Browser, UNKNOWN_BUCKET, total_clicks)
            .await?;
        let countries = self
            .breakdown(code, ClickDimension::Country, UNKNOWN_BUCKET, total_clicks)
            .await?;
        let referrers = self
            .breakdown(code, ClickDimension::Referrer, DIRECT_REFERRER, total_clicks)
            .await?;

        debug!("Computed stats for '{}': {} clicks", code, total_clicks);
        Ok(LinkStats {
            code: link.code,
            target: link.target,
            total_clicks,
            from: from.date_naive(),
            to: to.date_naive(),
            daily,
            devices,
            browsers,
            countries,
            referrers,
            generated_at: self.clock.now(),
        })
    }

    async fn breakdown(
        &self,
        code: &str,
        dimension: ClickDimension,
        missing: &str,
        total: u64,
    ) -> Result<Vec<CategoryStats>> {
        let rows = self.events.grouped_counts(code, dimension).await?;
        Ok(build_breakdown(rows, missing, total))
    }

    /// 统计快照，优先读缓存
    pub async fn get_stats(&self, code: &str) -> Result<LinkStats> {
        let key = stats_key(code);
        if let Some(stats) = self.cache.get::<LinkStats>(&key).await {
            return Ok(stats);
        }

        let stats = self.compute_stats(code).await?;
        self.cache.put(&key, &stats, self.cache_ttl()).await;
        Ok(stats)
    }

    /// 校验所有权后返回统计
    pub async fn get_stats_for_owner(&self, code: &str, owner: Option<OwnerId>) -> Result<LinkStats> {
        self.links.validate_ownership(code, owner).await?;
        self.get_stats(code).await
    }

    /// 指定时间范围的按天点击数（闭区间，不缓存）
    pub async fn daily_stats(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>> {
        self.check_series_range(from, to)?;
        self.ensure_link(code).await?;
        self.daily_series(code, from, to).await
    }

    /// 最近 `days` 天的按天点击数
    pub async fn daily_stats_last(&self, code: &str, days: i64) -> Result<Vec<DailyCount>> {
        let (from, to) = self.days_back(days)?;
        self.daily_stats(code, from, to).await
    }

    pub async fn total_clicks(&self, code: &str) -> Result<u64> {
        self.ensure_link(code).await?;
        self.events.count_by_link(code).await
    }

    pub async fn click_count_between(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64> {
        Self::check_range(from, to)?;
        self.ensure_link(code).await?;
        self.events.count_by_link_between(code, from, to).await
    }

    /// 最近的点击事件，新的在前
    pub async fn recent_clicks(&self, code: &str, limit: u64) -> Result<Vec<ClickEvent>> {
        self.ensure_link(code).await?;
        self.events.recent_events(code, limit.clamp(1, 1000)).await
    }

    /// 丢弃缓存并立即重新计算
    pub async fn refresh(&self, code: &str) -> Result<LinkStats> {
        let key = stats_key(code);
        self.cache.delete(&key).await;

        let stats = self.compute_stats(code).await?;
        self.cache.put(&key, &stats, self.cache_ttl()).await;
        info!("Analytics refreshed for '{}'", code);
        Ok(stats)
    }

    /// 清空所有统计缓存，事件数据不动
    pub async fn clear_all(&self) -> u64 {
        let evicted = self.cache.evict_prefix(STATS_PREFIX).await;
        info!("Cleared {} cached stats snapshots", evicted);
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 4, day).unwrap()
    }

    #[test]
    fn test_breakdown_percentages_sum_to_100() {
        let rows = vec![
            (Some("Chrome".to_string()), 3),
            (Some("Firefox".to_string()), 1),
            (None, 2),
            (Some("Unknown".to_string()), 1),
        ];
        let stats = build_breakdown(rows, UNKNOWN_BUCKET, 7);
        assert_eq!(stats.len(), 3);
        // Unknown 合并后 3 条，与 Chrome 并列，名称升序
        assert_eq!(stats[0].name, "Chrome");
        assert_eq!(stats[1].name, "Unknown");
        assert_eq!(stats[1].count, 3);
        assert_eq!(stats[2].name, "Firefox");

        let sum: f64 = stats.iter().map(|s| s.percentage).sum();
        assert!((sum - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_empty_and_zero() {
        assert!(build_breakdown(vec![], DIRECT_REFERRER, 0).is_empty());
        let stats = build_breakdown(vec![(None, 0)], DIRECT_REFERRER, 0);
        assert_eq!(stats[0].name, DIRECT_REFERRER);
        assert_eq!(stats[0].percentage, 0.0);
    }

    #[test]
    fn test_breakdown_divides_by_total_clicks() {
        // 统计期间又写入了 2 条，分组合计 8，总数 10
        let rows = vec![(Some("Mobile".to_string()), 6), (Some("Desktop".to_string()), 2)];
        let stats = build_breakdown(rows, UNKNOWN_BUCKET, 10);
        assert_eq!(stats[0].name, "Mobile");
        assert!((stats[0].percentage - 60.0).abs() < 1e-9);
        assert!((stats[1].percentage - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_fill_daily_series() {
        let sparse = vec![
            DailyCount { date: d(2), count: 4 },
            DailyCount { date: d(4), count: 1 },
        ];
        let filled = fill_daily_series(&sparse, d(1), d(5));
        let counts: Vec<u64> = filled.iter().map(|c| c.count).collect();
        assert_eq!(counts, vec![0, 4, 0, 1, 0]);
        assert_eq!(filled[0].date, d(1));

        assert_eq!(fill_daily_series(&sparse, d(3), d(3)).len(), 1);
    }
}
