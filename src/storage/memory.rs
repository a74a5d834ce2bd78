//! 进程内存储
//!
//! 链接放在 DashMap 中，点击事件放在带读写锁的 Vec 中。去重键单独建索引，
//! 插入时先占去重键再占短码，两者任一冲突都返回 `Conflict`。

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;

use super::models::{
    ClickDimension, ClickEvent, DailyCount, NewClickEvent, OwnerId, ShortLink, dedup_key,
};
use super::{ClickEventStore, LinkStore};
use crate::errors::{LinkpulseError, Result};

#[derive(Default)]
pub struct MemoryStorage {
    links: DashMap<String, ShortLink>,
    /// dedup_key -> code
    dedup_index: DashMap<String, String>,
    events: RwLock<Vec<ClickEvent>>,
    next_event_id: AtomicI64,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }

    fn owner_links(&self, owner: OwnerId, active_only: bool) -> Vec<ShortLink> {
        self.links
            .iter()
            .filter(|e| e.owner == Some(owner) && (!active_only || e.active))
            .map(|e| e.value().clone())
            .collect()
    }

    fn events_for<'a>(
        events: &'a [ClickEvent],
        code: &'a str,
    ) -> impl Iterator<Item = &'a ClickEvent> + 'a {
        events.iter().filter(move |e| e.code == code)
    }
}

#[async_trait]
impl LinkStore for MemoryStorage {
    async fn find_by_code(&self, code: &str) -> Result<Option<ShortLink>> {
        Ok(self.links.get(code).map(|e| e.value().clone()))
    }

    async fn exists(&self, code: &str) -> Result<bool> {
        Ok(self.links.contains_key(code))
    }

    async fn find_by_target(
        &self,
        target: &str,
        owner: Option<OwnerId>,
    ) -> Result<Option<ShortLink>> {
        Ok(self
            .links
            .iter()
            .filter(|e| e.target == target && owner.is_none_or(|o| e.owner == Some(o)))
            .map(|e| e.value().clone())
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.code.cmp(&b.code))))
    }

    async fn find_by_code_and_owner(
        &self,
        code: &str,
        owner: OwnerId,
    ) -> Result<Option<ShortLink>> {
        Ok(self
            .links
            .get(code)
            .filter(|e| e.owner == Some(owner))
            .map(|e| e.value().clone()))
    }

    async fn insert(&self, link: &ShortLink, dedup: bool) -> Result<()> {
        let dedup_entry = if dedup {
            match self.dedup_index.entry(dedup_key(&link.target, link.owner)) {
                Entry::Occupied(e) => {
                    return Err(LinkpulseError::conflict(format!(
                        "目标地址已存在短链接: {}",
                        e.get()
                    )));
                }
                Entry::Vacant(e) => Some(e.insert(link.code.clone())),
            }
        } else {
            None
        };

        match self.links.entry(link.code.clone()) {
            Entry::Occupied(_) => {
                if let Some(guard) = dedup_entry {
                    let key = guard.key().clone();
                    drop(guard);
                    self.dedup_index.remove(&key);
                }
                Err(LinkpulseError::conflict(format!(
                    "短码已存在: {}",
                    link.code
                )))
            }
            Entry::Vacant(e) => {
                e.insert(link.clone());
                Ok(())
            }
        }
    }

    async fn increment_click_count(&self, code: &str) -> Result<u64> {
        match self.links.get_mut(code) {
            Some(mut link) => {
                link.click_count += 1;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn deactivate_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut affected = 0;
        for mut link in self.links.iter_mut() {
            if link.active && link.expires_at.is_some_and(|exp| exp < now) {
                link.active = false;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn list_by_owner(
        &self,
        owner: OwnerId,
        active_only: bool,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ShortLink>, u64)> {
        let mut links = self.owner_links(owner, active_only);
        let total = links.len() as u64;
        links.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.code.cmp(&b.code))
        });

        let page_size = page_size.max(1);
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let items = links
            .into_iter()
            .skip(offset as usize)
            .take(page_size as usize)
            .collect();
        Ok((items, total))
    }

    async fn count_by_owner(&self, owner: OwnerId, active_only: bool) -> Result<u64> {
        Ok(self
            .links
            .iter()
            .filter(|e| e.owner == Some(owner) && (!active_only || e.active))
            .count() as u64)
    }

    async fn find_expiring_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<ShortLink>> {
        let mut links: Vec<ShortLink> = self
            .links
            .iter()
            .filter(|e| e.active && e.expires_at.is_some_and(|exp| exp >= from && exp <= to))
            .map(|e| e.value().clone())
            .collect();
        links.sort_by_key(|l| l.expires_at);
        Ok(links)
    }

    async fn find_popular_by_owner(
        &self,
        owner: OwnerId,
        min_clicks: u64,
    ) -> Result<Vec<ShortLink>> {
        let mut links: Vec<ShortLink> = self
            .owner_links(owner, false)
            .into_iter()
            .filter(|l| l.click_count > min_clicks)
            .collect();
        links.sort_by(|a, b| {
            b.click_count
                .cmp(&a.click_count)
                .then_with(|| a.code.cmp(&b.code))
        });
        Ok(links)
    }
}

#[async_trait]
impl ClickEventStore for MemoryStorage {
    async fn save_event(&self, event: NewClickEvent) -> Result<ClickEvent> {
        let id = self.next_event_id.fetch_add(1, Ordering::Relaxed) + 1;
        let saved = ClickEvent::from_new(id, event);
        self.events.write().push(saved.clone());
        Ok(saved)
    }

    async fn count_by_link(&self, code: &str) -> Result<u64> {
        let events = self.events.read();
        Ok(Self::events_for(&events, code).count() as u64)
    }

    async fn count_by_link_between(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<u64> {
        let events = self.events.read();
        Ok(Self::events_for(&events, code)
            .filter(|e| e.occurred_at >= from && e.occurred_at <= to)
            .count() as u64)
    }

    async fn daily_counts(
        &self,
        code: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<DailyCount>> {
        let events = self.events.read();
        let mut by_day = BTreeMap::new();
        for e in Self::events_for(&events, code)
            .filter(|e| e.occurred_at >= from && e.occurred_at <= to)
        {
            *by_day.entry(e.occurred_at.date_naive()).or_insert(0u64) += 1;
        }
        Ok(by_day
            .into_iter()
            .map(|(date, count)| DailyCount { date, count })
            .collect())
    }

    async fn grouped_counts(
        &self,
        code: &str,
        dimension: ClickDimension,
    ) -> Result<Vec<(Option<String>, u64)>> {
        let events = self.events.read();
        let mut groups: BTreeMap<Option<String>, u64> = BTreeMap::new();
        for e in Self::events_for(&events, code) {
            *groups
                .entry(dimension.value_of(e).map(str::to_string))
                .or_insert(0) += 1;
        }
        Ok(groups.into_iter().collect())
    }

    async fn recent_events(&self, code: &str, limit: u64) -> Result<Vec<ClickEvent>> {
        let events = self.events.read();
        let mut matched: Vec<ClickEvent> = Self::events_for(&events, code).cloned().collect();
        matched.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
        matched.truncate(limit as usize);
        Ok(matched)
    }

    async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut events = self.events.write();
        let before = events.len();
        events.retain(|e| e.occurred_at >= cutoff);
        Ok((before - events.len()) as u64)
    }
}
