//! Link resolution service
//!
//! 创建、解析和过期处理。缓存只是加速层：缓存出错时退化为直接读库，
//! 写路径上的存储错误照常向上传播。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::id_generator::IdGenerator;
use crate::cache::ResolutionCache;
use crate::config::LinksConfig;
use crate::errors::{LinkpulseError, Result};
use crate::storage::{LinkStore, OwnerId, ShortLink};
use crate::utils::url_validator::validate_target;
use crate::utils::{Clock, base62};

/// 短码冲突时最多重新生成的次数
const MAX_CODE_RETRIES: usize = 3;

/// Service for link creation and resolution
pub struct LinkService {
    links: Arc<dyn LinkStore>,
    cache: Arc<ResolutionCache>,
    ids: IdGenerator,
    clock: Arc<dyn Clock>,
    config: LinksConfig,
    default_ttl: Duration,
}

impl LinkService {
    pub fn new(
        links: Arc<dyn LinkStore>,
        cache: Arc<ResolutionCache>,
        ids: IdGenerator,
        clock: Arc<dyn Clock>,
        config: LinksConfig,
        default_ttl: Duration,
    ) -> Self {
        Self {
            links,
            cache,
            ids,
            clock,
            config,
            default_ttl,
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// 缓存 TTL：默认 TTL 与剩余有效期取小。已到期返回 None
    fn cache_ttl(&self, link: &ShortLink, now: DateTime<Utc>) -> Option<Duration> {
        match link.expires_at {
            None => Some(self.default_ttl),
            Some(exp) => {
                let left = (exp - now).to_std().ok()?;
                if left.is_zero() {
                    None
                } else {
                    Some(left.min(self.default_ttl))
                }
            }
        }
    }

    async fn cache_link(&self, link: &ShortLink, now: DateTime<Utc>) {
        match self.cache_ttl(link, now) {
            Some(ttl) => self.cache.put_link(link, ttl).await,
            None => debug!("Link '{}' already expired, not caching", link.code),
        }
    }

    fn validate_expiry(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Result<()> {
        if expires_at <= now {
            return Err(LinkpulseError::invalid_input(format!(
                "Expiration time {} must be in the future",
                expires_at
            )));
        }
        let window = chrono::Duration::try_days(self.config.max_expiry_days).ok_or_else(|| {
            LinkpulseError::config(format!(
                "max_expiry_days out of range: {}",
                self.config.max_expiry_days
            ))
        })?;
        if expires_at > now + window {
            return Err(LinkpulseError::invalid_input(format!(
                "Expiration time {} is more than {} days ahead",
                expires_at, self.config.max_expiry_days
            )));
        }
        Ok(())
    }

    // ============ Create ============

    /// Create a short link, or return the existing one for the same target
    pub async fn create(
        &self,
        target: &str,
        owner: Option<OwnerId>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<ShortLink> {
        let target = validate_target(target, self.config.max_url_length)?;
        let now = self.clock.now();
        if let Some(exp) = expires_at {
            self.validate_expiry(exp, now)?;
        }

        let dedup = self.config.duplicate_detection;
        if dedup && let Some(existing) = self.links.find_by_target(&target, owner).await? {
            debug!(
                "Duplicate target for owner {:?}, reusing '{}'",
                owner, existing.code
            );
            self.cache_link(&existing, now).await;
            return Ok(existing);
        }

        for attempt in 0..=MAX_CODE_RETRIES {
            let code = self.ids.generate_unique().await?;
            let link = ShortLink::new(code, target.clone(), owner, now, expires_at);

            match self.links.insert(&link, dedup).await {
                Ok(()) => {
                    self.cache_link(&link, now).await;
                    info!("LinkService: created '{}' -> '{}'", link.code, link.target);
                    return Ok(link);
                }
                Err(LinkpulseError::Conflict(msg)) => {
                    // 并发创建了同一目标，返回已有记录
                    if dedup && let Some(existing) = self.links.find_by_target(&target, owner).await? {
                        debug!("Concurrent create for same target, reusing '{}'", existing.code);
                        self.cache_link(&existing, now).await;
                        return Ok(existing);
                    }
                    warn!(
                        "Code '{}' taken concurrently (attempt {}): {}",
                        link.code,
                        attempt + 1,
                        msg
                    );
                }
                Err(e) => return Err(e),
            }
        }

        Err(LinkpulseError::conflict(format!(
            "Could not allocate a short code after {} attempts",
            MAX_CODE_RETRIES + 1
        )))
    }

    // ============ Resolve ============

    /// Resolve a code to its target URL
    pub async fn resolve(&self, code: &str) -> Result<String> {
        self.resolve_link(code).await.map(|link| link.target)
    }

    /// Resolve a code to the full link. 不可访问时返回 `Expired`
    pub async fn resolve_link(&self, code: &str) -> Result<ShortLink> {
        if !base62::is_valid_code(code, base62::MAX_CODE_LEN) {
            return Err(LinkpulseError::not_found(format!("Link '{}' not found", code)));
        }

        let now = self.clock.now();
        let link = match self.cache.get_link(code).await {
            Some(link) => link,
            None => {
                let link = self
                    .links
                    .find_by_code(code)
                    .await?
                    .ok_or_else(|| LinkpulseError::not_found(format!("Link '{}' not found", code)))?;
                self.cache_link(&link, now).await;
                link
            }
        };

        if !link.is_accessible_at(now) {
            return Err(LinkpulseError::expired(format!("Link '{}' has expired", code)));
        }
        Ok(link)
    }

    /// 链接是否已不可访问。不存在返回 `NotFound`
    pub async fn is_expired(&self, code: &str) -> Result<bool> {
        let link = self
            .links
            .find_by_code(code)
            .await?
            .ok_or_else(|| LinkpulseError::not_found(format!("Link '{}' not found", code)))?;
        Ok(!link.is_accessible_at(self.clock.now()))
    }

    // ============ Ownership / queries ============

    pub async fn get_link(&self, code: &str) -> Result<Option<ShortLink>> {
        self.links.find_by_code(code).await
    }

    pub async fn is_owned_by(&self, code: &str, owner: OwnerId) -> Result<bool> {
        Ok(self
            .links
            .find_by_code_and_owner(code, owner)
            .await?
            .is_some())
    }

    /// 匿名调用方或非所有者一律返回 `Unauthorized`
    pub async fn validate_ownership(&self, code: &str, owner: Option<OwnerId>) -> Result<()> {
        let Some(owner) = owner else {
            return Err(LinkpulseError::unauthorized(
                "Authentication required to access link analytics",
            ));
        };
        if self.is_owned_by(code, owner).await? {
            Ok(())
        } else {
            Err(LinkpulseError::unauthorized(format!(
                "Link '{}' is not owned by {}",
                code, owner
            )))
        }
    }

    pub async fn list_for_owner(
        &self,
        owner: OwnerId,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ShortLink>, u64)> {
        self.links
            .list_by_owner(owner, false, page.max(1), page_size.clamp(1, 100))
            .await
    }

    pub async fn list_active_for_owner(
        &self,
        owner: OwnerId,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<ShortLink>, u64)> {
        self.links
            .list_by_owner(owner, true, page.max(1), page_size.clamp(1, 100))
            .await
    }

    pub async fn count_for_owner(&self, owner: OwnerId) -> Result<u64> {
        self.links.count_by_owner(owner, false).await
    }

    pub async fn count_active_for_owner(&self, owner: OwnerId) -> Result<u64> {
        self.links.count_by_owner(owner, true).await
    }

    /// 在 `[now, now + within]` 内到期的启用链接
    pub async fn expiring_soon(&self, within: chrono::Duration) -> Result<Vec<ShortLink>> {
        let now = self.clock.now();
        self.links.find_expiring_between(now, now + within).await
    }

    /// owner 名下点击数超过 `min_clicks` 的链接，点击数降序
    pub async fn popular_for_owner(&self, owner: OwnerId, min_clicks: u64) -> Result<Vec<ShortLink>> {
        self.links.find_popular_by_owner(owner, min_clicks).await
    }

    // ============ Expiration ============

    pub async fn deactivate_expired(&self) -> Result<u64> {
        self.links.deactivate_expired(self.clock.now()).await
    }
}
