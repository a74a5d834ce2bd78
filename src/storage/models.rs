use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type OwnerId = i64;

/// 短链接
///
/// 相等性只比较 `code`。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortLink {
    pub code: String,
    pub target: String,
    #[serde(default)]
    pub owner: Option<OwnerId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub click_count: u64,
}

fn default_active() -> bool {
    true
}

impl ShortLink {
    pub fn new(
        code: impl Into<String>,
        target: impl Into<String>,
        owner: Option<OwnerId>,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            code: code.into(),
            target: target.into(),
            owner,
            created_at,
            expires_at,
            active: true,
            click_count: 0,
        }
    }

    /// 到期时间已过（不看 active 标志）
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now >= exp)
    }

    /// 可访问：启用且未到期
    pub fn is_accessible_at(&self, now: DateTime<Utc>) -> bool {
        self.active && !self.is_expired_at(now)
    }

    pub fn is_owned_by(&self, owner: OwnerId) -> bool {
        self.owner == Some(owner)
    }
}

impl PartialEq for ShortLink {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for ShortLink {}

impl std::hash::Hash for ShortLink {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

/// 去重键：同一 owner 下同一目标地址只保留一条
pub fn dedup_key(target: &str, owner: Option<OwnerId>) -> String {
    use sha2::{Digest, Sha256};

    let owner_part = owner.map_or_else(|| "-".to_string(), |o| o.to_string());
    let mut hasher = Sha256::new();
    hasher.update(owner_part.as_bytes());
    hasher.update(b"|");
    hasher.update(target.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 待写入的点击事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClickEvent {
    pub code: String,
    pub occurred_at: DateTime<Utc>,
    pub ip_hash: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub device_type: String,
    pub browser: String,
    pub operating_system: String,
    pub country: Option<String>,
    pub city: Option<String>,
}

/// 已落库的点击事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub id: i64,
    pub code: String,
    pub occurred_at: DateTime<Utc>,
    pub ip_hash: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub device_type: String,
    pub browser: String,
    pub operating_system: String,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl ClickEvent {
    pub fn from_new(id: i64, event: NewClickEvent) -> Self {
        Self {
            id,
            code: event.code,
            occurred_at: event.occurred_at,
            ip_hash: event.ip_hash,
            user_agent: event.user_agent,
            referrer: event.referrer,
            device_type: event.device_type,
            browser: event.browser,
            operating_system: event.operating_system,
            country: event.country,
            city: event.city,
        }
    }
}

/// 单日点击数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// 分组统计维度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickDimension {
    Device,
    Browser,
    OperatingSystem,
    Country,
    Referrer,
}

impl fmt::Display for ClickDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Device => "device",
            Self::Browser => "browser",
            Self::OperatingSystem => "os",
            Self::Country => "country",
            Self::Referrer => "referrer",
        };
        f.write_str(name)
    }
}

impl ClickDimension {
    /// 从事件中取出该维度的值
    pub fn value_of<'a>(&self, event: &'a ClickEvent) -> Option<&'a str> {
        match self {
            Self::Device => Some(event.device_type.as_str()),
            Self::Browser => Some(event.browser.as_str()),
            Self::OperatingSystem => Some(event.operating_system.as_str()),
            Self::Country => event.country.as_deref(),
            Self::Referrer => event.referrer.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn test_accessibility() {
        let mut link = ShortLink::new("a", "https://e.com", None, at(0), Some(at(10)));
        assert!(link.is_accessible_at(at(9)));
        assert!(!link.is_accessible_at(at(10)));
        assert!(link.is_expired_at(at(11)));

        link.expires_at = None;
        assert!(link.is_accessible_at(at(23) + Duration::days(3650)));

        link.active = false;
        assert!(!link.is_accessible_at(at(1)));
        assert!(!link.is_expired_at(at(1)));
    }

    #[test]
    fn test_equality_uses_code_only() {
        let a = ShortLink::new("same", "https://a.com", Some(1), at(0), None);
        let mut b = ShortLink::new("same", "https://b.com", None, at(5), None);
        b.click_count = 9;
        assert_eq!(a, b);
        assert_ne!(a, ShortLink::new("other", "https://a.com", Some(1), at(0), None));
    }

    #[test]
    fn test_dedup_key_scopes_by_owner() {
        let anon = dedup_key("https://e.com", None);
        assert_eq!(anon, dedup_key("https://e.com", None));
        assert_ne!(anon, dedup_key("https://e.com", Some(1)));
        assert_ne!(dedup_key("https://e.com", Some(1)), dedup_key("https://e.com", Some(2)));
        assert_eq!(anon.len(), 64);
    }
}
