//! Model <-> 领域类型转换

use sea_orm::ActiveValue::{NotSet, Set};

use crate::storage::models::{ClickEvent, NewClickEvent, ShortLink, dedup_key};
use migration::entities::{click_event, short_link};

pub fn model_to_link(model: short_link::Model) -> ShortLink {
    ShortLink {
        code: model.short_code,
        target: model.target_url,
        owner: model.owner_id,
        created_at: model.created_at,
        expires_at: model.expires_at,
        active: model.is_active,
        click_count: model.click_count.max(0) as u64,
    }
}

/// 新链接的 ActiveModel。`dedup` 为 false 时不写去重键
pub fn link_to_active_model(link: &ShortLink, dedup: bool) -> short_link::ActiveModel {
    short_link::ActiveModel {
        short_code: Set(link.code.clone()),
        target_url: Set(link.target.clone()),
        owner_id: Set(link.owner),
        created_at: Set(link.created_at),
        expires_at: Set(link.expires_at),
        is_active: Set(link.active),
        click_count: Set(link.click_count.min(i64::MAX as u64) as i64),
        dedup_key: Set(dedup.then(|| dedup_key(&link.target, link.owner))),
    }
}

pub fn model_to_event(model: click_event::Model) -> ClickEvent {
    ClickEvent {
        id: model.id,
        code: model.short_code,
        occurred_at: model.occurred_at,
        ip_hash: model.ip_hash,
        user_agent: model.user_agent,
        referrer: model.referrer,
        device_type: model.device_type,
        browser: model.browser,
        operating_system: model.operating_system,
        country: model.country,
        city: model.city,
    }
}

pub fn event_to_active_model(event: &NewClickEvent) -> click_event::ActiveModel {
    click_event::ActiveModel {
        id: NotSet,
        short_code: Set(event.code.clone()),
        occurred_at: Set(event.occurred_at),
        ip_hash: Set(event.ip_hash.clone()),
        user_agent: Set(event.user_agent.clone()),
        referrer: Set(event.referrer.clone()),
        device_type: Set(event.device_type.clone()),
        browser: Set(event.browser.clone()),
        operating_system: Set(event.operating_system.clone()),
        country: Set(event.country.clone()),
        city: Set(event.city.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::ActiveValue;

    #[test]
    fn test_model_to_link() {
        let now = Utc::now();
        let link = model_to_link(short_link::Model {
            short_code: "abc".into(),
            target_url: "https://e.com".into(),
            owner_id: Some(3),
            created_at: now,
            expires_at: Some(now + Duration::days(1)),
            is_active: false,
            click_count: 12,
            dedup_key: None,
        });
        assert_eq!(link.code, "abc");
        assert_eq!(link.owner, Some(3));
        assert!(!link.active);
        assert_eq!(link.click_count, 12);
    }

    #[test]
    fn test_negative_click_count_clamps() {
        let link = model_to_link(short_link::Model {
            short_code: "x".into(),
            target_url: "https://e.com".into(),
            owner_id: None,
            created_at: Utc::now(),
            expires_at: None,
            is_active: true,
            click_count: -4,
            dedup_key: None,
        });
        assert_eq!(link.click_count, 0);
    }

    #[test]
    fn test_dedup_key_only_when_enabled() {
        let link = ShortLink::new("a", "https://e.com", None, Utc::now(), None);
        let on = link_to_active_model(&link, true);
        let off = link_to_active_model(&link, false);
        assert_eq!(
            on.dedup_key,
            ActiveValue::Set(Some(dedup_key("https://e.com", None)))
        );
        assert_eq!(off.dedup_key, ActiveValue::Set(None));
    }
}
