use chrono::{DateTime, Duration, Utc};

use crate::errors::{LinkpulseError, Result};

/// 解析过期时间，支持：
/// - RFC3339：2026-10-01T12:00:00Z
/// - 相对时间：30m, 2h, 7d, 1w，可组合如 1d12h
pub fn parse_expiry(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }

    let offset = parse_duration(input)?;
    now.checked_add_signed(offset)
        .ok_or_else(|| LinkpulseError::invalid_input(format!("过期时间超出范围: {}", input)))
}

/// 解析相对时长
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let mut total = Duration::zero();
    let mut rest = input;

    while !rest.is_empty() {
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits_end == 0 {
            return Err(LinkpulseError::invalid_input(format!(
                "无效的时间格式: '{}'",
                input
            )));
        }
        let num: i64 = rest[..digits_end]
            .parse()
            .map_err(|_| LinkpulseError::invalid_input(format!("无效的数字: '{}'", input)))?;
        rest = &rest[digits_end..];

        let unit_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let part = match unit {
            "s" => Duration::try_seconds(num),
            "m" => Duration::try_minutes(num),
            "h" => Duration::try_hours(num),
            "d" => Duration::try_days(num),
            "w" => Duration::try_weeks(num),
            "" => {
                return Err(LinkpulseError::invalid_input(format!(
                    "数字 {} 后缺少时间单位",
                    num
                )));
            }
            other => {
                return Err(LinkpulseError::invalid_input(format!(
                    "不支持的时间单位: '{}'",
                    other
                )));
            }
        }
        .ok_or_else(|| LinkpulseError::invalid_input(format!("时长超出范围: '{}'", input)))?;

        total += part;
    }

    if total.is_zero() {
        return Err(LinkpulseError::invalid_input("时间间隔不能为零"));
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_relative_units() {
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
        assert_eq!(parse_duration("2h").unwrap(), Duration::hours(2));
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("1w").unwrap(), Duration::weeks(1));
        assert_eq!(
            parse_duration("1d12h").unwrap(),
            Duration::days(1) + Duration::hours(12)
        );
    }

    #[test]
    fn test_rfc3339() {
        let dt = parse_expiry("2026-10-01T08:00:00+08:00", now()).unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_expiry_is_relative_to_now() {
        assert_eq!(parse_expiry("1d", now()).unwrap(), now() + Duration::days(1));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("0d").is_err());
        assert!(parse_duration("5").is_err());
        assert!(parse_duration("5y").is_err());
        assert!(parse_duration("d5").is_err());
    }
}
