//! 目标 URL 校验
//!
//! 只接受 http/https 绝对地址，并显式拦截脚本类协议

use url::Url;

use crate::errors::{LinkpulseError, Result};

/// 显式拦截的协议
const BLOCKED_SCHEMES: &[&str] = &["javascript", "data", "file", "vbscript", "about", "blob"];

#[derive(Debug, PartialEq, Eq)]
pub enum TargetRejection {
    Empty,
    TooLong { len: usize, max: usize },
    BlockedScheme(String),
    UnsupportedScheme(String),
    Malformed(String),
}

impl std::fmt::Display for TargetRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "target URL cannot be empty"),
            Self::TooLong { len, max } => {
                write!(f, "target URL is {} characters, limit is {}", len, max)
            }
            Self::BlockedScheme(s) => write!(f, "scheme '{}:' is not allowed", s),
            Self::UnsupportedScheme(s) => {
                write!(f, "scheme '{}:' is not supported, use http or https", s)
            }
            Self::Malformed(msg) => write!(f, "malformed URL: {}", msg),
        }
    }
}

/// 校验目标地址，返回去除首尾空白后的规范字符串
pub fn check_target(raw: &str, max_len: usize) -> std::result::Result<String, TargetRejection> {
    let target = raw.trim();
    if target.is_empty() {
        return Err(TargetRejection::Empty);
    }

    // 按字符计数
    let len = target.chars().count();
    if len > max_len {
        return Err(TargetRejection::TooLong { len, max: max_len });
    }

    let scheme = target
        .split_once(':')
        .map(|(s, _)| s.to_ascii_lowercase())
        .unwrap_or_default();
    if BLOCKED_SCHEMES.contains(&scheme.as_str()) {
        return Err(TargetRejection::BlockedScheme(scheme));
    }

    let parsed = Url::parse(target).map_err(|e| TargetRejection::Malformed(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(TargetRejection::UnsupportedScheme(other.to_string())),
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(TargetRejection::Malformed("missing host".to_string()));
    }

    Ok(target.to_string())
}

/// `check_target` 的错误转换版本
pub fn validate_target(raw: &str, max_len: usize) -> Result<String> {
    check_target(raw, max_len).map_err(|e| LinkpulseError::invalid_input(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert_eq!(
            check_target("  https://example.com/a?b=1 ", 2048).unwrap(),
            "https://example.com/a?b=1"
        );
        assert!(check_target("http://localhost:8080", 2048).is_ok());
        assert!(check_target("HTTPS://EXAMPLE.COM", 2048).is_ok());
    }

    #[test]
    fn test_rejects_blocked_schemes() {
        for raw in [
            "javascript:alert(1)",
            "JavaScript:alert(1)",
            "data:text/html,<b>x</b>",
            "file:///etc/passwd",
            "vbscript:msgbox(1)",
        ] {
            assert!(
                matches!(check_target(raw, 2048), Err(TargetRejection::BlockedScheme(_))),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            check_target("ftp://example.com", 2048),
            Err(TargetRejection::UnsupportedScheme(_))
        ));
        assert!(matches!(
            check_target("mailto:someone@example.com", 2048),
            Err(TargetRejection::UnsupportedScheme(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        assert_eq!(check_target("   ", 2048), Err(TargetRejection::Empty));
        assert!(matches!(
            check_target("not a url", 2048),
            Err(TargetRejection::Malformed(_))
        ));
    }

    #[test]
    fn test_length_limit() {
        let url = format!("https://example.com/{}", "a".repeat(2048));
        assert!(matches!(
            check_target(&url, 2048),
            Err(TargetRejection::TooLong { max: 2048, .. })
        ));
        let exact = format!("https://e.com/{}", "a".repeat(2048 - 14));
        assert_eq!(exact.len(), 2048);
        assert!(check_target(&exact, 2048).is_ok());
    }

    #[test]
    fn test_validate_target_maps_to_invalid_input() {
        assert!(matches!(
            validate_target("", 10),
            Err(LinkpulseError::InvalidInput(_))
        ));
    }
}
