//! Base62 编解码
//!
//! 字母表固定为 `0-9A-Za-z`，高位在前。短码即序号的 Base62 表示。

use crate::errors::{LinkpulseError, Result};

pub const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE: u64 = 62;

/// u64::MAX 编码后为 11 位
pub const MAX_ENCODED_LEN: usize = 11;

/// 短码最大长度
pub const MAX_CODE_LEN: usize = 10;

pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut buf = [0u8; MAX_ENCODED_LEN];
    let mut pos = MAX_ENCODED_LEN;
    while n > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(n % BASE) as usize];
        n /= BASE;
    }

    // 字母表全是 ASCII
    buf[pos..].iter().map(|&b| b as char).collect()
}

pub fn decode(code: &str) -> Result<u64> {
    if code.is_empty() {
        return Err(LinkpulseError::invalid_input("短码不能为空"));
    }

    code.bytes().try_fold(0u64, |acc, b| {
        let digit = digit_value(b).ok_or_else(|| {
            LinkpulseError::invalid_input(format!(
                "短码包含非法字符 '{}': {}",
                b as char, code
            ))
        })?;
        acc.checked_mul(BASE)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| LinkpulseError::invalid_input(format!("短码超出取值范围: {}", code)))
    })
}

fn digit_value(b: u8) -> Option<u64> {
    match b {
        b'0'..=b'9' => Some((b - b'0') as u64),
        b'A'..=b'Z' => Some((b - b'A') as u64 + 10),
        b'a'..=b'z' => Some((b - b'a') as u64 + 36),
        _ => None,
    }
}

/// 短码格式检查（仅字母数字，1..=max_len）
pub fn is_valid_code(code: &str, max_len: usize) -> bool {
    !code.is_empty() && code.len() <= max_len && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_zero() {
        assert_eq!(encode(0), "0");
        assert_eq!(decode("0").unwrap(), 0);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(encode(61), "z");
        assert_eq!(encode(62), "10");
        assert_eq!(encode(3843), "zz");
        assert_eq!(decode("A").unwrap(), 10);
        assert_eq!(decode("a").unwrap(), 36);
    }

    #[test]
    fn test_roundtrip_samples() {
        for n in [1u64, 9, 10, 35, 36, 1_700_000_000_000, u64::MAX / 3, u64::MAX] {
            assert_eq!(decode(&encode(n)).unwrap(), n, "n = {}", n);
        }
        assert_eq!(encode(u64::MAX).len(), MAX_ENCODED_LEN);
    }

    #[test]
    fn test_ordering_follows_alphabet() {
        // 同长度下字典序与数值序一致
        let a = encode(1_000_000);
        let b = encode(1_000_001);
        assert_eq!(a.len(), b.len());
        assert!(a < b);
    }

    #[test]
    fn test_decode_rejects_invalid() {
        assert!(matches!(decode(""), Err(LinkpulseError::InvalidInput(_))));
        assert!(matches!(decode("ab-c"), Err(LinkpulseError::InvalidInput(_))));
        assert!(matches!(decode("é"), Err(LinkpulseError::InvalidInput(_))));
        // 12 位 'z' 超出 u64
        assert!(matches!(
            decode("zzzzzzzzzzzz"),
            Err(LinkpulseError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("abc123", 10));
        assert!(!is_valid_code("", 10));
        assert!(!is_valid_code("abc_123", 10));
        assert!(!is_valid_code("abcdefghijk", 10));
        assert!(is_valid_code(&encode(62u64.pow(10) - 1), MAX_CODE_LEN));
        assert!(!is_valid_code(&encode(62u64.pow(10)), MAX_CODE_LEN));
    }
}
