pub mod base62;
pub mod clock;
pub mod time_parser;
pub mod url_validator;

pub use clock::{Clock, SystemClock};

/// 计算客户端 IP 的 SHA-256 十六进制摘要，原始 IP 不落库
pub fn hash_ip(ip: &str) -> String {
    use sha2::{Digest, Sha256};
    format!("{:x}", Sha256::digest(ip.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_ip_is_stable_hex() {
        let h = hash_ip("203.0.113.7");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, hash_ip("203.0.113.7"));
        assert_ne!(h, hash_ip("203.0.113.8"));
    }
}
