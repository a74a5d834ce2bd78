//! User-Agent 分类
//!
//! 纯函数，不区分大小写的子串匹配，按顺序第一条命中即返回。
//! 空串或缺失的 UA 三项均为 `Unknown`。

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum DeviceType {
    Bot,
    Mobile,
    Tablet,
    Desktop,
    Unknown,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum Browser {
    Edge,
    Opera,
    Chrome,
    Safari,
    Firefox,
    Other,
    Unknown,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumString, EnumIter,
)]
pub enum OperatingSystem {
    Android,
    #[strum(serialize = "iOS")]
    Ios,
    #[strum(serialize = "Windows 10/11")]
    Windows10,
    #[strum(serialize = "Windows 8.1")]
    Windows81,
    #[strum(serialize = "Windows 8")]
    Windows8,
    #[strum(serialize = "Windows 7")]
    Windows7,
    Windows,
    #[strum(serialize = "macOS")]
    MacOs,
    Linux,
    Other,
    Unknown,
}

/// 一次请求的客户端画像
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientProfile {
    pub device: DeviceType,
    pub browser: Browser,
    pub os: OperatingSystem,
}

impl ClientProfile {
    pub const UNKNOWN: ClientProfile = ClientProfile {
        device: DeviceType::Unknown,
        browser: Browser::Unknown,
        os: OperatingSystem::Unknown,
    };
}

const BOT_TOKENS: &[&str] = &["bot", "crawler", "spider"];
const MOBILE_TOKENS: &[&str] = &["mobile", "android", "iphone"];
const TABLET_TOKENS: &[&str] = &["tablet", "ipad"];

/// Windows NT 版本号到显示名
const WINDOWS_VERSIONS: &[(&str, OperatingSystem)] = &[
    ("windows nt 10", OperatingSystem::Windows10),
    ("windows nt 6.3", OperatingSystem::Windows81),
    ("windows nt 6.2", OperatingSystem::Windows8),
    ("windows nt 6.1", OperatingSystem::Windows7),
];

/// 只有空串视为缺失，纯空白仍按普通 UA 匹配
fn normalize(ua: Option<&str>) -> Option<String> {
    ua.filter(|s| !s.is_empty()).map(str::to_lowercase)
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn device_of(ua: &str) -> DeviceType {
    if contains_any(ua, BOT_TOKENS) {
        DeviceType::Bot
    } else if contains_any(ua, MOBILE_TOKENS) {
        DeviceType::Mobile
    } else if contains_any(ua, TABLET_TOKENS) {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    }
}

fn browser_of(ua: &str) -> Browser {
    if ua.contains("edg/") || ua.contains("edge") {
        Browser::Edge
    } else if ua.contains("opr/") || ua.contains("opera") {
        Browser::Opera
    } else if ua.contains("chrome") {
        Browser::Chrome
    } else if ua.contains("safari") {
        Browser::Safari
    } else if ua.contains("firefox") {
        Browser::Firefox
    } else {
        Browser::Other
    }
}

fn os_of(ua: &str) -> OperatingSystem {
    if ua.contains("android") {
        return OperatingSystem::Android;
    }
    if ua.contains("iphone") || ua.contains("ipad") {
        return OperatingSystem::Ios;
    }
    if let Some((_, os)) = WINDOWS_VERSIONS.iter().find(|(token, _)| ua.contains(token)) {
        return *os;
    }
    if ua.contains("windows") {
        OperatingSystem::Windows
    } else if ua.contains("mac os x") {
        OperatingSystem::MacOs
    } else if ua.contains("linux") {
        OperatingSystem::Linux
    } else {
        OperatingSystem::Other
    }
}

pub fn device_type(ua: Option<&str>) -> DeviceType {
    normalize(ua).map_or(DeviceType::Unknown, |ua| device_of(&ua))
}

pub fn browser(ua: Option<&str>) -> Browser {
    normalize(ua).map_or(Browser::Unknown, |ua| browser_of(&ua))
}

pub fn operating_system(ua: Option<&str>) -> OperatingSystem {
    normalize(ua).map_or(OperatingSystem::Unknown, |ua| os_of(&ua))
}

pub fn classify(ua: Option<&str>) -> ClientProfile {
    match normalize(ua) {
        Some(ua) => ClientProfile {
            device: device_of(&ua),
            browser: browser_of(&ua),
            os: os_of(&ua),
        },
        None => ClientProfile::UNKNOWN,
    }
}
