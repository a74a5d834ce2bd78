use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{LinkpulseError, Result};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含：
/// - database: 数据库连接与重试
/// - cache: 解析缓存后端
/// - links: 短链接创建规则
/// - pipeline: 点击采集线程池
/// - analytics: 统计缓存与数据保留
/// - sweeper: 过期清扫任务
/// - logging: 日志输出
///
/// 配置以值的形式传入各组件构造函数，不做全局单例。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub links: LinksConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub sweeper: SweeperConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 `config.toml` 和环境变量加载配置
    pub fn load() -> Self {
        Self::load_from("config.toml")
    }

    /// 从指定文件和环境变量加载配置
    ///
    /// 优先级：ENV > 配置文件 > 默认值
    /// ENV 前缀：LP，分隔符：__
    /// 示例：LP__CACHE__TYPE=redis
    pub fn load_from(path: &str) -> Self {
        use config::{Config, Environment, File};

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("LP")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 检查取值范围，启动前调用
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.worker_count == 0 {
            return Err(LinkpulseError::config("pipeline.worker_count 必须大于 0"));
        }
        if self.pipeline.queue_capacity == 0 {
            return Err(LinkpulseError::config("pipeline.queue_capacity 必须大于 0"));
        }
        if self.links.max_url_length == 0 {
            return Err(LinkpulseError::config("links.max_url_length 必须大于 0"));
        }
        if self.links.id_probe_limit == 0 {
            return Err(LinkpulseError::config("links.id_probe_limit 必须大于 0"));
        }
        if self.sweeper.enabled && self.sweeper.interval_secs == 0 {
            return Err(LinkpulseError::config("sweeper.interval_secs 必须大于 0"));
        }
        if self.analytics.default_days <= 0
            || self.analytics.default_days > self.analytics.max_range_days
        {
            return Err(LinkpulseError::config(
                "analytics.default_days 必须在 1..=analytics.max_range_days 之间",
            ));
        }
        if self.analytics.retention_days > 0 && self.analytics.retention_interval_secs == 0 {
            return Err(LinkpulseError::config(
                "analytics.retention_interval_secs 必须大于 0",
            ));
        }
        CacheKind::parse(&self.cache.cache_type)?;
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LinkpulseError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    /// 连接/获取超时（秒）
    #[serde(default = "default_database_timeout")]
    pub timeout: u64,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
    Memory,
    Redis,
    None,
}

impl CacheKind {
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "moka" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            "none" | "null" | "off" => Ok(Self::None),
            other => Err(LinkpulseError::config(format!(
                "未知的缓存类型 '{}'，可选: memory, redis, none",
                other
            ))),
        }
    }
}

/// 缓存系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(rename = "type")]
    #[serde(default = "default_cache_type")]
    pub cache_type: String,
    /// 链接缓存默认 TTL（秒）
    #[serde(default = "default_cache_ttl")]
    pub default_ttl: u64,
    /// 单次缓存操作超时（毫秒）
    #[serde(default = "default_cache_op_timeout_ms")]
    pub op_timeout_ms: u64,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl CacheConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

/// Redis 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    #[serde(default = "default_redis_key_prefix")]
    pub key_prefix: String,
}

/// 内存缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub max_capacity: u64,
}

/// 短链接创建规则
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,
    #[serde(default = "default_true")]
    pub duplicate_detection: bool,
    #[serde(default = "default_max_expiry_days")]
    pub max_expiry_days: i64,
    /// 生成短码时最多探测次数
    #[serde(default = "default_id_probe_limit")]
    pub id_probe_limit: u32,
}

/// 点击采集线程池
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl PipelineConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// 统计配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// 统计快照缓存 TTL（秒）
    #[serde(default = "default_analytics_cache_ttl")]
    pub cache_ttl: u64,
    /// 默认统计天数
    #[serde(default = "default_analytics_days")]
    pub default_days: i64,
    /// 按天序列最多跨越的天数
    #[serde(default = "default_analytics_max_range_days")]
    pub max_range_days: i64,
    /// 点击事件保留天数，0 表示永久保留
    #[serde(default)]
    pub retention_days: u64,
    #[serde(default = "default_retention_interval_secs")]
    pub retention_interval_secs: u64,
}

/// 过期清扫配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweeperConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_sweeper_interval_secs")]
    pub interval_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_true")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_true() -> bool {
    true
}

fn default_database_url() -> String {
    "sqlite://linkpulse.db".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_database_timeout() -> u64 {
    8
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    100
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_cache_type() -> String {
    "memory".to_string()
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_op_timeout_ms() -> u64 {
    250
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".to_string()
}

fn default_redis_key_prefix() -> String {
    "linkpulse:".to_string()
}

fn default_memory_capacity() -> u64 {
    10000
}

fn default_max_url_length() -> usize {
    2048
}

fn default_max_expiry_days() -> i64 {
    365
}

fn default_id_probe_limit() -> u32 {
    1000
}

fn default_worker_count() -> usize {
    5
}

fn default_queue_capacity() -> usize {
    100
}

fn default_shutdown_grace_secs() -> u64 {
    60
}

fn default_analytics_cache_ttl() -> u64 {
    1800
}

fn default_analytics_days() -> i64 {
    7
}

fn default_analytics_max_range_days() -> i64 {
    366
}

fn default_retention_interval_secs() -> u64 {
    86400
}

fn default_sweeper_interval_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            timeout: default_database_timeout(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_type: default_cache_type(),
            default_ttl: default_cache_ttl(),
            op_timeout_ms: default_cache_op_timeout_ms(),
            redis: RedisConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: default_redis_key_prefix(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_capacity: default_memory_capacity(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            max_url_length: default_max_url_length(),
            duplicate_detection: true,
            max_expiry_days: default_max_expiry_days(),
            id_probe_limit: default_id_probe_limit(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_count: default_worker_count(),
            queue_capacity: default_queue_capacity(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            cache_ttl: default_analytics_cache_ttl(),
            default_days: default_analytics_days(),
            max_range_days: default_analytics_max_range_days(),
            retention_days: 0,
            retention_interval_secs: default_retention_interval_secs(),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_sweeper_interval_secs(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: true,
        }
    }
}
