use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum LinkpulseError {
    InvalidInput(String),
    NotFound(String),
    Expired(String),
    Unauthorized(String),
    Conflict(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    CacheConnection(String),
    Serialization(String),
    FileOperation(String),
    Config(String),
}

impl LinkpulseError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkpulseError::InvalidInput(_) => "E001",
            LinkpulseError::NotFound(_) => "E002",
            LinkpulseError::Expired(_) => "E003",
            LinkpulseError::Unauthorized(_) => "E004",
            LinkpulseError::Conflict(_) => "E005",
            LinkpulseError::DatabaseConfig(_) => "E006",
            LinkpulseError::DatabaseConnection(_) => "E007",
            LinkpulseError::DatabaseOperation(_) => "E008",
            LinkpulseError::CacheConnection(_) => "E009",
            LinkpulseError::Serialization(_) => "E010",
            LinkpulseError::FileOperation(_) => "E011",
            LinkpulseError::Config(_) => "E012",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkpulseError::InvalidInput(_) => "Invalid Input",
            LinkpulseError::NotFound(_) => "Resource Not Found",
            LinkpulseError::Expired(_) => "Link Expired",
            LinkpulseError::Unauthorized(_) => "Unauthorized",
            LinkpulseError::Conflict(_) => "Conflict",
            LinkpulseError::DatabaseConfig(_) => "Database Configuration Error",
            LinkpulseError::DatabaseConnection(_) => "Database Connection Error",
            LinkpulseError::DatabaseOperation(_) => "Database Operation Error",
            LinkpulseError::CacheConnection(_) => "Cache Connection Error",
            LinkpulseError::Serialization(_) => "Serialization Error",
            LinkpulseError::FileOperation(_) => "File Operation Error",
            LinkpulseError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkpulseError::InvalidInput(msg)
            | LinkpulseError::NotFound(msg)
            | LinkpulseError::Expired(msg)
            | LinkpulseError::Unauthorized(msg)
            | LinkpulseError::Conflict(msg)
            | LinkpulseError::DatabaseConfig(msg)
            | LinkpulseError::DatabaseConnection(msg)
            | LinkpulseError::DatabaseOperation(msg)
            | LinkpulseError::CacheConnection(msg)
            | LinkpulseError::Serialization(msg)
            | LinkpulseError::FileOperation(msg)
            | LinkpulseError::Config(msg) => msg,
        }
    }

    /// 格式化为彩色输出（用于 run 模式的启动日志）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 命令）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否为存储层错误
    pub fn is_database(&self) -> bool {
        matches!(
            self,
            LinkpulseError::DatabaseConfig(_)
                | LinkpulseError::DatabaseConnection(_)
                | LinkpulseError::DatabaseOperation(_)
        )
    }
}

impl fmt::Display for LinkpulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkpulseError {}

// 便捷的构造函数
impl LinkpulseError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::InvalidInput(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::NotFound(msg.into())
    }

    pub fn expired<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::Expired(msg.into())
    }

    pub fn unauthorized<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::Unauthorized(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::Conflict(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::DatabaseOperation(msg.into())
    }

    pub fn cache_connection<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::CacheConnection(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::Serialization(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::FileOperation(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        LinkpulseError::Config(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for LinkpulseError {
    fn from(err: sea_orm::DbErr) -> Self {
        LinkpulseError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for LinkpulseError {
    fn from(err: std::io::Error) -> Self {
        LinkpulseError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for LinkpulseError {
    fn from(err: serde_json::Error) -> Self {
        LinkpulseError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for LinkpulseError {
    fn from(err: chrono::ParseError) -> Self {
        LinkpulseError::InvalidInput(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkpulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let all = [
            LinkpulseError::invalid_input(""),
            LinkpulseError::not_found(""),
            LinkpulseError::expired(""),
            LinkpulseError::unauthorized(""),
            LinkpulseError::conflict(""),
            LinkpulseError::database_config(""),
            LinkpulseError::database_connection(""),
            LinkpulseError::database_operation(""),
            LinkpulseError::cache_connection(""),
            LinkpulseError::serialization(""),
            LinkpulseError::file_operation(""),
            LinkpulseError::config(""),
        ];
        let codes: std::collections::HashSet<_> = all.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn test_format_simple() {
        let err = LinkpulseError::expired("abc123");
        assert_eq!(err.format_simple(), "Link Expired: abc123");
        assert_eq!(err.to_string(), err.format_simple());
    }

    #[test]
    fn test_from_serde_json() {
        let err: LinkpulseError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, LinkpulseError::Serialization(_)));
    }
}
