use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    KeySpaceExhausted(String),
    InvalidKey(String),
    StoreFailure(String),
    CacheTransportFailure(String),
    Config(String),
}

impl LinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            LinkError::KeySpaceExhausted(_) => "E101",
            LinkError::InvalidKey(_) => "E102",
            LinkError::StoreFailure(_) => "E103",
            LinkError::CacheTransportFailure(_) => "E104",
            LinkError::Config(_) => "E105",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            LinkError::KeySpaceExhausted(_) => "Key Space Exhausted",
            LinkError::InvalidKey(_) => "Invalid Key",
            LinkError::StoreFailure(_) => "Store Failure",
            LinkError::CacheTransportFailure(_) => "Cache Transport Failure",
            LinkError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            LinkError::KeySpaceExhausted(msg)
            | LinkError::InvalidKey(msg)
            | LinkError::StoreFailure(msg)
            | LinkError::CacheTransportFailure(msg)
            | LinkError::Config(msg) => msg,
        }
    }

    /// 格式化为彩色输出（终端）
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

    /// 格式化为简洁输出（日志）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for LinkError {}

// 便捷的构造函数
impl LinkError {
    pub fn key_space_exhausted<T: Into<String>>(msg: T) -> Self {
        LinkError::KeySpaceExhausted(msg.into())
    }

    pub fn invalid_key<T: Into<String>>(msg: T) -> Self {
        LinkError::InvalidKey(msg.into())
    }

    pub fn store_failure<T: Into<String>>(msg: T) -> Self {
        LinkError::StoreFailure(msg.into())
    }

    pub fn cache_transport<T: Into<String>>(msg: T) -> Self {
        LinkError::CacheTransportFailure(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        LinkError::Config(msg.into())
    }
}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::StoreFailure(err.to_string())
    }
}

impl From<csv::Error> for LinkError {
    fn from(err: csv::Error) -> Self {
        LinkError::StoreFailure(err.to_string())
    }
}

impl From<redis::RedisError> for LinkError {
    fn from(err: redis::RedisError) -> Self {
        LinkError::CacheTransportFailure(err.to_string())
    }
}

impl From<::config::ConfigError> for LinkError {
    fn from(err: ::config::ConfigError) -> Self {
        LinkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LinkError {
    fn from(err: toml::ser::Error) -> Self {
        LinkError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let errors = [
            LinkError::key_space_exhausted("a"),
            LinkError::invalid_key("b"),
            LinkError::store_failure("c"),
            LinkError::cache_transport("d"),
            LinkError::config("e"),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_display_uses_simple_format() {
        let err = LinkError::store_failure("disk full");
        assert_eq!(err.to_string(), "Store Failure: disk full");
        assert_eq!(err.message(), "disk full");
    }

    #[test]
    fn test_io_error_maps_to_store_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: LinkError = io.into();
        assert!(matches!(err, LinkError::StoreFailure(_)));
    }
}
