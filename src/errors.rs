use thiserror::Error;
use std::path::PathBuf;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("RSS error: {0}")]
    RssError(#[from] rss::Error),

    #[error("Config error in {file}: {reason}")]
    ConfigError { file: String, reason: String },

    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Failed to write {}: {source}", path.display())]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Data error: {0}")]
    DataError(String),
}

pub type Result<T> = std::result::Result<T, FeedError>;

impl FeedError {
    /// 构造单个配置文件的错误
    pub fn config(file: impl Into<String>, reason: impl Into<String>) -> Self {
        FeedError::ConfigError {
            file: file.into(),
            reason: reason.into(),
        }
    }
}

// 用于从字符串创建错误
impl From<String> for FeedError {
    fn from(s: String) -> Self {
        FeedError::DataError(s)
    }
}

impl From<&str> for FeedError {
    fn from(s: &str) -> Self {
        FeedError::DataError(s.to_string())
    }
}
