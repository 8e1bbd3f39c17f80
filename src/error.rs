use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    ConfigValidation(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("malformed timestamp: {0}")]
    MalformedTimestamp(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("table parse error: {0}")]
    TableParse(String),

    #[error("wiki read failed: {0}")]
    WikiReadFailed(String),

    #[error("wiki write failed: {0}")]
    WikiWriteFailed(String),

    #[error("template error: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, Error>;
