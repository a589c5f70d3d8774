use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Invalid location: {0}")]
    Url(#[from] url::ParseError),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Addressing broke after a root was already resolved. Never skipped.
    #[error("Illegal state: {0}")]
    State(String),
}

impl LoadError {
    pub(crate) fn state(msg: impl Into<String>) -> Self {
        LoadError::State(msg.into())
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        LoadError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, LoadError>;
