use std::sync::Arc;

/// Errors raised around the debouncer: configuration, input and report files,
/// and alert delivery.
#[derive(Debug, thiserror::Error, Clone)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("json error: {0}")]
    Json(Arc<serde_json::Error>),

    /// The alert channel refused or failed to deliver a message.
    #[error("notification failed: {0}")]
    Notification(String),
}

pub type Result<T> = std::result::Result<T, Error>;

// Wrap in an Arc so it is Clone
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(Arc::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}
