/// Errors from talking to the relay bulletin.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),
}
