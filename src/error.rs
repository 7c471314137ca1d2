use solana_client::client_error::ClientError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Coarse classification of every pipeline failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Feed disconnect or unreachable RPC endpoint
    Transport,
    /// Missing transaction or account
    NotFound,
    /// Malformed notification or account layout mismatch
    Decode,
    /// Unique-key violation in the watchlist
    Duplicate,
}

/// Errors produced while watching, enriching and storing pool events
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("RPC request failed: {0}")]
    Rpc(#[from] ClientError),
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("Subscription was not acknowledged: {0}")]
    SubscribeRejected(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record with signature {0} already exists")]
    Duplicate(String),
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl WatcherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WatcherError::Rpc(_)
            | WatcherError::WebSocket(_)
            | WatcherError::SubscribeRejected(_)
            | WatcherError::Store(_) => ErrorKind::Transport,
            WatcherError::NotFound(_) => ErrorKind::NotFound,
            WatcherError::Decode(_) | WatcherError::Json(_) => ErrorKind::Decode,
            WatcherError::Duplicate(_) => ErrorKind::Duplicate,
        }
    }
}

pub type WatcherResult<T> = std::result::Result<T, WatcherError>;
