//! Sync error types

use thiserror::Error;

/// Errors from encoding, decoding or transporting sync messages
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to encode sync message: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed sync message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transport disconnected")]
    Disconnected,

    #[error("unknown sync event: {0}")]
    UnknownEvent(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;
