//! Bridge error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("bridge has not been started")]
    NotStarted,

    #[error("no view with id {0} has been found")]
    UnknownView(String),

    #[error("no pending promise with id {0}")]
    UnknownPromise(String),

    #[error("no function with id {0}")]
    UnknownFunction(String),

    #[error("unable to parse json response: {0}")]
    InvalidResponseJson(#[source] serde_json::Error),

    #[error("ui library error: {0}")]
    Library(String),

    #[error("outbound channel closed")]
    ChannelClosed,

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Stable code reported to the host in `error` envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::NotStarted => "not_started",
            BridgeError::UnknownView(_) => "unknown_view",
            BridgeError::UnknownPromise(_) => "unknown_promise",
            BridgeError::UnknownFunction(_) => "unknown_function",
            BridgeError::InvalidResponseJson(_) => "invalid_response_json",
            BridgeError::Library(_) => "library_error",
            BridgeError::ChannelClosed => "channel_closed",
            BridgeError::Json(_) => "decode_error",
            BridgeError::Io(_) => "io_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
