//! Client error types.

use thiserror::Error;
use ufte_protocol::ProtocolError;

/// Errors surfaced by the session layer.
///
/// Nothing is retried internally. After any failure the session may be
/// desynchronized (stray response bytes still buffered); the caller can
/// discard the accumulator and re-sync, or close and reopen.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Serial endpoint could not be opened or configured.
    #[error("failed to open serial port: {0}")]
    OpenFailed(String),

    /// No beacon observed within the configured retries.
    #[error("no beacon from device within {attempts} attempts")]
    SyncFailed { attempts: u32 },

    /// Underlying write failed.
    #[error("serial write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// Underlying read failed.
    #[error("serial read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// No frame delimiter arrived before the read deadline.
    #[error("no complete frame within the read deadline")]
    ReadTimeout,

    /// No response to a request within the session timeout.
    #[error("request timed out")]
    Timeout,

    /// Framing or packet codec failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Request parameters could not be serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The device answered `ok: false`; the message is its `err` verbatim.
    #[error("device error: {0}")]
    Remote(String),

    /// Local API misuse, e.g. an unknown transfer direction.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Local file open/read/write failure.
    #[error("local I/O error on {path}: {source}")]
    LocalIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
