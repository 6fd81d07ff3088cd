//! Consumer error types

use thiserror::Error;

/// Error type for stream consumer operations.
///
/// Every variant is recovered locally: connect and transport failures feed
/// the reconnect loop, and nothing here ever surfaces to the operator.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// Opening the stream connection failed
    #[error("Failed to open notification stream: {0}")]
    Connect(String),

    /// The open connection broke mid-stream
    #[error("Notification stream lost: {0}")]
    Transport(String),
}

impl ConsumerError {
    /// Create a connect error
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }
}

/// The host refused to play the notification sound (autoplay policy).
/// Swallowed by dispatch; never affects the log or the toast.
#[derive(Error, Debug)]
#[error("Sound playback rejected: {0}")]
pub struct PlaybackRejected(pub String);
