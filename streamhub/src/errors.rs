use thiserror::Error;

use crate::events::StreamKey;

#[derive(Debug, Error)]
pub enum StreamHubError {
    #[error("connection rejected: {0}")]
    ConnectionRejected(String),
    #[error("stream {0} is already being published")]
    DuplicateStream(StreamKey),
    #[error("stream {0} not found")]
    StreamNotFound(StreamKey),
    #[error("invalid stream key: {0}")]
    InvalidStreamKey(String),
    #[error("hub channel closed")]
    ChannelClosed,
}

pub type StreamHubResult<T> = Result<T, StreamHubError>;
