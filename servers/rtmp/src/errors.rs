use std::io;

use rtmp_formats::{chunk::errors::ChunkMessageError, handshake::errors::HandshakeError};
use stream_hub::errors::StreamHubError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RtmpServerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("handshake failed: {0}")]
    HandshakeFailed(#[from] HandshakeError),
    #[error("chunk message read failed: {0}")]
    ChunkMessageReadFailed(#[from] ChunkMessageError),
    #[error("stream hub operation failed: {0}")]
    StreamHub(#[from] StreamHubError),
    #[error("stream hub channel closed")]
    ChannelSendFailed,
    #[error("invalid stream parameter: {0}")]
    InvalidStreamParam(String),
    #[error("stream is gone")]
    StreamIsGone,
}

pub type RtmpServerResult<T> = Result<T, RtmpServerError>;
