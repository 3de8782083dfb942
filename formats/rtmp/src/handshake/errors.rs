use std::{io, time::SystemTimeError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unsupported rtmp version: {0}")]
    BadVersion(u8),
    #[error("c2 does not echo s1")]
    EchoMismatch,
    #[error("system time before unix epoch: {0}")]
    Time(#[from] SystemTimeError),
}

pub type HandshakeResult<T> = Result<T, HandshakeError>;
