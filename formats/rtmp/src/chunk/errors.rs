use std::io;

use thiserror::Error;

use amf::errors::{AmfReadError, AmfWriteError};

#[derive(Debug, Error)]
pub enum ChunkMessageError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("unexpected fmt bits: {0:#b}")]
    UnexpectedFmt(u8),
    #[error("unknown message type: {0}")]
    UnknownMessageType(u8),
    #[error("invalid basic header: {0}")]
    InvalidBasicHeader(String),
    #[error("invalid message header: {0}")]
    InvalidMessageHeader(String),
    #[error("no chunk stream context for csid {csid}, a type {fmt} header cannot start a stream")]
    MissingContext { csid: u32, fmt: u8 },
    #[error("message length {length} exceeds the configured maximum {max}")]
    MessageTooLarge { length: u32, max: u32 },
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("amf read error: {0}")]
    AmfRead(#[from] AmfReadError),
    #[error("amf write error: {0}")]
    AmfWrite(#[from] AmfWriteError),
    #[error("unexpected amf value: {0}")]
    UnexpectedAmfType(String),
    #[error("unexpected command name: {0}")]
    UnexpectedCommandName(String),
    #[error("chunk consumed, message still incomplete")]
    IncompleteChunk,
}

pub type ChunkMessageResult<T> = Result<T, ChunkMessageError>;
