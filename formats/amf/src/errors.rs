use std::{io, string};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AmfReadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("value truncated before its end")]
    Truncated,
    #[error("invalid utf8 data: {0}")]
    InvalidUtf8(#[from] string::FromUtf8Error),
    #[error("unsupported amf value marker: {marker}")]
    Unsupported { marker: u8 },
    #[error("unknown amf value marker: {marker}")]
    Unknown { marker: u8 },
}

pub type AmfReadResult<T> = Result<T, AmfReadError>;

#[derive(Error, Debug)]
pub enum AmfWriteError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("string length out of range: {length}")]
    StringTooLong { length: usize },
    #[error("array length out of range: {length}")]
    ArrayTooLong { length: usize },
}

pub type AmfWriteResult = Result<(), AmfWriteError>;
