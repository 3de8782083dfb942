use std::io::{self, Write};

use utils::traits::writer::WriteTo;

use crate::chunk::errors::{ChunkMessageError, ChunkMessageResult};

use super::RtmpUserMessageBody;

impl<W: io::Write> WriteTo<W> for RtmpUserMessageBody {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        Writer::new(writer).write(self)
    }
}

#[derive(Debug)]
pub struct Writer<W> {
    inner: W,
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Serializes a server-originated message body. This is an ingress
    /// server: client-to-server commands are never written.
    pub fn write(&mut self, message: &RtmpUserMessageBody) -> ChunkMessageResult<()> {
        match message {
            RtmpUserMessageBody::S2CCommand(command) => command.write_to(&mut self.inner),
            RtmpUserMessageBody::MetaData { payload }
            | RtmpUserMessageBody::SharedObject { payload }
            | RtmpUserMessageBody::Audio { payload }
            | RtmpUserMessageBody::Video { payload }
            | RtmpUserMessageBody::Aggregate { payload } => {
                self.inner.write_all(payload)?;
                Ok(())
            }
            RtmpUserMessageBody::C2SCommand(command) => Err(ChunkMessageError::InvalidMessage(
                format!("refusing to write a client-side command: {:?}", command),
            )),
        }
    }
}
