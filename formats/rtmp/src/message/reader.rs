use std::io::{self, Read};

use byteorder::ReadBytesExt;
use tokio_util::bytes::BytesMut;
use utils::traits::reader::ReadRemainingFrom;

use crate::{
    chunk::{
        ChunkMessageCommonHeader,
        errors::{ChunkMessageError, ChunkMessageResult},
    },
    commands,
};

use super::{RtmpMessageType, RtmpUserMessageBody};

/// Decodes a client-to-server message body. The chunk header supplies the
/// message type; AMF3-tagged commands skip their format-switch byte.
impl<R: io::Read> ReadRemainingFrom<&ChunkMessageCommonHeader, R> for RtmpUserMessageBody {
    type Error = ChunkMessageError;
    fn read_remaining_from(
        header: &ChunkMessageCommonHeader,
        reader: R,
    ) -> Result<Self, Self::Error> {
        Reader::new(reader).read_c2s(header)
    }
}

#[derive(Debug)]
pub struct Reader<R> {
    inner: R,
}

impl<R> Reader<R>
where
    R: io::Read,
{
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    pub fn read_c2s(
        &mut self,
        header: &ChunkMessageCommonHeader,
    ) -> ChunkMessageResult<RtmpUserMessageBody> {
        let message_type: RtmpMessageType = header.message_type_id.try_into()?;
        let version = match message_type {
            RtmpMessageType::AMF3Command
            | RtmpMessageType::AMF3Data
            | RtmpMessageType::AMF3SharedObject => amf::Version::Amf3,
            _ => amf::Version::Amf0,
        };
        let message = match message_type {
            RtmpMessageType::AMF0Command | RtmpMessageType::AMF3Command => {
                self.strip_format_switch(version)?;
                RtmpUserMessageBody::C2SCommand(
                    commands::reader::Reader::new(self.inner.by_ref()).read_c2s_command()?,
                )
            }
            RtmpMessageType::AMF0Data | RtmpMessageType::AMF3Data => {
                RtmpUserMessageBody::MetaData {
                    payload: self.read_remaining()?,
                }
            }
            RtmpMessageType::AMF0SharedObject | RtmpMessageType::AMF3SharedObject => {
                RtmpUserMessageBody::SharedObject {
                    payload: self.read_remaining()?,
                }
            }
            RtmpMessageType::Audio => RtmpUserMessageBody::Audio {
                payload: self.read_remaining()?,
            },
            RtmpMessageType::Video => RtmpUserMessageBody::Video {
                payload: self.read_remaining()?,
            },
            RtmpMessageType::Aggregate => RtmpUserMessageBody::Aggregate {
                payload: self.read_remaining()?,
            },
        };
        Ok(message)
    }

    /// An AMF3-tagged command payload is a single format-switch byte in
    /// front of plain AMF0 data.
    fn strip_format_switch(&mut self, version: amf::Version) -> ChunkMessageResult<()> {
        if version == amf::Version::Amf3 {
            let _switch = self.inner.read_u8()?;
        }
        Ok(())
    }

    fn read_remaining(&mut self) -> ChunkMessageResult<BytesMut> {
        let mut payload = Vec::new();
        self.inner.read_to_end(&mut payload)?;
        Ok(BytesMut::from(&payload[..]))
    }
}
