use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use utils::traits::writer::WriteTo;

use crate::chunk::errors::ChunkMessageError;

use super::ProtocolControlMessage;

impl<W: io::Write> WriteTo<W> for ProtocolControlMessage {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        match self {
            ProtocolControlMessage::SetChunkSize(m) => {
                writer.write_u32::<BigEndian>(m.chunk_size & 0x7FFF_FFFF)?;
            }
            ProtocolControlMessage::Abort(m) => {
                writer.write_u32::<BigEndian>(m.chunk_stream_id)?;
            }
            ProtocolControlMessage::Ack(m) => {
                writer.write_u32::<BigEndian>(m.sequence_number)?;
            }
            ProtocolControlMessage::WindowAckSize(m) => {
                writer.write_u32::<BigEndian>(m.size)?;
            }
            ProtocolControlMessage::SetPeerBandwidth(m) => {
                writer.write_u32::<BigEndian>(m.size)?;
                writer.write_u8(m.limit_type.into())?;
            }
        }
        Ok(())
    }
}
