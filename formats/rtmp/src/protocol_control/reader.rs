use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use utils::traits::reader::ReadRemainingFrom;

use crate::chunk::errors::{ChunkMessageError, ChunkMessageResult};

use super::{
    AbortMessage, Acknowledgement, ProtocolControlMessage, ProtocolControlMessageType,
    SetChunkSize, SetPeerBandwidth, WindowAckSize,
};

/// The message type id travels in the chunk header, so the payload decoder
/// receives it as pre-parsed context.
impl<R: io::Read> ReadRemainingFrom<ProtocolControlMessageType, R> for ProtocolControlMessage {
    type Error = ChunkMessageError;
    fn read_remaining_from(
        header: ProtocolControlMessageType,
        reader: R,
    ) -> Result<Self, Self::Error> {
        Reader::new(reader).read(header)
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

    pub fn read(
        &mut self,
        message_type: ProtocolControlMessageType,
    ) -> ChunkMessageResult<ProtocolControlMessage> {
        match message_type {
            ProtocolControlMessageType::SetChunkSize => self.read_set_chunk_size(),
            ProtocolControlMessageType::Abort => self.read_abort(),
            ProtocolControlMessageType::Acknowledgement => self.read_acknowledgement(),
            ProtocolControlMessageType::WindowAckSize => self.read_window_ack_size(),
            ProtocolControlMessageType::SetPeerBandwidth => self.read_set_peer_bandwidth(),
        }
    }

    fn read_set_chunk_size(&mut self) -> ChunkMessageResult<ProtocolControlMessage> {
        let raw = self.inner.read_u32::<BigEndian>()?;
        if raw & 0x8000_0000 != 0 {
            tracing::warn!("set chunk size with the reserved top bit set: {:#x}", raw);
        }
        Ok(ProtocolControlMessage::SetChunkSize(SetChunkSize {
            // the top bit must be zero, mask it off
            chunk_size: raw & 0x7FFF_FFFF,
        }))
    }

    fn read_abort(&mut self) -> ChunkMessageResult<ProtocolControlMessage> {
        Ok(ProtocolControlMessage::Abort(AbortMessage {
            chunk_stream_id: self.inner.read_u32::<BigEndian>()?,
        }))
    }

    fn read_acknowledgement(&mut self) -> ChunkMessageResult<ProtocolControlMessage> {
        Ok(ProtocolControlMessage::Ack(Acknowledgement {
            sequence_number: self.inner.read_u32::<BigEndian>()?,
        }))
    }

    fn read_window_ack_size(&mut self) -> ChunkMessageResult<ProtocolControlMessage> {
        Ok(ProtocolControlMessage::WindowAckSize(WindowAckSize {
            size: self.inner.read_u32::<BigEndian>()?,
        }))
    }

    fn read_set_peer_bandwidth(&mut self) -> ChunkMessageResult<ProtocolControlMessage> {
        Ok(ProtocolControlMessage::SetPeerBandwidth(SetPeerBandwidth {
            size: self.inner.read_u32::<BigEndian>()?,
            limit_type: self.inner.read_u8()?.try_into()?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use utils::traits::reader::ReadRemainingFrom;

    use crate::protocol_control::{
        ProtocolControlMessage, ProtocolControlMessageType, SetPeerBandwidthLimitType,
    };

    #[test]
    fn set_chunk_size_masks_top_bit() {
        let message = ProtocolControlMessage::read_remaining_from(
            ProtocolControlMessageType::SetChunkSize,
            &[0x80, 0x00, 0x10, 0x00][..],
        )
        .unwrap();
        match message {
            ProtocolControlMessage::SetChunkSize(m) => assert_eq!(m.chunk_size, 4096),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn set_peer_bandwidth() {
        let message = ProtocolControlMessage::read_remaining_from(
            ProtocolControlMessageType::SetPeerBandwidth,
            &[0x00, 0x26, 0x25, 0xA0, 0x02][..],
        )
        .unwrap();
        match message {
            ProtocolControlMessage::SetPeerBandwidth(m) => {
                assert_eq!(m.size, 2_500_000);
                assert_eq!(m.limit_type, SetPeerBandwidthLimitType::Dynamic);
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn unknown_limit_type_is_rejected() {
        let result = ProtocolControlMessage::read_remaining_from(
            ProtocolControlMessageType::SetPeerBandwidth,
            &[0x00, 0x00, 0x10, 0x00, 0x07][..],
        );
        assert!(result.is_err());
    }
}
