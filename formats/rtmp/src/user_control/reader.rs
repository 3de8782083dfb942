use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use utils::traits::reader::ReadFrom;

use crate::chunk::errors::{ChunkMessageError, ChunkMessageResult};

use super::{UserControlEvent, UserControlEventType};

impl<R: io::Read> ReadFrom<R> for UserControlEvent {
    type Error = ChunkMessageError;
    fn read_from(reader: R) -> Result<Self, Self::Error> {
        Reader::new(reader).read()
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

    pub fn read(&mut self) -> ChunkMessageResult<UserControlEvent> {
        let event_type = self.inner.read_u16::<BigEndian>()?;
        let event_type: UserControlEventType = event_type.try_into()?;
        match event_type {
            UserControlEventType::StreamBegin => Ok(UserControlEvent::StreamBegin {
                stream_id: self.inner.read_u32::<BigEndian>()?,
            }),
            UserControlEventType::StreamEOF => Ok(UserControlEvent::StreamEOF {
                stream_id: self.inner.read_u32::<BigEndian>()?,
            }),
            UserControlEventType::StreamDry => Ok(UserControlEvent::StreamDry {
                stream_id: self.inner.read_u32::<BigEndian>()?,
            }),
            UserControlEventType::SetBufferLength => Ok(UserControlEvent::SetBufferLength {
                stream_id: self.inner.read_u32::<BigEndian>()?,
                buffer_length: self.inner.read_u32::<BigEndian>()?,
            }),
            UserControlEventType::StreamIsRecorded => Ok(UserControlEvent::StreamIsRecorded {
                stream_id: self.inner.read_u32::<BigEndian>()?,
            }),
            UserControlEventType::PingRequest => Ok(UserControlEvent::PingRequest {
                timestamp: self.inner.read_u32::<BigEndian>()?,
            }),
            UserControlEventType::PingResponse => Ok(UserControlEvent::PingResponse {
                timestamp: self.inner.read_u32::<BigEndian>()?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use utils::traits::reader::ReadFrom;

    use crate::user_control::UserControlEvent;

    #[test]
    fn ping_request() {
        let event =
            UserControlEvent::read_from(&[0x00, 0x06, 0x12, 0x34, 0x56, 0x78][..]).unwrap();
        assert_eq!(
            event,
            UserControlEvent::PingRequest {
                timestamp: 0x1234_5678
            }
        );
    }

    #[test]
    fn set_buffer_length() {
        let event = UserControlEvent::read_from(
            &[0x00, 0x03, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x03, 0xE8][..],
        )
        .unwrap();
        assert_eq!(
            event,
            UserControlEvent::SetBufferLength {
                stream_id: 1,
                buffer_length: 1000
            }
        );
    }

    #[test]
    fn unknown_event_type() {
        assert!(UserControlEvent::read_from(&[0x00, 0x05, 0x00, 0x00, 0x00, 0x00][..]).is_err());
    }
}
