use std::io;

use byteorder::{BigEndian, ReadBytesExt};

use super::{
    C0S0Packet, C1S1Packet, C2S2Packet, Version,
    consts::RTMP_HANDSHAKE_RANDOM_SIZE,
    errors::{HandshakeError, HandshakeResult},
};

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

    pub fn read_c0s0(&mut self) -> HandshakeResult<C0S0Packet> {
        let version = self.inner.read_u8()?;
        let version = match version {
            0 => Version::V0,
            1 => Version::V1,
            2 => Version::V2,
            3 => Version::V3,
            _ => return Err(HandshakeError::BadVersion(version)),
        };
        Ok(C0S0Packet { version })
    }

    pub fn read_c1s1(&mut self) -> HandshakeResult<C1S1Packet> {
        let time = self.inner.read_u32::<BigEndian>()?;
        let zeros = self.inner.read_u32::<BigEndian>()?;
        let mut buf = [0; RTMP_HANDSHAKE_RANDOM_SIZE];
        self.inner.read_exact(&mut buf)?;
        Ok(C1S1Packet {
            time,
            zeros,
            random_bytes: buf,
        })
    }

    pub fn read_c2s2(&mut self) -> HandshakeResult<C2S2Packet> {
        let time = self.inner.read_u32::<BigEndian>()?;
        let time2 = self.inner.read_u32::<BigEndian>()?;
        let mut buf = [0; RTMP_HANDSHAKE_RANDOM_SIZE];
        self.inner.read_exact(&mut buf)?;
        Ok(C2S2Packet {
            time,
            time2,
            random_echo: buf,
        })
    }
}
