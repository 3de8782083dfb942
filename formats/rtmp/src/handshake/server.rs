use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use utils::traits::writer::WriteTo;

use super::{
    C1S1Packet, C2S2Packet, HandshakeServerState, RTMP_VERSION,
    consts::{RTMP_HANDSHAKE_RANDOM_SIZE, RTMP_HANDSHAKE_SIZE},
    errors::{HandshakeError, HandshakeResult},
    reader::Reader,
};

/// Server side of the simple handshake. The digest variants some encoders
/// attempt degrade to this exchange, which validates:
/// - C0 carries version 3;
/// - C2 echoes the S1 this server sent (epoch, zero field and random
///   block), otherwise the connection is aborted.
///
/// S2 is built as `C1.time || C1.time || C1.random`, which lenient
/// publishers accept for both time fields.
#[derive(Debug)]
pub struct HandshakeServer<T> {
    io: T,
    state: HandshakeServerState,
    s1_time: u32,
    s1_random: [u8; RTMP_HANDSHAKE_RANDOM_SIZE],
}

impl<T> HandshakeServer<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(io: T) -> Self {
        Self {
            io,
            state: HandshakeServerState::Uninitialized,
            s1_time: 0,
            s1_random: [0; RTMP_HANDSHAKE_RANDOM_SIZE],
        }
    }

    pub async fn handshake(&mut self) -> HandshakeResult<()> {
        loop {
            tracing::debug!("handshake with state: {:?}", self.state);
            match self.state {
                HandshakeServerState::Uninitialized => {
                    self.read_c0().await?;
                    self.write_s0().await?;
                    self.write_s1().await?;
                    self.io.flush().await?;
                    self.state = HandshakeServerState::VersionSent;
                }
                HandshakeServerState::VersionSent => {
                    let c1 = self.read_c1().await?;
                    self.write_s2(&c1).await?;
                    self.io.flush().await?;
                    self.state = HandshakeServerState::AckSent;
                }
                HandshakeServerState::AckSent => {
                    self.read_c2().await?;
                    self.state = HandshakeServerState::Done;
                }
                HandshakeServerState::Done => break,
            }
        }
        Ok(())
    }

    async fn read_c0(&mut self) -> HandshakeResult<()> {
        let version = self.io.read_u8().await?;
        if version != RTMP_VERSION.into() {
            return Err(HandshakeError::BadVersion(version));
        }
        tracing::debug!("read c0, version {}", version);
        Ok(())
    }

    async fn write_s0(&mut self) -> HandshakeResult<()> {
        self.io.write_u8(RTMP_VERSION.into()).await?;
        tracing::debug!("s0 sent");
        Ok(())
    }

    async fn write_s1(&mut self) -> HandshakeResult<()> {
        self.s1_time = (utils::system::time::get_timestamp_ms()? & 0xFFFF_FFFF) as u32;
        utils::random::random_fill(&mut self.s1_random);

        let mut bytes = Vec::with_capacity(RTMP_HANDSHAKE_SIZE);
        C1S1Packet {
            time: self.s1_time,
            zeros: 0,
            random_bytes: self.s1_random,
        }
        .write_to(&mut bytes)?;
        self.io.write_all(&bytes).await?;
        tracing::debug!("s1 sent");
        Ok(())
    }

    async fn read_c1(&mut self) -> HandshakeResult<C1S1Packet> {
        let mut buf = [0_u8; RTMP_HANDSHAKE_SIZE];
        self.io.read_exact(&mut buf).await?;
        let c1 = Reader::new(&buf[..]).read_c1s1()?;
        if c1.zeros != 0 {
            tracing::warn!("c1 zero field is {:#x}, continuing anyway", c1.zeros);
        }
        tracing::debug!("read c1");
        Ok(c1)
    }

    async fn write_s2(&mut self, c1: &C1S1Packet) -> HandshakeResult<()> {
        let mut bytes = Vec::with_capacity(RTMP_HANDSHAKE_SIZE);
        C2S2Packet {
            time: c1.time,
            time2: c1.time,
            random_echo: c1.random_bytes,
        }
        .write_to(&mut bytes)?;
        self.io.write_all(&bytes).await?;
        tracing::debug!("s2 sent");
        Ok(())
    }

    async fn read_c2(&mut self) -> HandshakeResult<()> {
        let mut buf = [0_u8; RTMP_HANDSHAKE_SIZE];
        self.io.read_exact(&mut buf).await?;
        let c2 = Reader::new(&buf[..]).read_c2s2()?;
        if c2.time != self.s1_time || c2.time2 != 0 || c2.random_echo != self.s1_random {
            return Err(HandshakeError::EchoMismatch);
        }
        tracing::debug!("read c2, echo verified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use crate::handshake::{consts::RTMP_HANDSHAKE_SIZE, errors::HandshakeError};

    use super::HandshakeServer;

    #[tokio::test]
    async fn happy_path() {
        let (mut client, server_io) = tokio::io::duplex(64 * 1024);
        let server = tokio::spawn(async move {
            let mut server = HandshakeServer::new(server_io);
            server.handshake().await
        });

        // C0 + C1 with a zero epoch and a zero random block
        client.write_u8(3).await.unwrap();
        let c1 = [0u8; RTMP_HANDSHAKE_SIZE];
        client.write_all(&c1).await.unwrap();

        let mut s0 = [0u8; 1];
        client.read_exact(&mut s0).await.unwrap();
        assert_eq!(s0[0], 3);

        let mut s1 = [0u8; RTMP_HANDSHAKE_SIZE];
        client.read_exact(&mut s1).await.unwrap();
        assert_eq!(&s1[4..8], &[0, 0, 0, 0]);

        let mut s2 = [0u8; RTMP_HANDSHAKE_SIZE];
        client.read_exact(&mut s2).await.unwrap();
        // S2 echoes C1.time twice and C1's random block
        assert_eq!(&s2[0..4], &c1[0..4]);
        assert_eq!(&s2[4..8], &c1[0..4]);
        assert_eq!(&s2[8..], &c1[8..]);

        // C2 echoes S1: time, zeros, random block
        let mut c2 = [0u8; RTMP_HANDSHAKE_SIZE];
        c2[0..4].copy_from_slice(&s1[0..4]);
        c2[8..].copy_from_slice(&s1[8..]);
        client.write_all(&c2).await.unwrap();

        server.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn rejects_bad_version() {
        let (mut client, server_io) = tokio::io::duplex(64 * 1024);
        let server = tokio::spawn(async move {
            let mut server = HandshakeServer::new(server_io);
            server.handshake().await
        });

        client.write_u8(6).await.unwrap();
        assert!(matches!(
            server.await.unwrap(),
            Err(HandshakeError::BadVersion(6))
        ));
    }

    #[tokio::test]
    async fn rejects_bad_c2_echo() {
        let (mut client, server_io) = tokio::io::duplex(64 * 1024);
        let server = tokio::spawn(async move {
            let mut server = HandshakeServer::new(server_io);
            server.handshake().await
        });

        client.write_u8(3).await.unwrap();
        client.write_all(&[0u8; RTMP_HANDSHAKE_SIZE]).await.unwrap();

        let mut s0s1s2 = [0u8; 1 + 2 * RTMP_HANDSHAKE_SIZE];
        client.read_exact(&mut s0s1s2).await.unwrap();
        let s1 = &s0s1s2[1..1 + RTMP_HANDSHAKE_SIZE];

        let mut c2 = [0u8; RTMP_HANDSHAKE_SIZE];
        c2.copy_from_slice(s1);
        c2[0..4].copy_from_slice(&s1[0..4]);
        // corrupt one byte of the random echo
        c2[100] ^= 0xFF;
        client.write_all(&c2).await.unwrap();

        assert!(matches!(
            server.await.unwrap(),
            Err(HandshakeError::EchoMismatch)
        ));
    }
}
