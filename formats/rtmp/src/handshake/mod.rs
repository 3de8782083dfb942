pub mod consts;
pub mod errors;
pub mod reader;
pub mod server;
pub mod writer;

use consts::RTMP_HANDSHAKE_RANDOM_SIZE;

#[derive(Debug)]
pub struct C0S0Packet {
    pub version: Version,
}

pub struct C1S1Packet {
    /// The peer's epoch field: 4 opaque bytes the other side echoes back.
    pub time: u32,
    pub zeros: u32,
    pub random_bytes: [u8; RTMP_HANDSHAKE_RANDOM_SIZE],
}

pub struct C2S2Packet {
    pub time: u32,
    pub time2: u32,
    pub random_echo: [u8; RTMP_HANDSHAKE_RANDOM_SIZE],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
}

impl From<Version> for u8 {
    fn from(value: Version) -> Self {
        value as u8
    }
}

/// +-------------+                +-------------+
/// |    Client   | TCP/IP Network |    Server   |
/// +-------------+       |        +-------------+
///        |              |               |
///  Uninitialized        |         Uninitialized
///        |      C0      |               |
///        |------------->|        C0     |
///        |              |-------------->|
///        |              |        S0 S1  |
///  Version sent         |<--------------|
///        |      C1      |               |
///        |------------->|        S2     |
///        |              |<--------------|
///     Ack sent          |            Ack sent
///        |      C2      |               |
///        |------------->|               |
///   Handshake Done      |          Handshake Done
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeServerState {
    Uninitialized,
    VersionSent,
    AckSent,
    Done,
}

pub const RTMP_VERSION: Version = Version::V3;
