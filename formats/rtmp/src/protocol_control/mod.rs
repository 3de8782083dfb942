use crate::chunk::errors::ChunkMessageError;

pub mod consts;
pub mod reader;
pub mod writer;

///! @see: 5.4.1. Set Chunk Size (1)
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |0|                     chunk size (31 bits)                    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, Copy)]
pub struct SetChunkSize {
    pub chunk_size: u32,
}

///! @see: 5.4.2. Abort Message (2)
#[derive(Debug, Clone, Copy)]
pub struct AbortMessage {
    pub chunk_stream_id: u32,
}

///! @see: 5.4.3. Acknowledgement (3)
#[derive(Debug, Clone, Copy)]
pub struct Acknowledgement {
    pub sequence_number: u32,
}

///! @see: 5.4.4. Window Acknowledgement Size (5)
#[derive(Debug, Clone, Copy)]
pub struct WindowAckSize {
    pub size: u32,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy)]
pub enum ProtocolControlMessageType {
    SetChunkSize = 1,
    Abort = 2,
    Acknowledgement = 3,
    WindowAckSize = 5,
    SetPeerBandwidth = 6,
}

impl From<ProtocolControlMessageType> for u8 {
    fn from(value: ProtocolControlMessageType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for ProtocolControlMessageType {
    type Error = ChunkMessageError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ProtocolControlMessageType::SetChunkSize),
            2 => Ok(ProtocolControlMessageType::Abort),
            3 => Ok(ProtocolControlMessageType::Acknowledgement),
            5 => Ok(ProtocolControlMessageType::WindowAckSize),
            6 => Ok(ProtocolControlMessageType::SetPeerBandwidth),
            _ => Err(ChunkMessageError::UnknownMessageType(value)),
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetPeerBandwidthLimitType {
    /// The peer SHOULD limit its output bandwidth to the indicated window.
    Hard = 0,
    /// The peer SHOULD limit its output bandwidth to this window or the
    /// limit already in effect, whichever is smaller.
    Soft = 1,
    /// Hard if the previous limit was Hard, otherwise ignored.
    Dynamic = 2,
}

impl From<SetPeerBandwidthLimitType> for u8 {
    fn from(value: SetPeerBandwidthLimitType) -> Self {
        value as u8
    }
}

impl TryFrom<u8> for SetPeerBandwidthLimitType {
    type Error = ChunkMessageError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SetPeerBandwidthLimitType::Hard),
            1 => Ok(SetPeerBandwidthLimitType::Soft),
            2 => Ok(SetPeerBandwidthLimitType::Dynamic),
            _ => Err(ChunkMessageError::InvalidMessage(format!(
                "unknown set peer bandwidth limit type: {}",
                value
            ))),
        }
    }
}

///! @see: 5.4.5. Set Peer Bandwidth (6)
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                  Acknowledgement Window size                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Limit Type   |
/// +-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, Copy)]
pub struct SetPeerBandwidth {
    pub size: u32,
    pub limit_type: SetPeerBandwidthLimitType,
}

#[derive(Debug)]
pub enum ProtocolControlMessage {
    SetChunkSize(SetChunkSize),
    Abort(AbortMessage),
    Ack(Acknowledgement),
    WindowAckSize(WindowAckSize),
    SetPeerBandwidth(SetPeerBandwidth),
}
