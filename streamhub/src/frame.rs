use tokio_util::bytes::BytesMut;

/// One application-layer message handed off by a publishing session:
/// the timestamp after extended-timestamp folding, the publisher's message
/// stream id, and the payload exactly as carried on the wire.
#[derive(Debug, Clone)]
pub enum MediaMessage {
    Audio {
        timestamp: u32,
        stream_id: u32,
        payload: BytesMut,
    },
    Video {
        timestamp: u32,
        stream_id: u32,
        payload: BytesMut,
    },
    /// Stream metadata (e.g. `onMetaData`), undecoded.
    Meta {
        timestamp: u32,
        stream_id: u32,
        payload: BytesMut,
    },
    Aggregate {
        timestamp: u32,
        stream_id: u32,
        payload: BytesMut,
    },
}

impl MediaMessage {
    pub fn timestamp(&self) -> u32 {
        match self {
            MediaMessage::Audio { timestamp, .. }
            | MediaMessage::Video { timestamp, .. }
            | MediaMessage::Meta { timestamp, .. }
            | MediaMessage::Aggregate { timestamp, .. } => *timestamp,
        }
    }

    pub fn payload_len(&self) -> usize {
        match self {
            MediaMessage::Audio { payload, .. }
            | MediaMessage::Video { payload, .. }
            | MediaMessage::Meta { payload, .. }
            | MediaMessage::Aggregate { payload, .. } => payload.len(),
        }
    }
}
