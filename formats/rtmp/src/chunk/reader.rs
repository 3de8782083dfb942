use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::{
    cmp::min,
    collections::HashMap,
    io::{Cursor, Read},
};
use tokio_util::bytes::{Buf, BytesMut};
use utils::traits::reader::{ReadFrom, ReadRemainingFrom};

use crate::{
    message::RtmpUserMessageBody, protocol_control::ProtocolControlMessage,
    user_control::UserControlEvent,
};

use super::{
    ChunkBasicHeader, ChunkBasicHeaderType, ChunkMessage, ChunkMessageCommonHeader,
    ChunkMessageType, Csid, RtmpChunkMessageBody,
    consts::{DEFAULT_MAX_MESSAGE_SIZE, INIT_CHUNK_SIZE, MAX_TIMESTAMP},
    errors::{ChunkMessageError, ChunkMessageResult},
};

#[derive(Debug)]
struct ChunkPayload {
    payload: BytesMut,
    remaining_length: usize,
}

/// The per-chunk-stream memo: the last full header seen on a CSID, which
/// type 1/2/3 headers are decompressed against, plus the message under
/// reassembly.
#[derive(Debug, Default)]
struct ReadContext {
    timestamp: u64,
    timestamp_delta: u32,
    extended_timestamp_enabled: bool,
    message_length: u32,
    message_stream_id: u32,
    message_type_id: u8,
    incomplete: Option<ChunkPayload>,
}

/// One parsed message header, resolved against the chunk stream context but
/// not yet committed to it. Committing only happens once the chunk's
/// payload slice is known to be available, so a short read never corrupts
/// the context.
#[derive(Debug)]
struct ResolvedHeader {
    timestamp: u64,
    timestamp_delta: u32,
    extended_timestamp_enabled: bool,
    message_length: u32,
    message_stream_id: u32,
    message_type_id: u8,
    starts_new_message: bool,
}

#[derive(Debug)]
pub struct Reader {
    context: HashMap<Csid, ReadContext>,
    chunk_size: usize,
    max_message_size: u32,
    bytes_received: u64,
}

impl Reader {
    pub fn new() -> Self {
        Self {
            context: HashMap::new(),
            chunk_size: INIT_CHUNK_SIZE as usize,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            bytes_received: 0,
        }
    }

    pub fn with_max_message_size(max_message_size: u32) -> Self {
        Self {
            max_message_size,
            ..Self::new()
        }
    }

    /// Total bytes consumed since chunked mode began, headers included.
    /// This is the figure acknowledgement messages report.
    #[inline]
    pub fn get_bytes_received(&self) -> u64 {
        self.bytes_received
    }

    pub fn set_chunk_size(&mut self, size: usize) -> usize {
        let old_size = self.chunk_size;
        self.chunk_size = size;
        old_size
    }

    pub fn abort_chunk_stream(&mut self, csid: Csid) {
        if let Some(ctx) = self.context.get_mut(&csid) {
            ctx.incomplete = None;
        }
    }

    /// Reads one chunk from the buffer.
    ///
    /// - `Ok(Some(message))`: the chunk completed a message.
    /// - `Ok(None)`: not enough buffered bytes for a whole chunk; nothing
    ///   was consumed, read more from the socket and retry.
    /// - `Err(IncompleteChunk)`: a mid-message chunk was consumed; advance
    ///   past the cursor position and parse again.
    pub fn read(
        &mut self,
        reader: &mut Cursor<&BytesMut>,
    ) -> ChunkMessageResult<Option<ChunkMessage>> {
        let start = reader.position();

        let basic_header = match self.read_basic_header(reader)? {
            Some(header) => header,
            None => {
                reader.set_position(start);
                return Ok(None);
            }
        };
        let csid = basic_header.chunk_stream_id;
        let fmt = basic_header.fmt;

        if !self.context.contains_key(&csid) && fmt != 0 {
            return Err(ChunkMessageError::MissingContext { csid, fmt });
        }

        // Lenient recovery: a type 0 header opening a new message while one
        // is still being reassembled flushes the partial message downstream
        // first. The cursor is rolled back so the new chunk reparses clean.
        if fmt == 0 && self.has_partial(csid) {
            reader.set_position(start);
            return self.take_partial_message(csid).map(Some);
        }

        let resolved = match self.read_message_header(reader, csid, fmt)? {
            Some(resolved) => resolved,
            None => {
                reader.set_position(start);
                return Ok(None);
            }
        };

        if resolved.starts_new_message && resolved.message_length > self.max_message_size {
            return Err(ChunkMessageError::MessageTooLarge {
                length: resolved.message_length,
                max: self.max_message_size,
            });
        }

        let remaining_of_message = match self.context.get(&csid).and_then(|c| c.incomplete.as_ref())
        {
            Some(partial) => partial.remaining_length,
            None => resolved.message_length as usize,
        };
        let bytes_need = min(self.chunk_size, remaining_of_message);
        if reader.remaining() < bytes_need {
            reader.set_position(start);
            return Ok(None);
        }

        // the whole chunk is buffered, commit
        let context = self.context.entry(csid).or_default();
        context.timestamp = resolved.timestamp;
        context.timestamp_delta = resolved.timestamp_delta;
        context.extended_timestamp_enabled = resolved.extended_timestamp_enabled;
        context.message_length = resolved.message_length;
        context.message_stream_id = resolved.message_stream_id;
        context.message_type_id = resolved.message_type_id;

        let chunk = context.incomplete.get_or_insert_with(|| ChunkPayload {
            payload: BytesMut::with_capacity(resolved.message_length as usize),
            remaining_length: resolved.message_length as usize,
        });

        let mut bytes = vec![0; bytes_need];
        reader.read_exact(&mut bytes)?;
        chunk.payload.extend_from_slice(&bytes);
        chunk.remaining_length -= bytes_need;
        let complete = chunk.remaining_length == 0;

        self.bytes_received += reader.position() - start;

        if !complete {
            return Err(ChunkMessageError::IncompleteChunk);
        }

        let payload = context
            .incomplete
            .take()
            .expect("the accumulator was just filled")
            .payload;
        let common_header = ChunkMessageCommonHeader {
            basic_header,
            timestamp: context.timestamp as u32,
            message_length: context.message_length,
            message_type_id: context.message_type_id,
            message_stream_id: context.message_stream_id,
            extended_timestamp_enabled: context.extended_timestamp_enabled,
        };
        Self::parse_message_body(common_header, payload).map(Some)
    }

    fn has_partial(&self, csid: Csid) -> bool {
        self.context
            .get(&csid)
            .is_some_and(|c| c.incomplete.is_some())
    }

    fn take_partial_message(&mut self, csid: Csid) -> ChunkMessageResult<ChunkMessage> {
        let context = self
            .context
            .get_mut(&csid)
            .expect("has_partial was checked");
        let partial = context
            .incomplete
            .take()
            .expect("has_partial was checked");
        tracing::warn!(
            "type 0 header interrupts reassembly on csid {}, flushing {} of {} bytes",
            csid,
            partial.payload.len(),
            context.message_length
        );
        let common_header = ChunkMessageCommonHeader {
            basic_header: ChunkBasicHeader::new(0, csid)?,
            timestamp: context.timestamp as u32,
            message_length: partial.payload.len() as u32,
            message_type_id: context.message_type_id,
            message_stream_id: context.message_stream_id,
            extended_timestamp_enabled: context.extended_timestamp_enabled,
        };
        Self::parse_message_body(common_header, partial.payload)
    }

    fn parse_message_body(
        header: ChunkMessageCommonHeader,
        payload: BytesMut,
    ) -> ChunkMessageResult<ChunkMessage> {
        let body = match header.message_type_id.try_into()? {
            ChunkMessageType::ProtocolControl(message_type) => {
                RtmpChunkMessageBody::ProtocolControl(
                    ProtocolControlMessage::read_remaining_from(message_type, &payload[..])?,
                )
            }
            ChunkMessageType::UserControl => {
                RtmpChunkMessageBody::UserControl(UserControlEvent::read_from(&payload[..])?)
            }
            ChunkMessageType::RtmpUserMessage(_) => {
                RtmpChunkMessageBody::RtmpUserMessage(Box::new(
                    RtmpUserMessageBody::read_remaining_from(&header, payload.reader())?,
                ))
            }
        };
        Ok(ChunkMessage {
            header,
            chunk_message_body: body,
        })
    }

    fn read_basic_header(
        &mut self,
        reader: &mut Cursor<&BytesMut>,
    ) -> ChunkMessageResult<Option<ChunkBasicHeader>> {
        if !reader.has_remaining() {
            return Ok(None);
        }

        let first_byte = reader.read_u8()?;
        let fmt = (first_byte >> 6) & 0b11;
        let maybe_csid = (first_byte & 0b0011_1111) as Csid;
        match maybe_csid {
            0 => {
                if !reader.has_remaining() {
                    return Ok(None);
                }
                let csid = reader.read_u8()? as Csid + 64;
                Ok(Some(ChunkBasicHeader {
                    header_type: ChunkBasicHeaderType::Type2,
                    fmt,
                    chunk_stream_id: csid,
                }))
            }
            1 => {
                if reader.remaining() < 2 {
                    return Ok(None);
                }
                // the two extension bytes are little-endian
                let csid = reader.read_u8()? as Csid + reader.read_u8()? as Csid * 256 + 64;
                Ok(Some(ChunkBasicHeader {
                    header_type: ChunkBasicHeaderType::Type3,
                    fmt,
                    chunk_stream_id: csid,
                }))
            }
            csid => Ok(Some(ChunkBasicHeader {
                header_type: ChunkBasicHeaderType::Type1,
                fmt,
                chunk_stream_id: csid,
            })),
        }
    }

    /// Parses the fmt-specific message header and resolves every field
    /// against the saved context, without mutating it. Returns `None` when
    /// the buffer holds less than the full header.
    fn read_message_header(
        &mut self,
        reader: &mut Cursor<&BytesMut>,
        csid: Csid,
        fmt: u8,
    ) -> ChunkMessageResult<Option<ResolvedHeader>> {
        let context = self.context.get(&csid);
        let starts_new_message = context.is_none_or(|c| c.incomplete.is_none());

        match fmt {
            0 => {
                if reader.remaining() < 11 {
                    return Ok(None);
                }
                let mut timestamp = reader.read_u24::<BigEndian>()? as u64;
                let message_length = reader.read_u24::<BigEndian>()?;
                let message_type_id = reader.read_u8()?;
                let message_stream_id = reader.read_u32::<LittleEndian>()?;
                let extended = timestamp as u32 >= MAX_TIMESTAMP;
                if extended {
                    if reader.remaining() < 4 {
                        return Ok(None);
                    }
                    timestamp = reader.read_u32::<BigEndian>()? as u64;
                }
                Ok(Some(ResolvedHeader {
                    timestamp,
                    timestamp_delta: 0,
                    extended_timestamp_enabled: extended,
                    message_length,
                    message_stream_id,
                    message_type_id,
                    starts_new_message: true,
                }))
            }
            1 => {
                if reader.remaining() < 7 {
                    return Ok(None);
                }
                let mut delta = reader.read_u24::<BigEndian>()?;
                let message_length = reader.read_u24::<BigEndian>()?;
                let message_type_id = reader.read_u8()?;
                let extended = delta >= MAX_TIMESTAMP;
                if extended {
                    if reader.remaining() < 4 {
                        return Ok(None);
                    }
                    delta = reader.read_u32::<BigEndian>()?;
                }
                let context = context.expect("fmt 1 requires a context");
                if !starts_new_message {
                    tracing::warn!("type 1 header mid-message on csid {}, ignoring delta", csid);
                }
                Ok(Some(ResolvedHeader {
                    timestamp: if starts_new_message {
                        context.timestamp + delta as u64
                    } else {
                        context.timestamp
                    },
                    timestamp_delta: delta,
                    extended_timestamp_enabled: extended,
                    message_length,
                    message_stream_id: context.message_stream_id,
                    message_type_id,
                    starts_new_message,
                }))
            }
            2 => {
                if reader.remaining() < 3 {
                    return Ok(None);
                }
                let mut delta = reader.read_u24::<BigEndian>()?;
                let extended = delta >= MAX_TIMESTAMP;
                if extended {
                    if reader.remaining() < 4 {
                        return Ok(None);
                    }
                    delta = reader.read_u32::<BigEndian>()?;
                }
                let context = context.expect("fmt 2 requires a context");
                if !starts_new_message {
                    tracing::warn!("type 2 header mid-message on csid {}, ignoring delta", csid);
                }
                Ok(Some(ResolvedHeader {
                    timestamp: if starts_new_message {
                        context.timestamp + delta as u64
                    } else {
                        context.timestamp
                    },
                    timestamp_delta: delta,
                    extended_timestamp_enabled: extended,
                    message_length: context.message_length,
                    message_stream_id: context.message_stream_id,
                    message_type_id: context.message_type_id,
                    starts_new_message,
                }))
            }
            3 => {
                let context = context.expect("fmt 3 requires a context");
                // a type 3 chunk repeats the extended timestamp iff the
                // previous chunk on this csid carried one
                if context.extended_timestamp_enabled {
                    if reader.remaining() < 4 {
                        return Ok(None);
                    }
                    let _repeated = reader.read_u32::<BigEndian>()?;
                }
                Ok(Some(ResolvedHeader {
                    // a type 3 chunk opening a new message re-applies the
                    // previous delta; a continuation leaves time untouched
                    timestamp: if starts_new_message {
                        context.timestamp + context.timestamp_delta as u64
                    } else {
                        context.timestamp
                    },
                    timestamp_delta: context.timestamp_delta,
                    extended_timestamp_enabled: context.extended_timestamp_enabled,
                    message_length: context.message_length,
                    message_stream_id: context.message_stream_id,
                    message_type_id: context.message_type_id,
                    starts_new_message,
                }))
            }
            _ => Err(ChunkMessageError::UnexpectedFmt(fmt)),
        }
    }
}

impl Default for Reader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tokio_util::bytes::{Buf, BytesMut};

    use crate::chunk::{ChunkMessage, RtmpChunkMessageBody, errors::ChunkMessageError};
    use crate::message::RtmpUserMessageBody;

    use super::Reader;

    fn drain(reader: &mut Reader, buffer: &BytesMut) -> Vec<ChunkMessage> {
        let mut buffer = buffer.clone();
        let mut messages = Vec::new();
        loop {
            let mut cursor = Cursor::new(&buffer);
            match reader.read(&mut cursor) {
                Ok(Some(message)) => {
                    let consumed = cursor.position() as usize;
                    buffer.advance(consumed);
                    messages.push(message);
                }
                Ok(None) => break,
                Err(ChunkMessageError::IncompleteChunk) => {
                    let consumed = cursor.position() as usize;
                    buffer.advance(consumed);
                }
                Err(err) => panic!("chunk read failed: {:?}", err),
            }
        }
        messages
    }

    fn audio_payload(message: &ChunkMessage) -> &[u8] {
        match message.chunk_message_body {
            RtmpChunkMessageBody::RtmpUserMessage(ref body) => match body.as_ref() {
                RtmpUserMessageBody::Audio { payload } => &payload[..],
                other => panic!("expected audio, got {:?}", other),
            },
            ref other => panic!("expected a user message, got {:?}", other),
        }
    }

    #[test]
    fn single_chunk_message() {
        let mut bytes = BytesMut::new();
        // fmt 0, csid 4, timestamp 0, length 4, type 8 (audio), stream id 1
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0xAA, 0xBB, 0xCC, 0xDD]);

        let mut reader = Reader::new();
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].header.message_stream_id, 1);
        assert_eq!(messages[0].header.message_length, 4);
        assert_eq!(audio_payload(&messages[0]), &[0xAA, 0xBB, 0xCC, 0xDD]);
        // 12 header bytes + 4 payload bytes
        assert_eq!(reader.get_bytes_received(), 16);
    }

    #[test]
    fn short_buffer_consumes_nothing() {
        let mut bytes = BytesMut::new();
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0xAA, 0xBB]); // two payload bytes missing

        let mut reader = Reader::new();
        let mut cursor = Cursor::new(&bytes);
        assert!(reader.read(&mut cursor).unwrap().is_none());
        assert_eq!(cursor.position(), 0);
        assert_eq!(reader.get_bytes_received(), 0);

        // the remainder arrives, the same parse now succeeds
        bytes.extend_from_slice(&[0xCC, 0xDD]);
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages.len(), 1);
        assert_eq!(audio_payload(&messages[0]), &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn compressed_header_without_context_is_an_error() {
        let bytes = BytesMut::from(&[0x44u8, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x08][..]);
        let mut reader = Reader::new();
        let mut cursor = Cursor::new(&bytes);
        assert!(matches!(
            reader.read(&mut cursor),
            Err(ChunkMessageError::MissingContext { csid: 4, fmt: 1 })
        ));
    }

    #[test]
    fn emission_order_is_completion_order() {
        let mut bytes = BytesMut::new();
        // message A on csid 4: 256 bytes, split into two 128-byte chunks
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0x0A; 128]);
        // message B on csid 5 completes while A is still in flight
        bytes.extend_from_slice(&[
            0x05, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0x0B; 4]);
        // the rest of A
        bytes.extend_from_slice(&[0xC4]);
        bytes.extend_from_slice(&[0x0A; 128]);

        let mut reader = Reader::new();
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].header.basic_header.chunk_stream_id, 5);
        assert_eq!(audio_payload(&messages[0]), &[0x0B; 4][..]);
        assert_eq!(messages[1].header.basic_header.chunk_stream_id, 4);
        assert_eq!(audio_payload(&messages[1]), &[0x0A; 256][..]);
    }

    #[test]
    fn timestamp_deltas_accumulate() {
        let mut bytes = BytesMut::new();
        // fmt 0 at t=1000
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x03, 0xE8, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00, 0x61,
        ]);
        // fmt 1, delta 40
        bytes.extend_from_slice(&[0x44, 0x00, 0x00, 0x28, 0x00, 0x00, 0x01, 0x08, 0x62]);
        // fmt 2, delta 40
        bytes.extend_from_slice(&[0x84, 0x00, 0x00, 0x28, 0x63]);
        // fmt 3, inherits delta 40
        bytes.extend_from_slice(&[0xC4, 0x64]);

        let mut reader = Reader::new();
        let messages = drain(&mut reader, &bytes);
        let timestamps: Vec<u32> = messages.iter().map(|m| m.header.timestamp).collect();
        assert_eq!(timestamps, vec![1000, 1040, 1080, 1120]);
    }

    #[test]
    fn extended_timestamp() {
        let mut bytes = BytesMut::new();
        // fmt 0, 24-bit field saturated, real timestamp follows
        bytes.extend_from_slice(&[
            0x04, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]); // 16777216
        bytes.extend_from_slice(&[0x61]);

        let mut reader = Reader::new();
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].header.timestamp, 0x0100_0000);
    }

    #[test]
    fn fmt3_continuation_repeats_extended_timestamp() {
        let mut bytes = BytesMut::new();
        // 130-byte message with an extended timestamp: two chunks, the
        // second repeats the 4 extended bytes after its basic header
        bytes.extend_from_slice(&[
            0x04, 0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x82, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0x01, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0x0C; 128]);
        bytes.extend_from_slice(&[0xC4, 0x01, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0x0C; 2]);

        let mut reader = Reader::new();
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].header.timestamp, 0x0100_0000);
        assert_eq!(audio_payload(&messages[0]).len(), 130);
    }

    #[test]
    fn abort_discards_partial_message() {
        let mut bytes = BytesMut::new();
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0x0A; 128]);

        let mut reader = Reader::new();
        let mut cursor = Cursor::new(&bytes);
        assert!(matches!(
            reader.read(&mut cursor),
            Err(ChunkMessageError::IncompleteChunk)
        ));
        reader.abort_chunk_stream(4);

        // a fresh message on the same csid decodes on its own
        let mut bytes = BytesMut::new();
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02, 0x08, 0x01, 0x00, 0x00, 0x00, 0x61, 0x62,
        ]);
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages.len(), 1);
        assert_eq!(audio_payload(&messages[0]), b"ab");
    }

    #[test]
    fn fmt0_mid_message_flushes_the_partial() {
        let mut bytes = BytesMut::new();
        // 256-byte message, only the first 128 bytes ever arrive
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0x0A; 128]);
        // the publisher restarts with a fresh fmt 0 message
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        bytes.extend_from_slice(&[0x0B; 4]);

        let mut reader = Reader::new();
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].header.message_length, 128);
        assert_eq!(audio_payload(&messages[0]), &[0x0A; 128][..]);
        assert_eq!(audio_payload(&messages[1]), &[0x0B; 4][..]);
    }

    #[test]
    fn message_above_the_size_limit_is_rejected() {
        let mut bytes = BytesMut::new();
        bytes.extend_from_slice(&[
            0x04, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x08, 0x01, 0x00, 0x00, 0x00,
        ]);
        let mut reader = Reader::with_max_message_size(1024);
        let mut cursor = Cursor::new(&bytes);
        assert!(matches!(
            reader.read(&mut cursor),
            Err(ChunkMessageError::MessageTooLarge {
                length: 0xFF_FFFF,
                max: 1024
            })
        ));
    }

    #[test]
    fn two_byte_csid_form() {
        let mut bytes = BytesMut::new();
        // csid 0 in the basic header: next byte + 64 => csid 100
        bytes.extend_from_slice(&[
            0x00, 36, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00, 0x61,
        ]);
        let mut reader = Reader::new();
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages[0].header.basic_header.chunk_stream_id, 100);
    }

    #[test]
    fn three_byte_csid_form_is_little_endian() {
        let mut bytes = BytesMut::new();
        // csid 1: lo=0x2C, hi=0x01 => 0x2C + 0x01*256 + 64 = 364
        bytes.extend_from_slice(&[
            0x01, 0x2C, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x08, 0x01, 0x00, 0x00, 0x00,
            0x61,
        ]);
        let mut reader = Reader::new();
        let messages = drain(&mut reader, &bytes);
        assert_eq!(messages[0].header.basic_header.chunk_stream_id, 364);
    }
}
