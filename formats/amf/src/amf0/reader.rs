use std::io;

use byteorder::{BigEndian, ReadBytesExt};

use crate::errors::{AmfReadError, AmfReadResult};

use super::{Value, amf0_marker};

/// Maps mid-value EOF to the dedicated truncation error. EOF before a
/// marker byte is a clean end of input and is handled in `read`.
fn eof_as_truncated(err: io::Error) -> AmfReadError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        AmfReadError::Truncated
    } else {
        AmfReadError::Io(err)
    }
}

#[derive(Debug)]
pub struct Reader<R> {
    inner: R,
    strict: bool,
}

impl<R> Reader<R> {
    pub fn into_inner(self) -> R {
        self.inner
    }

    pub fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

impl<R> Reader<R>
where
    R: io::Read,
{
    /// Lenient reader: markers this engine does not interpret decode to
    /// Null (with a resync attempt where the wire format allows one).
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            strict: false,
        }
    }

    pub fn strict(inner: R) -> Self {
        Self {
            inner,
            strict: true,
        }
    }

    /// Reads one value. `Ok(None)` means the input ended cleanly before a
    /// marker byte; truncation inside a value is an error.
    pub fn read(&mut self) -> AmfReadResult<Option<Value>> {
        let marker = match self.inner.read_u8() {
            Ok(marker) => marker,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value = match marker {
            amf0_marker::NUMBER => self.read_number(),
            amf0_marker::BOOLEAN => self.read_boolean(),
            amf0_marker::STRING => self.read_string(),
            amf0_marker::OBJECT => self.read_anonymous_object(),
            amf0_marker::NULL => Ok(Value::Null),
            amf0_marker::UNDEFINED => Ok(Value::Undefined),
            amf0_marker::ECMA_ARRAY => self.read_ecma_array(),
            amf0_marker::OBJECT_END => Ok(Value::ObjectEnd),
            amf0_marker::STRICT_ARRAY => self.read_strict_array(),
            amf0_marker::DATE => self.read_date(),
            amf0_marker::LONG_STRING => self.read_long_string(),
            amf0_marker::MOVIECLIP
            | amf0_marker::REFERENCE
            | amf0_marker::UNSUPPORTED
            | amf0_marker::RECORDSET
            | amf0_marker::XML_DOCUMENT
            | amf0_marker::TYPED_OBJECT
            | amf0_marker::AVMPLUS_OBJECT => self.read_uninterpreted(marker),
            _ => Err(AmfReadError::Unknown { marker }),
        };
        value.map(Some)
    }

    /// Reads until clean EOF. In lenient mode a decode failure ends the
    /// sequence and the values decoded so far are returned.
    pub fn read_all(&mut self) -> AmfReadResult<Vec<Value>> {
        let mut result = Vec::new();
        loop {
            match self.read() {
                Ok(Some(value)) => result.push(value),
                Ok(None) => break,
                Err(err) if !self.strict => {
                    tracing::warn!(
                        "amf0 decode failed after {} values, returning what we have: {}",
                        result.len(),
                        err
                    );
                    break;
                }
                Err(err) => return Err(err),
            }
        }
        Ok(result)
    }

    fn read_number(&mut self) -> AmfReadResult<Value> {
        let number = self
            .inner
            .read_f64::<BigEndian>()
            .map_err(eof_as_truncated)?;
        Ok(Value::Number(number))
    }

    fn read_boolean(&mut self) -> AmfReadResult<Value> {
        let byte = self.inner.read_u8().map_err(eof_as_truncated)?;
        Ok(Value::Boolean(byte != 0))
    }

    fn read_utf8_inner(&mut self, len: usize) -> AmfReadResult<String> {
        let mut buffer = vec![0; len];
        self.inner
            .read_exact(&mut buffer)
            .map_err(eof_as_truncated)?;
        let result = String::from_utf8(buffer)?;
        Ok(result)
    }

    fn read_string(&mut self) -> AmfReadResult<Value> {
        let len = self
            .inner
            .read_u16::<BigEndian>()
            .map_err(eof_as_truncated)?;
        self.read_utf8_inner(len as usize).map(Value::String)
    }

    fn read_long_string(&mut self) -> AmfReadResult<Value> {
        let len = self
            .inner
            .read_u32::<BigEndian>()
            .map_err(eof_as_truncated)?;
        self.read_utf8_inner(len as usize).map(Value::String)
    }

    fn read_key_value_pairs_inner(&mut self) -> AmfReadResult<Vec<(String, Value)>> {
        let mut result: Vec<(String, Value)> = Vec::new();
        loop {
            let len = self
                .inner
                .read_u16::<BigEndian>()
                .map_err(eof_as_truncated)?;
            let key = self.read_utf8_inner(len as usize)?;
            match self.read()? {
                Some(Value::ObjectEnd) if key.is_empty() => break,
                Some(value) => result.push((key, value)),
                None => return Err(AmfReadError::Truncated),
            }
        }
        Ok(result)
    }

    fn read_anonymous_object(&mut self) -> AmfReadResult<Value> {
        let entries = self.read_key_value_pairs_inner()?;
        Ok(Value::Object { entries })
    }

    fn read_ecma_array(&mut self) -> AmfReadResult<Value> {
        // the associative count is advisory, the terminator is authoritative
        let _count = self
            .inner
            .read_u32::<BigEndian>()
            .map_err(eof_as_truncated)?;
        let entries = self.read_key_value_pairs_inner()?;
        Ok(Value::ECMAArray(entries))
    }

    fn read_strict_array(&mut self) -> AmfReadResult<Value> {
        let len = self
            .inner
            .read_u32::<BigEndian>()
            .map_err(eof_as_truncated)? as usize;
        let values = (0..len)
            .map(|_| match self.read() {
                Ok(Some(value)) => Ok(value),
                Ok(None) => Err(AmfReadError::Truncated),
                Err(err) => Err(err),
            })
            .collect::<AmfReadResult<_>>()?;
        Ok(Value::StrictArray(values))
    }

    fn read_date(&mut self) -> AmfReadResult<Value> {
        let millis = self
            .inner
            .read_f64::<BigEndian>()
            .map_err(eof_as_truncated)?;
        // the time zone field is reserved and ignored
        let time_zone = self
            .inner
            .read_i16::<BigEndian>()
            .map_err(eof_as_truncated)?;
        Ok(Value::Date { millis, time_zone })
    }

    /// Markers this engine never interprets: Movieclip, Reference,
    /// Recordset, XML-Document, Typed-Object, AVMPlus. In strict mode they
    /// are errors; otherwise they decode to Null, skipping the payload
    /// where the wire format makes that possible.
    fn read_uninterpreted(&mut self, marker: u8) -> AmfReadResult<Value> {
        if self.strict {
            return Err(AmfReadError::Unsupported { marker });
        }
        tracing::warn!("uninterpreted amf0 marker {:#04x}, decoding as null", marker);
        match marker {
            amf0_marker::REFERENCE => {
                let _index = self
                    .inner
                    .read_u16::<BigEndian>()
                    .map_err(eof_as_truncated)?;
            }
            amf0_marker::XML_DOCUMENT => {
                let len = self
                    .inner
                    .read_u32::<BigEndian>()
                    .map_err(eof_as_truncated)?;
                let _body = self.read_utf8_inner(len as usize)?;
            }
            amf0_marker::TYPED_OBJECT => {
                let len = self
                    .inner
                    .read_u16::<BigEndian>()
                    .map_err(eof_as_truncated)?;
                let _class_name = self.read_utf8_inner(len as usize)?;
                let _entries = self.read_key_value_pairs_inner()?;
            }
            // no payload rule to resync by
            _ => {}
        }
        Ok(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use crate::{amf0::Value, amf0::amf0_marker, errors::AmfReadError};

    use super::Reader;

    macro_rules! decode {
        ($bytes:expr) => {{
            let data: &[u8] = $bytes;
            Reader::new(data).read()
        }};
    }

    macro_rules! decode_strict {
        ($bytes:expr) => {{
            let data: &[u8] = $bytes;
            Reader::strict(data).read()
        }};
    }

    #[test]
    fn number() {
        assert_eq!(
            decode!(&[0x00, 0x40, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
                .unwrap()
                .unwrap(),
            Value::Number(3.5)
        );
        assert_ne!(
            decode!(&[0x00, 0x40, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
                .unwrap()
                .unwrap(),
            Value::Number(1.)
        );
    }

    #[test]
    fn number_truncated() {
        assert!(matches!(
            decode!(&[0x00, 0x40, 0x0C]),
            Err(AmfReadError::Truncated)
        ));
    }

    #[test]
    fn boolean() {
        assert_eq!(
            decode!(&[0x01, 0x01]).unwrap().unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            decode!(&[0x01, 0x00]).unwrap().unwrap(),
            Value::Boolean(false)
        );
        assert!(matches!(decode!(&[0x01]), Err(AmfReadError::Truncated)));
    }

    #[test]
    fn string() {
        assert_eq!(
            decode!(&[0x02, 0x00, 0x04, b'l', b'i', b'v', b'e'])
                .unwrap()
                .unwrap(),
            Value::String("live".to_string())
        );
        assert!(matches!(
            decode!(&[0x02, 0x00, 0x04, b'l', b'i']),
            Err(AmfReadError::Truncated)
        ));
    }

    #[test]
    fn long_string() {
        let body = "a".repeat(0x1_0003);
        let mut bytes = vec![0x0C, 0x00, 0x01, 0x00, 0x03];
        bytes.extend_from_slice(body.as_bytes());
        assert_eq!(decode!(&bytes).unwrap().unwrap(), Value::String(body));
    }

    #[test]
    fn object_preserves_order() {
        // {app: "live", flag: false}
        let bytes = [
            0x03, 0x00, 0x03, b'a', b'p', b'p', 0x02, 0x00, 0x04, b'l', b'i', b'v', b'e', 0x00,
            0x04, b'f', b'l', b'a', b'g', 0x01, 0x00, 0x00, 0x00, 0x09,
        ];
        assert_eq!(
            decode!(&bytes).unwrap().unwrap(),
            Value::Object {
                entries: vec![
                    ("app".to_string(), Value::String("live".to_string())),
                    ("flag".to_string(), Value::Boolean(false)),
                ]
            }
        );
    }

    #[test]
    fn object_truncated() {
        let bytes = [0x03, 0x00, 0x03, b'a', b'p', b'p', 0x02, 0x00, 0x04, b'l'];
        assert!(matches!(decode!(&bytes), Err(AmfReadError::Truncated)));
    }

    #[test]
    fn ecma_array_count_is_advisory() {
        // count says 7, terminator after one pair wins
        let bytes = [
            0x08, 0x00, 0x00, 0x00, 0x07, 0x00, 0x01, b'a', 0x02, 0x00, 0x01, b'b', 0x00, 0x00,
            0x09,
        ];
        assert_eq!(
            decode!(&bytes).unwrap().unwrap(),
            Value::ECMAArray(vec![("a".to_string(), Value::String("b".to_string()))])
        );
    }

    #[test]
    fn strict_array() {
        let bytes = [
            0x0A, 0x00, 0x00, 0x00, 0x02, 0x00, 0x3F, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x05,
        ];
        assert_eq!(
            decode!(&bytes).unwrap().unwrap(),
            Value::StrictArray(vec![Value::Number(1.0), Value::Null])
        );
    }

    #[test]
    fn null_and_undefined() {
        assert_eq!(decode!(&[0x05]).unwrap().unwrap(), Value::Null);
        assert_eq!(decode!(&[0x06]).unwrap().unwrap(), Value::Undefined);
    }

    #[test]
    fn date_time_zone_ignored() {
        let bytes = [
            0x0B, 0x42, 0x77, 0x26, 0x2E, 0x0D, 0x00, 0x00, 0x00, 0xFF, 0x88,
        ];
        assert_eq!(
            decode!(&bytes).unwrap().unwrap(),
            Value::Date {
                millis: 1_590_796_800_000.0,
                time_zone: -120,
            }
        );
    }

    #[test]
    fn empty_input() {
        assert!(decode!(&[]).unwrap().is_none());
    }

    #[test]
    fn unknown_marker() {
        assert!(matches!(
            decode!(&[0x42]),
            Err(AmfReadError::Unknown { marker: 0x42 })
        ));
    }

    #[test]
    fn uninterpreted_markers_decode_to_null() {
        // reference payload is skipped so the next value still decodes
        let mut reader = Reader::new(&[0x07, 0x00, 0x01, 0x05][..]);
        assert_eq!(reader.read().unwrap().unwrap(), Value::Null);
        assert_eq!(reader.read().unwrap().unwrap(), Value::Null);

        assert_eq!(
            decode!(&[amf0_marker::MOVIECLIP]).unwrap().unwrap(),
            Value::Null
        );
    }

    #[test]
    fn strict_mode_rejects_uninterpreted_markers() {
        assert!(matches!(
            decode_strict!(&[amf0_marker::MOVIECLIP]),
            Err(AmfReadError::Unsupported { marker: 0x04 })
        ));
        assert!(matches!(
            decode_strict!(&[amf0_marker::RECORDSET]),
            Err(AmfReadError::Unsupported { marker: 0x0E })
        ));
    }

    #[test]
    fn read_all_returns_decoded_prefix_on_error() {
        // a number followed by garbage: lenient read_all keeps the number
        let bytes = [
            0x00, 0x3F, 0xF0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x42, 0x42,
        ];
        let values = Reader::new(&bytes[..]).read_all().unwrap();
        assert_eq!(values, vec![Value::Number(1.0)]);
    }
}
