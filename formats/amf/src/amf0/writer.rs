use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use utils::traits::writer::WriteTo;

use crate::errors::{AmfWriteError, AmfWriteResult};

use super::{Value, amf0_marker};

impl<W: io::Write> WriteTo<W> for Value {
    type Error = AmfWriteError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        match self {
            Value::Number(n) => Self::write_number(writer, *n),
            Value::Boolean(b) => Self::write_boolean(writer, *b),
            Value::String(s) => Self::write_string(writer, s),
            Value::Object { entries } => Self::write_anonymous_object(writer, entries),
            Value::Null => Self::write_null(writer),
            Value::Undefined => Self::write_undefined(writer),
            Value::ECMAArray(entries) => Self::write_ecma_array(writer, entries),
            Value::StrictArray(values) => Self::write_strict_array(writer, values),
            Value::Date { millis, time_zone } => Self::write_date(writer, *millis, *time_zone),
            Value::ObjectEnd => Self::write_object_end(writer),
        }
    }
}

/// A thin sequential writer mirroring the reader: encodes values one after
/// another into the underlying sink.
#[derive(Debug)]
pub struct Writer<W> {
    inner: W,
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, value: &Value) -> AmfWriteResult {
        value.write_to(&mut self.inner)
    }
}

impl Value {
    pub fn write_number<W: io::Write>(writer: &mut W, v: f64) -> AmfWriteResult {
        writer.write_u8(amf0_marker::NUMBER)?;
        writer.write_f64::<BigEndian>(v)?;
        Ok(())
    }

    pub fn write_boolean<W: io::Write>(writer: &mut W, v: bool) -> AmfWriteResult {
        writer.write_u8(amf0_marker::BOOLEAN)?;
        writer.write_u8(v as u8)?;
        Ok(())
    }

    fn write_short_string_inner<W: io::Write>(writer: &mut W, v: &str) -> AmfWriteResult {
        if v.len() > 0xFFFF {
            return Err(AmfWriteError::StringTooLong { length: v.len() });
        }
        writer.write_u16::<BigEndian>(v.len() as u16)?;
        writer.write_all(v.as_bytes())?;
        Ok(())
    }

    fn write_long_string_inner<W: io::Write>(writer: &mut W, v: &str) -> AmfWriteResult {
        if v.len() > 0xFFFF_FFFF {
            return Err(AmfWriteError::StringTooLong { length: v.len() });
        }
        writer.write_u32::<BigEndian>(v.len() as u32)?;
        writer.write_all(v.as_bytes())?;
        Ok(())
    }

    pub fn write_string<W: io::Write>(writer: &mut W, v: &str) -> AmfWriteResult {
        if v.len() <= 0xFFFF {
            writer.write_u8(amf0_marker::STRING)?;
            Self::write_short_string_inner(writer, v)?;
        } else {
            writer.write_u8(amf0_marker::LONG_STRING)?;
            Self::write_long_string_inner(writer, v)?;
        }
        Ok(())
    }

    fn write_pairs_inner<W: io::Write>(
        writer: &mut W,
        entries: &[(String, Value)],
    ) -> AmfWriteResult {
        for (key, value) in entries {
            Self::write_short_string_inner(writer, key)?;
            value.write_to(writer)?;
        }
        writer.write_u16::<BigEndian>(0)?;
        writer.write_u8(amf0_marker::OBJECT_END)?;
        Ok(())
    }

    pub fn write_anonymous_object<W: io::Write>(
        writer: &mut W,
        entries: &[(String, Value)],
    ) -> AmfWriteResult {
        writer.write_u8(amf0_marker::OBJECT)?;
        Self::write_pairs_inner(writer, entries)?;
        Ok(())
    }

    pub fn write_null<W: io::Write>(writer: &mut W) -> AmfWriteResult {
        writer.write_u8(amf0_marker::NULL)?;
        Ok(())
    }

    pub fn write_undefined<W: io::Write>(writer: &mut W) -> AmfWriteResult {
        writer.write_u8(amf0_marker::UNDEFINED)?;
        Ok(())
    }

    pub fn write_ecma_array<W: io::Write>(
        writer: &mut W,
        entries: &[(String, Value)],
    ) -> AmfWriteResult {
        if entries.len() > 0xFFFF_FFFF {
            return Err(AmfWriteError::ArrayTooLong {
                length: entries.len(),
            });
        }
        writer.write_u8(amf0_marker::ECMA_ARRAY)?;
        writer.write_u32::<BigEndian>(entries.len() as u32)?;
        Self::write_pairs_inner(writer, entries)?;
        Ok(())
    }

    pub fn write_strict_array<W: io::Write>(writer: &mut W, values: &[Value]) -> AmfWriteResult {
        if values.len() > 0xFFFF_FFFF {
            return Err(AmfWriteError::ArrayTooLong {
                length: values.len(),
            });
        }
        writer.write_u8(amf0_marker::STRICT_ARRAY)?;
        writer.write_u32::<BigEndian>(values.len() as u32)?;
        for v in values {
            v.write_to(writer)?;
        }
        Ok(())
    }

    pub fn write_date<W: io::Write>(writer: &mut W, millis: f64, time_zone: i16) -> AmfWriteResult {
        writer.write_u8(amf0_marker::DATE)?;
        writer.write_f64::<BigEndian>(millis)?;
        writer.write_i16::<BigEndian>(time_zone)?;
        Ok(())
    }

    fn write_object_end<W: io::Write>(writer: &mut W) -> AmfWriteResult {
        writer.write_u8(amf0_marker::OBJECT_END)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use utils::traits::writer::WriteTo;

    use crate::amf0::{Reader, Value};

    macro_rules! encode {
        ($value:expr) => {{
            let mut buf = Vec::new();
            ($value).write_to(&mut buf).unwrap();
            buf
        }};
    }

    macro_rules! assert_round_trip {
        ($value:expr) => {{
            let value = $value;
            let encoded = encode!(&value);
            let decoded = Reader::new(&encoded[..]).read().unwrap().unwrap();
            assert_eq!(decoded, value);
        }};
    }

    #[test]
    fn number() {
        assert_eq!(
            encode!(&Value::Number(3.5)),
            vec![0x00, 0x40, 0x0C, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn boolean() {
        assert_eq!(encode!(&Value::Boolean(true)), vec![0x01, 0x01]);
        assert_eq!(encode!(&Value::Boolean(false)), vec![0x01, 0x00]);
    }

    #[test]
    fn string_selects_long_form_by_length() {
        assert_eq!(
            encode!(&Value::String("live".to_string())),
            vec![0x02, 0x00, 0x04, b'l', b'i', b'v', b'e']
        );
        let long = "x".repeat(0x1_0000);
        let encoded = encode!(&Value::String(long));
        assert_eq!(encoded[0], 0x0C);
        assert_eq!(&encoded[1..5], &[0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn object_encodes_entries_in_order() {
        let object = Value::object(vec![
            ("fmsVer", Value::from("FMS/3,0,1,123")),
            ("capabilities", Value::Number(31.0)),
            ("mode", Value::Number(1.0)),
        ]);
        let encoded = encode!(&object);
        // key order on the wire matches insertion order
        let fms = encoded
            .windows(6)
            .position(|w| w == b"fmsVer")
            .expect("fmsVer key missing");
        let caps = encoded
            .windows(12)
            .position(|w| w == b"capabilities")
            .expect("capabilities key missing");
        let mode = encoded
            .windows(4)
            .position(|w| w == b"mode")
            .expect("mode key missing");
        assert!(fms < caps && caps < mode);
        assert_eq!(&encoded[encoded.len() - 3..], &[0x00, 0x00, 0x09]);
    }

    #[test]
    fn round_trip() {
        assert_round_trip!(Value::Number(0.0));
        assert_round_trip!(Value::Number(-0.0));
        assert_round_trip!(Value::Number(f64::INFINITY));
        assert_round_trip!(Value::Number(1e-300));
        assert_round_trip!(Value::Boolean(true));
        assert_round_trip!(Value::String("".to_string()));
        assert_round_trip!(Value::String("ストリーム".to_string()));
        assert_round_trip!(Value::Null);
        assert_round_trip!(Value::Undefined);
        assert_round_trip!(Value::Date {
            millis: 1_590_796_800_000.0,
            time_zone: 0
        });
        assert_round_trip!(Value::StrictArray(vec![
            Value::Number(1.0),
            Value::String("2".to_string()),
            Value::Null,
        ]));
        assert_round_trip!(Value::ECMAArray(vec![
            ("c".to_string(), Value::String("d".to_string())),
            ("a".to_string(), Value::String("b".to_string())),
        ]));
        assert_round_trip!(Value::object(vec![
            ("app", Value::from("live")),
            ("tcUrl", Value::from("rtmp://h/live")),
            (
                "nested",
                Value::object(vec![("objectEncoding", Value::Number(0.0))]),
            ),
        ]));
    }

    #[test]
    fn number_round_trip_is_bit_exact() {
        for v in [1.5, -7.25, 2f64.powi(-40), 123_456_789.000_001] {
            let encoded = encode!(&Value::Number(v));
            match Reader::new(&encoded[..]).read().unwrap().unwrap() {
                Value::Number(decoded) => assert_eq!(decoded.to_bits(), v.to_bits()),
                other => panic!("expected a number, got {:?}", other),
            }
        }
    }
}
