//! AMF0 decoder

use std::borrow::Cow;
use std::io;

use byteorder::{BigEndian, ReadBytesExt};
use num_traits::FromPrimitive;

use crate::{Amf0Error, Amf0Marker, Amf0Object, Amf0Value};

/// AMF0 decoder.
///
/// Provides various functions to decode different types of AMF0 values from a
/// byte slice. Strings are borrowed from the input wherever possible.
#[derive(Debug, Clone)]
pub struct Amf0Decoder<'a> {
    cursor: io::Cursor<&'a [u8]>,
    next_marker: Option<Amf0Marker>,
}

impl<'a> Amf0Decoder<'a> {
    /// Create a new decoder over the given byte slice.
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            cursor: io::Cursor::new(buffer),
            next_marker: None,
        }
    }

    /// Check if there are remaining bytes to read.
    pub fn has_remaining(&self) -> bool {
        (self.cursor.position() as usize) < self.cursor.get_ref().len() || self.next_marker.is_some()
    }

    /// Decode a [`Amf0Value`] from the buffer.
    pub fn decode_value(&mut self) -> Result<Amf0Value<'a>, Amf0Error> {
        let marker = self.peek_marker()?;

        match marker {
            Amf0Marker::Boolean => self.decode_boolean().map(Into::into),
            Amf0Marker::Number | Amf0Marker::Date => self.decode_number().map(Into::into),
            Amf0Marker::String | Amf0Marker::LongString => self.decode_string().map(Amf0Value::String),
            Amf0Marker::Null | Amf0Marker::Undefined => self.decode_null().map(|()| Amf0Value::Null),
            Amf0Marker::Object => self.decode_object().map(Amf0Value::Object),
            Amf0Marker::EcmaArray => self.decode_ecma_array().map(Amf0Value::EcmaArray),
            _ => Err(Amf0Error::UnsupportedMarker(marker)),
        }
    }

    /// Decode all values from the buffer until the end.
    pub fn decode_all(&mut self) -> Result<Vec<Amf0Value<'a>>, Amf0Error> {
        let mut values = Vec::new();

        while self.has_remaining() {
            values.push(self.decode_value()?);
        }

        Ok(values)
    }

    /// Peek the next marker in the buffer without consuming it.
    pub fn peek_marker(&mut self) -> Result<Amf0Marker, Amf0Error> {
        let marker = self.read_marker()?;
        // Buffer the marker for the next read
        self.next_marker = Some(marker);

        Ok(marker)
    }

    fn read_marker(&mut self) -> Result<Amf0Marker, Amf0Error> {
        if let Some(marker) = self.next_marker.take() {
            return Ok(marker);
        }

        let marker = self.cursor.read_u8()?;
        Amf0Marker::from_u8(marker).ok_or(Amf0Error::UnknownMarker(marker))
    }

    fn expect_marker(&mut self, expect: &'static [Amf0Marker]) -> Result<Amf0Marker, Amf0Error> {
        let marker = self.read_marker()?;

        if !expect.contains(&marker) {
            // Buffer the marker back so the caller can retry with the right
            // type.
            self.next_marker = Some(marker);
            Err(Amf0Error::UnexpectedType {
                expected: expect,
                got: marker,
            })
        } else {
            Ok(marker)
        }
    }

    /// Decode a number from the buffer.
    pub fn decode_number(&mut self) -> Result<f64, Amf0Error> {
        let marker = self.expect_marker(&[Amf0Marker::Number, Amf0Marker::Date])?;

        let number = self.cursor.read_f64::<BigEndian>()?;

        if marker == Amf0Marker::Date {
            // Skip the timezone
            self.cursor.read_i16::<BigEndian>()?;
        }

        Ok(number)
    }

    /// Decode a boolean from the buffer.
    pub fn decode_boolean(&mut self) -> Result<bool, Amf0Error> {
        self.expect_marker(&[Amf0Marker::Boolean])?;
        Ok(self.cursor.read_u8()? != 0)
    }

    /// Decode a string from the buffer.
    ///
    /// This function can decode both normal strings and long strings.
    pub fn decode_string(&mut self) -> Result<Cow<'a, str>, Amf0Error> {
        let marker = self.expect_marker(&[Amf0Marker::String, Amf0Marker::LongString])?;

        let len = if marker == Amf0Marker::String {
            self.cursor.read_u16::<BigEndian>()? as usize
        } else {
            self.cursor.read_u32::<BigEndian>()? as usize
        };

        self.read_str(len)
    }

    /// Decode a null value from the buffer.
    ///
    /// This function also accepts undefined values.
    pub fn decode_null(&mut self) -> Result<(), Amf0Error> {
        self.expect_marker(&[Amf0Marker::Null, Amf0Marker::Undefined])?;
        Ok(())
    }

    /// Decode an object from the buffer.
    pub fn decode_object(&mut self) -> Result<Amf0Object<'a>, Amf0Error> {
        self.expect_marker(&[Amf0Marker::Object])?;

        let mut object = Vec::new();

        while let Some(key) = self.decode_object_key()? {
            let value = self.decode_value()?;
            object.push((key, value));
        }

        Ok(Cow::Owned(object))
    }

    /// Decode an ECMA array from the buffer.
    ///
    /// The associative count is advisory; the pair list is read until the
    /// object end marker, preserving order.
    pub fn decode_ecma_array(&mut self) -> Result<Amf0Object<'a>, Amf0Error> {
        self.expect_marker(&[Amf0Marker::EcmaArray])?;

        let size = self.cursor.read_u32::<BigEndian>()?;
        let mut object = Vec::with_capacity(size.min(16) as usize);

        while let Some(key) = self.decode_object_key()? {
            let value = self.decode_value()?;
            object.push((key, value));
        }

        Ok(Cow::Owned(object))
    }

    fn decode_object_key(&mut self) -> Result<Option<Cow<'a, str>>, Amf0Error> {
        // Object keys are not preceeded with a marker and are always normal
        // strings
        let len = self.cursor.read_u16::<BigEndian>()? as usize;
        let key = self.read_str(len)?;

        // The object end marker is preceeded by an empty string
        if key.is_empty() && self.peek_marker()? == Amf0Marker::ObjectEnd {
            // Clear the next marker buffer
            self.next_marker = None;
            return Ok(None);
        }

        Ok(Some(key))
    }

    fn read_str(&mut self, len: usize) -> Result<Cow<'a, str>, Amf0Error> {
        let start = self.cursor.position() as usize;
        let end = start + len;

        let data = self
            .cursor
            .get_ref()
            .get(start..end)
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "string extends past end of buffer"))?;
        self.cursor.set_position(end as u64);

        Ok(Cow::Borrowed(std::str::from_utf8(data)?))
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn decode_flat_sequence() {
        #[rustfmt::skip]
        let bytes = [
            Amf0Marker::String as u8, 0, 7, b'c', b'o', b'n', b'n', b'e', b'c', b't',
            Amf0Marker::Number as u8, 0x3F, 0xF0, 0, 0, 0, 0, 0, 0, // 1.0
            Amf0Marker::Null as u8,
        ];

        let mut decoder = Amf0Decoder::new(&bytes);
        let values = decoder.decode_all().unwrap();

        assert_eq!(
            values,
            vec![
                Amf0Value::String("connect".into()),
                Amf0Value::Number(1.0),
                Amf0Value::Null,
            ]
        );
    }

    #[test]
    fn decode_object() {
        #[rustfmt::skip]
        let bytes = [
            Amf0Marker::Object as u8,
            0, 3, b'a', b'p', b'p',
            Amf0Marker::String as u8, 0, 4, b'l', b'i', b'v', b'e',
            0, 0, Amf0Marker::ObjectEnd as u8,
        ];

        let mut decoder = Amf0Decoder::new(&bytes);
        let value = decoder.decode_value().unwrap();

        assert_eq!(
            value,
            Amf0Value::Object(Cow::Owned(vec![("app".into(), Amf0Value::String("live".into()))]))
        );
        assert!(!decoder.has_remaining());
    }

    #[test]
    fn decode_ecma_array() {
        #[rustfmt::skip]
        let bytes = [
            Amf0Marker::EcmaArray as u8,
            0, 0, 0, 1, // count
            0, 8, b'd', b'u', b'r', b'a', b't', b'i', b'o', b'n',
            Amf0Marker::Number as u8, 0, 0, 0, 0, 0, 0, 0, 0,
            0, 0, Amf0Marker::ObjectEnd as u8,
        ];

        let mut decoder = Amf0Decoder::new(&bytes);
        let value = decoder.decode_value().unwrap();

        assert_eq!(
            value,
            Amf0Value::EcmaArray(Cow::Owned(vec![("duration".into(), Amf0Value::Number(0.0))]))
        );
    }

    #[test]
    fn undefined_decodes_as_null() {
        let bytes = [Amf0Marker::Undefined as u8];
        let mut decoder = Amf0Decoder::new(&bytes);
        assert_eq!(decoder.decode_value().unwrap(), Amf0Value::Null);
    }

    #[test]
    fn unknown_marker_is_an_error() {
        let bytes = [0xFF];
        let mut decoder = Amf0Decoder::new(&bytes);
        assert!(matches!(decoder.decode_value().unwrap_err(), Amf0Error::UnknownMarker(0xFF)));
    }

    #[test]
    fn unsupported_marker_is_an_error() {
        let bytes = [Amf0Marker::Reference as u8, 0, 0];
        let mut decoder = Amf0Decoder::new(&bytes);
        assert!(matches!(
            decoder.decode_value().unwrap_err(),
            Amf0Error::UnsupportedMarker(Amf0Marker::Reference)
        ));
    }

    #[test]
    fn typed_decode_rejects_wrong_marker() {
        let bytes = [Amf0Marker::Number as u8, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut decoder = Amf0Decoder::new(&bytes);

        let err = decoder.decode_string().unwrap_err();
        assert!(matches!(
            err,
            Amf0Error::UnexpectedType {
                got: Amf0Marker::Number,
                ..
            }
        ));

        // The marker is buffered, a matching decode still succeeds.
        assert_eq!(decoder.decode_number().unwrap(), 0.0);
    }
}
