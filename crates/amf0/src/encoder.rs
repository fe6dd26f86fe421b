//! AMF0 encoder

use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use crate::{Amf0Error, Amf0Marker, Amf0Object, Amf0Value};

/// AMF0 encoder.
///
/// Provides various functions to encode different types of AMF0 values into a
/// writer.
pub struct Amf0Encoder;

impl Amf0Encoder {
    /// Encode a generic [`Amf0Value`].
    pub fn encode(writer: &mut impl io::Write, value: &Amf0Value) -> Result<(), Amf0Error> {
        value.encode(writer)
    }

    /// Encode a [`f64`] as a AMF0 number value.
    pub fn encode_number(writer: &mut impl io::Write, value: f64) -> Result<(), Amf0Error> {
        writer.write_u8(Amf0Marker::Number as u8)?;
        writer.write_f64::<BigEndian>(value)?;
        Ok(())
    }

    /// Encode a [`bool`] as a AMF0 boolean value.
    pub fn encode_boolean(writer: &mut impl io::Write, value: bool) -> Result<(), Amf0Error> {
        writer.write_u8(Amf0Marker::Boolean as u8)?;
        writer.write_u8(value as u8)?;
        Ok(())
    }

    /// Encode a [`&str`](str) as a AMF0 string value.
    ///
    /// Strings longer than a normal string can carry are encoded as long
    /// strings.
    pub fn encode_string(writer: &mut impl io::Write, value: &str) -> Result<(), Amf0Error> {
        let len = value.len();

        if len <= (u16::MAX as usize) {
            writer.write_u8(Amf0Marker::String as u8)?;
            writer.write_u16::<BigEndian>(len as u16)?;
            writer.write_all(value.as_bytes())?;
        } else {
            // This try_into fails if the length is greater than u32::MAX
            let len: u32 = len.try_into()?;

            writer.write_u8(Amf0Marker::LongString as u8)?;
            writer.write_u32::<BigEndian>(len)?;
            writer.write_all(value.as_bytes())?;
        }

        Ok(())
    }

    /// Encode AMF0 Null value.
    pub fn encode_null(writer: &mut impl io::Write) -> Result<(), Amf0Error> {
        writer.write_u8(Amf0Marker::Null as u8)?;
        Ok(())
    }

    /// Encode an [`Amf0Object`] as an AMF0 Object value.
    pub fn encode_object(writer: &mut impl io::Write, values: &Amf0Object) -> Result<(), Amf0Error> {
        writer.write_u8(Amf0Marker::Object as u8)?;
        Self::encode_object_body(writer, values)?;
        Ok(())
    }

    /// Encode an [`Amf0Object`] as an AMF0 ECMA array value.
    pub fn encode_ecma_array(writer: &mut impl io::Write, values: &Amf0Object) -> Result<(), Amf0Error> {
        writer.write_u8(Amf0Marker::EcmaArray as u8)?;
        writer.write_u32::<BigEndian>(values.len().try_into()?)?;
        Self::encode_object_body(writer, values)?;
        Ok(())
    }

    fn encode_object_body(writer: &mut impl io::Write, values: &Amf0Object) -> Result<(), Amf0Error> {
        for (key, value) in values.iter() {
            writer.write_u16::<BigEndian>(key.len().try_into()?)?;
            writer.write_all(key.as_bytes())?;
            value.encode(writer)?;
        }

        // Objects and ECMA arrays are terminated by an empty key followed by
        // the object end marker.
        writer.write_u24::<BigEndian>(Amf0Marker::ObjectEnd as u32)?;

        Ok(())
    }
}
