//! FLV tags.

use std::io;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use num_traits::FromPrimitive;
use rill_bytes_util::BytesCursorExt;

use crate::error::FlvError;

/// The type of an FLV tag.
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Annex E.4.1 - FLV Tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum FlvTagType {
    /// Audio tag.
    Audio = 8,
    /// Video tag.
    Video = 9,
    /// Script data (AMF0 metadata) tag.
    ScriptData = 18,
}

/// A single FLV tag.
///
/// On the wire every tag is followed by a 4-byte PreviousTagSize field equal
/// to the tag size including its 11-byte header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlvTag {
    /// The type of the tag.
    pub tag_type: FlvTagType,
    /// Timestamp in milliseconds.
    ///
    /// The wire format splits this into a lower 24-bit field and an upper
    /// 8-bit extension; [`mux`](FlvTag::mux) and [`demux`](FlvTag::demux)
    /// handle the split.
    pub timestamp: u32,
    /// Stream id, always 0 for FLV streams.
    pub stream_id: u32,
    /// The tag body.
    pub data: Bytes,
}

/// Size of the fixed tag header preceding the body.
pub const TAG_HEADER_SIZE: u32 = 11;

impl FlvTag {
    /// Mux the tag, including its trailing PreviousTagSize field.
    pub fn mux(&self, writer: &mut impl io::Write) -> Result<(), FlvError> {
        let data_size = self.data.len() as u32;

        writer.write_u8(self.tag_type as u8)?;
        writer.write_u24::<BigEndian>(data_size)?;
        writer.write_u24::<BigEndian>(self.timestamp & 0x00FF_FFFF)?;
        writer.write_u8((self.timestamp >> 24) as u8)?;
        writer.write_u24::<BigEndian>(self.stream_id)?;
        writer.write_all(&self.data)?;
        writer.write_u32::<BigEndian>(data_size + TAG_HEADER_SIZE)?;

        Ok(())
    }

    /// Demux one tag from the given reader, consuming the trailing
    /// PreviousTagSize field.
    pub fn demux(reader: &mut io::Cursor<Bytes>) -> Result<Self, FlvError> {
        let tag_type = reader.read_u8()?;
        let tag_type = FlvTagType::from_u8(tag_type).ok_or(FlvError::InvalidTagType(tag_type))?;

        let data_size = reader.read_u24::<BigEndian>()?;
        let timestamp_lower = reader.read_u24::<BigEndian>()?;
        let timestamp_upper = reader.read_u8()?;
        let stream_id = reader.read_u24::<BigEndian>()?;

        let data = reader.extract_bytes(data_size as usize)?;

        // PreviousTagSize
        reader.read_u32::<BigEndian>()?;

        Ok(FlvTag {
            tag_type,
            timestamp: ((timestamp_upper as u32) << 24) | timestamp_lower,
            stream_id,
            data,
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn mux_tag() {
        let mut buf = Vec::new();
        FlvTag {
            tag_type: FlvTagType::Audio,
            timestamp: 0xAB000123,
            stream_id: 0,
            data: Bytes::from_static(&[1, 2, 3]),
        }
        .mux(&mut buf)
        .unwrap();

        #[rustfmt::skip]
        assert_eq!(
            buf,
            vec![
                0x08, // audio
                0x00, 0x00, 0x03, // data size
                0x00, 0x01, 0x23, // timestamp lower
                0xAB, // timestamp upper
                0x00, 0x00, 0x00, // stream id
                1, 2, 3, // body
                0x00, 0x00, 0x00, 0x0E, // previous tag size (3 + 11)
            ]
        );
    }

    #[test]
    fn timestamp_split_round_trips() {
        let tag = FlvTag {
            tag_type: FlvTagType::Video,
            timestamp: u32::MAX,
            stream_id: 0,
            data: Bytes::from_static(&[0]),
        };

        let mut buf = Vec::new();
        tag.mux(&mut buf).unwrap();

        let mut cursor = io::Cursor::new(Bytes::from(buf));
        assert_eq!(FlvTag::demux(&mut cursor).unwrap(), tag);
    }

    #[test]
    fn demux_rejects_unknown_tag_type() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[0x05, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        assert!(matches!(FlvTag::demux(&mut cursor), Err(FlvError::InvalidTagType(0x05))));
    }
}
