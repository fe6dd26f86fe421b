//! The FLV header.

use std::io;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use rill_bytes_util::BytesCursorExt;

use crate::error::FlvError;

/// The FLV header.
///
/// These are the first 9 bytes of every FLV stream, followed by a zero
/// PreviousTagSize0 field.
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV Header - Page 8)
/// - video_file_format_spec_v10_1.pdf (Annex E.2 - The FLV Header)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlvHeader {
    /// The version of the FLV format.
    pub version: u8,
    /// Whether the stream contains audio tags.
    pub is_audio_present: bool,
    /// Whether the stream contains video tags.
    pub is_video_present: bool,
}

impl FlvHeader {
    /// The signature bytes at the start of every FLV stream.
    pub const SIGNATURE: [u8; 3] = *b"FLV";

    /// Mux the FLV header into the given writer.
    ///
    /// Writes the 9 header bytes followed by the 4-byte zero
    /// PreviousTagSize0 field, so the writer is left right where the first
    /// tag goes.
    pub fn mux(&self, writer: &mut impl io::Write) -> Result<(), FlvError> {
        writer.write_all(&Self::SIGNATURE)?;
        writer.write_u8(self.version)?;

        let mut flags = 0u8;
        if self.is_audio_present {
            flags |= 0b00000100;
        }
        if self.is_video_present {
            flags |= 0b00000001;
        }
        writer.write_u8(flags)?;

        // DataOffset is the size of this header.
        writer.write_u32::<BigEndian>(9)?;
        // PreviousTagSize0 is always 0.
        writer.write_u32::<BigEndian>(0)?;

        Ok(())
    }

    /// Demux the FLV header from the given reader.
    ///
    /// The reader will be left at the start of the first tag.
    pub fn demux(reader: &mut io::Cursor<Bytes>) -> Result<Self, FlvError> {
        let start = reader.position() as usize;

        let signature = reader.read_u24::<BigEndian>()?;

        // 0 byte at the beginning because we are only reading 3 bytes not 4.
        if signature != u32::from_be_bytes([0, b'F', b'L', b'V']) {
            return Err(FlvError::InvalidSignature(signature));
        }

        let version = reader.read_u8()?;
        let flags = reader.read_u8()?;
        let is_audio_present = (flags & 0b00000100) != 0;
        let is_video_present = (flags & 0b00000001) != 0;

        let data_offset = reader.read_u32::<BigEndian>()?;
        let size = reader.position() as usize - start;

        // Skip whatever extra data a future header version may carry.
        let remaining = (data_offset as usize)
            .checked_sub(size)
            .ok_or(FlvError::InvalidDataOffset(data_offset))?;
        reader.extract_bytes(remaining)?;

        // PreviousTagSize0
        reader.read_u32::<BigEndian>()?;

        Ok(FlvHeader {
            version,
            is_audio_present,
            is_video_present,
        })
    }
}
