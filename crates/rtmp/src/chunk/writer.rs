//! Writing chunks.

use std::io;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use super::define::{Chunk, ChunkMessageHeader, ChunkType, INIT_CHUNK_SIZE};
use super::error::ChunkWriteError;

/// A chunk writer.
///
/// Splits messages into chunks of at most the configured chunk size. The
/// first chunk of a message carries a full Type 0 header; continuation
/// chunks carry Type 3 basic headers only.
pub struct ChunkWriter {
    chunk_size: usize,
}

impl Default for ChunkWriter {
    fn default() -> Self {
        Self {
            chunk_size: INIT_CHUNK_SIZE,
        }
    }
}

impl ChunkWriter {
    /// Set the chunk size.
    ///
    /// Advertise the new size with a SetChunkSize message before writing
    /// chunks with it.
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size;
    }

    /// Internal function to write the basic header.
    #[inline]
    fn write_basic_header(io: &mut impl io::Write, fmt: ChunkType, csid: u32) -> Result<(), ChunkWriteError> {
        let fmt = fmt as u8;

        if csid >= 64 + 256 {
            io.write_u8((fmt << 6) | 1)?;
            let csid = csid - 64;

            let div = csid / 256;
            let rem = csid % 256;

            io.write_u8(rem as u8)?;
            io.write_u8(div as u8)?;
        } else if csid >= 64 {
            io.write_u8(fmt << 6)?;
            io.write_u8((csid - 64) as u8)?;
        } else {
            io.write_u8((fmt << 6) | csid as u8)?;
        }

        Ok(())
    }

    /// Internal function to write the message header.
    #[inline]
    fn write_message_header(io: &mut impl io::Write, message_header: &ChunkMessageHeader) -> Result<(), ChunkWriteError> {
        let timestamp = if message_header.timestamp >= 0xFFFFFF {
            0xFFFFFF
        } else {
            message_header.timestamp
        };

        io.write_u24::<BigEndian>(timestamp)?;
        io.write_u24::<BigEndian>(message_header.msg_length)?;
        io.write_u8(message_header.msg_type_id.0)?;
        io.write_u32::<LittleEndian>(message_header.msg_stream_id)?;

        if message_header.is_extended_timestamp() {
            Self::write_extended_timestamp(io, message_header.timestamp)?;
        }

        Ok(())
    }

    /// Internal function to write the extended timestamp.
    #[inline]
    fn write_extended_timestamp(io: &mut impl io::Write, timestamp: u32) -> Result<(), ChunkWriteError> {
        io.write_u32::<BigEndian>(timestamp)?;

        Ok(())
    }

    /// Write a chunk into some writer.
    pub fn write_chunk(&self, io: &mut impl io::Write, mut chunk_info: Chunk) -> Result<(), ChunkWriteError> {
        Self::write_basic_header(io, ChunkType::Type0, chunk_info.basic_header.chunk_stream_id)?;

        Self::write_message_header(io, &chunk_info.message_header)?;

        while !chunk_info.payload.is_empty() {
            let cur_payload_size = if chunk_info.payload.len() > self.chunk_size {
                self.chunk_size
            } else {
                chunk_info.payload.len()
            };

            let payload_bytes = chunk_info.payload.split_to(cur_payload_size);
            io.write_all(&payload_bytes[..])?;

            if !chunk_info.payload.is_empty() {
                Self::write_basic_header(io, ChunkType::Type3, chunk_info.basic_header.chunk_stream_id)?;

                if chunk_info.message_header.is_extended_timestamp() {
                    Self::write_extended_timestamp(io, chunk_info.message_header.timestamp)?;
                }
            }
        }

        Ok(())
    }
}
