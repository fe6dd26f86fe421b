//! Reading chunks.

use std::collections::HashMap;

use bytes::{Buf, Bytes, BytesMut};

use super::define::{Chunk, ChunkBasicHeader, ChunkMessageHeader, ChunkType, INIT_CHUNK_SIZE};
use super::error::ChunkReadError;
use crate::messages::MessageType;

// These limits bound the memory a misbehaving peer can tie up in the
// reassembly tables.
const MAX_PREVIOUS_CHUNK_HEADERS: usize = 100;
const MAX_PARTIAL_CHUNKS: usize = 4;
const MAX_PARTIAL_CHUNK_SIZE: usize = 10 * 1024 * 1024;

/// A chunk reader.
///
/// Reassembles messages from interleaved chunks. Per chunk stream id it
/// tracks the previous message header (for the Type 1/2/3 header
/// compression) and the partially received message body.
pub struct ChunkReader {
    previous_chunk_headers: HashMap<u32, ChunkMessageHeader>,
    partial_chunks: HashMap<u32, PartialChunk>,
    max_chunk_size: usize,
}

struct PartialChunk {
    header: ChunkMessageHeader,
    data: BytesMut,
}

enum ReadOutcome {
    /// The buffer does not contain a complete chunk yet. Nothing was
    /// consumed.
    NeedMoreData,
    /// One chunk was consumed but its message is not complete yet.
    Consumed(usize),
    /// One chunk was consumed and completed a message.
    Message(usize, Chunk),
}

impl Default for ChunkReader {
    fn default() -> Self {
        Self {
            previous_chunk_headers: HashMap::new(),
            partial_chunks: HashMap::new(),
            max_chunk_size: INIT_CHUNK_SIZE,
        }
    }
}

impl ChunkReader {
    /// Call when a SetChunkSize message is received.
    ///
    /// Returns false if the chunk size is out of the valid range; the
    /// session should error in that case.
    pub fn update_max_chunk_size(&mut self, chunk_size: usize) -> bool {
        // Anything above 0xFFFFFF is equivalent to 0xFFFFFF since no message
        // is larger than that.
        if !(1..=0x7FFFFFFF).contains(&chunk_size) {
            false
        } else {
            self.max_chunk_size = chunk_size.min(0xFFFFFF);
            true
        }
    }

    /// Drop all in-flight reassembly state, keeping the negotiated chunk
    /// size.
    ///
    /// Used to resynchronize after a structurally invalid chunk stream; the
    /// caller also drops its buffered bytes.
    pub fn recover(&mut self) {
        self.previous_chunk_headers.clear();
        self.partial_chunks.clear();
    }

    /// Read the next complete message from the buffer.
    ///
    /// Consumed bytes are removed from the buffer. Returns `Ok(None)` if the
    /// buffer does not contain a complete message yet, in which case any
    /// trailing incomplete chunk is left in the buffer untouched.
    pub fn read_chunk(&mut self, buffer: &mut BytesMut) -> Result<Option<Chunk>, ChunkReadError> {
        loop {
            match self.read_chunk_inner(&buffer[..])? {
                ReadOutcome::NeedMoreData => return Ok(None),
                ReadOutcome::Consumed(size) => buffer.advance(size),
                ReadOutcome::Message(size, chunk) => {
                    buffer.advance(size);
                    return Ok(Some(chunk));
                }
            }
        }
    }

    fn read_chunk_inner(&mut self, buf: &[u8]) -> Result<ReadOutcome, ChunkReadError> {
        let mut reader = ByteReader::new(buf);

        let Some(first) = reader.read_u8() else {
            return Ok(ReadOutcome::NeedMoreData);
        };

        let format = match first >> 6 {
            0 => ChunkType::Type0,
            1 => ChunkType::Type1,
            2 => ChunkType::Type2,
            _ => ChunkType::Type3,
        };

        let csid = match first & 0x3F {
            0 => {
                // 2-byte form: 64..=319
                let Some(byte) = reader.read_u8() else {
                    return Ok(ReadOutcome::NeedMoreData);
                };
                64 + byte as u32
            }
            1 => {
                // 3-byte form: 320..=65599, low byte first
                let Some(low) = reader.read_u8() else {
                    return Ok(ReadOutcome::NeedMoreData);
                };
                let Some(high) = reader.read_u8() else {
                    return Ok(ReadOutcome::NeedMoreData);
                };
                64 + low as u32 + 256 * high as u32
            }
            csid => csid as u32,
        };

        match format {
            ChunkType::Type0 => {
                let Some((raw_timestamp, msg_length, msg_type_id)) = reader.read_common_header() else {
                    return Ok(ReadOutcome::NeedMoreData);
                };
                let Some(msg_stream_id) = reader.read_u32_le() else {
                    return Ok(ReadOutcome::NeedMoreData);
                };

                let was_extended_timestamp = raw_timestamp == 0xFFFFFF;
                let timestamp = if was_extended_timestamp {
                    let Some(extended) = reader.read_u32_be() else {
                        return Ok(ReadOutcome::NeedMoreData);
                    };
                    extended
                } else {
                    raw_timestamp
                };

                let header = ChunkMessageHeader {
                    timestamp,
                    timestamp_delta: 0,
                    msg_length,
                    msg_type_id: MessageType(msg_type_id),
                    msg_stream_id,
                    was_extended_timestamp,
                };

                self.start_message(&mut reader, format, csid, header)
            }
            ChunkType::Type1 | ChunkType::Type2 => {
                let (raw_delta, msg_length, msg_type_id) = if format == ChunkType::Type1 {
                    let Some(fields) = reader.read_common_header() else {
                        return Ok(ReadOutcome::NeedMoreData);
                    };
                    (fields.0, Some(fields.1), Some(fields.2))
                } else {
                    let Some(raw_delta) = reader.read_u24_be() else {
                        return Ok(ReadOutcome::NeedMoreData);
                    };
                    (raw_delta, None, None)
                };

                let was_extended_timestamp = raw_delta == 0xFFFFFF;
                let delta = if was_extended_timestamp {
                    let Some(extended) = reader.read_u32_be() else {
                        return Ok(ReadOutcome::NeedMoreData);
                    };
                    extended
                } else {
                    raw_delta
                };

                let previous = self
                    .previous_chunk_headers
                    .get(&csid)
                    .ok_or(ChunkReadError::MissingPreviousChunkHeader(csid))?;

                let timestamp = previous
                    .timestamp
                    .checked_add(delta)
                    .ok_or(ChunkReadError::TimestampOverflow(previous.timestamp, delta))?;

                let header = ChunkMessageHeader {
                    timestamp,
                    timestamp_delta: delta,
                    msg_length: msg_length.unwrap_or(previous.msg_length),
                    msg_type_id: msg_type_id.map(MessageType).unwrap_or(previous.msg_type_id),
                    msg_stream_id: previous.msg_stream_id,
                    was_extended_timestamp,
                };

                self.start_message(&mut reader, format, csid, header)
            }
            ChunkType::Type3 => {
                if self.partial_chunks.contains_key(&csid) {
                    self.continue_message(&mut reader, csid)
                } else {
                    // A Type 3 header can also start a new message,
                    // inheriting everything from the previous one and
                    // re-applying its timestamp delta.
                    let previous = self
                        .previous_chunk_headers
                        .get(&csid)
                        .ok_or(ChunkReadError::MissingPreviousChunkHeader(csid))?;

                    let delta = if previous.was_extended_timestamp {
                        // The extended timestamp field is repeated. If the
                        // previous delta was extended the field carries the
                        // new delta, otherwise it echoes the absolute
                        // timestamp and the delta is unchanged.
                        let Some(extended) = reader.read_u32_be() else {
                            return Ok(ReadOutcome::NeedMoreData);
                        };
                        if previous.timestamp_delta >= 0xFFFFFF {
                            extended
                        } else {
                            previous.timestamp_delta
                        }
                    } else {
                        previous.timestamp_delta
                    };

                    let timestamp = previous
                        .timestamp
                        .checked_add(delta)
                        .ok_or(ChunkReadError::TimestampOverflow(previous.timestamp, delta))?;

                    let header = ChunkMessageHeader {
                        timestamp,
                        timestamp_delta: delta,
                        msg_length: previous.msg_length,
                        msg_type_id: previous.msg_type_id,
                        msg_stream_id: previous.msg_stream_id,
                        was_extended_timestamp: previous.was_extended_timestamp,
                    };

                    self.start_message(&mut reader, format, csid, header)
                }
            }
        }
    }

    /// Reads the first chunk of a new message.
    fn start_message(
        &mut self,
        reader: &mut ByteReader<'_>,
        format: ChunkType,
        csid: u32,
        header: ChunkMessageHeader,
    ) -> Result<ReadOutcome, ChunkReadError> {
        let msg_length = header.msg_length as usize;
        if msg_length > MAX_PARTIAL_CHUNK_SIZE {
            return Err(ChunkReadError::PartialChunkTooLarge(msg_length));
        }

        let piece_size = msg_length.min(self.max_chunk_size);
        let Some(piece) = reader.read_bytes(piece_size) else {
            return Ok(ReadOutcome::NeedMoreData);
        };

        if !self.previous_chunk_headers.contains_key(&csid)
            && self.previous_chunk_headers.len() >= MAX_PREVIOUS_CHUNK_HEADERS
        {
            return Err(ChunkReadError::TooManyPreviousChunkHeaders);
        }

        self.previous_chunk_headers.insert(csid, header.clone());

        // A new message on this csid supersedes whatever was in flight.
        self.partial_chunks.remove(&csid);

        if piece_size == msg_length {
            return Ok(ReadOutcome::Message(
                reader.position(),
                Chunk {
                    basic_header: ChunkBasicHeader {
                        format,
                        chunk_stream_id: csid,
                    },
                    message_header: header,
                    payload: Bytes::copy_from_slice(piece),
                },
            ));
        }

        if self.partial_chunks.len() >= MAX_PARTIAL_CHUNKS {
            return Err(ChunkReadError::TooManyPartialChunks);
        }

        self.partial_chunks.insert(
            csid,
            PartialChunk {
                header,
                data: BytesMut::from(piece),
            },
        );

        Ok(ReadOutcome::Consumed(reader.position()))
    }

    /// Reads a continuation chunk of a partially received message.
    fn continue_message(&mut self, reader: &mut ByteReader<'_>, csid: u32) -> Result<ReadOutcome, ChunkReadError> {
        let partial = self.partial_chunks.get_mut(&csid).expect("checked by caller");

        // Every continuation of a message whose header used the extended
        // timestamp carries the 32-bit field again; it echoes the header
        // value and is discarded.
        if partial.header.was_extended_timestamp && reader.read_u32_be().is_none() {
            return Ok(ReadOutcome::NeedMoreData);
        }

        let remaining = partial.header.msg_length as usize - partial.data.len();
        let piece_size = remaining.min(self.max_chunk_size);
        let Some(piece) = reader.read_bytes(piece_size) else {
            return Ok(ReadOutcome::NeedMoreData);
        };

        partial.data.extend_from_slice(piece);

        if partial.data.len() < partial.header.msg_length as usize {
            return Ok(ReadOutcome::Consumed(reader.position()));
        }

        let partial = self.partial_chunks.remove(&csid).expect("checked above");

        Ok(ReadOutcome::Message(
            reader.position(),
            Chunk {
                basic_header: ChunkBasicHeader {
                    format: ChunkType::Type3,
                    chunk_stream_id: csid,
                },
                message_header: partial.header,
                payload: partial.data.freeze(),
            },
        ))
    }
}

/// A non-consuming reader over a byte slice.
///
/// Returns `None` once the slice runs out, which the chunk reader maps to
/// NeedMoreData without having touched the buffer.
struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn read_bytes(&mut self, size: usize) -> Option<&'a [u8]> {
        let piece = self.buf.get(self.pos..self.pos + size)?;
        self.pos += size;
        Some(piece)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    fn read_u24_be(&mut self) -> Option<u32> {
        let b = self.read_bytes(3)?;
        Some(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    fn read_u32_be(&mut self) -> Option<u32> {
        let b = self.read_bytes(4)?;
        Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u32_le(&mut self) -> Option<u32> {
        let b = self.read_bytes(4)?;
        Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reads the timestamp (or delta), message length and message type id
    /// fields shared by Type 0 and Type 1 headers.
    fn read_common_header(&mut self) -> Option<(u32, u32, u8)> {
        let timestamp = self.read_u24_be()?;
        let msg_length = self.read_u24_be()?;
        let msg_type_id = self.read_u8()?;
        Some((timestamp, msg_length, msg_type_id))
    }
}
