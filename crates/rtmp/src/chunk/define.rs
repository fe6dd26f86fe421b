use bytes::Bytes;

use crate::messages::MessageType;

/// The chunk size every session starts with, until a SetChunkSize message
/// negotiates a new one.
pub const INIT_CHUNK_SIZE: usize = 128;

/// The chunk size this implementation advertises for its own outgoing
/// chunks.
pub const CHUNK_SIZE: usize = 4096;

/// Chunk stream id reserved for protocol control messages.
pub const CHUNK_STREAM_ID_PROTOCOL_CONTROL: u32 = 2;

/// Chunk stream id used for command messages.
pub const CHUNK_STREAM_ID_COMMAND: u32 = 3;

/// Chunk stream id used for outgoing audio messages.
pub const CHUNK_STREAM_ID_AUDIO: u32 = 4;

/// Chunk stream id used for outgoing video messages.
pub const CHUNK_STREAM_ID_VIDEO: u32 = 6;

/// The fmt field of a chunk basic header.
///
/// Selects which fields of the previous same-csid message header are reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum ChunkType {
    /// Self-contained message header (11 bytes).
    Type0 = 0,
    /// Timestamp delta, length and type id; stream id is inherited (7
    /// bytes).
    Type1 = 1,
    /// Timestamp delta only; everything else is inherited (3 bytes).
    Type2 = 2,
    /// No message header; everything is inherited (0 bytes).
    Type3 = 3,
}

/// A chunk basic header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkBasicHeader {
    /// The format of the message header that follows.
    pub format: ChunkType,
    /// The chunk stream id (2..=65599; 0 and 1 select the extended
    /// encodings).
    pub chunk_stream_id: u32,
}

/// A chunk message header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMessageHeader {
    /// Absolute timestamp of the message in milliseconds.
    pub timestamp: u32,
    /// The timestamp delta carried by the most recent Type 1/2 header, reused
    /// by Type 3 message starts.
    pub timestamp_delta: u32,
    /// Length of the message body in bytes.
    pub msg_length: u32,
    /// The message type id.
    pub msg_type_id: MessageType,
    /// The message stream id.
    pub msg_stream_id: u32,
    /// Whether the header carried the timestamp in an extended 32-bit field.
    ///
    /// Continuation chunks of such a message carry the 32-bit field again.
    pub was_extended_timestamp: bool,
}

impl ChunkMessageHeader {
    /// Whether writing this header requires the extended timestamp field.
    #[inline]
    pub fn is_extended_timestamp(&self) -> bool {
        self.timestamp >= 0xFFFFFF
    }
}

/// A complete RTMP chunk (an entire message once reassembled).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The basic header.
    pub basic_header: ChunkBasicHeader,
    /// The message header.
    pub message_header: ChunkMessageHeader,
    /// The message body.
    pub payload: Bytes,
}

impl Chunk {
    /// Create a new chunk with a Type 0 header.
    pub fn new(chunk_stream_id: u32, timestamp: u32, msg_type_id: MessageType, msg_stream_id: u32, payload: Bytes) -> Self {
        Self {
            basic_header: ChunkBasicHeader {
                format: ChunkType::Type0,
                chunk_stream_id,
            },
            message_header: ChunkMessageHeader {
                timestamp,
                timestamp_delta: 0,
                msg_length: payload.len() as u32,
                msg_type_id,
                msg_stream_id,
                was_extended_timestamp: timestamp >= 0xFFFFFF,
            },
            payload,
        }
    }
}
