//! RTMP chunk protocol.
//!
//! Messages are fragmented into chunks of at most the negotiated chunk size
//! and tagged with a chunk stream id; chunks from different streams may
//! interleave on the wire.

mod define;
mod error;

pub mod reader;
pub mod writer;

pub use self::define::{
    CHUNK_SIZE, CHUNK_STREAM_ID_AUDIO, CHUNK_STREAM_ID_COMMAND, CHUNK_STREAM_ID_PROTOCOL_CONTROL, CHUNK_STREAM_ID_VIDEO,
    Chunk, ChunkBasicHeader, ChunkMessageHeader, ChunkType, INIT_CHUNK_SIZE,
};
pub use self::error::{ChunkReadError, ChunkWriteError};
pub use self::reader::ChunkReader;
pub use self::writer::ChunkWriter;
