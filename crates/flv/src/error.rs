//! FLV error type.

use std::io;

/// Errors that can occur while muxing or demuxing FLV streams.
#[derive(Debug, thiserror::Error)]
pub enum FlvError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Invalid FLV signature.
    #[error("invalid flv signature: {0:#x}")]
    InvalidSignature(u32),
    /// Invalid data offset in the FLV header.
    #[error("invalid data offset: {0}")]
    InvalidDataOffset(u32),
    /// Invalid tag type.
    #[error("invalid tag type: {0}")]
    InvalidTagType(u8),
}
