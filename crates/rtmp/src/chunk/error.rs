use std::io;

/// Errors that can occur when reading chunks.
///
/// All of these indicate a structurally invalid chunk stream; the session
/// layer treats them as recoverable by dropping the reader state and the
/// buffered bytes.
#[derive(Debug, thiserror::Error)]
pub enum ChunkReadError {
    /// Missing previous chunk header.
    #[error("missing previous chunk header: {0}")]
    MissingPreviousChunkHeader(u32),
    /// Too many partial chunks.
    #[error("too many partial chunks")]
    TooManyPartialChunks,
    /// Too many previous chunk headers.
    #[error("too many previous chunk headers")]
    TooManyPreviousChunkHeaders,
    /// Partial chunk too large.
    #[error("partial chunk too large: {0}")]
    PartialChunkTooLarge(usize),
    /// Timestamp overflow.
    #[error("timestamp overflow: timestamp: {0}, delta: {1}")]
    TimestampOverflow(u32, u32),
}

/// Errors that can occur when writing chunks.
#[derive(Debug, thiserror::Error)]
pub enum ChunkWriteError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
