//! Error type for the handshake.

use std::io;

/// Errors that can occur during the handshake.
///
/// Any of these is fatal for the connection.
#[derive(Debug, thiserror::Error)]
pub enum HandshakeError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The peer requested an RTMP version we do not speak.
    #[error("unsupported rtmp version: {0}")]
    UnsupportedVersion(u8),
    /// A step arrived after the handshake already finished.
    #[error("handshake already finished")]
    AlreadyFinished,
}
