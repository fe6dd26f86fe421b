//! General RTMP error type.

use crate::chunk::{ChunkReadError, ChunkWriteError};
use crate::command_messages::error::CommandError;
use crate::handshake::HandshakeError;
use crate::session::client::ClientSessionError;
use crate::session::server::ServerSessionError;
use crate::sink::SinkError;
use crate::url::RtmpUrlError;

/// RTMP error.
#[derive(Debug, thiserror::Error)]
pub enum RtmpError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Handshake error.
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),
    /// Chunk read error.
    #[error("chunk read error: {0}")]
    ChunkRead(#[from] ChunkReadError),
    /// Chunk write error.
    #[error("chunk write error: {0}")]
    ChunkWrite(#[from] ChunkWriteError),
    /// Command error.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
    /// FLV error.
    #[error("flv error: {0}")]
    Flv(#[from] rill_flv::FlvError),
    /// URL error.
    #[error("url error: {0}")]
    Url(#[from] RtmpUrlError),
    /// Server session error.
    #[error("server session error: {0}")]
    ServerSession(#[from] ServerSessionError),
    /// Client session error.
    #[error("client session error: {0}")]
    ClientSession(#[from] ClientSessionError),
    /// Sink error.
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}

impl RtmpError {
    /// Returns true if the error indicates that the peer has closed the
    /// connection.
    pub fn is_client_closed(&self) -> bool {
        match self {
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::UnexpectedEof
            ),
            Self::ServerSession(ServerSessionError::Timeout(_)) => true,
            _ => false,
        }
    }
}
