//! Error type for server sessions.

use std::fmt::Display;

/// The stage at which a validator rejected the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStage {
    /// The connect command.
    Connect,
    /// The releaseStream command.
    ReleaseStream,
    /// The publish command.
    Publish,
    /// The @setDataFrame data message.
    SetDataFrame,
    /// The onMetaData data message.
    OnMetaData,
}

impl Display for ValidationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::ReleaseStream => write!(f, "release_stream"),
            Self::Publish => write!(f, "publish"),
            Self::SetDataFrame => write!(f, "set_data_frame"),
            Self::OnMetaData => write!(f, "on_meta_data"),
        }
    }
}

/// Errors that can occur during a server session.
#[derive(Debug, thiserror::Error)]
pub enum ServerSessionError {
    /// Timeout.
    #[error("timeout: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
    /// Received publish command before connect command.
    #[error("received publish command before connect command")]
    PublishBeforeConnect,
    /// Invalid chunk size.
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),
    /// A validator rejected the stream.
    #[error("stream validation rejected at {stage}: {reason}")]
    ValidationRejected {
        /// The stage at which the stream was rejected.
        stage: ValidationStage,
        /// The reason given by the validator.
        reason: String,
    },
    /// A stream handler failed.
    #[error("handler error: {0}")]
    Handler(String),
}
