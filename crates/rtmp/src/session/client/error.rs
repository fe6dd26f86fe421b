//! Error type for client sessions.

/// Errors that can occur during a client (publish) session.
#[derive(Debug, thiserror::Error)]
pub enum ClientSessionError {
    /// Timeout while waiting for a server response.
    #[error("timeout: {0}")]
    Timeout(#[from] tokio::time::error::Elapsed),
    /// The server closed the connection.
    #[error("server closed the connection")]
    ServerClosed,
    /// The server answered a command with `_error`.
    #[error("command failed: transaction {transaction_id}")]
    CommandFailed {
        /// The transaction id of the failed command.
        transaction_id: f64,
    },
    /// The server rejected the publish command.
    #[error("publish rejected: {code}")]
    PublishRejected {
        /// The onStatus code the server answered with.
        code: String,
    },
    /// The server sent an invalid chunk size.
    #[error("invalid chunk size: {0}")]
    InvalidChunkSize(usize),
    /// A media write was attempted before the publish dialog completed.
    #[error("not published yet")]
    NotPublished,
}
