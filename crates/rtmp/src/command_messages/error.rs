//! Error type for command messages.

/// Errors that can occur when reading or writing command messages.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// AMF0 error.
    #[error("amf0: {0}")]
    Amf0(#[from] rill_amf0::Amf0Error),
    /// No app name of type string in the connect command object.
    #[error("no app name of type string in connect command")]
    NoAppName,
    /// Invalid onStatus info object.
    #[error("invalid onStatus info object")]
    InvalidOnStatusInfoObject,
}
