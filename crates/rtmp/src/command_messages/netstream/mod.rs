//! NetStream command messages.
//!
//! Defined by:
//! - Legacy RTMP spec, 7.2.2

use std::borrow::Cow;

pub mod reader;
pub mod writer;

/// NetStream commands as defined in 7.2.2.
///
/// The play-side commands (play, play2, seek, pause, receiveAudio,
/// receiveVideo) are not part of this publish-only implementation; they fall
/// through to the unknown-command handling.
#[derive(Debug, Clone)]
pub enum NetStreamCommand<'a> {
    /// Publish command.
    Publish {
        /// Name with which the stream is published (the stream key).
        publishing_name: Cow<'a, str>,
        /// Type of publishing.
        publishing_type: NetStreamCommandPublishPublishingType<'a>,
    },
    /// Delete stream command.
    DeleteStream {
        /// ID of the stream to delete.
        stream_id: f64,
    },
    /// Close stream command.
    CloseStream,
}

/// Type of publishing.
///
/// Appears as part of the [`NetStreamCommand::Publish`] command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetStreamCommandPublishPublishingType<'a> {
    /// Live data is published without recording it in a file.
    Live,
    /// The stream is published and the data is recorded to a new file.
    Record,
    /// The stream is published and the data is appended to a file.
    Append,
    /// Any other value.
    Unknown(Cow<'a, str>),
}

impl<'a> From<Cow<'a, str>> for NetStreamCommandPublishPublishingType<'a> {
    fn from(value: Cow<'a, str>) -> Self {
        match value.as_ref() {
            "live" => Self::Live,
            "record" => Self::Record,
            "append" => Self::Append,
            _ => Self::Unknown(value),
        }
    }
}

impl NetStreamCommandPublishPublishingType<'_> {
    /// The wire representation of this publishing type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Live => "live",
            Self::Record => "record",
            Self::Append => "append",
            Self::Unknown(value) => value.as_ref(),
        }
    }
}
