//! The onStatus command.
//!
//! It is not very clear if the onStatus message should be part of the
//! NetConnection or NetStream commands; in practice it is used as a response
//! message to both, which is why it lives in its own module.

use std::borrow::Cow;

use rill_amf0::Amf0Object;

use super::CommandResultLevel;

pub mod reader;
pub mod writer;

/// Well-known onStatus and `_result` codes.
pub mod codes {
    /// The connect command succeeded.
    pub const NET_CONNECTION_CONNECT_SUCCESS: &str = "NetConnection.Connect.Success";
    /// Publishing has started.
    pub const NET_STREAM_PUBLISH_START: &str = "NetStream.Publish.Start";
    /// Publishing has stopped.
    pub const NET_STREAM_UNPUBLISH_SUCCESS: &str = "NetStream.Unpublish.Success";
}

/// The onStatus command.
///
/// Sent to notify the peer about the status of a connection or stream.
#[derive(Debug, Clone)]
pub struct OnStatus<'a> {
    /// The level of the status message.
    pub level: CommandResultLevel,
    /// The status code, e.g. [`codes::NET_STREAM_PUBLISH_START`].
    pub code: Cow<'a, str>,
    /// A human readable description of the status.
    pub description: Option<Cow<'a, str>>,
    /// Any other properties of the info object.
    pub others: Option<Amf0Object<'a>>,
}
