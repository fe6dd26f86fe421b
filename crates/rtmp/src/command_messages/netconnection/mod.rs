//! NetConnection command messages.
//!
//! Defined by:
//! - Legacy RTMP spec, 7.2.1

use std::borrow::Cow;

use rill_amf0::Amf0Object;

use super::CommandResultLevel;
use super::on_status::codes::NET_CONNECTION_CONNECT_SUCCESS;

pub mod reader;
pub mod writer;

/// NetConnection command `connect`.
///
/// Defined by:
/// - Legacy RTMP spec, 7.2.1.1
#[derive(Debug, Clone)]
pub struct NetConnectionCommandConnect<'a> {
    /// Tells the server application name the client is connected to.
    ///
    /// When you connect via rtmp, you specify the app name in the url.
    /// For example in `rtmp://localhost:1935/live/xyz` the app name is
    /// "live" and "xyz" is the stream key.
    pub app: Cow<'a, str>,
    /// The tcUrl the client connected to, if it sent one.
    pub tc_url: Option<Cow<'a, str>>,
    /// The full command object, including the extracted fields.
    ///
    /// Defined by:
    /// - Legacy RTMP spec, page 30
    pub others: Amf0Object<'a>,
}

/// NetConnection command `connect` result.
///
/// Defined by:
/// - Legacy RTMP spec, 7.2.1.1
#[derive(Debug, Clone)]
pub struct NetConnectionCommandConnectResult<'a> {
    /// Flash Media Server version.
    ///
    /// Usually set to "FMS/3,0,1,123".
    pub fmsver: Cow<'a, str>,
    /// Capability flags. Usually set to 31.0; no known client inspects the
    /// individual bits.
    pub capabilities: f64,
    /// Result level.
    pub level: CommandResultLevel,
    /// Result code.
    pub code: Cow<'a, str>,
    /// Result description.
    pub description: Cow<'a, str>,
    /// The AMF encoding version. Always 0.0 (AMF0).
    pub encoding: f64,
}

impl Default for NetConnectionCommandConnectResult<'_> {
    fn default() -> Self {
        Self {
            fmsver: Cow::Borrowed("FMS/3,0,1,123"),
            capabilities: 31.0,
            level: CommandResultLevel::Status,
            code: Cow::Borrowed(NET_CONNECTION_CONNECT_SUCCESS),
            description: Cow::Borrowed("Connection Succeeded."),
            encoding: 0.0,
        }
    }
}

/// NetConnection commands as defined in 7.2.1, plus the connection-level
/// commands the flash encoder family (FCPublish, `_checkbw`, onBWDone)
/// exchanges outside any stream.
#[derive(Debug, Clone)]
pub enum NetConnectionCommand<'a> {
    /// Connect command.
    Connect(NetConnectionCommandConnect<'a>),
    /// Connect result.
    ///
    /// Sent from server to client in response to
    /// [`NetConnectionCommand::Connect`].
    ConnectResult(NetConnectionCommandConnectResult<'a>),
    /// Create stream command.
    CreateStream,
    /// Create stream result.
    ///
    /// Sent from server to client in response to
    /// [`NetConnectionCommand::CreateStream`].
    CreateStreamResult {
        /// ID of the created stream.
        stream_id: f64,
    },
    /// Release stream command.
    ///
    /// Sent by publishers before FCPublish to ask the server to release a
    /// possibly lingering stream with the same key.
    ReleaseStream {
        /// The stream key to release.
        stream_key: Cow<'a, str>,
    },
    /// Release stream result.
    ReleaseStreamResult,
    /// FCPublish command.
    FcPublish {
        /// The stream key the client is about to publish.
        stream_key: Option<Cow<'a, str>>,
    },
    /// onFCPublish notification.
    ///
    /// Sent from server to client in response to
    /// [`NetConnectionCommand::FcPublish`].
    OnFcPublish,
    /// `_checkbw` command.
    CheckBw,
    /// `_checkbw` result.
    CheckBwResult,
    /// onBWDone notification, sent by the server after the connect dialog.
    OnBwDone,
}
