//! Command messages.
//!
//! > The client and the server exchange commands which are AMF encoded.
//! > The sender sends a command message that consists of command name,
//! > transaction ID, and command object that contains related parameters.
//!
//! Defined by:
//! - Legacy RTMP spec, section 7.1.1
//! - Legacy RTMP spec, section 7.2

use std::borrow::Cow;

use netconnection::NetConnectionCommand;
use netstream::NetStreamCommand;
use on_status::OnStatus;
use rill_amf0::Amf0Value;

pub mod error;
pub mod netconnection;
pub mod netstream;
pub mod on_status;
pub mod reader;
pub mod writer;

/// Command message.
#[derive(Debug, Clone)]
pub struct Command<'a> {
    /// Transaction ID.
    ///
    /// > The receiver processes the command and sends back the response with
    /// > the same transaction ID.
    pub transaction_id: f64,
    /// Command type.
    pub command_type: CommandType<'a>,
}

/// This enum wraps the [`NetConnectionCommand`], [`NetStreamCommand`] and
/// [`OnStatus`] enums.
#[derive(Debug, Clone)]
pub enum CommandType<'a> {
    /// NetConnection command
    NetConnection(NetConnectionCommand<'a>),
    /// NetStream command
    NetStream(NetStreamCommand<'a>),
    /// onStatus command
    OnStatus(OnStatus<'a>),
    /// A `_result` or `_error` response from the peer.
    Result(CommandResult<'a>),
    /// Any unknown command
    ///
    /// e.g. FFmpeg sends some commands that don't appear in any spec, so we
    /// need to handle them.
    Unknown(UnknownCommand<'a>),
}

/// A `_result` or `_error` response received from the peer.
///
/// The meaning of the values depends on the command the transaction id
/// refers to, so they are kept raw.
#[derive(Debug, Clone)]
pub struct CommandResult<'a> {
    /// Whether this is a `_error` response.
    pub is_error: bool,
    /// All values of the response after the transaction id.
    pub values: Vec<Amf0Value<'a>>,
}

/// Any unknown command.
#[derive(Debug, Clone)]
pub struct UnknownCommand<'a> {
    /// Name of the unknown command.
    pub command_name: Cow<'a, str>,
    /// All other values of the command including the command object.
    pub values: Vec<Amf0Value<'a>>,
}

/// The level of a command result or onStatus info object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResultLevel {
    /// Warning level.
    ///
    /// Rarely used in practice.
    Warning,
    /// Status level.
    Status,
    /// Error level.
    Error,
    /// Any other level.
    Unknown(String),
}
