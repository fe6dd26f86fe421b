//! Message types and definitions.
//!
//! Defined by:
//! - Legacy RTMP spec, 5.4

use bytes::Bytes;

use crate::command_messages::Command;
use crate::protocol_control_messages::{
    ProtocolControlMessageAcknowledgement, ProtocolControlMessageSetChunkSize, ProtocolControlMessageSetPeerBandwidth,
    ProtocolControlMessageWindowAcknowledgementSize,
};
use crate::user_control_messages::EventMessage;

pub mod reader;

/// One RTMP message, as reassembled by the chunk reader.
#[derive(Debug)]
pub enum MessageData<'a> {
    // Protocol Control Messages
    /// Set Chunk Size message
    SetChunkSize(ProtocolControlMessageSetChunkSize),
    /// Acknowledgement message
    Acknowledgement(ProtocolControlMessageAcknowledgement),
    /// Window Acknowledgement Size message
    SetAcknowledgementWindowSize(ProtocolControlMessageWindowAcknowledgementSize),
    /// Set Peer Bandwidth message
    SetPeerBandwidth(ProtocolControlMessageSetPeerBandwidth),
    /// User control message (stream begin, ping, ..)
    UserControl(EventMessage),
    // RTMP Command Messages
    /// Command message
    ///
    /// > Command messages carry the AMF-encoded commands between the client
    /// > and the server.
    Amf0Command(Command<'a>),
    /// Metadata message
    ///
    /// > The client or the server sends this message to send Metadata or any
    /// > user data to the peer.
    DataAmf0 {
        /// The metadata.
        data: Bytes,
    },
    /// Audio message
    ///
    /// Usually contains FLV AUDIODATA.
    AudioData {
        /// The audio data.
        data: Bytes,
    },
    /// Video message
    ///
    /// Usually contains FLV VIDEODATA.
    VideoData {
        /// The video data.
        data: Bytes,
    },
    /// Any message that is not implemented.
    Unknown(UnknownMessage),
}

/// Any unknown message.
#[derive(Debug)]
pub struct UnknownMessage {
    /// The message type id.
    pub msg_type_id: MessageType,
    /// The raw message payload.
    pub data: Bytes,
}

/// The type id of an RTMP message.
///
/// Defined by:
/// - Legacy RTMP spec, 5.4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageType(pub u8);

impl MessageType {
    /// Set Chunk Size
    pub const SET_CHUNK_SIZE: Self = Self(1);
    /// Abort
    pub const ABORT: Self = Self(2);
    /// Acknowledgement
    pub const ACKNOWLEDGEMENT: Self = Self(3);
    /// User Control Event
    pub const USER_CONTROL_EVENT: Self = Self(4);
    /// Window Acknowledgement Size
    pub const WINDOW_ACKNOWLEDGEMENT_SIZE: Self = Self(5);
    /// Set Peer Bandwidth
    pub const SET_PEER_BANDWIDTH: Self = Self(6);
    /// Audio
    pub const AUDIO: Self = Self(8);
    /// Video
    pub const VIDEO: Self = Self(9);
    /// AMF3 data
    pub const DATA_AMF3: Self = Self(15);
    /// AMF3 shared object
    pub const SHARED_OBJ_AMF3: Self = Self(16);
    /// AMF3 command
    pub const COMMAND_AMF3: Self = Self(17);
    /// AMF0 data
    pub const DATA_AMF0: Self = Self(18);
    /// AMF0 shared object
    pub const SHARED_OBJ_AMF0: Self = Self(19);
    /// AMF0 command
    pub const COMMAND_AMF0: Self = Self(20);
    /// Aggregate
    pub const AGGREGATE: Self = Self(22);
}
