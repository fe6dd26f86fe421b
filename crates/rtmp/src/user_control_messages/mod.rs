//! User control messages.
//!
//! Defined by:
//! - Legacy RTMP spec, 6.2

use bytes::Bytes;

pub mod reader;
pub mod writer;

/// The type of user control message event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventType(pub u16);

impl EventType {
    /// > The server sends this event to notify the client
    /// > that a stream has become functional and can be
    /// > used for communication. The event data is 4-byte and represents
    /// > the stream ID of the stream that became functional.
    pub const STREAM_BEGIN: Self = Self(0);
    /// > The server sends this event to notify the client
    /// > that the playback of data is over as requested on this stream.
    pub const STREAM_EOF: Self = Self(1);
    /// > The server sends this event to notify the client
    /// > that there is no more data on the stream.
    pub const STREAM_DRY: Self = Self(2);
    /// > The client sends this event to inform the server
    /// > of the buffer size (in milliseconds) that is
    /// > used to buffer any data coming over a stream.
    pub const SET_BUFFER_LENGTH: Self = Self(3);
    /// > The server sends this event to notify the client
    /// > that the stream is a recorded stream.
    pub const STREAM_IS_RECORDED: Self = Self(4);
    /// > The server sends this event to test whether the
    /// > client is reachable. Event data is a 4-byte
    /// > timestamp, representing the local server time
    /// > when the server dispatched the command. The
    /// > client responds with PingResponse on receiving
    /// > PingRequest.
    pub const PING_REQUEST: Self = Self(6);
    /// > The client sends this event to the server in
    /// > response to the ping request. The event data is
    /// > a 4-byte timestamp, which was received with the
    /// > PingRequest request.
    pub const PING_RESPONSE: Self = Self(7);
}

/// A user control message as received from the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage {
    /// The event type.
    pub event_type: EventType,
    /// The raw event data.
    pub data: Bytes,
}

/// The StreamBegin event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventMessageStreamBegin {
    /// The stream ID of the stream that became functional.
    pub stream_id: u32,
}

/// The PingResponse event, echoing the data of a PingRequest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessagePingResponse {
    /// The timestamp data received with the PingRequest.
    pub data: Bytes,
}
