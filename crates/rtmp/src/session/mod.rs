//! High-level API to drive RTMP sessions.

pub mod client;
pub mod server;
