//! Defines types for handling session events.

use bytes::Bytes;
use tokio::sync::mpsc;

use super::error::ServerSessionError;

/// Messages a [`SessionLink`] can deliver into a running session.
#[derive(Debug)]
pub enum SessionMessage<I> {
    /// Ask the session to deliver up to `n` more FLV payloads.
    ///
    /// The first demand after a publish command completes the publish
    /// dialog.
    DemandData(u32),
    /// Arbitrary external info, forwarded to
    /// [`StreamHandler::handle_info`].
    Info(I),
}

/// A cloneable reference to a running session.
///
/// Handed to [`NewClientHandler::handle_new_client`] so the owner of the
/// stream can signal demand and forward messages to its handler.
#[derive(Debug)]
pub struct SessionLink<I> {
    sender: mpsc::UnboundedSender<SessionMessage<I>>,
}

// Derived Clone would require I: Clone.
impl<I> Clone for SessionLink<I> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<I> SessionLink<I> {
    pub(super) fn new(sender: mpsc::UnboundedSender<SessionMessage<I>>) -> Self {
        Self { sender }
    }

    /// Ask the session to deliver up to `n` more FLV payloads.
    ///
    /// Sends to a session that has already terminated are silently dropped.
    pub fn demand_data(&self, n: u32) {
        let _ = self.sender.send(SessionMessage::DemandData(n));
    }

    /// Forward arbitrary info to the session's [`StreamHandler`].
    pub fn info(&self, info: I) {
        let _ = self.sender.send(SessionMessage::Info(info));
    }
}

/// Handler for the media stream of one publishing client.
///
/// Created by [`NewClientHandler::handle_new_client`] once a publish command
/// passes validation.
pub trait StreamHandler {
    /// The type of external info this handler accepts through
    /// [`SessionLink::info`].
    type Info: Send + 'static;

    /// Called once, right after the handler is created.
    fn handle_init(&mut self) -> impl std::future::Future<Output = Result<(), ServerSessionError>> + Send;

    /// Called for every FLV payload.
    ///
    /// The first payload starts with the FLV stream header; every payload
    /// carries exactly one complete FLV tag.
    fn handle_data_available(
        &mut self,
        payload: Bytes,
    ) -> impl std::future::Future<Output = Result<(), ServerSessionError>> + Send;

    /// Called exactly once when the stream ends, whether cleanly (delete
    /// stream) or because the socket closed.
    fn handle_end_of_stream(&mut self) -> impl std::future::Future<Output = Result<(), ServerSessionError>> + Send;

    /// Called for every message delivered through [`SessionLink::info`].
    fn handle_info(&mut self, info: Self::Info)
    -> impl std::future::Future<Output = Result<(), ServerSessionError>> + Send;
}

/// Factory for [`StreamHandler`]s, invoked when a client's publish command
/// passes validation.
pub trait NewClientHandler {
    /// The handler type this factory produces.
    type Handler: StreamHandler;

    /// Create the handler for a new publishing client.
    ///
    /// The link stays valid for the lifetime of the session; the owner uses
    /// it to signal demand (nothing is delivered, and the publish dialog
    /// does not complete, until the first demand arrives).
    fn handle_new_client(
        &mut self,
        link: SessionLink<<Self::Handler as StreamHandler>::Info>,
        app: &str,
        stream_key: &str,
    ) -> Self::Handler;
}
