//! RTMP server (ingest) session.
//!
//! One session per accepted connection. The session drives the handshake,
//! the connect/publish command dialog and the translation of media messages
//! into FLV payloads, delivering them to a [`StreamHandler`] under
//! demand-driven backpressure: the socket is only read while the stream
//! owner has outstanding demand (or the publish dialog has not completed
//! yet).

use std::borrow::Cow;
use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use rill_amf0::{Amf0Decoder, Amf0Value};
use rill_bytes_util::BytesCursorExt;
use rill_flv::header::FlvHeader;
use rill_flv::tag::{FlvTag, FlvTagType};
use rill_future_ext::FutureExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::chunk::reader::ChunkReader;
use crate::chunk::writer::ChunkWriter;
use crate::chunk::CHUNK_SIZE;
use crate::command_messages::netconnection::{
    NetConnectionCommand, NetConnectionCommandConnect, NetConnectionCommandConnectResult,
};
use crate::command_messages::netstream::{NetStreamCommand, NetStreamCommandPublishPublishingType};
use crate::command_messages::on_status::OnStatus;
use crate::command_messages::on_status::codes::NET_STREAM_PUBLISH_START;
use crate::command_messages::{Command, CommandResultLevel, CommandType};
use crate::error::RtmpError;
use crate::handshake::HandshakeServer;
use crate::messages::MessageData;
use crate::protocol_control_messages::{
    ProtocolControlMessageSetChunkSize, ProtocolControlMessageSetPeerBandwidth,
    ProtocolControlMessageSetPeerBandwidthLimitType, ProtocolControlMessageWindowAcknowledgementSize,
};
use crate::user_control_messages::{EventMessage, EventMessagePingResponse, EventMessageStreamBegin, EventType};

pub mod config;

mod error;
mod handler;
mod validator;

pub use config::{ServerConfig, SslOptions, SslVerify, TlsConfigError};
pub use error::{ServerSessionError, ValidationStage};
pub use handler::{NewClientHandler, SessionLink, SessionMessage, StreamHandler};
pub use validator::{AcceptAll, Validator};

// The acknowledgement window advertised to clients. Large enough that
// clients never need to send acknowledgements.
const WINDOW_ACKNOWLEDGEMENT_SIZE: u32 = 0x7FFFFFFF;

const HANDSHAKE_READ_TIMEOUT: Duration = Duration::from_secs(2);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(5);

type HandlerInfo<N> = <<N as NewClientHandler>::Handler as StreamHandler>::Info;

struct PendingPublish {
    stream_key: String,
}

/// An RTMP server session for one publishing client.
///
/// Generic over the byte stream (plain TCP or an accepted TLS stream), the
/// [`NewClientHandler`] factory and the [`Validator`].
pub struct ServerSession<S, N: NewClientHandler, V = AcceptAll> {
    /// Used to read and write data.
    io: S,
    /// Invoked when a publish command passes validation.
    on_new_client: N,
    /// Consulted before connect, releaseStream, publish and data messages
    /// are acted on.
    validator: V,
    /// The handler of the publishing stream, once publish was accepted.
    handler: Option<<N as NewClientHandler>::Handler>,
    /// Bounds the time between publish acceptance and the first demand.
    client_timeout: Duration,
    /// This is used to read the data from the stream and convert it into
    /// rtmp messages.
    chunk_reader: ChunkReader,
    /// This is used to convert rtmp messages into chunks.
    chunk_writer: ChunkWriter,
    /// Buffer to read data into.
    read_buf: BytesMut,
    /// Buffer to write data to.
    write_buf: Vec<u8>,
    /// Sometimes when doing the handshake we read too much data; this flag
    /// indicates that `read_buf` holds data ready to parse and we should not
    /// read from the stream yet.
    skip_read: bool,
    /// The app name from the connect command.
    app_name: Option<String>,
    /// The stream key from the publish command.
    stream_key: Option<String>,
    /// Set once the publish dialog completed (first demand arrived).
    published: bool,
    /// Set once the FLV stream header went out with the first payload.
    header_sent: bool,
    /// Remaining demand; media is only read while this is non-zero or the
    /// session is not published yet.
    buffers_demanded: u32,
    /// An accepted publish command awaiting its first demand.
    pending_publish: Option<PendingPublish>,
    /// Deadline for the first demand.
    publish_deadline: Option<tokio::time::Instant>,
    /// Set when the session should stop after the current batch of
    /// messages.
    closing: bool,
    /// Whether the stop was a clean end of stream.
    clean_close: bool,
    control_tx: mpsc::UnboundedSender<SessionMessage<HandlerInfo<N>>>,
    control_rx: mpsc::UnboundedReceiver<SessionMessage<HandlerInfo<N>>>,
}

impl<S, N: NewClientHandler> ServerSession<S, N> {
    /// Create a new session accepting every stream.
    pub fn new(io: S, on_new_client: N) -> Self {
        let (control_tx, control_rx) = mpsc::unbounded_channel();

        Self {
            io,
            on_new_client,
            validator: AcceptAll,
            handler: None,
            client_timeout: DEFAULT_CLIENT_TIMEOUT,
            chunk_reader: ChunkReader::default(),
            chunk_writer: ChunkWriter::default(),
            read_buf: BytesMut::new(),
            write_buf: Vec::new(),
            skip_read: false,
            app_name: None,
            stream_key: None,
            published: false,
            header_sent: false,
            buffers_demanded: 0,
            pending_publish: None,
            publish_deadline: None,
            closing: false,
            clean_close: false,
            control_tx,
            control_rx,
        }
    }
}

impl<S, N: NewClientHandler, V: Validator> ServerSession<S, N, V> {
    /// Replace the validator.
    pub fn with_validator<V2: Validator>(self, validator: V2) -> ServerSession<S, N, V2> {
        ServerSession {
            io: self.io,
            on_new_client: self.on_new_client,
            validator,
            handler: self.handler,
            client_timeout: self.client_timeout,
            chunk_reader: self.chunk_reader,
            chunk_writer: self.chunk_writer,
            read_buf: self.read_buf,
            write_buf: self.write_buf,
            skip_read: self.skip_read,
            app_name: self.app_name,
            stream_key: self.stream_key,
            published: self.published,
            header_sent: self.header_sent,
            buffers_demanded: self.buffers_demanded,
            pending_publish: self.pending_publish,
            publish_deadline: self.publish_deadline,
            closing: self.closing,
            clean_close: self.clean_close,
            control_tx: self.control_tx,
            control_rx: self.control_rx,
        }
    }

    /// Set the publish-to-first-demand timeout.
    pub fn with_client_timeout(mut self, client_timeout: Duration) -> Self {
        self.client_timeout = client_timeout;
        self
    }
}

impl<S, N, V> ServerSession<S, N, V>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
    N: NewClientHandler,
    V: Validator,
{
    /// Run the session to completion.
    ///
    /// Returns `Ok(true)` if the stream ended cleanly (a deleteStream
    /// command arrived, or the socket closed after media had been
    /// delivered), `Ok(false)` if the socket closed before any media was
    /// delivered. [`StreamHandler::handle_end_of_stream`] is invoked exactly
    /// once if a handler was created.
    pub async fn run(mut self) -> Result<bool, RtmpError> {
        let mut handshaker = HandshakeServer::default();
        // Run the handshake to completion
        loop {
            match self.drive_handshake(&mut handshaker).await? {
                true => break,
                false => self.flush().await?,
            }
        }

        // Drop the handshaker, we don't need it anymore
        drop(handshaker);

        tracing::debug!("handshake complete");

        let result = self.drive_session().await;

        if let Some(mut handler) = self.handler.take() {
            if let Err(err) = handler.handle_end_of_stream().await {
                tracing::warn!(error = %err, "handler failed to handle end of stream");
            }
        }

        result
    }

    /// This drives the first stage of the session: the handshake.
    ///
    /// Returns true once the handshake is complete.
    async fn drive_handshake(&mut self, handshaker: &mut HandshakeServer) -> Result<bool, RtmpError> {
        let expected = handshaker.expects_bytes();

        while self.read_buf.len() < expected {
            self.read_buf.reserve(expected - self.read_buf.len());

            let n = self
                .io
                .read_buf(&mut self.read_buf)
                .with_timeout(HANDSHAKE_READ_TIMEOUT)
                .await
                .map_err(ServerSessionError::Timeout)??;

            if n == 0 {
                return Err(RtmpError::Io(io::ErrorKind::UnexpectedEof.into()));
            }
        }

        let mut cursor = io::Cursor::new(self.read_buf.split().freeze());

        handshaker.handshake(&mut cursor, &mut self.write_buf)?;

        // Clients may pipeline bytes past the current step (C2, or even the
        // first chunks); keep them for the next stage.
        let over_read = cursor.extract_remaining();
        if !over_read.is_empty() {
            self.read_buf.extend_from_slice(&over_read);
            if handshaker.is_finished() {
                self.skip_read = true;
            }
        }

        Ok(handshaker.is_finished())
    }

    /// This drives the second and main stage of the session.
    async fn drive_session(&mut self) -> Result<bool, RtmpError> {
        loop {
            match self.drive().await {
                Ok(true) => self.flush().await?,
                Ok(false) => return Ok(self.clean_close || self.header_sent),
                Err(err) if err.is_client_closed() => {
                    tracing::debug!("client closed the connection");
                    return Ok(self.clean_close || self.header_sent);
                }
                Err(RtmpError::ChunkRead(err)) => {
                    // A structurally invalid chunk stream is recoverable:
                    // drop the in-flight reassembly state and the buffered
                    // bytes and resume with whatever arrives next.
                    tracing::warn!(error = %err, "invalid chunk stream, resynchronizing");
                    self.read_buf.clear();
                    self.chunk_reader.recover();
                    self.flush().await?;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Process one batch of input: a control message, a socket read or the
    /// publish timeout. Returns false when the session should stop.
    async fn drive(&mut self) -> Result<bool, RtmpError> {
        if self.skip_read {
            self.skip_read = false;
            self.process_chunks().await?;
            return Ok(!self.closing);
        }

        // Socket reads are gated on demand once the stream is published.
        let can_read = self.buffers_demanded > 0 || !self.published;
        let deadline = self.publish_deadline;

        if can_read {
            self.read_buf.reserve(CHUNK_SIZE);
        }

        tokio::select! {
            message = self.control_rx.recv() => {
                self.on_control_message(message).await?;
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(tokio::time::Instant::now)), if deadline.is_some() => {
                tracing::debug!("no demand arrived within the client timeout, closing");
                let _ = self.io.shutdown().await;
                return Ok(false);
            }
            n = self.io.read_buf(&mut self.read_buf), if can_read => {
                if n? == 0 {
                    return Ok(false);
                }

                self.process_chunks().await?;
            }
        }

        Ok(!self.closing)
    }

    async fn on_control_message(&mut self, message: Option<SessionMessage<HandlerInfo<N>>>) -> Result<(), RtmpError> {
        match message {
            Some(SessionMessage::DemandData(n)) => {
                self.buffers_demanded = n;

                // The first demand completes a pending publish dialog.
                if let Some(pending) = self.pending_publish.take() {
                    self.publish_deadline = None;
                    self.finish_publish(pending)?;
                }
            }
            Some(SessionMessage::Info(info)) => {
                if let Some(handler) = &mut self.handler {
                    handler.handle_info(info).await?;
                }
            }
            // The session holds a sender itself, so the channel never
            // closes.
            None => {}
        }

        Ok(())
    }

    /// Parse data from the client into RTMP messages and process them.
    async fn process_chunks(&mut self) -> Result<(), RtmpError> {
        while !self.closing {
            let Some(chunk) = self.chunk_reader.read_chunk(&mut self.read_buf)? else {
                break;
            };

            let timestamp = chunk.message_header.timestamp;
            let msg = MessageData::read(&chunk)?;
            self.process_message(msg, timestamp).await?;
        }

        Ok(())
    }

    /// Process one RTMP message.
    async fn process_message(&mut self, msg: MessageData<'_>, timestamp: u32) -> Result<(), RtmpError> {
        match msg {
            MessageData::Amf0Command(command) => self.on_command_message(command).await?,
            MessageData::SetChunkSize(ProtocolControlMessageSetChunkSize { chunk_size }) => {
                self.on_set_chunk_size(chunk_size as usize)?;
            }
            MessageData::Acknowledgement(_) | MessageData::SetAcknowledgementWindowSize(_) | MessageData::SetPeerBandwidth(_) => {
                // The window is advertised as 2^31-1; acknowledgement-based
                // flow control is not performed.
            }
            MessageData::UserControl(event) => self.on_user_control(event)?,
            MessageData::AudioData { data } => self.on_media(FlvTagType::Audio, timestamp, data).await?,
            MessageData::VideoData { data } => self.on_media(FlvTagType::Video, timestamp, data).await?,
            MessageData::DataAmf0 { data } => self.on_data_amf0(&data).await?,
            MessageData::Unknown(unknown) => {
                tracing::debug!(msg_type_id = unknown.msg_type_id.0, "ignoring unsupported message");
            }
        }

        Ok(())
    }

    /// Called when we receive an AMF0 command message from the client.
    async fn on_command_message(&mut self, command: Command<'_>) -> Result<(), RtmpError> {
        match command.command_type {
            CommandType::NetConnection(NetConnectionCommand::Connect(connect)) => {
                self.on_command_connect(command.transaction_id, connect).await?;
            }
            CommandType::NetConnection(NetConnectionCommand::ReleaseStream { stream_key }) => {
                self.on_command_release_stream(command.transaction_id, &stream_key).await?;
            }
            CommandType::NetConnection(NetConnectionCommand::FcPublish { .. }) => {
                Command {
                    transaction_id: 0.0,
                    command_type: CommandType::NetConnection(NetConnectionCommand::OnFcPublish),
                }
                .write(&mut self.write_buf, &self.chunk_writer)?;
            }
            CommandType::NetConnection(NetConnectionCommand::CreateStream) => {
                Command {
                    transaction_id: command.transaction_id,
                    command_type: CommandType::NetConnection(NetConnectionCommand::CreateStreamResult { stream_id: 1.0 }),
                }
                .write(&mut self.write_buf, &self.chunk_writer)?;
            }
            CommandType::NetConnection(NetConnectionCommand::CheckBw) => {
                Command {
                    transaction_id: command.transaction_id,
                    command_type: CommandType::NetConnection(NetConnectionCommand::CheckBwResult),
                }
                .write(&mut self.write_buf, &self.chunk_writer)?;
            }
            CommandType::NetStream(NetStreamCommand::Publish {
                publishing_name,
                publishing_type,
            }) => {
                self.on_command_publish(&publishing_name, publishing_type).await?;
            }
            CommandType::NetStream(NetStreamCommand::DeleteStream { .. }) => {
                tracing::debug!(stream_key = ?self.stream_key, "delete stream, ending session");
                self.closing = true;
                self.clean_close = true;
            }
            CommandType::NetStream(NetStreamCommand::CloseStream) => {
                // Not sure what this does, might be important
            }
            CommandType::Unknown(unknown) => {
                tracing::debug!(command_name = %unknown.command_name, "ignoring unknown command");
            }
            // ignore everything else
            _ => {}
        }

        Ok(())
    }

    /// Called when we receive a set chunk size message from the client.
    fn on_set_chunk_size(&mut self, chunk_size: usize) -> Result<(), RtmpError> {
        if self.chunk_reader.update_max_chunk_size(chunk_size) {
            Ok(())
        } else {
            Err(RtmpError::ServerSession(ServerSessionError::InvalidChunkSize(chunk_size)))
        }
    }

    fn on_user_control(&mut self, event: EventMessage) -> Result<(), RtmpError> {
        match event.event_type {
            EventType::PING_REQUEST => {
                EventMessagePingResponse { data: event.data }.write(&mut self.write_buf, &self.chunk_writer)?;
            }
            event_type => {
                tracing::debug!(event_type = event_type.0, "ignoring user control event");
            }
        }

        Ok(())
    }

    /// Called when the client first connects to the server.
    async fn on_command_connect(
        &mut self,
        transaction_id: f64,
        connect: NetConnectionCommandConnect<'_>,
    ) -> Result<(), RtmpError> {
        if let Err(reason) = self.validator.validate_connect(&connect) {
            return self.reject(ValidationStage::Connect, reason).await;
        }

        self.app_name = Some(connect.app.to_string());

        ProtocolControlMessageWindowAcknowledgementSize {
            acknowledgement_window_size: WINDOW_ACKNOWLEDGEMENT_SIZE,
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;

        ProtocolControlMessageSetPeerBandwidth {
            acknowledgement_window_size: WINDOW_ACKNOWLEDGEMENT_SIZE,
            limit_type: ProtocolControlMessageSetPeerBandwidthLimitType::Dynamic,
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;

        EventMessageStreamBegin { stream_id: 0 }.write(&mut self.write_buf, &self.chunk_writer)?;

        ProtocolControlMessageSetChunkSize {
            chunk_size: CHUNK_SIZE as u32,
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;
        self.chunk_writer.set_chunk_size(CHUNK_SIZE);

        Command {
            transaction_id,
            command_type: CommandType::NetConnection(NetConnectionCommand::ConnectResult(
                NetConnectionCommandConnectResult::default(),
            )),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;

        Command {
            transaction_id: 0.0,
            command_type: CommandType::NetConnection(NetConnectionCommand::OnBwDone),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;

        Ok(())
    }

    async fn on_command_release_stream(&mut self, transaction_id: f64, stream_key: &str) -> Result<(), RtmpError> {
        if let Err(reason) = self.validator.validate_release_stream(stream_key) {
            return self.reject(ValidationStage::ReleaseStream, reason).await;
        }

        Command {
            transaction_id,
            command_type: CommandType::NetConnection(NetConnectionCommand::ReleaseStreamResult),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;

        Ok(())
    }

    /// Called when the client wants to start publishing a stream.
    ///
    /// The publish dialog is only half-finished here: the
    /// NetStream.Publish.Start notification is held back until the stream
    /// owner signals demand, so streams nobody listens to are never
    /// accepted.
    async fn on_command_publish(
        &mut self,
        publishing_name: &str,
        _publishing_type: NetStreamCommandPublishPublishingType<'_>,
    ) -> Result<(), RtmpError> {
        let Some(app_name) = self.app_name.clone() else {
            // The app name is not set yet
            return Err(RtmpError::ServerSession(ServerSessionError::PublishBeforeConnect));
        };

        if let Err(reason) = self.validator.validate_publish(&app_name, publishing_name) {
            return self.reject(ValidationStage::Publish, reason).await;
        }

        let link = SessionLink::new(self.control_tx.clone());
        let mut handler = self.on_new_client.handle_new_client(link, &app_name, publishing_name);
        handler.handle_init().await?;

        self.handler = Some(handler);
        self.stream_key = Some(publishing_name.to_string());

        EventMessageStreamBegin { stream_id: 1 }.write(&mut self.write_buf, &self.chunk_writer)?;

        self.pending_publish = Some(PendingPublish {
            stream_key: publishing_name.to_string(),
        });
        self.publish_deadline = Some(tokio::time::Instant::now() + self.client_timeout);

        Ok(())
    }

    /// Completes the publish dialog once the first demand arrived.
    fn finish_publish(&mut self, pending: PendingPublish) -> Result<(), RtmpError> {
        Command {
            transaction_id: 0.0,
            command_type: CommandType::OnStatus(OnStatus {
                level: CommandResultLevel::Status,
                code: NET_STREAM_PUBLISH_START.into(),
                description: Some(format!("{} is now published", pending.stream_key).into()),
                others: Some(Cow::Owned(vec![(
                    "details".into(),
                    Amf0Value::String(pending.stream_key.into()),
                )])),
            }),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;

        self.published = true;

        Ok(())
    }

    /// Consults the validator about a data message, then drops the body.
    async fn on_data_amf0(&mut self, data: &Bytes) -> Result<(), RtmpError> {
        let mut decoder = Amf0Decoder::new(data);

        let Ok(name) = decoder.decode_string() else {
            tracing::debug!("ignoring malformed amf0 data message");
            return Ok(());
        };

        match name.as_ref() {
            "@setDataFrame" => {
                let values = decoder.decode_all().unwrap_or_default();
                if let Err(reason) = self.validator.validate_set_data_frame(&values) {
                    return self.reject(ValidationStage::SetDataFrame, reason).await;
                }
            }
            "onMetaData" => {
                let values = decoder.decode_all().unwrap_or_default();
                if let Err(reason) = self.validator.validate_on_meta_data(&values) {
                    return self.reject(ValidationStage::OnMetaData, reason).await;
                }
            }
            name => {
                tracing::debug!(name = %name, "dropping amf0 data message");

                // Anonymous data messages go through the same validation as
                // @setDataFrame.
                let values = decoder.decode_all().unwrap_or_default();
                if let Err(reason) = self.validator.validate_set_data_frame(&values) {
                    return self.reject(ValidationStage::SetDataFrame, reason).await;
                }
            }
        }

        Ok(())
    }

    /// Translates a media message into an FLV payload and hands it to the
    /// handler.
    async fn on_media(&mut self, tag_type: FlvTagType, timestamp: u32, data: Bytes) -> Result<(), RtmpError> {
        if !self.published {
            // No data is surfaced before the publish dialog completed.
            tracing::debug!("dropping media message received before publish completed");
            return Ok(());
        }

        let Some(handler) = &mut self.handler else {
            return Ok(());
        };

        let mut payload = Vec::with_capacity(data.len() + 32);

        if !self.header_sent {
            FlvHeader {
                version: 1,
                is_audio_present: true,
                is_video_present: true,
            }
            .mux(&mut payload)?;
            self.header_sent = true;
        }

        FlvTag {
            tag_type,
            timestamp,
            stream_id: 0,
            data,
        }
        .mux(&mut payload)?;

        handler.handle_data_available(Bytes::from(payload)).await?;

        self.buffers_demanded = self.buffers_demanded.saturating_sub(1);

        Ok(())
    }

    /// Emits the validation-failed notification and terminates the
    /// session.
    async fn reject(&mut self, stage: ValidationStage, reason: String) -> Result<(), RtmpError> {
        tracing::warn!(stage = %stage, reason = %reason, "stream validation error, closing connection");

        let _ = self.io.shutdown().await;

        Err(RtmpError::ServerSession(ServerSessionError::ValidationRejected {
            stage,
            reason,
        }))
    }

    async fn flush(&mut self) -> Result<(), RtmpError> {
        if !self.write_buf.is_empty() {
            self.io
                .write_all(self.write_buf.as_ref())
                .with_timeout(FLUSH_TIMEOUT)
                .await
                .map_err(ServerSessionError::Timeout)??;
            self.write_buf.clear();
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use tokio::io::DuplexStream;
    use tokio::sync::mpsc;

    use super::*;
    use crate::command_messages::netconnection::NetConnectionCommand;
    use crate::handshake::HandshakeClient;
    use crate::messages::MessageType;
    use crate::protocol_control_messages::ProtocolControlMessageWindowAcknowledgementSize;
    use crate::user_control_messages::EventType;

    struct NoHandler;

    impl StreamHandler for NoHandler {
        type Info = ();

        async fn handle_init(&mut self) -> Result<(), ServerSessionError> {
            Ok(())
        }

        async fn handle_data_available(&mut self, _payload: Bytes) -> Result<(), ServerSessionError> {
            Ok(())
        }

        async fn handle_end_of_stream(&mut self) -> Result<(), ServerSessionError> {
            Ok(())
        }

        async fn handle_info(&mut self, _info: ()) -> Result<(), ServerSessionError> {
            Ok(())
        }
    }

    struct NoClients;

    impl NewClientHandler for NoClients {
        type Handler = NoHandler;

        fn handle_new_client(&mut self, _link: SessionLink<()>, _app: &str, _stream_key: &str) -> NoHandler {
            panic!("no client expected in this test");
        }
    }

    /// A raw test peer: performs the handshake and exchanges chunks without
    /// a [`crate::ClientSession`], so the exact server replies stay
    /// observable.
    struct RawPeer {
        io: DuplexStream,
        reader: ChunkReader,
        writer: ChunkWriter,
        read_buf: BytesMut,
    }

    impl RawPeer {
        async fn handshake(mut io: DuplexStream) -> Self {
            let mut handshaker = HandshakeClient::new(0);

            let mut c0c1 = Vec::new();
            handshaker.start(&mut c0c1);
            io.write_all(&c0c1).await.expect("write c0c1");

            let mut s0s1s2 = vec![0u8; handshaker.expects_bytes()];
            io.read_exact(&mut s0s1s2).await.expect("read s0s1s2");

            let mut c2 = Vec::new();
            handshaker
                .handshake(&mut io::Cursor::new(Bytes::from(s0s1s2)), &mut c2)
                .expect("handshake");
            io.write_all(&c2).await.expect("write c2");

            Self {
                io,
                reader: ChunkReader::default(),
                writer: ChunkWriter::default(),
                read_buf: BytesMut::new(),
            }
        }

        async fn send(&mut self, chunk: crate::chunk::Chunk) {
            let mut buf = Vec::new();
            self.writer.write_chunk(&mut buf, chunk).expect("write chunk");
            self.io.write_all(&buf).await.expect("send chunk");
        }

        /// Reads the next message, tracking the server's chunk size.
        async fn recv(&mut self) -> crate::chunk::Chunk {
            loop {
                if let Some(chunk) = self.reader.read_chunk(&mut self.read_buf).expect("read chunk") {
                    if chunk.message_header.msg_type_id == MessageType::SET_CHUNK_SIZE {
                        let msg = ProtocolControlMessageSetChunkSize::read(&chunk.payload).expect("set chunk size");
                        assert!(self.reader.update_max_chunk_size(msg.chunk_size as usize));
                    }

                    return chunk;
                }

                if self.io.read_buf(&mut self.read_buf).await.expect("read") == 0 {
                    panic!("server closed unexpectedly");
                }
            }
        }
    }

    /// The connect command is answered with the exact reply sequence:
    /// window acknowledgement size, set peer bandwidth, stream begin 0, set
    /// chunk size, `_result` and onBWDone.
    #[tokio::test]
    async fn connect_reply_sequence() {
        let (client_io, server_io) = tokio::io::duplex(1 << 16);
        let server = tokio::spawn(ServerSession::new(server_io, NoClients).run());

        let mut peer = RawPeer::handshake(client_io).await;

        peer.send(crate::chunk::Chunk::new(
            2,
            0,
            MessageType::SET_CHUNK_SIZE,
            0,
            Bytes::from(4096u32.to_be_bytes().to_vec()),
        ))
        .await;

        let mut connect = Vec::new();
        rill_amf0::Amf0Encoder::encode_string(&mut connect, "connect").unwrap();
        rill_amf0::Amf0Encoder::encode_number(&mut connect, 1.0).unwrap();
        rill_amf0::Amf0Encoder::encode_object(
            &mut connect,
            &Cow::Owned(vec![
                ("app".into(), Amf0Value::String("live".into())),
                ("tcUrl".into(), Amf0Value::String("rtmp://h/live".into())),
            ]),
        )
        .unwrap();
        peer.send(crate::chunk::Chunk::new(3, 0, MessageType::COMMAND_AMF0, 0, connect.into()))
            .await;

        let chunk = peer.recv().await;
        assert_eq!(chunk.message_header.msg_type_id, MessageType::WINDOW_ACKNOWLEDGEMENT_SIZE);
        let msg = ProtocolControlMessageWindowAcknowledgementSize::read(&chunk.payload).unwrap();
        assert_eq!(msg.acknowledgement_window_size, 0x7FFFFFFF);

        let chunk = peer.recv().await;
        assert_eq!(chunk.message_header.msg_type_id, MessageType::SET_PEER_BANDWIDTH);
        assert_eq!(&chunk.payload[..], &[0x7F, 0xFF, 0xFF, 0xFF, 0x02]);

        let chunk = peer.recv().await;
        assert_eq!(chunk.message_header.msg_type_id, MessageType::USER_CONTROL_EVENT);
        let event = EventMessage::read(&chunk.payload).unwrap();
        assert_eq!(event.event_type, EventType::STREAM_BEGIN);
        assert_eq!(&event.data[..], &[0, 0, 0, 0]);

        let chunk = peer.recv().await;
        assert_eq!(chunk.message_header.msg_type_id, MessageType::SET_CHUNK_SIZE);
        let msg = ProtocolControlMessageSetChunkSize::read(&chunk.payload).unwrap();
        assert_eq!(msg.chunk_size, 4096);

        let chunk = peer.recv().await;
        assert_eq!(chunk.basic_header.chunk_stream_id, 3);
        let msg = MessageData::read(&chunk).unwrap();
        let MessageData::Amf0Command(Command {
            transaction_id,
            command_type: CommandType::Result(result),
        }) = msg
        else {
            panic!("expected connect result, got {msg:?}");
        };
        assert_eq!(transaction_id, 1.0);
        assert_eq!(
            result.values[1].get("code").and_then(|v| v.as_str()),
            Some("NetConnection.Connect.Success")
        );
        assert_eq!(result.values[1].get("objectEncoding").and_then(|v| v.as_number()), Some(0.0));
        assert_eq!(
            result.values[0].get("fmsVer").and_then(|v| v.as_str()),
            Some("FMS/3,0,1,123")
        );

        let chunk = peer.recv().await;
        let msg = MessageData::read(&chunk).unwrap();
        assert!(matches!(
            msg,
            MessageData::Amf0Command(Command {
                command_type: CommandType::NetConnection(NetConnectionCommand::OnBwDone),
                ..
            })
        ));

        drop(peer);
        let _ = server.await.expect("join");
    }

    /// Ping requests are answered with a ping response echoing the data.
    #[tokio::test]
    async fn responds_to_ping_requests() {
        let (client_io, server_io) = tokio::io::duplex(1 << 16);
        let server = tokio::spawn(ServerSession::new(server_io, NoClients).run());

        let mut peer = RawPeer::handshake(client_io).await;

        peer.send(crate::chunk::Chunk::new(
            2,
            0,
            MessageType::USER_CONTROL_EVENT,
            0,
            Bytes::from_static(&[0x00, 0x06, 0xDE, 0xAD, 0xBE, 0xEF]),
        ))
        .await;

        let chunk = peer.recv().await;
        assert_eq!(chunk.message_header.msg_type_id, MessageType::USER_CONTROL_EVENT);
        let event = EventMessage::read(&chunk.payload).unwrap();
        assert_eq!(event.event_type, EventType::PING_RESPONSE);
        assert_eq!(&event.data[..], &[0xDE, 0xAD, 0xBE, 0xEF]);

        drop(peer);
        let _ = server.await.expect("join");
    }
}
