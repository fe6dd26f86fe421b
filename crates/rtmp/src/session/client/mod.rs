//! RTMP client (publish) session.
//!
//! The mirror image of the server session: connects to a remote RTMP
//! server, performs the client handshake and the connect → releaseStream →
//! FCPublish → createStream → publish dialog, then pushes media messages.

use std::borrow::Cow;
use std::io;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use rill_amf0::{Amf0Encoder, Amf0Object, Amf0Value};
use rill_bytes_util::BytesCursorExt;
use rill_future_ext::FutureExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::chunk::reader::ChunkReader;
use crate::chunk::writer::ChunkWriter;
use crate::chunk::{CHUNK_SIZE, CHUNK_STREAM_ID_AUDIO, CHUNK_STREAM_ID_VIDEO, Chunk};
use crate::command_messages::error::CommandError;
use crate::command_messages::netconnection::{NetConnectionCommand, NetConnectionCommandConnect};
use crate::command_messages::netstream::{NetStreamCommand, NetStreamCommandPublishPublishingType};
use crate::command_messages::on_status::codes::NET_STREAM_PUBLISH_START;
use crate::command_messages::{Command, CommandResult, CommandType};
use crate::error::RtmpError;
use crate::handshake::{self, HandshakeClient};
use crate::messages::{MessageData, MessageType};
use crate::protocol_control_messages::ProtocolControlMessageSetChunkSize;

mod error;

pub use error::ClientSessionError;

const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// The state of a client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSessionState {
    /// The handshake has not completed yet.
    Handshake,
    /// The command dialog is in progress.
    Connecting,
    /// NetStream.Publish.Start was received; media can be written.
    Connected,
}

/// An RTMP client session publishing a single stream.
pub struct ClientSession<S> {
    /// Used to read and write data.
    io: S,
    chunk_reader: ChunkReader,
    chunk_writer: ChunkWriter,
    read_buf: BytesMut,
    write_buf: Vec<u8>,
    /// Monotonically increasing transaction id counter.
    current_transaction_id: f64,
    state: ClientSessionState,
    /// The message stream id returned by createStream.
    stream_id: u32,
}

impl<S> ClientSession<S> {
    /// Create a new client session over the given byte stream.
    pub fn new(io: S) -> Self {
        Self {
            io,
            chunk_reader: ChunkReader::default(),
            chunk_writer: ChunkWriter::default(),
            read_buf: BytesMut::new(),
            write_buf: Vec::new(),
            current_transaction_id: 0.0,
            state: ClientSessionState::Handshake,
            stream_id: 1,
        }
    }

    /// The state of the session.
    pub fn state(&self) -> ClientSessionState {
        self.state
    }

    fn next_transaction_id(&mut self) -> f64 {
        self.current_transaction_id += 1.0;
        self.current_transaction_id
    }
}

impl<S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin> ClientSession<S> {
    /// Run the handshake and the publish dialog to completion.
    ///
    /// Returns once the server has acknowledged the publish with
    /// NetStream.Publish.Start; afterwards media can be written.
    pub async fn publish(&mut self, app: &str, stream_key: &str, tc_url: &str) -> Result<(), RtmpError> {
        self.handshake().await?;

        // Advertise our own chunk size before anything bigger than the
        // default goes out.
        ProtocolControlMessageSetChunkSize {
            chunk_size: CHUNK_SIZE as u32,
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;
        self.chunk_writer.set_chunk_size(CHUNK_SIZE);

        let transaction_id = self.next_transaction_id();
        Command {
            transaction_id,
            command_type: CommandType::NetConnection(NetConnectionCommand::Connect(NetConnectionCommandConnect {
                app: Cow::Borrowed(app),
                tc_url: Some(Cow::Borrowed(tc_url)),
                others: Cow::Owned(vec![
                    ("type".into(), Amf0Value::String("nonprivate".into())),
                    ("flashVer".into(), Amf0Value::String("FMLE/3.0".into())),
                ]),
            })),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;
        self.flush().await?;

        self.wait_for_result(transaction_id).await?;

        let transaction_id = self.next_transaction_id();
        Command {
            transaction_id,
            command_type: CommandType::NetConnection(NetConnectionCommand::ReleaseStream {
                stream_key: Cow::Borrowed(stream_key),
            }),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;

        let transaction_id = self.next_transaction_id();
        Command {
            transaction_id,
            command_type: CommandType::NetConnection(NetConnectionCommand::FcPublish {
                stream_key: Some(Cow::Borrowed(stream_key)),
            }),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;

        let create_stream_transaction_id = self.next_transaction_id();
        Command {
            transaction_id: create_stream_transaction_id,
            command_type: CommandType::NetConnection(NetConnectionCommand::CreateStream),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;
        self.flush().await?;

        let result = self.wait_for_result(create_stream_transaction_id).await?;
        if let Some(stream_id) = result.values.iter().find_map(|value| value.as_number()) {
            self.stream_id = stream_id as u32;
        }

        let transaction_id = self.next_transaction_id();
        Command {
            transaction_id,
            command_type: CommandType::NetStream(NetStreamCommand::Publish {
                publishing_name: Cow::Borrowed(stream_key),
                publishing_type: NetStreamCommandPublishPublishingType::Live,
            }),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;
        self.flush().await?;

        self.wait_for_publish_start().await?;
        self.state = ClientSessionState::Connected;

        tracing::debug!(app = %app, stream_key = %stream_key, "publishing");

        Ok(())
    }

    /// Write one video message.
    pub async fn write_video(&mut self, timestamp: u32, data: Bytes) -> Result<(), RtmpError> {
        self.ensure_connected()?;

        self.chunk_writer.write_chunk(
            &mut self.write_buf,
            Chunk::new(CHUNK_STREAM_ID_VIDEO, timestamp, MessageType::VIDEO, self.stream_id, data),
        )?;
        self.flush().await
    }

    /// Write one audio message.
    pub async fn write_audio(&mut self, timestamp: u32, data: Bytes) -> Result<(), RtmpError> {
        self.ensure_connected()?;

        self.chunk_writer.write_chunk(
            &mut self.write_buf,
            Chunk::new(CHUNK_STREAM_ID_AUDIO, timestamp, MessageType::AUDIO, self.stream_id, data),
        )?;
        self.flush().await
    }

    /// Write a @setDataFrame data message carrying onMetaData.
    pub async fn write_set_data_frame(&mut self, timestamp: u32, metadata: &Amf0Object<'_>) -> Result<(), RtmpError> {
        self.ensure_connected()?;

        let mut payload = Vec::new();
        Amf0Encoder::encode_string(&mut payload, "@setDataFrame").map_err(CommandError::Amf0)?;
        Amf0Encoder::encode_string(&mut payload, "onMetaData").map_err(CommandError::Amf0)?;
        Amf0Encoder::encode_ecma_array(&mut payload, metadata).map_err(CommandError::Amf0)?;

        self.chunk_writer.write_chunk(
            &mut self.write_buf,
            Chunk::new(
                CHUNK_STREAM_ID_AUDIO,
                timestamp,
                MessageType::DATA_AMF0,
                self.stream_id,
                payload.into(),
            ),
        )?;
        self.flush().await
    }

    /// Tell the server the stream is over.
    pub async fn delete_stream(&mut self) -> Result<(), RtmpError> {
        let transaction_id = self.next_transaction_id();
        Command {
            transaction_id,
            command_type: CommandType::NetStream(NetStreamCommand::DeleteStream {
                stream_id: self.stream_id as f64,
            }),
        }
        .write(&mut self.write_buf, &self.chunk_writer)?;
        self.flush().await
    }

    fn ensure_connected(&self) -> Result<(), RtmpError> {
        if self.state != ClientSessionState::Connected {
            return Err(RtmpError::ClientSession(ClientSessionError::NotPublished));
        }

        Ok(())
    }

    async fn handshake(&mut self) -> Result<(), RtmpError> {
        let mut handshaker = HandshakeClient::new(handshake::current_time());
        handshaker.start(&mut self.write_buf);
        self.flush().await?;

        while !handshaker.is_finished() {
            let expected = handshaker.expects_bytes();

            while self.read_buf.len() < expected {
                self.read_buf.reserve(expected - self.read_buf.len());

                let n = self
                    .io
                    .read_buf(&mut self.read_buf)
                    .with_timeout(RESPONSE_TIMEOUT)
                    .await
                    .map_err(ClientSessionError::Timeout)??;

                if n == 0 {
                    return Err(RtmpError::ClientSession(ClientSessionError::ServerClosed));
                }
            }

            let mut cursor = io::Cursor::new(self.read_buf.split().freeze());
            handshaker.handshake(&mut cursor, &mut self.write_buf)?;

            // The server may have pipelined its first chunks behind the
            // handshake.
            let over_read = cursor.extract_remaining();
            if !over_read.is_empty() {
                self.read_buf.extend_from_slice(&over_read);
            }

            self.flush().await?;
        }

        self.state = ClientSessionState::Connecting;
        tracing::debug!("handshake complete");

        Ok(())
    }

    /// Reads messages until the `_result` for the given transaction id
    /// arrives. Other messages (onBWDone, onFCPublish, stream begin,
    /// results of fire-and-forget commands) are absorbed.
    async fn wait_for_result(&mut self, transaction_id: f64) -> Result<CommandResult<'static>, RtmpError> {
        loop {
            let chunk = self.read_message().await?;

            match MessageData::read(&chunk)? {
                MessageData::SetChunkSize(ProtocolControlMessageSetChunkSize { chunk_size }) => {
                    self.on_set_chunk_size(chunk_size as usize)?;
                }
                MessageData::Amf0Command(Command {
                    transaction_id: got,
                    command_type: CommandType::Result(result),
                }) if got == transaction_id => {
                    if result.is_error {
                        return Err(RtmpError::ClientSession(ClientSessionError::CommandFailed { transaction_id }));
                    }

                    return Ok(CommandResult {
                        is_error: result.is_error,
                        values: result.values.into_iter().map(Amf0Value::into_owned).collect(),
                    });
                }
                message => {
                    tracing::debug!(?message, "ignoring message while waiting for result");
                }
            }
        }
    }

    /// Reads messages until NetStream.Publish.Start (or a rejection)
    /// arrives.
    async fn wait_for_publish_start(&mut self) -> Result<(), RtmpError> {
        loop {
            let chunk = self.read_message().await?;

            match MessageData::read(&chunk)? {
                MessageData::SetChunkSize(ProtocolControlMessageSetChunkSize { chunk_size }) => {
                    self.on_set_chunk_size(chunk_size as usize)?;
                }
                MessageData::Amf0Command(Command {
                    command_type: CommandType::OnStatus(on_status),
                    ..
                }) => {
                    if on_status.code == NET_STREAM_PUBLISH_START {
                        return Ok(());
                    }

                    return Err(RtmpError::ClientSession(ClientSessionError::PublishRejected {
                        code: on_status.code.to_string(),
                    }));
                }
                message => {
                    tracing::debug!(?message, "ignoring message while waiting for publish start");
                }
            }
        }
    }

    fn on_set_chunk_size(&mut self, chunk_size: usize) -> Result<(), RtmpError> {
        if self.chunk_reader.update_max_chunk_size(chunk_size) {
            Ok(())
        } else {
            Err(RtmpError::ClientSession(ClientSessionError::InvalidChunkSize(chunk_size)))
        }
    }

    /// Reads one complete message from the stream.
    async fn read_message(&mut self) -> Result<Chunk, RtmpError> {
        loop {
            if let Some(chunk) = self.chunk_reader.read_chunk(&mut self.read_buf)? {
                return Ok(chunk);
            }

            self.read_buf.reserve(CHUNK_SIZE);

            let n = self
                .io
                .read_buf(&mut self.read_buf)
                .with_timeout(RESPONSE_TIMEOUT)
                .await
                .map_err(ClientSessionError::Timeout)??;

            if n == 0 {
                return Err(RtmpError::ClientSession(ClientSessionError::ServerClosed));
            }
        }
    }

    async fn flush(&mut self) -> Result<(), RtmpError> {
        if !self.write_buf.is_empty() {
            self.io
                .write_all(self.write_buf.as_ref())
                .with_timeout(FLUSH_TIMEOUT)
                .await
                .map_err(ClientSessionError::Timeout)??;
            self.write_buf.clear();
        }

        Ok(())
    }
}
