//! A pure Rust RTMP ingest server and publish client.
//!
//! The server side accepts one publishing client per session: it performs
//! the handshake, drives the connect → releaseStream → FCPublish →
//! createStream → publish command dialog and emits the received audio/video
//! messages as an FLV byte stream, under demand-driven backpressure. The
//! client side is the mirror image and pushes H.264+AAC to a remote RTMP
//! server.
//!
//! ## Specifications
//!
//! | Name | Version | Link | Comments |
//! | --- | --- | --- | --- |
//! | Adobe's Real Time Messaging Protocol | `1.0` | <https://github.com/veovera/enhanced-rtmp/blob/main/docs/legacy/rtmp-v1-0-spec.pdf> | Refered to as 'Legacy RTMP spec' in this documentation |
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(unsafe_code)]
#![deny(unreachable_pub)]

pub mod chunk;
pub mod command_messages;
pub mod error;
pub mod handshake;
pub mod messages;
pub mod protocol_control_messages;
pub mod session;
pub mod sink;
pub mod url;
pub mod user_control_messages;

pub use error::RtmpError;
pub use session::client::{ClientSession, ClientSessionError, ClientSessionState};
pub use session::server::{
    AcceptAll, NewClientHandler, ServerConfig, ServerSession, ServerSessionError, SessionLink, SessionMessage,
    SslOptions, StreamHandler, ValidationStage, Validator,
};
pub use sink::{Attempts, RtmpSink, SinkConfig, SinkError, SinkPad, SinkState};
pub use url::{RtmpUrl, RtmpUrlError};

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use bytes::Bytes;
    use rill_flv::header::FlvHeader;
    use rill_flv::tag::{FlvTag, FlvTagType};
    use tokio::sync::mpsc;

    use crate::session::server::{NewClientHandler, ServerSessionError, SessionLink, StreamHandler, ValidationStage};
    use crate::{ClientSession, ClientSessionState, RtmpError, ServerSession, Validator};

    #[derive(Debug)]
    enum Event {
        NewClient {
            link: SessionLink<String>,
            app: String,
            stream_key: String,
        },
        Init,
        Data(Bytes),
        EndOfStream,
        Info(String),
    }

    struct Handler(mpsc::UnboundedSender<Event>);

    impl StreamHandler for Handler {
        type Info = String;

        async fn handle_init(&mut self) -> Result<(), ServerSessionError> {
            self.0.send(Event::Init).expect("test receiver alive");
            Ok(())
        }

        async fn handle_data_available(&mut self, payload: Bytes) -> Result<(), ServerSessionError> {
            self.0.send(Event::Data(payload)).expect("test receiver alive");
            Ok(())
        }

        async fn handle_end_of_stream(&mut self) -> Result<(), ServerSessionError> {
            self.0.send(Event::EndOfStream).expect("test receiver alive");
            Ok(())
        }

        async fn handle_info(&mut self, info: String) -> Result<(), ServerSessionError> {
            self.0.send(Event::Info(info)).expect("test receiver alive");
            Ok(())
        }
    }

    struct NewClient(mpsc::UnboundedSender<Event>);

    impl NewClientHandler for NewClient {
        type Handler = Handler;

        fn handle_new_client(&mut self, link: SessionLink<String>, app: &str, stream_key: &str) -> Handler {
            self.0
                .send(Event::NewClient {
                    link,
                    app: app.to_string(),
                    stream_key: stream_key.to_string(),
                })
                .expect("test receiver alive");

            Handler(self.0.clone())
        }
    }

    #[tokio::test]
    async fn publish_end_to_end() {
        let (client_io, server_io) = tokio::io::duplex(1 << 16);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let session = ServerSession::new(server_io, NewClient(event_tx)).with_client_timeout(Duration::from_secs(5));
        let server = tokio::spawn(session.run());

        let client = tokio::spawn(async move {
            let mut client = ClientSession::new(client_io);
            client.publish("live", "stream-key", "rtmp://localhost:1935/live").await?;

            assert_eq!(client.state(), ClientSessionState::Connected);

            let metadata = vec![("duration".into(), 0.0f64.into())];
            client.write_set_data_frame(0, &metadata.into()).await?;

            client.write_video(40, Bytes::from_static(&[0x17, 0x01, 0, 0, 0, 0xAA])).await?;
            client.write_audio(42, Bytes::from_static(&[0xAF, 0x01, 0xBB])).await?;

            client.delete_stream().await?;

            Ok::<_, RtmpError>(client)
        });

        // The publish dialog pauses until the stream owner signals demand.
        let Some(Event::NewClient { link, app, stream_key }) = event_rx.recv().await else {
            panic!("expected new client event");
        };
        assert_eq!(app, "live");
        assert_eq!(stream_key, "stream-key");

        let Some(Event::Init) = event_rx.recv().await else {
            panic!("expected init event");
        };

        // No data may have been surfaced before demand.
        assert!(event_rx.try_recv().is_err());

        link.demand_data(10);

        // Info messages reach the handler through the link.
        link.info("hello".to_string());
        let Some(Event::Info(info)) = event_rx.recv().await else {
            panic!("expected info event");
        };
        assert_eq!(info, "hello");

        // The first payload starts with the FLV stream header followed by
        // the video tag; the metadata message is validated and dropped.
        let Some(Event::Data(payload)) = event_rx.recv().await else {
            panic!("expected video payload");
        };

        let mut cursor = Cursor::new(payload);
        let header = FlvHeader::demux(&mut cursor).expect("flv header");
        assert!(header.is_audio_present);
        assert!(header.is_video_present);

        let tag = FlvTag::demux(&mut cursor).expect("video tag");
        assert_eq!(tag.tag_type, FlvTagType::Video);
        assert_eq!(tag.timestamp, 40);
        assert_eq!(tag.data, Bytes::from_static(&[0x17, 0x01, 0, 0, 0, 0xAA]));

        // The second payload is a bare audio tag.
        let Some(Event::Data(payload)) = event_rx.recv().await else {
            panic!("expected audio payload");
        };

        let mut cursor = Cursor::new(payload);
        let tag = FlvTag::demux(&mut cursor).expect("audio tag");
        assert_eq!(tag.tag_type, FlvTagType::Audio);
        assert_eq!(tag.timestamp, 42);
        assert_eq!(tag.data, Bytes::from_static(&[0xAF, 0x01, 0xBB]));

        // Delete stream ends the session cleanly.
        let Some(Event::EndOfStream) = event_rx.recv().await else {
            panic!("expected end of stream event");
        };

        assert!(server.await.expect("join").expect("server session"));
        client.await.expect("join").expect("client session");
    }

    struct RejectWrongKey;

    impl Validator for RejectWrongKey {
        fn validate_publish(&self, _app: &str, stream_key: &str) -> Result<(), String> {
            if stream_key == "wrongkey" {
                Err("wrong stream key".to_string())
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn validator_rejects_publish() {
        let (client_io, server_io) = tokio::io::duplex(1 << 16);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let session = ServerSession::new(server_io, NewClient(event_tx)).with_validator(RejectWrongKey);
        let server = tokio::spawn(session.run());

        let client = tokio::spawn(async move {
            let mut client = ClientSession::new(client_io);
            client.publish("live", "wrongkey", "rtmp://localhost:1935/live").await
        });

        let err = server.await.expect("join").expect_err("session must fail");
        match err {
            RtmpError::ServerSession(ServerSessionError::ValidationRejected { stage, reason }) => {
                assert_eq!(stage, ValidationStage::Publish);
                assert_eq!(reason, "wrong stream key");
            }
            err => panic!("unexpected error: {err:?}"),
        }

        // No handler was ever created.
        assert!(event_rx.recv().await.is_none());

        // The client observes the closed socket.
        assert!(client.await.expect("join").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn publish_times_out_without_demand() {
        let (client_io, server_io) = tokio::io::duplex(1 << 16);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        let session = ServerSession::new(server_io, NewClient(event_tx)).with_client_timeout(Duration::from_secs(1));
        let server = tokio::spawn(session.run());

        let client = tokio::spawn(async move {
            let mut client = ClientSession::new(client_io);
            client.publish("live", "stream-key", "rtmp://localhost:1935/live").await
        });

        let Some(Event::NewClient { .. }) = event_rx.recv().await else {
            panic!("expected new client event");
        };
        let Some(Event::Init) = event_rx.recv().await else {
            panic!("expected init event");
        };

        // Nobody demands data; the session closes the socket and delivers
        // end of stream.
        let Some(Event::EndOfStream) = event_rx.recv().await else {
            panic!("expected end of stream event");
        };

        // No media flowed, so the close is not a clean end of stream.
        assert!(!server.await.expect("join").expect("server session"));
        assert!(client.await.expect("join").is_err());
    }
}
