//! Outbound RTMP sink.
//!
//! Pushes H.264 video and AAC audio to a remote RTMP server as FLV-framed
//! media messages, via a [`ClientSession`]. Both streams have to be
//! announced with their codec configuration before frames flow; a single
//! frame arriving early is buffered and re-submitted once both streams are
//! ready.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use rill_amf0::Amf0Value;
use rill_flv::audio::{AacAudioData, SoundRate, SoundType};
use rill_flv::video::AvcVideoData;
use tokio::net::TcpStream;

use crate::error::RtmpError;
use crate::session::client::ClientSession;
use crate::url::RtmpUrl;

mod stream;

pub use stream::MaybeTlsStream;

const CONNECT_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Errors that can occur in the sink.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The connection could not be established within the configured number
    /// of attempts.
    #[error("connect failed after {attempts} attempts: {source}")]
    ConnectFailed {
        /// How many attempts were made.
        attempts: u32,
        /// The error of the last attempt.
        #[source]
        source: io::Error,
    },
    /// The host name is not a valid TLS server name.
    #[error("invalid tls server name: {0}")]
    InvalidServerName(String),
    /// A stream was re-configured after it was already announced.
    ///
    /// Recoverable: the re-configuration is dropped, the stream keeps its
    /// original configuration.
    #[error("stream format resent")]
    StreamFormatResent,
    /// A frame arrived before both streams were announced and another frame
    /// was already buffered.
    #[error("stream not ready")]
    NotReady,
}

/// How often to retry the initial TCP connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempts {
    /// Give up after this many attempts.
    Finite(u32),
    /// Keep retrying forever.
    Infinity,
}

impl Attempts {
    fn exhausted(&self, attempt: u32) -> bool {
        match self {
            Self::Finite(max) => attempt >= *max,
            Self::Infinity => false,
        }
    }
}

impl<'de> serde::Deserialize<'de> for Attempts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct AttemptsVisitor;

        impl serde::de::Visitor<'_> for AttemptsVisitor {
            type Value = Attempts;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a positive integer or \"infinity\"")
            }

            fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<Self::Value, E> {
                let value = u32::try_from(value).map_err(E::custom)?;
                Ok(Attempts::Finite(value))
            }

            fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<Self::Value, E> {
                if value == "infinity" {
                    Ok(Attempts::Infinity)
                } else {
                    Err(E::custom("expected \"infinity\""))
                }
            }
        }

        deserializer.deserialize_any(AttemptsVisitor)
    }
}

/// Configuration for the sink.
#[derive(Debug, Clone, serde_derive::Deserialize)]
pub struct SinkConfig {
    /// Destination URL, `rtmp://` or `rtmps://`.
    pub rtmp_url: String,
    /// How often to retry the initial TCP connect. Only connection-refused
    /// and timeout errors are retried, every 500 ms.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: Attempts,
}

fn default_max_attempts() -> Attempts {
    Attempts::Finite(1)
}

/// Readiness of the sink's two media streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkState {
    /// Neither stream is announced yet.
    NotReady,
    /// Only the video stream is announced.
    ReadyVideo,
    /// Only the audio stream is announced.
    ReadyAudio,
    /// Both streams are announced; frames flow.
    Ready,
}

/// The sink's media pads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkPad {
    /// The audio pad.
    Audio,
    /// The video pad.
    Video,
}

#[derive(Debug)]
struct VideoStreamConfig {
    width: u32,
    height: u32,
}

#[derive(Debug)]
struct AudioStreamConfig {
    sound_rate: SoundRate,
    sound_type: SoundType,
}

enum BufferedFrame {
    Video {
        payload: Bytes,
        dts: u32,
        pts: u32,
        is_key_frame: bool,
    },
    Audio {
        payload: Bytes,
        pts: u32,
    },
}

/// An outbound RTMP publish sink for one H.264 + AAC stream.
pub struct RtmpSink {
    session: ClientSession<MaybeTlsStream>,
    state: SinkState,
    video: Option<VideoStreamConfig>,
    audio: Option<AudioStreamConfig>,
    buffered_frame: Option<BufferedFrame>,
    last_video_timestamp: Option<u32>,
    last_audio_timestamp: Option<u32>,
}

impl RtmpSink {
    /// Connect to the configured URL and run the publish dialog.
    ///
    /// Connection-refused and timeout errors are retried every 500 ms up to
    /// `max_attempts`; any other error fails immediately.
    pub async fn connect(config: SinkConfig) -> Result<Self, RtmpError> {
        let url = RtmpUrl::parse(&config.rtmp_url)?;

        let tcp = Self::connect_tcp(&url, config.max_attempts).await?;

        // Disable the Nagle algorithm, media should leave as soon as
        // possible.
        if let Err(err) = tcp.set_nodelay(true) {
            tracing::warn!(error = %err, "failed to set nodelay");
        }

        let io = if url.use_tls {
            MaybeTlsStream::connect_tls(&url.host, tcp).await?
        } else {
            MaybeTlsStream::Plain(tcp)
        };

        let mut session = ClientSession::new(io);
        session.publish(&url.app, &url.stream_key, &url.tc_url()).await?;

        Ok(Self {
            session,
            state: SinkState::NotReady,
            video: None,
            audio: None,
            buffered_frame: None,
            last_video_timestamp: None,
            last_audio_timestamp: None,
        })
    }

    async fn connect_tcp(url: &RtmpUrl, max_attempts: Attempts) -> Result<TcpStream, RtmpError> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            match TcpStream::connect((url.host.as_str(), url.port)).await {
                Ok(stream) => return Ok(stream),
                Err(err) if matches!(err.kind(), io::ErrorKind::ConnectionRefused | io::ErrorKind::TimedOut) => {
                    if max_attempts.exhausted(attempt) {
                        return Err(RtmpError::Sink(SinkError::ConnectFailed {
                            attempts: attempt,
                            source: err,
                        }));
                    }

                    tracing::debug!(attempt, error = %err, "connect failed, retrying");
                    tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
                }
                Err(err) => return Err(RtmpError::Io(err)),
            }
        }
    }

    /// The readiness state of the sink.
    pub fn state(&self) -> SinkState {
        self.state
    }

    /// The pad to demand the next buffer from: the one whose last written
    /// timestamp is smallest, so the streams progress interleaved.
    pub fn preferred_pad(&self) -> SinkPad {
        match (self.last_audio_timestamp, self.last_video_timestamp) {
            (None, _) => SinkPad::Audio,
            (_, None) => SinkPad::Video,
            (Some(audio), Some(video)) => {
                if audio <= video {
                    SinkPad::Audio
                } else {
                    SinkPad::Video
                }
            }
        }
    }

    /// Announce the video stream and send its AVC sequence header.
    ///
    /// Announcing a stream that is already announced is rejected with
    /// [`SinkError::StreamFormatResent`]; the re-configuration is dropped.
    pub async fn init_video_stream(
        &mut self,
        width: u32,
        height: u32,
        avc_decoder_config: Bytes,
    ) -> Result<(), RtmpError> {
        match self.state {
            SinkState::NotReady | SinkState::ReadyAudio => {}
            SinkState::ReadyVideo | SinkState::Ready => {
                return Err(RtmpError::Sink(SinkError::StreamFormatResent));
            }
        }

        self.video = Some(VideoStreamConfig { width, height });

        let mut body = Vec::new();
        AvcVideoData::sequence_header(avc_decoder_config).mux(&mut body)?;
        self.session.write_video(0, body.into()).await?;

        self.state = match self.state {
            SinkState::NotReady => SinkState::ReadyVideo,
            _ => SinkState::Ready,
        };

        if self.state == SinkState::Ready {
            self.on_ready().await?;
        }

        Ok(())
    }

    /// Announce the audio stream and send its AAC sequence header
    /// (AudioSpecificConfig).
    pub async fn init_audio_stream(
        &mut self,
        channels: u8,
        sample_rate: u32,
        audio_specific_config: Bytes,
    ) -> Result<(), RtmpError> {
        match self.state {
            SinkState::NotReady | SinkState::ReadyVideo => {}
            SinkState::ReadyAudio | SinkState::Ready => {
                return Err(RtmpError::Sink(SinkError::StreamFormatResent));
            }
        }

        let sequence_header = AacAudioData::sequence_header(channels, sample_rate, audio_specific_config);
        self.audio = Some(AudioStreamConfig {
            sound_rate: sequence_header.sound_rate,
            sound_type: sequence_header.sound_type,
        });

        let mut body = Vec::new();
        sequence_header.mux(&mut body)?;
        self.session.write_audio(0, body.into()).await?;

        self.state = match self.state {
            SinkState::NotReady => SinkState::ReadyAudio,
            _ => SinkState::Ready,
        };

        if self.state == SinkState::Ready {
            self.on_ready().await?;
        }

        Ok(())
    }

    /// Write one H.264 frame.
    ///
    /// `dts` and `pts` are in milliseconds. Before both streams are
    /// announced a single frame is held back; a second early frame is an
    /// error.
    pub async fn write_video_frame(
        &mut self,
        payload: Bytes,
        dts: u32,
        pts: u32,
        is_key_frame: bool,
    ) -> Result<(), RtmpError> {
        if self.state != SinkState::Ready {
            if self.buffered_frame.is_none() {
                self.buffered_frame = Some(BufferedFrame::Video {
                    payload,
                    dts,
                    pts,
                    is_key_frame,
                });
                return Ok(());
            }

            return Err(RtmpError::Sink(SinkError::NotReady));
        }

        let composition_time = (pts as i64 - dts as i64) as i32;

        let mut body = Vec::with_capacity(payload.len() + 5);
        AvcVideoData::nalu(is_key_frame, composition_time, payload).mux(&mut body)?;

        self.session.write_video(dts, body.into()).await?;
        self.last_video_timestamp = Some(dts);

        Ok(())
    }

    /// Write one AAC frame.
    ///
    /// `pts` is in milliseconds.
    pub async fn write_audio_frame(&mut self, payload: Bytes, pts: u32) -> Result<(), RtmpError> {
        if self.state != SinkState::Ready {
            if self.buffered_frame.is_none() {
                self.buffered_frame = Some(BufferedFrame::Audio { payload, pts });
                return Ok(());
            }

            return Err(RtmpError::Sink(SinkError::NotReady));
        }

        let audio = self.audio.as_ref().expect("ready implies audio config");

        let mut body = Vec::with_capacity(payload.len() + 2);
        AacAudioData::raw(audio.sound_rate, audio.sound_type, payload).mux(&mut body)?;

        self.session.write_audio(pts, body.into()).await?;
        self.last_audio_timestamp = Some(pts);

        Ok(())
    }

    /// Tell the server the stream is over.
    pub async fn finish(&mut self) -> Result<(), RtmpError> {
        self.session.delete_stream().await
    }

    /// Both streams just became ready: send the stream metadata and
    /// re-submit the frame that arrived early, if any.
    async fn on_ready(&mut self) -> Result<(), RtmpError> {
        let video = self.video.as_ref().expect("ready implies video config");

        let metadata = vec![
            ("width".into(), Amf0Value::Number(video.width as f64)),
            ("height".into(), Amf0Value::Number(video.height as f64)),
            ("videocodecid".into(), Amf0Value::Number(7.0)),
            ("audiocodecid".into(), Amf0Value::Number(10.0)),
        ];
        self.session.write_set_data_frame(0, &metadata.into()).await?;

        if let Some(frame) = self.buffered_frame.take() {
            match frame {
                BufferedFrame::Video {
                    payload,
                    dts,
                    pts,
                    is_key_frame,
                } => self.write_video_frame(payload, dts, pts, is_key_frame).await?,
                BufferedFrame::Audio { payload, pts } => self.write_audio_frame(payload, pts).await?,
            }
        }

        Ok(())
    }
}
