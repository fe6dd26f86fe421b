//! Reading [`NetConnectionCommand`].

use rill_amf0::Amf0Decoder;

use super::{NetConnectionCommand, NetConnectionCommandConnect};
use crate::command_messages::error::CommandError;

impl<'a> NetConnectionCommand<'a> {
    /// Reads a [`NetConnectionCommand`] from the given decoder.
    ///
    /// Returns `Ok(None)` if the `command_name` is not recognized.
    pub fn read(command_name: &str, decoder: &mut Amf0Decoder<'a>) -> Result<Option<Self>, CommandError> {
        match command_name {
            "connect" => {
                let command_object = decoder.decode_object()?;

                let app = command_object
                    .iter()
                    .find(|(key, _)| key == "app")
                    .and_then(|(_, value)| value.as_str())
                    .ok_or(CommandError::NoAppName)?;

                let tc_url = command_object
                    .iter()
                    .find(|(key, _)| key == "tcUrl")
                    .and_then(|(_, value)| value.as_str());

                Ok(Some(Self::Connect(NetConnectionCommandConnect {
                    app: app.to_string().into(),
                    tc_url: tc_url.map(|s| s.to_string().into()),
                    others: command_object,
                })))
            }
            "createStream" => Ok(Some(Self::CreateStream)),
            "releaseStream" => {
                // skip command object
                decoder.decode_null()?;

                let stream_key = decoder.decode_string()?;
                Ok(Some(Self::ReleaseStream { stream_key }))
            }
            "FCPublish" => {
                // skip command object
                decoder.decode_null()?;

                let stream_key = if decoder.has_remaining() {
                    Some(decoder.decode_string()?)
                } else {
                    None
                };
                Ok(Some(Self::FcPublish { stream_key }))
            }
            "_checkbw" => Ok(Some(Self::CheckBw)),
            "onBWDone" => Ok(Some(Self::OnBwDone)),
            "onFCPublish" => Ok(Some(Self::OnFcPublish)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::borrow::Cow;

    use rill_amf0::{Amf0Encoder, Amf0Value};

    use super::*;

    #[test]
    fn read_connect() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_object(
            &mut buf,
            &Cow::Owned(vec![
                ("app".into(), Amf0Value::String("live".into())),
                ("tcUrl".into(), Amf0Value::String("rtmp://localhost:1935/live".into())),
            ]),
        )
        .unwrap();

        let mut decoder = Amf0Decoder::new(&buf);
        let command = NetConnectionCommand::read("connect", &mut decoder).unwrap().unwrap();

        let NetConnectionCommand::Connect(connect) = command else {
            panic!("expected connect");
        };
        assert_eq!(connect.app, "live");
        assert_eq!(connect.tc_url.as_deref(), Some("rtmp://localhost:1935/live"));
        assert_eq!(connect.others.len(), 2);
    }

    #[test]
    fn read_connect_without_app_is_an_error() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_object(&mut buf, &Cow::Owned(vec![])).unwrap();

        let mut decoder = Amf0Decoder::new(&buf);
        let result = NetConnectionCommand::read("connect", &mut decoder).unwrap_err();

        assert!(matches!(result, CommandError::NoAppName));
    }

    #[test]
    fn read_release_stream() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_null(&mut buf).unwrap();
        Amf0Encoder::encode_string(&mut buf, "stream-key").unwrap();

        let mut decoder = Amf0Decoder::new(&buf);
        let command = NetConnectionCommand::read("releaseStream", &mut decoder).unwrap().unwrap();

        let NetConnectionCommand::ReleaseStream { stream_key } = command else {
            panic!("expected releaseStream");
        };
        assert_eq!(stream_key, "stream-key");
    }

    #[test]
    fn read_fc_publish_without_key() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_null(&mut buf).unwrap();

        let mut decoder = Amf0Decoder::new(&buf);
        let command = NetConnectionCommand::read("FCPublish", &mut decoder).unwrap().unwrap();

        assert!(matches!(command, NetConnectionCommand::FcPublish { stream_key: None }));
    }

    #[test]
    fn unrecognized_name_reads_as_none() {
        let mut decoder = Amf0Decoder::new(&[]);
        assert!(NetConnectionCommand::read("publish", &mut decoder).unwrap().is_none());
    }
}
