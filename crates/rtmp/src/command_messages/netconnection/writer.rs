//! Writing [`NetConnectionCommand`].

use std::borrow::Cow;
use std::io;

use rill_amf0::{Amf0Encoder, Amf0Value};

use super::{NetConnectionCommand, NetConnectionCommandConnect, NetConnectionCommandConnectResult};
use crate::command_messages::error::CommandError;

impl NetConnectionCommand<'_> {
    /// Writes a [`NetConnectionCommand`] to the given writer.
    pub fn write(self, buf: &mut impl io::Write, transaction_id: f64) -> Result<(), CommandError> {
        match self {
            Self::Connect(NetConnectionCommandConnect { app, tc_url, others }) => {
                Amf0Encoder::encode_string(buf, "connect")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;

                let mut object: Vec<(Cow<'_, str>, Amf0Value<'_>)> = vec![("app".into(), Amf0Value::String(app))];
                if let Some(tc_url) = tc_url {
                    object.push(("tcUrl".into(), Amf0Value::String(tc_url)));
                }
                object.extend(
                    others
                        .into_owned()
                        .into_iter()
                        .filter(|(key, _)| key != "app" && key != "tcUrl"),
                );

                Amf0Encoder::encode_object(buf, &Cow::Owned(object))?;
            }
            Self::ConnectResult(NetConnectionCommandConnectResult {
                fmsver,
                capabilities,
                level,
                code,
                description,
                encoding,
            }) => {
                Amf0Encoder::encode_string(buf, "_result")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_object(
                    buf,
                    &Cow::Owned(vec![
                        ("fmsVer".into(), Amf0Value::String(fmsver)),
                        ("capabilities".into(), Amf0Value::Number(capabilities)),
                    ]),
                )?;
                Amf0Encoder::encode_object(
                    buf,
                    &Cow::Owned(vec![
                        ("level".into(), Amf0Value::String(level.as_ref().to_string().into())),
                        ("code".into(), Amf0Value::String(code)),
                        ("description".into(), Amf0Value::String(description)),
                        ("objectEncoding".into(), Amf0Value::Number(encoding)),
                    ]),
                )?;
            }
            Self::CreateStream => {
                Amf0Encoder::encode_string(buf, "createStream")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
            }
            Self::CreateStreamResult { stream_id } => {
                Amf0Encoder::encode_string(buf, "_result")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
                Amf0Encoder::encode_number(buf, stream_id)?;
            }
            Self::ReleaseStream { stream_key } => {
                Amf0Encoder::encode_string(buf, "releaseStream")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
                Amf0Encoder::encode_string(buf, &stream_key)?;
            }
            Self::ReleaseStreamResult => {
                Amf0Encoder::encode_string(buf, "_result")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_number(buf, 0.0)?;
                Amf0Encoder::encode_null(buf)?;
            }
            Self::FcPublish { stream_key } => {
                Amf0Encoder::encode_string(buf, "FCPublish")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
                if let Some(stream_key) = stream_key {
                    Amf0Encoder::encode_string(buf, &stream_key)?;
                }
            }
            Self::OnFcPublish => {
                Amf0Encoder::encode_string(buf, "onFCPublish")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
            }
            Self::CheckBw => {
                Amf0Encoder::encode_string(buf, "_checkbw")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
            }
            Self::CheckBwResult => {
                Amf0Encoder::encode_string(buf, "_result")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
                Amf0Encoder::encode_number(buf, 0.0)?;
            }
            Self::OnBwDone => {
                Amf0Encoder::encode_string(buf, "onBWDone")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
                Amf0Encoder::encode_number(buf, 8192.0)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use rill_amf0::Amf0Decoder;

    use super::*;

    #[test]
    fn connect_response() {
        let mut buf = Vec::new();

        NetConnectionCommand::ConnectResult(NetConnectionCommandConnectResult::default())
            .write(&mut buf, 1.0)
            .expect("write");

        let mut decoder = Amf0Decoder::new(&buf);
        let values = decoder.decode_all().unwrap();

        assert_eq!(values.len(), 4);
        assert_eq!(values[0], Amf0Value::String("_result".into())); // command name
        assert_eq!(values[1], Amf0Value::Number(1.0)); // transaction id
        assert_eq!(
            values[2],
            Amf0Value::Object(Cow::Owned(vec![
                ("fmsVer".into(), Amf0Value::String("FMS/3,0,1,123".into())),
                ("capabilities".into(), Amf0Value::Number(31.0)),
            ]))
        );
        assert_eq!(
            values[3],
            Amf0Value::Object(Cow::Owned(vec![
                ("level".into(), Amf0Value::String("status".into())),
                ("code".into(), Amf0Value::String("NetConnection.Connect.Success".into())),
                ("description".into(), Amf0Value::String("Connection Succeeded.".into())),
                ("objectEncoding".into(), Amf0Value::Number(0.0)),
            ]))
        );
    }

    #[test]
    fn create_stream_response() {
        let mut buf = Vec::new();

        NetConnectionCommand::CreateStreamResult { stream_id: 1.0 }
            .write(&mut buf, 4.0)
            .expect("write");

        let mut decoder = Amf0Decoder::new(&buf);
        let values = decoder.decode_all().unwrap();

        assert_eq!(values.len(), 4);
        assert_eq!(values[0], Amf0Value::String("_result".into())); // command name
        assert_eq!(values[1], Amf0Value::Number(4.0)); // transaction id
        assert_eq!(values[2], Amf0Value::Null); // command object
        assert_eq!(values[3], Amf0Value::Number(1.0)); // stream id
    }

    #[test]
    fn release_stream_response() {
        let mut buf = Vec::new();

        NetConnectionCommand::ReleaseStreamResult.write(&mut buf, 2.0).expect("write");

        let mut decoder = Amf0Decoder::new(&buf);
        let values = decoder.decode_all().unwrap();

        assert_eq!(
            values,
            vec![
                Amf0Value::String("_result".into()),
                Amf0Value::Number(2.0),
                Amf0Value::Number(0.0),
                Amf0Value::Null,
            ]
        );
    }

    #[test]
    fn on_bw_done() {
        let mut buf = Vec::new();

        NetConnectionCommand::OnBwDone.write(&mut buf, 0.0).expect("write");

        let mut decoder = Amf0Decoder::new(&buf);
        let values = decoder.decode_all().unwrap();

        assert_eq!(
            values,
            vec![
                Amf0Value::String("onBWDone".into()),
                Amf0Value::Number(0.0),
                Amf0Value::Null,
                Amf0Value::Number(8192.0),
            ]
        );
    }

    #[test]
    fn connect_round_trips() {
        let mut buf = Vec::new();

        NetConnectionCommand::Connect(NetConnectionCommandConnect {
            app: "live".into(),
            tc_url: Some("rtmp://localhost:1935/live".into()),
            others: Cow::Owned(vec![]),
        })
        .write(&mut buf, 1.0)
        .expect("write");

        let mut decoder = Amf0Decoder::new(&buf);
        assert_eq!(decoder.decode_string().unwrap(), "connect");
        assert_eq!(decoder.decode_number().unwrap(), 1.0);

        let command = NetConnectionCommand::read("connect", &mut decoder).unwrap().unwrap();
        let NetConnectionCommand::Connect(connect) = command else {
            panic!("expected connect");
        };
        assert_eq!(connect.app, "live");
        assert_eq!(connect.tc_url.as_deref(), Some("rtmp://localhost:1935/live"));
    }
}
