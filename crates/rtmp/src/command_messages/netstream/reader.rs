//! Reading [`NetStreamCommand`].

use rill_amf0::Amf0Decoder;

use super::NetStreamCommand;
use crate::command_messages::error::CommandError;

impl<'a> NetStreamCommand<'a> {
    /// Reads a [`NetStreamCommand`] from the given decoder.
    ///
    /// Returns `Ok(None)` if the `command_name` is not recognized.
    pub fn read(command_name: &str, decoder: &mut Amf0Decoder<'a>) -> Result<Option<Self>, CommandError> {
        match command_name {
            "publish" => {
                // skip command object
                decoder.decode_null()?;

                let publishing_name = decoder.decode_string()?;
                let publishing_type = decoder.decode_string()?.into();

                Ok(Some(Self::Publish {
                    publishing_name,
                    publishing_type,
                }))
            }
            "deleteStream" => {
                // skip command object
                decoder.decode_null()?;

                let stream_id = decoder.decode_number()?;
                Ok(Some(Self::DeleteStream { stream_id }))
            }
            "closeStream" => Ok(Some(Self::CloseStream)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use rill_amf0::Amf0Encoder;

    use super::*;
    use crate::command_messages::netstream::NetStreamCommandPublishPublishingType;

    #[test]
    fn read_publish() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_null(&mut buf).unwrap();
        Amf0Encoder::encode_string(&mut buf, "stream-key").unwrap();
        Amf0Encoder::encode_string(&mut buf, "live").unwrap();

        let command = NetStreamCommand::read("publish", &mut Amf0Decoder::new(&buf)).unwrap().unwrap();

        let NetStreamCommand::Publish {
            publishing_name,
            publishing_type,
        } = command
        else {
            panic!("expected publish");
        };
        assert_eq!(publishing_name, "stream-key");
        assert_eq!(publishing_type, NetStreamCommandPublishPublishingType::Live);
    }

    #[test]
    fn read_publish_unknown_type() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_null(&mut buf).unwrap();
        Amf0Encoder::encode_string(&mut buf, "stream-key").unwrap();
        Amf0Encoder::encode_string(&mut buf, "broadcast").unwrap();

        let command = NetStreamCommand::read("publish", &mut Amf0Decoder::new(&buf)).unwrap().unwrap();

        let NetStreamCommand::Publish { publishing_type, .. } = command else {
            panic!("expected publish");
        };
        assert_eq!(
            publishing_type,
            NetStreamCommandPublishPublishingType::Unknown("broadcast".into())
        );
    }

    #[test]
    fn read_delete_stream() {
        let mut buf = Vec::new();
        Amf0Encoder::encode_null(&mut buf).unwrap();
        Amf0Encoder::encode_number(&mut buf, 1.0).unwrap();

        let command = NetStreamCommand::read("deleteStream", &mut Amf0Decoder::new(&buf))
            .unwrap()
            .unwrap();

        assert!(matches!(command, NetStreamCommand::DeleteStream { stream_id } if stream_id == 1.0));
    }

    #[test]
    fn read_close_stream() {
        let command = NetStreamCommand::read("closeStream", &mut Amf0Decoder::new(&[])).unwrap().unwrap();
        assert!(matches!(command, NetStreamCommand::CloseStream));
    }

    #[test]
    fn play_is_not_recognized() {
        assert!(NetStreamCommand::read("play", &mut Amf0Decoder::new(&[])).unwrap().is_none());
    }
}
