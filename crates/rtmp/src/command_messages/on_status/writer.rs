//! Writing [`OnStatus`].

use std::borrow::Cow;
use std::io;

use rill_amf0::{Amf0Encoder, Amf0Value};

use super::OnStatus;
use crate::command_messages::error::CommandError;

impl OnStatus<'_> {
    /// Writes an [`OnStatus`] command to the given writer.
    pub fn write(self, buf: &mut impl io::Write, transaction_id: f64) -> Result<(), CommandError> {
        Amf0Encoder::encode_string(buf, "onStatus")?;
        Amf0Encoder::encode_number(buf, transaction_id)?;
        // command object is null
        Amf0Encoder::encode_null(buf)?;

        let mut info_object: Vec<(Cow<'_, str>, Amf0Value<'_>)> = Vec::new();

        info_object.push(("level".into(), Amf0Value::String(self.level.to_string().into())));
        info_object.push(("code".into(), Amf0Value::String(self.code)));

        if let Some(description) = self.description {
            info_object.push(("description".into(), Amf0Value::String(description)));
        }

        if let Some(others) = self.others {
            info_object.extend(others.into_owned());
        }

        Amf0Encoder::encode_object(buf, &Cow::Owned(info_object))?;

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use rill_amf0::Amf0Decoder;

    use super::*;
    use crate::command_messages::CommandResultLevel;

    #[test]
    fn write_on_status() {
        let mut buf = Vec::new();

        OnStatus {
            level: CommandResultLevel::Status,
            code: "idk".into(),
            description: Some("description".into()),
            others: Some(Cow::Owned(vec![(
                "testkey".into(),
                Amf0Value::String("testvalue".into()),
            )])),
        }
        .write(&mut buf, 1.0)
        .expect("write");

        let mut decoder = Amf0Decoder::new(&buf);
        let values = decoder.decode_all().unwrap();

        assert_eq!(values.len(), 4);
        assert_eq!(values[0], Amf0Value::String("onStatus".into())); // command name
        assert_eq!(values[1], Amf0Value::Number(1.0)); // transaction id
        assert_eq!(values[2], Amf0Value::Null); // command object
        assert_eq!(
            values[3],
            Amf0Value::Object(Cow::Owned(vec![
                ("level".into(), Amf0Value::String("status".into())),
                ("code".into(), Amf0Value::String("idk".into())),
                ("description".into(), Amf0Value::String("description".into())),
                ("testkey".into(), Amf0Value::String("testvalue".into())),
            ]))
        ); // info object
    }

    #[test]
    fn write_without_description() {
        let mut buf = Vec::new();

        OnStatus {
            level: CommandResultLevel::Status,
            code: "NetStream.Unpublish.Success".into(),
            description: None,
            others: None,
        }
        .write(&mut buf, 0.0)
        .expect("write");

        let mut decoder = Amf0Decoder::new(&buf);
        let values = decoder.decode_all().unwrap();

        assert_eq!(
            values[3],
            Amf0Value::Object(Cow::Owned(vec![
                ("level".into(), Amf0Value::String("status".into())),
                ("code".into(), Amf0Value::String("NetStream.Unpublish.Success".into())),
            ]))
        );
    }
}
