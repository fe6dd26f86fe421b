//! Writing [`NetStreamCommand`].

use std::io;

use rill_amf0::Amf0Encoder;

use super::NetStreamCommand;
use crate::command_messages::error::CommandError;

impl NetStreamCommand<'_> {
    /// Writes a [`NetStreamCommand`] to the given writer.
    pub fn write(self, buf: &mut impl io::Write, transaction_id: f64) -> Result<(), CommandError> {
        match self {
            Self::Publish {
                publishing_name,
                publishing_type,
            } => {
                Amf0Encoder::encode_string(buf, "publish")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
                Amf0Encoder::encode_string(buf, &publishing_name)?;
                Amf0Encoder::encode_string(buf, publishing_type.as_str())?;
            }
            Self::DeleteStream { stream_id } => {
                Amf0Encoder::encode_string(buf, "deleteStream")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
                Amf0Encoder::encode_number(buf, stream_id)?;
            }
            Self::CloseStream => {
                Amf0Encoder::encode_string(buf, "closeStream")?;
                Amf0Encoder::encode_number(buf, transaction_id)?;
                Amf0Encoder::encode_null(buf)?;
            }
        }

        Ok(())
    }
}
