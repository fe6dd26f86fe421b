//! Reading [`OnStatus`].

use std::borrow::Cow;

use rill_amf0::Amf0Decoder;

use super::OnStatus;
use crate::command_messages::CommandResultLevel;
use crate::command_messages::error::CommandError;

impl<'a> OnStatus<'a> {
    /// Reads an [`OnStatus`] command from the given decoder.
    ///
    /// The command name and transaction id have already been consumed by the
    /// caller.
    pub fn read(decoder: &mut Amf0Decoder<'a>) -> Result<Self, CommandError> {
        // skip command object
        decoder.decode_null()?;

        let info_object = decoder.decode_object()?;

        let mut level = None;
        let mut code = None;
        let mut description = None;
        let mut others = Vec::new();

        for (key, value) in info_object.into_owned() {
            match key.as_ref() {
                "level" => {
                    level = value.as_str().and_then(|s| s.parse().ok());
                }
                "code" => {
                    code = value.as_str().map(|s| Cow::Owned(s.to_string()));
                }
                "description" => {
                    description = value.as_str().map(|s| Cow::Owned(s.to_string()));
                }
                _ => others.push((key, value)),
            }
        }

        let code = code.ok_or(CommandError::InvalidOnStatusInfoObject)?;

        Ok(Self {
            level: level.unwrap_or(CommandResultLevel::Status),
            code,
            description,
            others: if others.is_empty() { None } else { Some(Cow::Owned(others)) },
        })
    }
}
