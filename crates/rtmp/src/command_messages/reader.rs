//! Reading [`Command`].

use std::borrow::Cow;
use std::convert::Infallible;
use std::str::FromStr;

use rill_amf0::Amf0Decoder;

use super::error::CommandError;
use super::netconnection::NetConnectionCommand;
use super::netstream::NetStreamCommand;
use super::on_status::OnStatus;
use super::{Command, CommandResult, CommandResultLevel, CommandType, UnknownCommand};

impl<'a> Command<'a> {
    /// Reads a [`Command`] from the given message payload.
    pub fn read(payload: &'a [u8]) -> Result<Self, CommandError> {
        let mut decoder = Amf0Decoder::new(payload);

        let command_name = decoder.decode_string()?;
        let transaction_id = decoder.decode_number()?;

        let command_type = CommandType::read(command_name, &mut decoder)?;

        Ok(Self {
            transaction_id,
            command_type,
        })
    }
}

impl<'a> CommandType<'a> {
    fn read(command_name: Cow<'a, str>, decoder: &mut Amf0Decoder<'a>) -> Result<Self, CommandError> {
        if let Some(command) = NetConnectionCommand::read(&command_name, decoder)? {
            return Ok(Self::NetConnection(command));
        }

        if let Some(command) = NetStreamCommand::read(&command_name, decoder)? {
            return Ok(Self::NetStream(command));
        }

        match command_name.as_ref() {
            "onStatus" => Ok(Self::OnStatus(OnStatus::read(decoder)?)),
            "_result" | "_error" => Ok(Self::Result(CommandResult {
                is_error: command_name == "_error",
                values: decoder.decode_all()?,
            })),
            _ => Ok(Self::Unknown(UnknownCommand {
                command_name,
                values: decoder.decode_all()?,
            })),
        }
    }
}

impl FromStr for CommandResultLevel {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(Self::Warning),
            "status" => Ok(Self::Status),
            "error" => Ok(Self::Error),
            _ => Ok(Self::Unknown(s.to_string())),
        }
    }
}
