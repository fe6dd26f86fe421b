//! Writing [`Command`].

use std::fmt::Display;
use std::io;

use super::{Command, CommandResultLevel, CommandType};
use crate::chunk::writer::ChunkWriter;
use crate::chunk::{CHUNK_STREAM_ID_COMMAND, Chunk};
use crate::error::RtmpError;
use crate::messages::MessageType;

impl AsRef<str> for CommandResultLevel {
    fn as_ref(&self) -> &str {
        match self {
            CommandResultLevel::Warning => "warning",
            CommandResultLevel::Status => "status",
            CommandResultLevel::Error => "error",
            CommandResultLevel::Unknown(s) => s,
        }
    }
}

impl Display for CommandResultLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl Command<'_> {
    /// Writes a [`Command`] to the given writer.
    ///
    /// Received-only command types ([`CommandType::Result`] and
    /// [`CommandType::Unknown`]) are skipped.
    pub fn write(self, io: &mut impl io::Write, writer: &ChunkWriter) -> Result<(), RtmpError> {
        let mut buf = Vec::new();

        match self.command_type {
            CommandType::NetConnection(command) => {
                command.write(&mut buf, self.transaction_id)?;
            }
            CommandType::NetStream(command) => {
                command.write(&mut buf, self.transaction_id)?;
            }
            CommandType::OnStatus(command) => {
                command.write(&mut buf, self.transaction_id)?;
            }
            // don't write responses or unknown commands
            CommandType::Result(_) | CommandType::Unknown { .. } => return Ok(()),
        }

        writer.write_chunk(
            io,
            Chunk::new(CHUNK_STREAM_ID_COMMAND, 0, MessageType::COMMAND_AMF0, 0, buf.into()),
        )?;

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::command_messages::CommandResult;

    #[test]
    fn command_result_level_to_str() {
        assert_eq!(CommandResultLevel::Warning.as_ref(), "warning");
        assert_eq!(CommandResultLevel::Status.as_ref(), "status");
        assert_eq!(CommandResultLevel::Error.as_ref(), "error");
        assert_eq!(CommandResultLevel::Unknown("custom".to_string()).as_ref(), "custom");
    }

    #[test]
    fn command_result_level_into_string() {
        assert_eq!(CommandResultLevel::Status.to_string(), "status");
        assert_eq!(CommandResultLevel::Unknown("custom".to_string()).to_string(), "custom");
    }

    #[test]
    fn received_only_commands_are_skipped() {
        let mut buf = Vec::new();
        let writer = ChunkWriter::default();

        Command {
            command_type: CommandType::Result(CommandResult {
                is_error: false,
                values: Vec::new(),
            }),
            transaction_id: 1.0,
        }
        .write(&mut buf, &writer)
        .unwrap();

        assert!(buf.is_empty());
    }
}
