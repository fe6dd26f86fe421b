//! Reading user control messages.

use std::io::{self, Cursor};

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Bytes;
use rill_bytes_util::BytesCursorExt;

use super::{EventMessage, EventType};

impl EventMessage {
    /// Reads an [`EventMessage`] from the given payload.
    ///
    /// Event types that are not implemented are still parsed; the session
    /// decides what to do with them.
    pub fn read(payload: &Bytes) -> io::Result<Self> {
        let mut cursor = Cursor::new(payload.clone());
        let event_type = EventType(cursor.read_u16::<BigEndian>()?);
        let data = cursor.extract_remaining();

        Ok(Self { event_type, data })
    }
}
