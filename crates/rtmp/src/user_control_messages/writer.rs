//! Writing user control messages.

use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use super::{EventMessagePingResponse, EventMessageStreamBegin, EventType};
use crate::chunk::writer::ChunkWriter;
use crate::chunk::{CHUNK_STREAM_ID_PROTOCOL_CONTROL, Chunk};
use crate::messages::MessageType;

impl EventMessageStreamBegin {
    /// Writes an [`EventMessageStreamBegin`] to the given writer.
    pub fn write(&self, io: &mut impl io::Write, writer: &ChunkWriter) -> Result<(), crate::error::RtmpError> {
        let mut data = Vec::new();

        data.write_u16::<BigEndian>(EventType::STREAM_BEGIN.0).expect("write to vec");
        data.write_u32::<BigEndian>(self.stream_id).expect("write to vec");

        writer.write_chunk(
            io,
            Chunk::new(
                CHUNK_STREAM_ID_PROTOCOL_CONTROL,
                0,
                MessageType::USER_CONTROL_EVENT,
                0,
                data.into(),
            ),
        )?;

        Ok(())
    }
}

impl EventMessagePingResponse {
    /// Writes an [`EventMessagePingResponse`] to the given writer.
    pub fn write(&self, io: &mut impl io::Write, writer: &ChunkWriter) -> Result<(), crate::error::RtmpError> {
        let mut data = Vec::new();

        data.write_u16::<BigEndian>(EventType::PING_RESPONSE.0).expect("write to vec");
        data.extend_from_slice(&self.data);

        writer.write_chunk(
            io,
            Chunk::new(
                CHUNK_STREAM_ID_PROTOCOL_CONTROL,
                0,
                MessageType::USER_CONTROL_EVENT,
                0,
                data.into(),
            ),
        )?;

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::*;
    use crate::chunk::ChunkReader;

    #[test]
    fn write_stream_begin() {
        let writer = ChunkWriter::default();
        let mut buf = Vec::new();

        EventMessageStreamBegin { stream_id: 1 }.write(&mut buf, &writer).unwrap();

        let mut reader = ChunkReader::default();
        let mut buffer = BytesMut::from(&buf[..]);

        let chunk = reader.read_chunk(&mut buffer).expect("read chunk").expect("chunk");
        assert_eq!(chunk.basic_header.chunk_stream_id, 0x02);
        assert_eq!(chunk.message_header.msg_type_id.0, 0x04);
        assert_eq!(chunk.message_header.msg_stream_id, 0);
        assert_eq!(chunk.payload, Bytes::from_static(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x01]));
    }

    #[test]
    fn write_ping_response() {
        let writer = ChunkWriter::default();
        let mut buf = Vec::new();

        EventMessagePingResponse {
            data: Bytes::from_static(&[0xDE, 0xAD, 0xBE, 0xEF]),
        }
        .write(&mut buf, &writer)
        .unwrap();

        let mut reader = ChunkReader::default();
        let mut buffer = BytesMut::from(&buf[..]);

        let chunk = reader.read_chunk(&mut buffer).expect("read chunk").expect("chunk");
        assert_eq!(chunk.basic_header.chunk_stream_id, 0x02);
        assert_eq!(chunk.message_header.msg_type_id.0, 0x04);
        assert_eq!(chunk.payload, Bytes::from_static(&[0x00, 0x07, 0xDE, 0xAD, 0xBE, 0xEF]));
    }
}
