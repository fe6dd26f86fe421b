use std::io::{self, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use rand::Rng;
use rill_bytes_util::BytesCursorExt;

use super::error::HandshakeError;
use super::{RTMP_HANDSHAKE_SIZE, RTMP_VERSION, TIME_VERSION_LENGTH, current_time, echo_matches};

/// The state of the server handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerHandshakeState {
    /// Waiting for the client's C0+C1.
    ReadC0C1,
    /// S0+S1+S2 has been sent, waiting for the client's C2.
    ReadC2,
    /// The handshake is complete.
    Finish,
}

/// Server side of the handshake.
///
/// Drives the C0C1 -> S0S1S2 -> C2 exchange. Each call to
/// [`handshake`](HandshakeServer::handshake) consumes exactly one step from
/// the input and appends the reply (if any) to the output.
pub struct HandshakeServer {
    state: ServerHandshakeState,
    c1_payload: Bytes,
    s1_payload: Vec<u8>,
}

impl Default for HandshakeServer {
    fn default() -> Self {
        Self {
            state: ServerHandshakeState::ReadC0C1,
            c1_payload: Bytes::new(),
            s1_payload: Vec::new(),
        }
    }
}

impl HandshakeServer {
    /// Get the state of the handshake.
    pub fn state(&self) -> ServerHandshakeState {
        self.state
    }

    /// Whether the handshake is complete.
    pub fn is_finished(&self) -> bool {
        self.state == ServerHandshakeState::Finish
    }

    /// The number of bytes the next step needs.
    pub fn expects_bytes(&self) -> usize {
        match self.state {
            ServerHandshakeState::ReadC0C1 => 1 + RTMP_HANDSHAKE_SIZE,
            ServerHandshakeState::ReadC2 => RTMP_HANDSHAKE_SIZE,
            ServerHandshakeState::Finish => 0,
        }
    }

    /// Perform one handshake step, reading from the input and writing to the
    /// output.
    pub fn handshake(&mut self, input: &mut io::Cursor<Bytes>, output: &mut Vec<u8>) -> Result<(), HandshakeError> {
        match self.state {
            ServerHandshakeState::ReadC0C1 => {
                self.read_c0(input)?;
                self.read_c1(input)?;
                self.write_s0(output)?;
                self.write_s1(output)?;
                self.write_s2(output)?;
                self.state = ServerHandshakeState::ReadC2;
            }
            ServerHandshakeState::ReadC2 => {
                self.read_c2(input)?;
                self.state = ServerHandshakeState::Finish;
            }
            ServerHandshakeState::Finish => return Err(HandshakeError::AlreadyFinished),
        }

        Ok(())
    }

    fn read_c0(&mut self, input: &mut io::Cursor<Bytes>) -> Result<(), HandshakeError> {
        // Version (8 bits): In C0, this field identifies the RTMP version
        // requested by the client. Only version 3 is spoken here.
        let requested_version = input.read_u8()?;
        if requested_version != RTMP_VERSION {
            return Err(HandshakeError::UnsupportedVersion(requested_version));
        }

        Ok(())
    }

    fn read_c1(&mut self, input: &mut io::Cursor<Bytes>) -> Result<(), HandshakeError> {
        // C1 is the client epoch, four zero bytes and 1528 bytes of random
        // data. The whole payload is kept so S2 can echo it.
        self.c1_payload = input.extract_bytes(RTMP_HANDSHAKE_SIZE)?;

        Ok(())
    }

    fn read_c2(&mut self, input: &mut io::Cursor<Bytes>) -> Result<(), HandshakeError> {
        let c2_payload = input.extract_bytes(RTMP_HANDSHAKE_SIZE)?;

        // C2 should echo S1. Some clients rewrite the time read field or send
        // garbage here, so a mismatch is only logged.
        if !echo_matches(&self.s1_payload, &c2_payload) {
            tracing::warn!("c2 does not echo s1, continuing anyway");
        }

        Ok(())
    }

    fn write_s0(&mut self, output: &mut Vec<u8>) -> Result<(), HandshakeError> {
        // Version (8 bits): the version selected by the server.
        output.write_u8(RTMP_VERSION)?;

        Ok(())
    }

    fn write_s1(&mut self, output: &mut Vec<u8>) -> Result<(), HandshakeError> {
        let mut s1 = Vec::with_capacity(RTMP_HANDSHAKE_SIZE);

        // Time (4 bytes): the server epoch.
        s1.write_u32::<BigEndian>(current_time())?;

        // Zero (4 bytes): this field MUST be all 0s.
        s1.write_u32::<BigEndian>(0)?;

        // Random data (1528 bytes). There is no need for
        // cryptographically-secure randomness here, the peer only echoes it
        // back.
        let mut rng = rand::rng();
        for _ in 0..RTMP_HANDSHAKE_SIZE - TIME_VERSION_LENGTH {
            s1.write_u8(rng.random())?;
        }

        output.write_all(&s1)?;
        self.s1_payload = s1;

        Ok(())
    }

    fn write_s2(&mut self, output: &mut Vec<u8>) -> Result<(), HandshakeError> {
        // Time (4 bytes): this field MUST contain the timestamp sent in C1.
        let c1_timestamp = (&self.c1_payload[..4]).read_u32::<BigEndian>()?;
        output.write_u32::<BigEndian>(c1_timestamp)?;

        // Time2 (4 bytes): the timestamp at which C1 was read.
        output.write_u32::<BigEndian>(current_time())?;

        // Random echo (1528 bytes): the random data field sent in C1.
        output.write_all(&self.c1_payload[TIME_VERSION_LENGTH..])?;

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn server_handshake() {
        let mut handshake_server = HandshakeServer::default();

        let mut c0c1 = Vec::with_capacity(1528 + 9);
        c0c1.write_u8(3).unwrap(); // version
        c0c1.write_u32::<BigEndian>(123).unwrap(); // timestamp
        c0c1.write_u32::<BigEndian>(0).unwrap(); // zero

        for i in 0..1528 {
            c0c1.write_u8((i % 256) as u8).unwrap();
        }

        let c0c1 = Bytes::from(c0c1);

        let mut writer = Vec::new();
        handshake_server
            .handshake(&mut io::Cursor::new(c0c1.clone()), &mut writer)
            .unwrap();

        let mut reader = io::Cursor::new(writer);
        assert_eq!(reader.read_u8().unwrap(), 3); // version
        let timestamp = reader.read_u32::<BigEndian>().unwrap(); // timestamp
        assert_eq!(reader.read_u32::<BigEndian>().unwrap(), 0); // zero

        let mut server_random = vec![0; 1528];
        reader.read_exact(&mut server_random).unwrap();

        assert_eq!(reader.read_u32::<BigEndian>().unwrap(), 123); // our timestamp
        let timestamp2 = reader.read_u32::<BigEndian>().unwrap(); // server timestamp

        assert!(timestamp2 >= timestamp);

        let mut read_client_random = vec![0; 1528];
        reader.read_exact(&mut read_client_random).unwrap();

        assert_eq!(&c0c1[9..], &read_client_random);

        let mut c2 = Vec::with_capacity(1528 + 8);
        c2.write_u32::<BigEndian>(timestamp).unwrap(); // timestamp
        c2.write_u32::<BigEndian>(124).unwrap(); // our timestamp
        c2.write_all(&server_random).unwrap();

        let mut writer = Vec::new();
        handshake_server
            .handshake(&mut io::Cursor::new(Bytes::from(c2)), &mut writer)
            .unwrap();

        assert!(writer.is_empty());
        assert_eq!(handshake_server.state(), ServerHandshakeState::Finish);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut handshake_server = HandshakeServer::default();

        let mut c0c1 = vec![6u8]; // RTMPE
        c0c1.extend_from_slice(&[0; RTMP_HANDSHAKE_SIZE]);

        let err = handshake_server
            .handshake(&mut io::Cursor::new(Bytes::from(c0c1)), &mut Vec::new())
            .unwrap_err();

        assert!(matches!(err, HandshakeError::UnsupportedVersion(6)));
    }

    #[test]
    fn step_after_finish_is_an_error() {
        let mut handshake_server = HandshakeServer::default();

        let mut c0c1 = vec![3u8];
        c0c1.extend_from_slice(&[0; RTMP_HANDSHAKE_SIZE]);

        let mut writer = Vec::new();
        handshake_server
            .handshake(&mut io::Cursor::new(Bytes::from(c0c1)), &mut writer)
            .unwrap();

        let c2 = writer[1..1 + RTMP_HANDSHAKE_SIZE].to_vec();
        handshake_server
            .handshake(&mut io::Cursor::new(Bytes::from(c2.clone())), &mut Vec::new())
            .unwrap();

        let err = handshake_server
            .handshake(&mut io::Cursor::new(Bytes::from(c2)), &mut Vec::new())
            .unwrap_err();
        assert!(matches!(err, HandshakeError::AlreadyFinished));
    }
}
