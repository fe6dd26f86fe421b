use std::io::{self, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::Bytes;
use rand::Rng;
use rill_bytes_util::BytesCursorExt;

use super::error::HandshakeError;
use super::{RTMP_HANDSHAKE_SIZE, RTMP_VERSION, TIME_VERSION_LENGTH, current_time, echo_matches};

/// The state of the client handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientHandshakeState {
    /// C0+C1 has been sent, waiting for the server's S0+S1+S2.
    ReadS0S1S2,
    /// The handshake is complete (C2 has been sent).
    Finish,
}

/// Client side of the handshake.
///
/// [`start`](HandshakeClient::start) writes C0+C1;
/// [`handshake`](HandshakeClient::handshake) consumes S0+S1+S2 and writes
/// C2.
pub struct HandshakeClient {
    epoch: u32,
    state: ClientHandshakeState,
    c1_payload: Vec<u8>,
}

impl HandshakeClient {
    /// Create a new client handshake with the given epoch.
    pub fn new(epoch: u32) -> Self {
        Self {
            epoch,
            state: ClientHandshakeState::ReadS0S1S2,
            c1_payload: Vec::new(),
        }
    }

    /// Get the state of the handshake.
    pub fn state(&self) -> ClientHandshakeState {
        self.state
    }

    /// Whether the handshake is complete.
    pub fn is_finished(&self) -> bool {
        self.state == ClientHandshakeState::Finish
    }

    /// The number of bytes the next step needs.
    pub fn expects_bytes(&self) -> usize {
        match self.state {
            ClientHandshakeState::ReadS0S1S2 => 1 + 2 * RTMP_HANDSHAKE_SIZE,
            ClientHandshakeState::Finish => 0,
        }
    }

    /// Write C0+C1 into the output. Call once before reading from the
    /// server.
    pub fn start(&mut self, output: &mut Vec<u8>) {
        let mut c1 = Vec::with_capacity(RTMP_HANDSHAKE_SIZE);

        // Time (4 bytes): the client epoch.
        c1.write_u32::<BigEndian>(self.epoch).expect("write to vec");

        // Zero (4 bytes): this field MUST be all 0s.
        c1.write_u32::<BigEndian>(0).expect("write to vec");

        // Random data (1528 bytes).
        let mut rng = rand::rng();
        for _ in 0..RTMP_HANDSHAKE_SIZE - TIME_VERSION_LENGTH {
            c1.push(rng.random());
        }

        output.push(RTMP_VERSION);
        output.extend_from_slice(&c1);
        self.c1_payload = c1;
    }

    /// Perform the remaining handshake step, reading S0+S1+S2 from the input
    /// and writing C2 to the output.
    pub fn handshake(&mut self, input: &mut io::Cursor<Bytes>, output: &mut Vec<u8>) -> Result<(), HandshakeError> {
        match self.state {
            ClientHandshakeState::ReadS0S1S2 => {
                self.read_s0(input)?;
                let s1_payload = input.extract_bytes(RTMP_HANDSHAKE_SIZE)?;
                self.read_s2(input)?;
                self.write_c2(output, &s1_payload)?;
                self.state = ClientHandshakeState::Finish;
            }
            ClientHandshakeState::Finish => return Err(HandshakeError::AlreadyFinished),
        }

        Ok(())
    }

    fn read_s0(&mut self, input: &mut io::Cursor<Bytes>) -> Result<(), HandshakeError> {
        let version = input.read_u8()?;
        if version != RTMP_VERSION {
            return Err(HandshakeError::UnsupportedVersion(version));
        }

        Ok(())
    }

    fn read_s2(&mut self, input: &mut io::Cursor<Bytes>) -> Result<(), HandshakeError> {
        let s2_payload = input.extract_bytes(RTMP_HANDSHAKE_SIZE)?;

        // S2 should echo C1. Logged only, like the server side.
        if !echo_matches(&self.c1_payload, &s2_payload) {
            tracing::warn!("s2 does not echo c1, continuing anyway");
        }

        Ok(())
    }

    fn write_c2(&mut self, output: &mut Vec<u8>, s1_payload: &[u8]) -> Result<(), HandshakeError> {
        // Time (4 bytes): the timestamp sent in S1.
        output.write_all(&s1_payload[..4])?;

        // Time2 (4 bytes): the timestamp at which S1 was read.
        output.write_u32::<BigEndian>(current_time())?;

        // Random echo (1528 bytes): the random data field sent in S1.
        output.write_all(&s1_payload[TIME_VERSION_LENGTH..])?;

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn c0c1_layout() {
        let mut client = HandshakeClient::new(777);

        let mut c0c1 = Vec::new();
        client.start(&mut c0c1);

        assert_eq!(c0c1.len(), 1 + RTMP_HANDSHAKE_SIZE);
        assert_eq!(c0c1[0], 3); // version
        assert_eq!(&c0c1[1..5], &777u32.to_be_bytes()); // epoch
        assert_eq!(&c0c1[5..9], &[0, 0, 0, 0]); // zero
    }

    #[test]
    fn c2_echoes_s1() {
        let mut client = HandshakeClient::new(0);
        client.start(&mut Vec::new());

        let mut s0s1s2 = vec![3u8];
        for i in 0..2 * RTMP_HANDSHAKE_SIZE {
            s0s1s2.push((i % 251) as u8);
        }
        let s1 = s0s1s2[1..1 + RTMP_HANDSHAKE_SIZE].to_vec();

        let mut c2 = Vec::new();
        client
            .handshake(&mut io::Cursor::new(Bytes::from(s0s1s2)), &mut c2)
            .unwrap();

        assert!(client.is_finished());
        assert_eq!(c2.len(), RTMP_HANDSHAKE_SIZE);
        assert!(echo_matches(&s1, &c2));
    }
}
