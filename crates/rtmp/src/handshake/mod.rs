//! RTMP handshake.
//!
//! Both ends exchange three fixed-size steps: the client sends C0+C1, the
//! server answers with S0+S1+S2 and the client finishes with C2. S2 echoes
//! C1 and C2 echoes S1, so either side can verify the peer saw its payload.
//!
//! Order of messages:
//! ```text
//! Client -> C0 -> Server
//! Client -> C1 -> Server
//! Client <- S0 <- Server
//! Client <- S1 <- Server
//! Client <- S2 <- Server
//! Client -> C2 -> Server
//! ```

use std::time::SystemTime;

mod client;
mod error;
mod server;

pub use client::{ClientHandshakeState, HandshakeClient};
pub use error::HandshakeError;
pub use server::{HandshakeServer, ServerHandshakeState};

/// The size of C1/S1/C2/S2 (without the version byte).
pub const RTMP_HANDSHAKE_SIZE: usize = 1536;

/// The size of the leading time + zero (or time read) fields of C1/S1.
pub const TIME_VERSION_LENGTH: usize = 8;

/// The RTMP version this implementation speaks.
pub const RTMP_VERSION: u8 = 3;

pub(crate) fn current_time() -> u32 {
    let duration = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH);
    match duration {
        Ok(result) => result.as_millis() as u32,
        _ => 0,
    }
}

/// Compares an echoed handshake payload against the original.
///
/// The *time read* field (bytes 4..8) is rewritten by some peers, so only the
/// epoch and the random body take part in the comparison. A mismatch is
/// reported to the caller, which logs it; it is never fatal.
pub(crate) fn echo_matches(original: &[u8], echoed: &[u8]) -> bool {
    if original.len() != RTMP_HANDSHAKE_SIZE || echoed.len() != RTMP_HANDSHAKE_SIZE {
        return false;
    }

    original[..4] == echoed[..4] && original[TIME_VERSION_LENGTH..] == echoed[TIME_VERSION_LENGTH..]
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;

    use bytes::Bytes;

    use super::*;

    #[test]
    fn echo_ignores_time_read_field() {
        let mut original = vec![0u8; RTMP_HANDSHAKE_SIZE];
        original[..4].copy_from_slice(&[0, 0, 0, 42]);
        original[8] = 0xAB;

        let mut echoed = original.clone();
        // Peers are allowed to rewrite the time read field.
        echoed[4..8].copy_from_slice(&[1, 2, 3, 4]);
        assert!(echo_matches(&original, &echoed));

        echoed[8] = 0xCD;
        assert!(!echo_matches(&original, &echoed));
    }

    /// Runs the client against the server and checks both echo directions
    /// (P5): the server's S2 carries C1's payload and the client's C2
    /// carries S1's payload.
    #[test]
    fn client_against_server() {
        let mut client = HandshakeClient::new(0);
        let mut server = HandshakeServer::default();

        let mut c0c1 = Vec::new();
        client.start(&mut c0c1);
        assert_eq!(c0c1.len(), 1 + RTMP_HANDSHAKE_SIZE);
        assert_eq!(server.expects_bytes(), 1 + RTMP_HANDSHAKE_SIZE);

        let mut s0s1s2 = Vec::new();
        server
            .handshake(&mut io::Cursor::new(Bytes::from(c0c1.clone())), &mut s0s1s2)
            .unwrap();
        assert_eq!(s0s1s2.len(), 1 + 2 * RTMP_HANDSHAKE_SIZE);
        assert_eq!(client.expects_bytes(), 1 + 2 * RTMP_HANDSHAKE_SIZE);

        // S2 must echo C1.
        assert!(echo_matches(&c0c1[1..], &s0s1s2[1 + RTMP_HANDSHAKE_SIZE..]));

        let mut c2 = Vec::new();
        client
            .handshake(&mut io::Cursor::new(Bytes::from(s0s1s2.clone())), &mut c2)
            .unwrap();
        assert!(client.is_finished());
        assert_eq!(c2.len(), RTMP_HANDSHAKE_SIZE);
        assert_eq!(server.expects_bytes(), RTMP_HANDSHAKE_SIZE);

        // C2 must echo S1.
        assert!(echo_matches(&s0s1s2[1..1 + RTMP_HANDSHAKE_SIZE], &c2));

        let mut out = Vec::new();
        server.handshake(&mut io::Cursor::new(Bytes::from(c2)), &mut out).unwrap();
        assert!(server.is_finished());
        assert!(out.is_empty());
        assert_eq!(server.expects_bytes(), 0);
    }
}
