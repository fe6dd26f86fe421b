use std::io;

use bytes::Bytes;

/// A helper trait to extract [`Bytes`] from a [`io::Cursor<Bytes>`] without
/// copying the underlying data.
pub trait BytesCursorExt {
    /// Extracts the remaining bytes from the cursor.
    ///
    /// This does not do a copy of the bytes and is O(1) time.
    fn extract_remaining(&mut self) -> Bytes;

    /// Extracts exactly `size` bytes from the cursor.
    ///
    /// Returns an [`io::ErrorKind::UnexpectedEof`] error if fewer than `size`
    /// bytes remain; in that case the cursor is not advanced.
    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes>;
}

fn remaining(cursor: &io::Cursor<Bytes>) -> usize {
    cursor.get_ref().len().saturating_sub(cursor.position() as usize)
}

impl BytesCursorExt for io::Cursor<Bytes> {
    fn extract_remaining(&mut self) -> Bytes {
        // We don't really care if we fail here since the desired behavior is
        // to return all bytes remaining in the cursor. If we fail its because
        // there are not enough bytes left in the cursor, so we just return an
        // empty bytes slice.
        self.extract_bytes(remaining(self)).unwrap_or_default()
    }

    fn extract_bytes(&mut self, size: usize) -> io::Result<Bytes> {
        if remaining(self) < size {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "not enough bytes in cursor"));
        }

        let position = self.position() as usize;
        let slice = self.get_ref().slice(position..position + size);
        self.set_position((position + size) as u64);

        Ok(slice)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;

    use bytes::Bytes;

    use super::BytesCursorExt;

    #[test]
    fn extract_bytes() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2, 3, 4, 5]));

        let bytes = cursor.extract_bytes(3).unwrap();
        assert_eq!(bytes, Bytes::from_static(&[1, 2, 3]));

        let bytes = cursor.extract_bytes(2).unwrap();
        assert_eq!(bytes, Bytes::from_static(&[4, 5]));

        let err = cursor.extract_bytes(1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn extract_bytes_does_not_advance_on_error() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2, 3]));

        assert!(cursor.extract_bytes(4).is_err());
        assert_eq!(cursor.position(), 0);

        let bytes = cursor.extract_bytes(3).unwrap();
        assert_eq!(bytes, Bytes::from_static(&[1, 2, 3]));
    }

    #[test]
    fn extract_remaining() {
        let mut cursor = io::Cursor::new(Bytes::from_static(&[1, 2, 3, 4, 5]));
        cursor.set_position(2);

        let bytes = cursor.extract_remaining();
        assert_eq!(bytes, Bytes::from_static(&[3, 4, 5]));

        let bytes = cursor.extract_remaining();
        assert_eq!(bytes, Bytes::new());
    }
}
