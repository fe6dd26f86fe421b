//! Utilities for working with [`Bytes`](bytes::Bytes) buffers.
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(unreachable_pub)]

mod cursor;

pub use cursor::BytesCursorExt;
