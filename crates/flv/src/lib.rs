//! A pure Rust implementation of the FLV container format, allowing for
//! muxing and demuxing of FLV streams.
//!
//! ## Specifications
//!
//! | Name | Version | Link |
//! | --- | --- | --- |
//! | Video File Format Specification | `10` | <https://github.com/veovera/enhanced-rtmp/blob/main/docs/legacy/video-file-format-v10-0-spec.pdf> |
//! | Adobe Flash Video File Format Specification | `10.1` | <https://github.com/veovera/enhanced-rtmp/blob/main/docs/legacy/video-file-format-v10-1-spec.pdf> |
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(unsafe_code)]
#![deny(unreachable_pub)]

pub mod audio;
pub mod error;
pub mod header;
pub mod tag;
pub mod video;

pub use error::FlvError;
pub use header::FlvHeader;
pub use tag::{FlvTag, FlvTagType};

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io;

    use bytes::Bytes;

    use crate::header::FlvHeader;
    use crate::tag::{FlvTag, FlvTagType};

    #[test]
    fn mux_demux_stream() {
        let mut buf = Vec::new();

        FlvHeader {
            version: 1,
            is_audio_present: true,
            is_video_present: true,
        }
        .mux(&mut buf)
        .unwrap();

        FlvTag {
            tag_type: FlvTagType::Video,
            timestamp: 0x01020304,
            stream_id: 0,
            data: Bytes::from_static(&[0x17, 0x01, 0, 0, 0, 0xAA]),
        }
        .mux(&mut buf)
        .unwrap();

        FlvTag {
            tag_type: FlvTagType::Audio,
            timestamp: 40,
            stream_id: 0,
            data: Bytes::from_static(&[0xAF, 0x01, 0xBB]),
        }
        .mux(&mut buf)
        .unwrap();

        let mut cursor = io::Cursor::new(Bytes::from(buf));
        let header = FlvHeader::demux(&mut cursor).unwrap();
        assert!(header.is_audio_present);
        assert!(header.is_video_present);

        let video = FlvTag::demux(&mut cursor).unwrap();
        assert_eq!(video.tag_type, FlvTagType::Video);
        assert_eq!(video.timestamp, 0x01020304);
        assert_eq!(video.data, Bytes::from_static(&[0x17, 0x01, 0, 0, 0, 0xAA]));

        let audio = FlvTag::demux(&mut cursor).unwrap();
        assert_eq!(audio.tag_type, FlvTagType::Audio);
        assert_eq!(audio.timestamp, 40);
        assert_eq!(audio.data, Bytes::from_static(&[0xAF, 0x01, 0xBB]));
    }
}
