//! Legacy FLV video tag headers and bodies.

use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Bytes;

use crate::error::FlvError;

/// FLV Video Codec ID
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Video tags)
/// - video_file_format_spec_v10_1.pdf (Annex E.4.3.1 - VIDEODATA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum VideoCodecId {
    /// Sorenson H.263
    SorensonH263 = 2,
    /// Screen Video
    ScreenVideo = 3,
    /// On2 VP6
    On2VP6 = 4,
    /// On2 VP6 with alpha channel
    On2VP6WithAlphaChannel = 5,
    /// Screen Video Version 2
    ScreenVideoVersion2 = 6,
    /// AVC (H.264)
    Avc = 7,
}

/// FLV Frame Type
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum VideoFrameType {
    /// Keyframe (for AVC, a seekable frame)
    Keyframe = 1,
    /// Inter frame (for AVC, a non-seekable frame)
    InterFrame = 2,
    /// Disposable inter frame (H.263 only)
    DisposableInterFrame = 3,
    /// Generated keyframe (reserved for server use)
    GeneratedKeyframe = 4,
    /// Video info/command frame
    VideoInfoOrCommandFrame = 5,
}

/// AVC packet type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum AvcPacketType {
    /// AVC sequence header (AVCDecoderConfigurationRecord)
    SeqHdr = 0,
    /// One or more AVC NALUs
    Nalu = 1,
    /// AVC end of sequence
    EndOfSequence = 2,
}

/// An AVC video tag body as carried inside an FLV video tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvcVideoData {
    /// Keyframe or inter frame.
    pub frame_type: VideoFrameType,
    /// Sequence header, NALU data or end of sequence.
    pub packet_type: AvcPacketType,
    /// Composition time offset (pts - dts) in milliseconds.
    pub composition_time: i32,
    /// AVCDecoderConfigurationRecord bytes or NALU data.
    pub data: Bytes,
}

impl AvcVideoData {
    /// An AVC sequence header carrying the given
    /// AVCDecoderConfigurationRecord.
    pub fn sequence_header(decoder_configuration_record: Bytes) -> Self {
        Self {
            frame_type: VideoFrameType::Keyframe,
            packet_type: AvcPacketType::SeqHdr,
            composition_time: 0,
            data: decoder_configuration_record,
        }
    }

    /// An AVC NALU frame.
    pub fn nalu(is_key_frame: bool, composition_time: i32, data: Bytes) -> Self {
        Self {
            frame_type: if is_key_frame {
                VideoFrameType::Keyframe
            } else {
                VideoFrameType::InterFrame
            },
            packet_type: AvcPacketType::Nalu,
            composition_time,
            data,
        }
    }

    /// Mux the tag body, including the one-byte VIDEODATA header and the
    /// AVCVIDEOPACKET prefix.
    pub fn mux(&self, writer: &mut impl io::Write) -> Result<(), FlvError> {
        writer.write_u8(((self.frame_type as u8) << 4) | (VideoCodecId::Avc as u8))?;
        writer.write_u8(self.packet_type as u8)?;
        writer.write_u24::<BigEndian>((self.composition_time as u32) & 0x00FF_FFFF)?;
        writer.write_all(&self.data)?;

        Ok(())
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn mux_sequence_header() {
        let mut buf = Vec::new();
        AvcVideoData::sequence_header(Bytes::from_static(&[0x01, 0x64, 0x00, 0x1F]))
            .mux(&mut buf)
            .unwrap();

        // 0x17 = keyframe + AVC
        assert_eq!(buf, vec![0x17, 0x00, 0x00, 0x00, 0x00, 0x01, 0x64, 0x00, 0x1F]);
    }

    #[test]
    fn mux_inter_frame_with_composition_time() {
        let mut buf = Vec::new();
        AvcVideoData::nalu(false, 0x0102, Bytes::from_static(&[0xAA])).mux(&mut buf).unwrap();

        // 0x27 = inter frame + AVC
        assert_eq!(buf, vec![0x27, 0x01, 0x00, 0x01, 0x02, 0xAA]);
    }

    #[test]
    fn negative_composition_time_wraps_to_24_bits() {
        let mut buf = Vec::new();
        AvcVideoData::nalu(true, -1, Bytes::new()).mux(&mut buf).unwrap();

        assert_eq!(buf, vec![0x17, 0x01, 0xFF, 0xFF, 0xFF]);
    }
}
