//! Legacy FLV audio tag headers and bodies.

use std::io;

use byteorder::WriteBytesExt;
use bytes::Bytes;

use crate::error::FlvError;

/// FLV Sound Format
///
/// Denotes the type of the underlying data packet. Only AAC is produced by
/// this crate, but the full id space is kept for demuxing.
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Audio tags)
/// - video_file_format_spec_v10_1.pdf (Annex E.4.2.1 - AUDIODATA)
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum SoundFormat {
    /// Linear PCM, platform endian
    LinearPcmPlatformEndian = 0,
    /// ADPCM
    Adpcm = 1,
    /// MP3
    Mp3 = 2,
    /// Linear PCM, little endian
    LinearPcmLittleEndian = 3,
    /// Nellymoser 16Khz Mono
    Nellymoser16KhzMono = 4,
    /// Nellymoser 8Khz Mono
    Nellymoser8KhzMono = 5,
    /// Nellymoser
    Nellymoser = 6,
    /// G.711 A-Law logarithmic PCM
    G711ALaw = 7,
    /// G.711 Mu-Law logarithmic PCM
    G711MuLaw = 8,
    /// AAC
    Aac = 10,
    /// Speex
    Speex = 11,
    /// Mp3 8Khz
    Mp38Khz = 14,
    /// Device specific sound
    DeviceSpecificSound = 15,
}

/// FLV Sound Rate
///
/// Denotes the sampling rate of the audio data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum SoundRate {
    /// 5.5 KHz
    Hz5500 = 0,
    /// 11 KHz
    Hz11000 = 1,
    /// 22 KHz
    Hz22000 = 2,
    /// 44 KHz
    Hz44000 = 3,
}

impl SoundRate {
    /// Picks the closest FLV rate id for a sample rate in Hz.
    ///
    /// AAC is always signalled as 44 KHz; the real rate lives in the
    /// AudioSpecificConfig.
    pub fn from_sample_rate(sample_rate: u32) -> Self {
        match sample_rate {
            0..=5512 => SoundRate::Hz5500,
            5513..=11025 => SoundRate::Hz11000,
            11026..=22050 => SoundRate::Hz22000,
            _ => SoundRate::Hz44000,
        }
    }
}

/// FLV Sound Size
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum SoundSize {
    /// 8 bit
    Bit8 = 0,
    /// 16 bit
    Bit16 = 1,
}

/// FLV Sound Type
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum SoundType {
    /// Mono
    Mono = 0,
    /// Stereo
    Stereo = 1,
}

/// AAC packet type.
///
/// Distinguishes the AudioSpecificConfig from raw AAC frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, num_derive::FromPrimitive)]
#[repr(u8)]
pub enum AacPacketType {
    /// AAC sequence header (AudioSpecificConfig)
    SeqHdr = 0,
    /// Raw AAC frame
    Raw = 1,
}

/// An AAC audio tag body as carried inside an FLV audio tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AacAudioData {
    /// The sampling rate id.
    pub sound_rate: SoundRate,
    /// Mono or stereo.
    pub sound_type: SoundType,
    /// Sequence header or raw frame.
    pub packet_type: AacPacketType,
    /// AudioSpecificConfig bytes or a raw AAC frame.
    pub data: Bytes,
}

impl AacAudioData {
    /// An AAC sequence header carrying the given AudioSpecificConfig.
    pub fn sequence_header(channels: u8, sample_rate: u32, audio_specific_config: Bytes) -> Self {
        Self {
            sound_rate: SoundRate::from_sample_rate(sample_rate),
            sound_type: if channels <= 1 { SoundType::Mono } else { SoundType::Stereo },
            packet_type: AacPacketType::SeqHdr,
            data: audio_specific_config,
        }
    }

    /// A raw AAC frame.
    pub fn raw(sound_rate: SoundRate, sound_type: SoundType, data: Bytes) -> Self {
        Self {
            sound_rate,
            sound_type,
            packet_type: AacPacketType::Raw,
            data,
        }
    }

    /// Mux the tag body, including the one-byte AUDIODATA header.
    pub fn mux(&self, writer: &mut impl io::Write) -> Result<(), FlvError> {
        let header = ((SoundFormat::Aac as u8) << 4)
            | ((self.sound_rate as u8) << 2)
            | ((SoundSize::Bit16 as u8) << 1)
            | (self.sound_type as u8);

        writer.write_u8(header)?;
        writer.write_u8(self.packet_type as u8)?;
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
        AacAudioData::sequence_header(2, 44100, Bytes::from_static(&[0x12, 0x10]))
            .mux(&mut buf)
            .unwrap();

        // 0xAF = AAC, 44 KHz, 16 bit, stereo
        assert_eq!(buf, vec![0xAF, 0x00, 0x12, 0x10]);
    }

    #[test]
    fn mux_raw_frame() {
        let mut buf = Vec::new();
        AacAudioData::raw(SoundRate::Hz44000, SoundType::Stereo, Bytes::from_static(&[0xDE, 0xAD]))
            .mux(&mut buf)
            .unwrap();

        assert_eq!(buf, vec![0xAF, 0x01, 0xDE, 0xAD]);
    }

    #[test]
    fn sound_rate_from_sample_rate() {
        assert_eq!(SoundRate::from_sample_rate(5500), SoundRate::Hz5500);
        assert_eq!(SoundRate::from_sample_rate(11025), SoundRate::Hz11000);
        assert_eq!(SoundRate::from_sample_rate(22050), SoundRate::Hz22000);
        assert_eq!(SoundRate::from_sample_rate(44100), SoundRate::Hz44000);
        assert_eq!(SoundRate::from_sample_rate(48000), SoundRate::Hz44000);
    }
}
