//! Frame header and descriptor.
//!
//! ## Header Layout
//!
//! ```text
//! byte 0   syncword (0x9C for A2DP SBC, 0xAD for mSBC)
//! byte 1   sampling_frequency:2 blocks:2 channel_mode:2 allocation_method:1 subbands:1
//! byte 2   bitpool
//! byte 3   crc_check
//! ```
//!
//! mSBC frames replace bytes 1 and 2 with zeros; their parameters are fixed.
//! The four header bytes fully determine the frame length, which is what
//! makes the two-phase "probe, then read the rest" stream protocol possible.

use std::fmt::Display;

use crate::utils::bitstream_io::{BsIoSliceReader, BsIoSliceWriter};
use crate::utils::errors::FrameError;

pub const SYNCWORD_SBC: u8 = 0x9c;
pub const SYNCWORD_MSBC: u8 = 0xad;

/// Bytes needed to derive a [`FrameDescriptor`].
pub const PROBE_SIZE: usize = 4;

pub const HEADER_SIZE: usize = 4;

pub const MAX_SUBBANDS: usize = 8;
pub const MAX_BLOCKS: usize = 16;
pub const MAX_CHANNELS: usize = 2;

/// Samples per channel in the largest frame.
pub const MAX_SAMPLES: usize = MAX_BLOCKS * MAX_SUBBANDS;

/// Bytes in the largest frame: dual channel, 16 blocks, 8 subbands, bitpool 128.
///
/// Joint stereo at bitpool 255 stays one byte short of this.
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE
    + (4 * MAX_SUBBANDS * MAX_CHANNELS) / 8
    + (MAX_BLOCKS * MAX_CHANNELS * 16 * MAX_SUBBANDS) / 8;

const MSBC_BLOCKS: u8 = 15;
const MSBC_BITPOOL: u8 = 26;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SamplingFrequency {
    Freq16k,
    Freq32k,
    Freq44k1,
    #[default]
    Freq48k,
}

impl SamplingFrequency {
    pub const fn hz(self) -> u32 {
        match self {
            Self::Freq16k => 16000,
            Self::Freq32k => 32000,
            Self::Freq44k1 => 44100,
            Self::Freq48k => 48000,
        }
    }

    pub fn from_hz(hz: u32) -> Result<Self, FrameError> {
        match hz {
            16000 => Ok(Self::Freq16k),
            32000 => Ok(Self::Freq32k),
            44100 => Ok(Self::Freq44k1),
            48000 => Ok(Self::Freq48k),
            _ => Err(FrameError::InvalidFrequency(hz)),
        }
    }

    pub(crate) const fn code(self) -> u8 {
        self as u8
    }

    const fn from_code(code: u8) -> Self {
        match code & 3 {
            0 => Self::Freq16k,
            1 => Self::Freq32k,
            2 => Self::Freq44k1,
            _ => Self::Freq48k,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelMode {
    Mono,
    DualChannel,
    #[default]
    Stereo,
    JointStereo,
}

impl ChannelMode {
    pub const fn channels(self) -> usize {
        match self {
            Self::Mono => 1,
            _ => 2,
        }
    }

    /// Stereo modes share one bitpool between both channels.
    pub const fn shares_bitpool(self) -> bool {
        matches!(self, Self::Stereo | Self::JointStereo)
    }

    pub(crate) const fn code(self) -> u8 {
        self as u8
    }

    const fn from_code(code: u8) -> Self {
        match code & 3 {
            0 => Self::Mono,
            1 => Self::DualChannel,
            2 => Self::Stereo,
            _ => Self::JointStereo,
        }
    }
}

impl Display for ChannelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelMode::Mono => write!(f, "Mono"),
            ChannelMode::DualChannel => write!(f, "Dual-Channel"),
            ChannelMode::Stereo => write!(f, "Stereo"),
            ChannelMode::JointStereo => write!(f, "Joint-Stereo"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllocationMethod {
    #[default]
    Loudness,
    Snr,
}

impl Display for AllocationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AllocationMethod::Loudness => write!(f, "Loudness"),
            AllocationMethod::Snr => write!(f, "SNR"),
        }
    }
}

/// Structural parameters of one frame.
///
/// Derived from the first [`PROBE_SIZE`] bytes when decoding, supplied by
/// configuration when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameDescriptor {
    pub msbc: bool,
    pub frequency: SamplingFrequency,
    pub mode: ChannelMode,
    pub allocation: AllocationMethod,
    pub subbands: u8,
    pub blocks: u8,
    pub bitpool: u8,
}

impl Default for FrameDescriptor {
    fn default() -> Self {
        Self {
            msbc: false,
            frequency: SamplingFrequency::default(),
            mode: ChannelMode::default(),
            allocation: AllocationMethod::default(),
            subbands: 8,
            blocks: 16,
            bitpool: 35,
        }
    }
}

impl FrameDescriptor {
    /// Fixed mSBC (wide-band speech) parameters.
    pub const fn msbc() -> Self {
        Self {
            msbc: true,
            frequency: SamplingFrequency::Freq16k,
            mode: ChannelMode::Mono,
            allocation: AllocationMethod::Loudness,
            subbands: 8,
            blocks: MSBC_BLOCKS,
            bitpool: MSBC_BITPOOL,
        }
    }

    pub const fn channels(&self) -> usize {
        self.mode.channels()
    }

    pub const fn sampling_frequency_hz(&self) -> u32 {
        self.frequency.hz()
    }

    /// PCM samples per channel carried by one frame.
    pub const fn samples_per_channel(&self) -> usize {
        self.blocks as usize * self.subbands as usize
    }

    pub const fn max_bitpool(&self) -> u8 {
        let per_subband = if self.mode.shares_bitpool() { 32 } else { 16 };
        let max = per_subband * self.subbands as usize;
        if max > 255 { 255 } else { max as u8 }
    }

    /// Bits covered by the CRC after header byte 3: join flags and scale factors.
    pub(crate) const fn crc_protected_bits(&self) -> usize {
        let join = match self.mode {
            ChannelMode::JointStereo => self.subbands as usize,
            _ => 0,
        };
        join + 4 * self.subbands as usize * self.channels()
    }

    /// Length in bytes of a frame with these parameters.
    pub const fn frame_size(&self) -> usize {
        let nch = self.channels();
        let nsb = self.subbands as usize;
        let nblk = self.blocks as usize;
        let bitpool = self.bitpool as usize;

        let data_bits = match self.mode {
            ChannelMode::Mono | ChannelMode::DualChannel => nblk * nch * bitpool,
            ChannelMode::Stereo => nblk * bitpool,
            ChannelMode::JointStereo => nsb + nblk * bitpool,
        };

        HEADER_SIZE + (4 * nsb * nch) / 8 + data_bits.div_ceil(8)
    }

    /// Bitrate in bits per second.
    pub const fn bitrate(&self) -> u32 {
        let samples = self.samples_per_channel() as u64;
        let bits = 8 * self.frame_size() as u64 * self.sampling_frequency_hz() as u64;
        (bits / samples) as u32
    }

    /// Checks every field against the ranges the header can express.
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.msbc {
            return if *self == Self::msbc() {
                Ok(())
            } else {
                Err(FrameError::InvalidMsbcParameters)
            };
        }

        if !matches!(self.subbands, 4 | 8) {
            return Err(FrameError::InvalidSubbands(self.subbands));
        }

        if !matches!(self.blocks, 4 | 8 | 12 | 16) {
            return Err(FrameError::InvalidBlocks(self.blocks));
        }

        if self.bitpool > self.max_bitpool() {
            return Err(FrameError::BitpoolOutOfRange {
                bitpool: self.bitpool,
                max: self.max_bitpool(),
                subbands: self.subbands,
            });
        }

        Ok(())
    }

    pub(crate) fn read(reader: &mut BsIoSliceReader) -> Result<Self, FrameError> {
        let syncword: u8 = reader.get_n(8)?;

        let desc = match syncword {
            SYNCWORD_SBC => {
                let frequency = SamplingFrequency::from_code(reader.get_n(2)?);
                let blocks = 4 * (1 + reader.get_n::<u8>(2)?);
                let mode = ChannelMode::from_code(reader.get_n(2)?);
                let allocation = if reader.get()? {
                    AllocationMethod::Snr
                } else {
                    AllocationMethod::Loudness
                };
                let subbands = 4 * (1 + reader.get_n::<u8>(1)?);
                let bitpool = reader.get_n(8)?;

                Self {
                    msbc: false,
                    frequency,
                    mode,
                    allocation,
                    subbands,
                    blocks,
                    bitpool,
                }
            }
            SYNCWORD_MSBC => {
                let reserved_1: u8 = reader.get_n(8)?;
                let reserved_2: u8 = reader.get_n(8)?;
                if reserved_1 != 0 || reserved_2 != 0 {
                    return Err(FrameError::MsbcReservedNonZero(reserved_1, reserved_2));
                }
                Self::msbc()
            }
            sync => return Err(FrameError::InvalidSyncword(sync)),
        };

        desc.validate()?;

        Ok(desc)
    }

    /// Writes the first three header bytes; the CRC byte is filled in later.
    pub(crate) fn write(&self, writer: &mut BsIoSliceWriter) -> std::io::Result<()> {
        if self.msbc {
            writer.put_n(8, SYNCWORD_MSBC)?;
            writer.put_n(16, 0u16)?;
        } else {
            writer.put_n(8, SYNCWORD_SBC)?;
            writer.put_n(2, self.frequency.code())?;
            writer.put_n(2, self.blocks / 4 - 1)?;
            writer.put_n(2, self.mode.code())?;
            writer.put(self.allocation == AllocationMethod::Snr)?;
            writer.put_n(1, self.subbands / 4 - 1)?;
            writer.put_n(8, self.bitpool)?;
        }
        writer.put_n(8, 0u8)
    }
}

/// Derives the frame parameters from a header prefix.
///
/// Looks at no more than [`PROBE_SIZE`] bytes.
pub fn probe(header: &[u8]) -> Result<FrameDescriptor, FrameError> {
    if header.len() < PROBE_SIZE {
        return Err(FrameError::ShortHeader(header.len()));
    }

    let reader = &mut BsIoSliceReader::from_slice(&header[..PROBE_SIZE]);
    FrameDescriptor::read(reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_a2dp_header() {
        // 44.1 kHz, 16 blocks, joint stereo, loudness, 8 subbands, bitpool 53
        let desc = probe(&[0x9c, 0xbd, 0x35, 0x00]).unwrap();
        assert_eq!(desc.frequency, SamplingFrequency::Freq44k1);
        assert_eq!(desc.blocks, 16);
        assert_eq!(desc.mode, ChannelMode::JointStereo);
        assert_eq!(desc.allocation, AllocationMethod::Loudness);
        assert_eq!(desc.subbands, 8);
        assert_eq!(desc.bitpool, 53);
        assert!(!desc.msbc);

        // 16 kHz, 4 blocks, mono, SNR, 4 subbands, bitpool 10
        let desc = probe(&[0x9c, 0x02, 0x0a, 0xff]).unwrap();
        assert_eq!(desc.frequency, SamplingFrequency::Freq16k);
        assert_eq!(desc.blocks, 4);
        assert_eq!(desc.mode, ChannelMode::Mono);
        assert_eq!(desc.allocation, AllocationMethod::Snr);
        assert_eq!(desc.subbands, 4);
    }

    #[test]
    fn probe_msbc_header() {
        let desc = probe(&[0xad, 0x00, 0x00, 0x12]).unwrap();
        assert_eq!(desc, FrameDescriptor::msbc());
        assert_eq!(desc.frame_size(), 57);

        assert!(matches!(
            probe(&[0xad, 0x01, 0x00, 0x00]),
            Err(FrameError::MsbcReservedNonZero(1, 0))
        ));
    }

    #[test]
    fn probe_rejects_bad_input() {
        assert!(matches!(
            probe(&[0x9c, 0xbd]),
            Err(FrameError::ShortHeader(2))
        ));
        assert!(matches!(
            probe(&[0x52, 0x49, 0x46, 0x46]),
            Err(FrameError::InvalidSyncword(0x52))
        ));
        // mono, 4 subbands: bitpool at most 64
        assert!(matches!(
            probe(&[0x9c, 0x00, 65, 0x00]),
            Err(FrameError::BitpoolOutOfRange { max: 64, .. })
        ));
    }

    #[test]
    fn probe_ignores_bytes_past_prefix() {
        let a = probe(&[0x9c, 0xbd, 0x35, 0x00]).unwrap();
        let b = probe(&[0x9c, 0xbd, 0x35, 0x00, 0xde, 0xad, 0xbe, 0xef]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn frame_size_and_bitrate() {
        let mut desc = FrameDescriptor {
            frequency: SamplingFrequency::Freq44k1,
            mode: ChannelMode::JointStereo,
            bitpool: 53,
            ..Default::default()
        };
        // 4 + 8 + ceil((8 + 16 * 53) / 8)
        assert_eq!(desc.frame_size(), 119);
        assert_eq!(desc.bitrate(), 8 * 119 * 44100 / 128);

        desc.mode = ChannelMode::Stereo;
        assert_eq!(desc.frame_size(), 4 + 8 + 106);

        desc.mode = ChannelMode::DualChannel;
        desc.bitpool = 32;
        assert_eq!(desc.frame_size(), 4 + 8 + 128);

        desc.mode = ChannelMode::Mono;
        desc.subbands = 4;
        desc.blocks = 4;
        desc.bitpool = 5;
        // 4 + 2 + ceil(20 / 8)
        assert_eq!(desc.frame_size(), 9);
    }

    #[test]
    fn max_frame_size_bounds_every_descriptor() {
        let modes = [
            ChannelMode::Mono,
            ChannelMode::DualChannel,
            ChannelMode::Stereo,
            ChannelMode::JointStereo,
        ];

        let mut largest = FrameDescriptor::msbc().frame_size();
        for mode in modes {
            for subbands in [4u8, 8] {
                for blocks in [4u8, 8, 12, 16] {
                    let mut desc = FrameDescriptor {
                        mode,
                        subbands,
                        blocks,
                        ..Default::default()
                    };
                    desc.bitpool = desc.max_bitpool();
                    assert!(desc.validate().is_ok(), "{desc:?}");
                    assert!(desc.frame_size() <= MAX_FRAME_SIZE, "{desc:?}");
                    assert!(desc.samples_per_channel() <= MAX_SAMPLES);
                    largest = largest.max(desc.frame_size());
                }
            }
        }
        assert_eq!(largest, MAX_FRAME_SIZE);

        let dual = probe(&[0x9c, 0xf5, 128, 0x00]).unwrap();
        assert_eq!(dual.mode, ChannelMode::DualChannel);
        assert_eq!(dual.frame_size(), 524);
        assert_eq!(MAX_FRAME_SIZE, 524);
    }

    #[test]
    fn header_write_then_probe() {
        let desc = FrameDescriptor {
            frequency: SamplingFrequency::Freq32k,
            mode: ChannelMode::DualChannel,
            allocation: AllocationMethod::Snr,
            subbands: 4,
            blocks: 12,
            bitpool: 18,
            msbc: false,
        };
        let mut buf = [0u8; 4];
        {
            let writer = &mut BsIoSliceWriter::from_slice(&mut buf);
            desc.write(writer).unwrap();
        }
        assert_eq!(probe(&buf).unwrap(), desc);
    }
}
