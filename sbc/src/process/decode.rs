use log::Level::Warn;

use crate::log_or_err;
use crate::process::filterbank::Synthesis;
use crate::structs::allocation::{ScaleFactors, allocate_bits};
use crate::structs::frame::{
    ChannelMode, FrameDescriptor, HEADER_SIZE, MAX_BLOCKS, MAX_CHANNELS, MAX_SUBBANDS,
};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::crc::frame_crc;
use crate::utils::errors::DecodeError;

type SubbandSamples = [[[f32; MAX_SUBBANDS]; MAX_CHANNELS]; MAX_BLOCKS];

/// Decodes SBC frames into 16-bit PCM.
///
/// Holds the synthesis filter history of both channels, so consecutive
/// frames of one stream must go through the same decoder.
///
/// # Example
///
/// ```rust
/// use sbc::process::decode::Decoder;
/// use sbc::process::encode::Encoder;
/// use sbc::structs::frame::{FrameDescriptor, MAX_FRAME_SIZE, probe};
///
/// let desc = FrameDescriptor::default();
/// let pcm_in = vec![0i16; 2 * desc.samples_per_channel()];
/// let mut frame = [0u8; MAX_FRAME_SIZE];
///
/// let mut encoder = Encoder::default();
/// let len = encoder.encode(&pcm_in, 2, &desc, &mut frame)?;
///
/// let probed = probe(&frame[..len])?;
/// let mut pcm_out = vec![0i16; 2 * probed.samples_per_channel()];
///
/// let mut decoder = Decoder::default();
/// decoder.decode(&frame[..len], &probed, &mut pcm_out, 2)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Decoder {
    state: DecoderState,
}

impl Default for Decoder {
    fn default() -> Self {
        Self {
            state: DecoderState {
                fail_level: log::Level::Error,
                synthesis: Default::default(),
                frames: 0,
            },
        }
    }
}

#[derive(Debug)]
struct DecoderState {
    pub fail_level: log::Level,
    synthesis: [Synthesis; MAX_CHANNELS],
    frames: u64,
}

impl Decoder {
    /// Sets the failure level for validation errors.
    ///
    /// - `log::Level::Error`: CRC mismatches are logged and the frame is
    ///   decoded anyway (default)
    /// - `log::Level::Warn`: CRC mismatches fail the frame (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.state.fail_level = level;
    }

    /// Clears the filter history.
    pub fn reset(&mut self) {
        self.state.synthesis.iter_mut().for_each(Synthesis::reset);
        self.state.frames = 0;
    }

    /// Decodes one complete frame.
    ///
    /// Writes `desc.samples_per_channel()` samples per channel, channel `c`
    /// sample `i` landing at `pcm[i * stride + c]`.
    pub fn decode(
        &mut self,
        frame: &[u8],
        desc: &FrameDescriptor,
        pcm: &mut [i16],
        stride: usize,
    ) -> Result<(), DecodeError> {
        let state = &mut self.state;
        let nch = desc.channels();
        let nsb = desc.subbands as usize;
        let nblk = desc.blocks as usize;

        let expected = desc.frame_size();
        if frame.len() < expected {
            return Err(DecodeError::ShortFrame {
                expected,
                actual: frame.len(),
            });
        }

        let needed = (nblk * nsb - 1) * stride + nch;
        if pcm.len() < needed {
            return Err(DecodeError::PcmBufferTooSmall {
                needed,
                actual: pcm.len(),
            });
        }

        let frame = &frame[..expected];
        let reader = &mut BsIoSliceReader::from_slice(frame);
        reader.skip_n(8 * HEADER_SIZE as u32)?;

        let mut join = [false; MAX_SUBBANDS];
        if desc.mode == ChannelMode::JointStereo {
            for flag in join.iter_mut().take(nsb - 1) {
                *flag = reader.get()?;
            }
            reader.skip_n(1)?;
        }

        let mut scale_factors: ScaleFactors = [[0; MAX_SUBBANDS]; MAX_CHANNELS];
        for sf in scale_factors.iter_mut().take(nch) {
            for sf in sf.iter_mut().take(nsb) {
                *sf = reader.get_n(4)?;
            }
        }

        let calculated = frame_crc(frame, desc.crc_protected_bits());
        let read = frame[3];
        if calculated != read {
            log_or_err!(
                state,
                Warn,
                DecodeError::CrcMismatch { calculated, read }
            );
        }

        let bits = allocate_bits(desc, &scale_factors);

        let mut samples: SubbandSamples = [[[0.0; MAX_SUBBANDS]; MAX_CHANNELS]; MAX_BLOCKS];
        for block in samples.iter_mut().take(nblk) {
            for ch in 0..nch {
                for sb in 0..nsb {
                    let nbits = bits[ch][sb] as u32;
                    if nbits == 0 {
                        block[ch][sb] = 0.0;
                        continue;
                    }

                    let levels = ((1u32 << nbits) - 1) as f32;
                    let scale = (1u32 << (scale_factors[ch][sb] + 1)) as f32;
                    let quantized: u32 = reader.get_n(nbits)?;

                    block[ch][sb] = scale * ((2 * quantized + 1) as f32 / levels - 1.0);
                }
            }
        }

        if desc.mode == ChannelMode::JointStereo {
            for block in samples.iter_mut().take(nblk) {
                for sb in (0..nsb).filter(|&sb| join[sb]) {
                    let mid = block[0][sb];
                    let side = block[1][sb];
                    block[0][sb] = mid + side;
                    block[1][sb] = mid - side;
                }
            }
        }

        let mut out = [0f32; MAX_SUBBANDS];
        for (blk, block) in samples.iter().take(nblk).enumerate() {
            for ch in 0..nch {
                state.synthesis[ch].process(&block[ch][..nsb], &mut out[..nsb]);
                for (sb, &value) in out[..nsb].iter().enumerate() {
                    pcm[(blk * nsb + sb) * stride + ch] = to_pcm16(value);
                }
            }
        }

        state.frames += 1;

        Ok(())
    }

    /// Frames decoded since construction or the last [`reset`](Self::reset).
    pub fn frames(&self) -> u64 {
        self.state.frames
    }
}

#[inline(always)]
fn to_pcm16(value: f32) -> i16 {
    value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}
