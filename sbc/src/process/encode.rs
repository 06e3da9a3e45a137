use crate::process::filterbank::Analysis;
use crate::structs::allocation::{ScaleFactors, allocate_bits};
use crate::structs::frame::{ChannelMode, FrameDescriptor, MAX_BLOCKS, MAX_CHANNELS, MAX_SUBBANDS};
use crate::utils::bitstream_io::BsIoSliceWriter;
use crate::utils::crc::frame_crc;
use crate::utils::errors::EncodeError;

type SubbandSamples = [[[f32; MAX_SUBBANDS]; MAX_CHANNELS]; MAX_BLOCKS];

const MAX_SCALE_FACTOR: u8 = 15;

/// Encodes 16-bit PCM into SBC frames.
///
/// Holds the analysis filter history of both channels. The descriptor may
/// change between calls; the history carries over regardless.
#[derive(Debug, Default)]
pub struct Encoder {
    analysis: [Analysis; MAX_CHANNELS],
    frames: u64,
}

impl Encoder {
    /// Clears the filter history.
    pub fn reset(&mut self) {
        self.analysis.iter_mut().for_each(Analysis::reset);
        self.frames = 0;
    }

    /// Encodes `desc.samples_per_channel()` samples per channel into `out`.
    ///
    /// Channel `c` sample `i` is read from `pcm[i * stride + c]`. Returns the
    /// number of bytes written, always `desc.frame_size()`.
    pub fn encode(
        &mut self,
        pcm: &[i16],
        stride: usize,
        desc: &FrameDescriptor,
        out: &mut [u8],
    ) -> Result<usize, EncodeError> {
        desc.validate()?;

        let nch = desc.channels();
        let nsb = desc.subbands as usize;
        let nblk = desc.blocks as usize;

        let needed = (nblk * nsb - 1) * stride + nch;
        if pcm.len() < needed {
            return Err(EncodeError::PcmTooShort {
                needed,
                actual: pcm.len(),
            });
        }

        let size = desc.frame_size();
        if out.len() < size {
            return Err(EncodeError::OutputTooSmall {
                needed: size,
                actual: out.len(),
            });
        }

        let mut samples: SubbandSamples = [[[0.0; MAX_SUBBANDS]; MAX_CHANNELS]; MAX_BLOCKS];
        let mut input = [0f32; MAX_SUBBANDS];
        for (blk, block) in samples.iter_mut().take(nblk).enumerate() {
            for ch in 0..nch {
                for (i, x) in input[..nsb].iter_mut().enumerate() {
                    *x = pcm[(blk * nsb + i) * stride + ch] as f32;
                }
                self.analysis[ch].process(&input[..nsb], &mut block[ch][..nsb]);
            }
        }

        let mut scale_factors: ScaleFactors = [[0; MAX_SUBBANDS]; MAX_CHANNELS];
        for ch in 0..nch {
            for sb in 0..nsb {
                scale_factors[ch][sb] = scale_factor(samples[..nblk].iter().map(|b| b[ch][sb]));
            }
        }

        let mut join = [false; MAX_SUBBANDS];
        if desc.mode == ChannelMode::JointStereo {
            for sb in 0..nsb - 1 {
                let mid = scale_factor(samples[..nblk].iter().map(|b| (b[0][sb] + b[1][sb]) / 2.0));
                let side =
                    scale_factor(samples[..nblk].iter().map(|b| (b[0][sb] - b[1][sb]) / 2.0));

                if mid + side < scale_factors[0][sb] + scale_factors[1][sb] {
                    join[sb] = true;
                    scale_factors[0][sb] = mid;
                    scale_factors[1][sb] = side;
                    for block in samples[..nblk].iter_mut() {
                        let (left, right) = (block[0][sb], block[1][sb]);
                        block[0][sb] = (left + right) / 2.0;
                        block[1][sb] = (left - right) / 2.0;
                    }
                }
            }
        }

        let bits = allocate_bits(desc, &scale_factors);

        let out = &mut out[..size];
        out.fill(0);
        {
            let writer = &mut BsIoSliceWriter::from_slice(out);
            desc.write(writer)?;

            if desc.mode == ChannelMode::JointStereo {
                for &flag in &join[..nsb] {
                    writer.put(flag)?;
                }
            }

            for sf in &scale_factors[..nch] {
                for &sf in &sf[..nsb] {
                    writer.put_n(4, sf)?;
                }
            }

            for block in &samples[..nblk] {
                for ch in 0..nch {
                    for sb in 0..nsb {
                        let nbits = bits[ch][sb] as u32;
                        let quantized = quantize(block[ch][sb], scale_factors[ch][sb], nbits);
                        writer.put_n(nbits, quantized)?;
                    }
                }
            }

            writer.align()?;
        }

        let crc = frame_crc(out, desc.crc_protected_bits());
        out[3] = crc;
        self.frames += 1;

        Ok(size)
    }

    /// Frames encoded since construction or the last [`reset`](Self::reset).
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

/// Smallest `sf` with every `|s| < 2^(sf + 1)`, saturating at 15.
fn scale_factor(samples: impl Iterator<Item = f32>) -> u8 {
    let peak = samples.fold(0f32, |peak, s| peak.max(s.abs()));
    let mut sf = 0;
    while sf < MAX_SCALE_FACTOR && peak >= (1u32 << (sf + 1)) as f32 {
        sf += 1;
    }
    sf
}

fn quantize(sample: f32, sf: u8, nbits: u32) -> u32 {
    if nbits == 0 {
        return 0;
    }
    let levels = ((1u32 << nbits) - 1) as f32;
    let scale = (1u32 << (sf + 1)) as f32;
    let q = ((sample / scale + 1.0) * levels / 2.0).floor();
    q.clamp(0.0, levels - 1.0) as u32
}
