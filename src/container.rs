//! Glue between container metadata and frame descriptors.
//!
//! PCM travels through the pipeline channel-interleaved: channel `c` of
//! sample `i` sits at `pcm[i * channels + c]`, which is the codec's
//! pointer-plus-stride view with a stride equal to the channel count.

use sbc::{AllocationMethod, ChannelMode, FrameDescriptor, SamplingFrequency};

use crate::error::SessionError;
use crate::wav::ContainerFormat;

/// Encoder settings fixed for a whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeConfig {
    /// Requested mode for two-channel input; ignored for one channel.
    pub mode: ChannelMode,
    pub allocation: AllocationMethod,
    pub subbands: u8,
    pub blocks: u8,
    pub bitpool: u8,
    pub msbc: bool,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        let desc = FrameDescriptor::default();
        Self {
            mode: desc.mode,
            allocation: desc.allocation,
            subbands: desc.subbands,
            blocks: desc.blocks,
            bitpool: desc.bitpool,
            msbc: false,
        }
    }
}

/// Header for the decoded output of a stream starting with `desc`.
pub fn container_format(desc: &FrameDescriptor) -> ContainerFormat {
    ContainerFormat::pcm16(desc.sampling_frequency_hz(), desc.channels() as u16, None)
}

/// Interleaved PCM samples carried by one frame.
pub fn frame_samples(desc: &FrameDescriptor) -> usize {
    desc.samples_per_channel() * desc.channels()
}

/// Validates an input container and combines it with `config`.
pub fn frame_descriptor(
    format: &ContainerFormat,
    config: &EncodeConfig,
) -> Result<FrameDescriptor, SessionError> {
    let frequency = SamplingFrequency::from_hz(format.sample_rate)
        .map_err(|_| SessionError::UnsupportedFormat(format!("Samplerate {} Hz", format.sample_rate)))?;

    if format.bits_per_sample != 16 || format.sample_bytes != 2 {
        return Err(SessionError::UnsupportedFormat(format!(
            "Bitdepth {} ({}-byte samples)",
            format.bits_per_sample, format.sample_bytes
        )));
    }

    if !(1..=2).contains(&format.channels) {
        return Err(SessionError::UnsupportedFormat(format!(
            "Number of channels {}",
            format.channels
        )));
    }

    if config.msbc {
        if frequency != SamplingFrequency::Freq16k || format.channels != 1 {
            return Err(SessionError::InvalidConfig(format!(
                "mSBC needs 16000 Hz mono input, got {} Hz with {} channels",
                format.sample_rate, format.channels
            )));
        }
        return Ok(FrameDescriptor::msbc());
    }

    let mode = if format.channels == 1 {
        ChannelMode::Mono
    } else if config.mode == ChannelMode::Mono {
        ChannelMode::Stereo
    } else {
        config.mode
    };

    let desc = FrameDescriptor {
        msbc: false,
        frequency,
        mode,
        allocation: config.allocation,
        subbands: config.subbands,
        blocks: config.blocks,
        bitpool: config.bitpool,
    };
    desc.validate()
        .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

    Ok(desc)
}
