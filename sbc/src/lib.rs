//! Encoder and decoder for the Bluetooth low-complexity sub-band codec (SBC).
//!
//! ## Technical Overview
//!
//! SBC splits audio into 4 or 8 sub-bands with a polyphase filterbank and
//! quantizes each sub-band adaptively from a per-frame bit budget.
//!
//! ### Frame Organization
//!
//! **Header**: syncword, parameters, bitpool and CRC, 4 bytes.
//! **Side information**: joint-stereo flags and 4-bit scale factors.
//! **Audio samples**: `blocks` groups of quantized sub-band samples.
//!
//! ### Variants
//!
//! - A2DP SBC: 16, 32, 44.1 or 48 kHz, mono, dual-channel, stereo or joint-stereo
//! - mSBC: 16 kHz mono wide-band speech with fixed parameters
//!
//! ## Quick Start
//!
//! 1. Derive frame parameters from the first [`PROBE_SIZE`] bytes using [`probe`]
//! 2. Read the remaining `frame_size() - PROBE_SIZE` bytes
//! 3. Decode PCM samples using [`process::decode::Decoder`]
//!
//! ```rust
//! use sbc::{FrameDescriptor, MAX_FRAME_SIZE, PROBE_SIZE, probe};
//! use sbc::process::{decode::Decoder, encode::Encoder};
//!
//! let desc = FrameDescriptor::msbc();
//! let pcm_in = vec![0i16; desc.samples_per_channel()];
//!
//! let mut frame = [0u8; MAX_FRAME_SIZE];
//! let len = Encoder::default().encode(&pcm_in, 1, &desc, &mut frame)?;
//!
//! let probed = probe(&frame[..PROBE_SIZE])?;
//! assert_eq!(probed.frame_size(), len);
//!
//! let mut pcm_out = vec![0i16; probed.samples_per_channel()];
//! Decoder::default().decode(&frame[..len], &probed, &mut pcm_out, 1)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Processing functionality.
///
/// 1. **Filterbank** ([`process::filterbank`]): Polyphase sub-band analysis
///    and synthesis.
///
/// 2. **Decoding** ([`process::decode`]): Frame to PCM.
///
/// 3. **Encoding** ([`process::encode`]): PCM to frame.
pub mod process;

/// Data structures representing SBC format components.
///
/// - **Frames** ([`structs::frame`]): Header fields and derived sizes
/// - **Bit Allocation** ([`structs::allocation`]): Loudness and SNR allocation
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bit-level reading/writing
/// - **CRC Validation** ([`utils::crc`]): Header checksum
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;

pub use process::decode::Decoder;
pub use process::encode::Encoder;
pub use structs::frame::{
    AllocationMethod, ChannelMode, FrameDescriptor, MAX_FRAME_SIZE, MAX_SAMPLES, PROBE_SIZE,
    SamplingFrequency, probe,
};
pub use utils::errors::{DecodeError, EncodeError, FrameError};
