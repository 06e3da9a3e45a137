//! # sbc-tools
//!
//! Streaming transcoders between WAVE PCM and SBC bitstreams, built on the
//! [`sbc`] codec crate. The `dsbc` and `esbc` binaries are thin wrappers
//! around [`session::decode::decode`] and [`session::encode::encode`].
//!
//! ## Pipeline
//!
//! ```text
//! dsbc:  source -> FrameStreamReader -> Decoder -> WaveWriter -> sink
//! esbc:  source -> WaveReader -> FrameStreamWriter(Encoder) -> sink
//! ```
//!
//! Processing is strictly sequential, one frame at a time, with buffers sized
//! once from [`sbc::MAX_FRAME_SIZE`] and [`sbc::MAX_SAMPLES`].
//!
//! ## Example
//!
//! ```
//! use std::io::Cursor;
//! use sbc_tools::session::decode::{decode, DecodeOptions};
//! use sbc_tools::session::encode::{encode, EncodeOptions};
//! use sbc_tools::wav::{ContainerFormat, WaveWriter};
//!
//! let mut wav = WaveWriter::new(Vec::new());
//! wav.write_header(&ContainerFormat::pcm16(48000, 2, None))?;
//! wav.write_pcm(&[0i16; 2 * 256])?;
//! wav.finish()?;
//!
//! let mut sbc = Vec::new();
//! encode(Cursor::new(wav.into_inner()), &mut sbc, &EncodeOptions::default())?;
//!
//! let mut pcm = Vec::new();
//! let report = decode(Cursor::new(sbc), &mut pcm, &DecodeOptions::default())?;
//! assert_eq!(report.frames, 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod byteorder;
pub mod cli;
pub mod container;
pub mod error;
pub mod input;
pub mod output;
pub mod session;
pub mod stream;
pub mod wav;
