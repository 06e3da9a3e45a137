//! Session drivers: one full transcoding run per call.
//!
//! Each driver owns the codec state and the reusable PCM and frame buffers,
//! logs a one-line stream summary, and loops until its stream component
//! reports the end.

use sbc::FrameDescriptor;

pub mod decode;
pub mod encode;
pub mod progress;
pub mod report;

/// One-line human-readable stream description.
pub fn summary(desc: &FrameDescriptor) -> String {
    format!(
        "{} {} Hz -- {:.1} kbps (bitpool {}) -- {} blocks, {} subbands",
        desc.mode,
        desc.sampling_frequency_hz(),
        desc.bitrate() as f64 * 1e-3,
        desc.bitpool,
        desc.blocks,
        desc.subbands
    )
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::decode::{DecodeOptions, decode};
    use super::encode::{EncodeOptions, encode};
    use super::*;
    use crate::container::EncodeConfig;
    use crate::error::SessionError;
    use crate::wav::{ContainerFormat, UNSPECIFIED_SIZE, WaveReader, WaveWriter};
    use sbc::{ChannelMode, MAX_FRAME_SIZE, probe};
    use std::io::Cursor;

    fn wave(rate: u32, channels: u16, samples_per_channel: usize) -> Vec<u8> {
        let mut writer = WaveWriter::new(Vec::new());
        writer
            .write_header(&ContainerFormat::pcm16(rate, channels, None))
            .unwrap();

        let samples: Vec<i16> = (0..samples_per_channel)
            .flat_map(|i| {
                let t = i as f64 / rate as f64;
                (0..channels).map(move |ch| {
                    (6000.0 * (2.0 * PI * 500.0 * (ch + 1) as f64 * t).sin()).round() as i16
                })
            })
            .collect();
        writer.write_pcm(&samples).unwrap();
        writer.finish().unwrap();
        writer.into_inner()
    }

    fn encode_bytes(input: Vec<u8>, config: EncodeConfig) -> Result<Vec<u8>, SessionError> {
        let mut out = Vec::new();
        encode(
            Cursor::new(input),
            &mut out,
            &EncodeOptions {
                config,
                progress: None,
            },
        )?;
        Ok(out)
    }

    fn decode_bytes(input: Vec<u8>) -> Result<(Vec<u8>, report::SessionReport), SessionError> {
        let mut out = Vec::new();
        let report = decode(Cursor::new(input), &mut out, &DecodeOptions::default())?;
        Ok((out, report))
    }

    #[test]
    fn summary_line() {
        let desc = FrameDescriptor::msbc();
        assert_eq!(
            summary(&desc),
            "Mono 16000 Hz -- 60.8 kbps (bitpool 26) -- 15 blocks, 8 subbands"
        );
    }

    #[test]
    fn encode_then_decode() {
        let sbc = encode_bytes(wave(48000, 2, 128 * 10 + 17), EncodeConfig::default()).unwrap();
        let desc = probe(&sbc).unwrap();
        assert_eq!(sbc.len(), 10 * desc.frame_size());

        let (wav, report) = decode_bytes(sbc).unwrap();
        assert_eq!(report.frames, 10);
        assert!(!report.truncated);
        assert!(report.header_patched);

        let mut reader = WaveReader::new(Cursor::new(wav));
        let format = reader.read_header().unwrap();
        assert_eq!(format, ContainerFormat::pcm16(48000, 2, Some(1280)));
    }

    #[test]
    fn mono_input_yields_mono_frames() {
        let config = EncodeConfig {
            mode: ChannelMode::JointStereo,
            ..Default::default()
        };
        let sbc = encode_bytes(wave(32000, 1, 128 * 3), config).unwrap();
        let desc = probe(&sbc).unwrap();
        assert_eq!(desc.mode, ChannelMode::Mono);
        assert_eq!(sbc.len(), 3 * desc.frame_size());
    }

    #[test]
    fn dual_channel_max_bitpool_round_trip() {
        let config = EncodeConfig {
            mode: ChannelMode::DualChannel,
            bitpool: 128,
            ..Default::default()
        };
        let sbc = encode_bytes(wave(48000, 2, 128 * 3), config).unwrap();
        let desc = probe(&sbc).unwrap();
        assert_eq!(desc.frame_size(), MAX_FRAME_SIZE);
        assert_eq!(sbc.len(), 3 * desc.frame_size());

        let (_, report) = decode_bytes(sbc).unwrap();
        assert_eq!(report.frames, 3);
        assert!(!report.truncated);
    }

    #[test]
    fn unsupported_rate_writes_nothing() {
        let mut out = Vec::new();
        let result = encode(
            Cursor::new(wave(22050, 2, 1024)),
            &mut out,
            &EncodeOptions::default(),
        );
        assert!(matches!(result, Err(SessionError::UnsupportedFormat(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn decode_clean_and_truncated_endings() {
        let sbc = encode_bytes(wave(44100, 2, 128 * 4), EncodeConfig::default()).unwrap();
        let size = probe(&sbc).unwrap().frame_size();

        // Ends on a frame boundary.
        let (_, report) = decode_bytes(sbc[..2 * size].to_vec()).unwrap();
        assert_eq!((report.frames, report.truncated), (2, false));

        // Cut inside the third body: the first two frames survive.
        let (wav, report) = decode_bytes(sbc[..2 * size + 20].to_vec()).unwrap();
        assert_eq!((report.frames, report.truncated), (2, true));
        assert_eq!(wav.len(), 44 + 2 * 128 * 4);

        // Cut inside the third header prefix.
        assert!(matches!(
            decode_bytes(sbc[..2 * size + 3].to_vec()),
            Err(SessionError::TruncatedStream { got: 3, .. })
        ));
    }

    #[test]
    fn decode_rejects_empty_and_garbage_input() {
        assert!(matches!(
            decode_bytes(Vec::new()),
            Err(SessionError::Format { offset: 0, .. })
        ));
        assert!(matches!(
            decode_bytes(wave(48000, 2, 16)),
            Err(SessionError::Format { offset: 0, .. })
        ));
    }

    #[test]
    fn first_body_cut_still_writes_header() {
        let sbc = encode_bytes(wave(16000, 1, 128), EncodeConfig::default()).unwrap();
        let (wav, report) = decode_bytes(sbc[..10].to_vec()).unwrap();
        assert_eq!(report.frames, 0);
        assert!(report.truncated);
        assert_eq!(wav.len(), 44);

        let format = WaveReader::new(Cursor::new(wav)).read_header().unwrap();
        assert_eq!(format.sample_rate, 16000);
        assert_eq!(format.channels, 1);
    }

    #[test]
    fn rate_change_is_stream_mismatch() {
        let mut sbc = encode_bytes(wave(48000, 2, 128), EncodeConfig::default()).unwrap();
        sbc.extend(encode_bytes(wave(44100, 2, 128), EncodeConfig::default()).unwrap());

        assert!(matches!(
            decode_bytes(sbc),
            Err(SessionError::StreamMismatch { frame: 1, .. })
        ));
    }

    #[test]
    fn bitpool_change_is_allowed() {
        let mut sbc = encode_bytes(wave(48000, 2, 128), EncodeConfig::default()).unwrap();
        let config = EncodeConfig {
            bitpool: 53,
            ..Default::default()
        };
        sbc.extend(encode_bytes(wave(48000, 2, 128), config).unwrap());

        let (_, report) = decode_bytes(sbc).unwrap();
        assert_eq!(report.frames, 2);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let input = wave(48000, 2, 128 * 6);
        let config = EncodeConfig {
            mode: ChannelMode::JointStereo,
            ..Default::default()
        };
        let a = encode_bytes(input.clone(), config).unwrap();
        let b = encode_bytes(input, config).unwrap();
        assert_eq!(a, b);

        let (wav_a, _) = decode_bytes(a).unwrap();
        let (wav_b, _) = decode_bytes(b).unwrap();
        assert_eq!(wav_a, wav_b);
    }

    #[test]
    fn non_seekable_sink_keeps_unspecified_sizes() {
        struct Pipe(Vec<u8>);

        impl std::io::Write for Pipe {
            fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
                self.0.write(buf)
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        impl crate::wav::PatchableSink for Pipe {
            fn patch(&mut self, _offset: u64, _bytes: &[u8]) -> std::io::Result<bool> {
                Ok(false)
            }
        }

        let sbc = encode_bytes(wave(48000, 2, 256), EncodeConfig::default()).unwrap();
        let mut pipe = Pipe(Vec::new());
        let report = decode(Cursor::new(sbc), &mut pipe, &DecodeOptions::default()).unwrap();
        assert!(!report.header_patched);
        assert_eq!(
            u32::from_le_bytes([pipe.0[40], pipe.0[41], pipe.0[42], pipe.0[43]]),
            UNSPECIFIED_SIZE
        );
    }
}
