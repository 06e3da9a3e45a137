use std::io::Read;

use indicatif::MultiProgress;
use sbc::{Decoder, FrameDescriptor, FrameError, MAX_SAMPLES};

use crate::container::{container_format, frame_samples};
use crate::error::SessionError;
use crate::session::progress::{create_progress_bar, estimate_total_frames};
use crate::session::report::{Direction, SessionReport};
use crate::session::summary;
use crate::stream::reader::FrameStreamReader;
use crate::wav::{PatchableSink, WaveWriter};

#[derive(Default)]
pub struct DecodeOptions<'a> {
    /// Fail on CRC mismatches instead of warning.
    pub strict: bool,
    /// Input length in bytes, for progress estimation.
    pub input_len: Option<u64>,
    pub progress: Option<&'a MultiProgress>,
}

fn check_consistent(first: &FrameDescriptor, desc: &FrameDescriptor, frame: u64) -> Result<(), SessionError> {
    if desc.sampling_frequency_hz() != first.sampling_frequency_hz() {
        return Err(SessionError::StreamMismatch {
            frame,
            detail: format!(
                "sample rate {} Hz, stream started at {} Hz",
                desc.sampling_frequency_hz(),
                first.sampling_frequency_hz()
            ),
        });
    }
    if desc.channels() != first.channels() {
        return Err(SessionError::StreamMismatch {
            frame,
            detail: format!(
                "{} channels, stream started with {}",
                desc.channels(),
                first.channels()
            ),
        });
    }

    Ok(())
}

/// Decodes an SBC stream from `source` into a WAVE file on `sink`.
pub fn decode<R: Read, W: PatchableSink>(
    source: R,
    sink: W,
    options: &DecodeOptions,
) -> Result<SessionReport, SessionError> {
    let mut reader = FrameStreamReader::new(source);
    let mut writer = WaveWriter::new(sink);
    let mut decoder = Decoder::default();
    let mut pcm = [0i16; 2 * MAX_SAMPLES];

    if options.strict {
        decoder.set_fail_level(log::Level::Warn);
    }
    decoder.reset();

    let mut first: Option<FrameDescriptor> = None;
    let mut frames = 0u64;
    let mut samples = 0u64;
    let mut pb = None;

    while let Some(frame) = reader.next_frame()? {
        let desc = frame.desc;

        match first {
            None => {
                log::info!("{}", summary(&desc));
                writer.write_header(&container_format(&desc))?;
                pb = options.progress.map(|multi| {
                    create_progress_bar(
                        multi,
                        estimate_total_frames(options.input_len, desc.frame_size()),
                        "decoding",
                    )
                });
                first = Some(desc);
            }
            Some(first) => check_consistent(&first, &desc, frames)?,
        }

        decoder.decode(frame.data, &desc, &mut pcm, desc.channels())?;
        writer.write_pcm(&pcm[..frame_samples(&desc)])?;
        frames += 1;
        samples += desc.samples_per_channel() as u64;

        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }

    // A stream cut inside its first body still gets a header.
    if first.is_none() {
        let Some(desc) = reader.first_descriptor().copied() else {
            return Err(SessionError::Format {
                offset: 0,
                source: FrameError::ShortHeader(0),
            });
        };
        log::info!("{}", summary(&desc));
        writer.write_header(&container_format(&desc))?;
        first = Some(desc);
    }

    let header_patched = writer.finish()?;
    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let mut report = SessionReport::new(Direction::Decode);
    if let Some(desc) = &first {
        report.set_totals(desc, frames, samples);
    }
    report.truncated = reader.truncated();
    report.header_patched = header_patched;

    log::debug!(
        "Decoded {frames} frames, {} bytes in, {} bytes of samples out",
        reader.offset(),
        writer.data_written()
    );

    Ok(report)
}
