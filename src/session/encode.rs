use std::io::{Read, Write};

use indicatif::MultiProgress;
use sbc::{Encoder, MAX_SAMPLES};

use crate::container::{EncodeConfig, frame_descriptor};
use crate::error::SessionError;
use crate::session::progress::create_progress_bar;
use crate::session::report::{Direction, SessionReport};
use crate::session::summary;
use crate::stream::writer::FrameStreamWriter;
use crate::wav::WaveReader;

#[derive(Default)]
pub struct EncodeOptions<'a> {
    pub config: EncodeConfig,
    pub progress: Option<&'a MultiProgress>,
}

/// Encodes a WAVE file from `source` into an SBC stream on `sink`.
///
/// The container header is validated before anything is written.
pub fn encode<R: Read, W: Write>(
    source: R,
    sink: W,
    options: &EncodeOptions,
) -> Result<SessionReport, SessionError> {
    let mut wav = WaveReader::new(source);
    let format = wav.read_header()?;
    let desc = frame_descriptor(&format, &options.config)?;

    if format.channels == 1 && options.config.mode != desc.mode && !desc.msbc {
        log::debug!("Mono input, encoding {} instead of {}", desc.mode, options.config.mode);
    }
    log::info!("{}", summary(&desc));

    let mut encoder = Encoder::default();
    let mut pcm = [0i16; 2 * MAX_SAMPLES];
    encoder.reset();

    let pb = options.progress.map(|multi| {
        let total = format
            .sample_count
            .map(|count| count / desc.samples_per_channel() as u64);
        create_progress_bar(multi, total, "encoding")
    });

    let mut writer = FrameStreamWriter::new(sink, desc);
    while writer.next_frame(&mut wav, &mut encoder, &mut pcm)? {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    writer.flush()?;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    let frames = writer.frames();
    let mut report = SessionReport::new(Direction::Encode);
    report.set_totals(&desc, frames, frames * desc.samples_per_channel() as u64);
    report.truncated = writer.truncated();

    log::debug!(
        "Encoded {frames} frames, {} bytes out",
        writer.bytes_written()
    );

    Ok(report)
}
