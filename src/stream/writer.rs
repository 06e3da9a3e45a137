use std::io::{Read, Write};

use sbc::{Encoder, FrameDescriptor, MAX_FRAME_SIZE};

use crate::container::frame_samples;
use crate::error::SessionError;
use crate::wav::WaveReader;

/// Encodes fixed-size PCM batches into frames written back to back.
///
/// The descriptor is fixed for the whole stream. A final batch shorter than
/// one frame ends the stream and is dropped.
pub struct FrameStreamWriter<W: Write> {
    sink: W,
    desc: FrameDescriptor,
    buf: [u8; MAX_FRAME_SIZE],
    frames: u64,
    bytes: u64,
    truncated: bool,
}

impl<W: Write> FrameStreamWriter<W> {
    pub fn new(sink: W, desc: FrameDescriptor) -> Self {
        Self {
            sink,
            desc,
            buf: [0; MAX_FRAME_SIZE],
            frames: 0,
            bytes: 0,
            truncated: false,
        }
    }

    /// Reads one batch from `source` into `pcm` and writes its frame.
    ///
    /// Returns `false` once the source cannot fill a whole batch.
    pub fn next_frame<R: Read>(
        &mut self,
        source: &mut WaveReader<R>,
        encoder: &mut Encoder,
        pcm: &mut [i16],
    ) -> Result<bool, SessionError> {
        let batch = self.desc.samples_per_channel();
        let got = source.read_pcm(pcm, batch)?;

        if got < batch {
            if got > 0 {
                log::debug!("Dropping trailing {got} of {batch} samples per channel");
                self.truncated = true;
            }
            return Ok(false);
        }

        self.write_frame(encoder, &pcm[..frame_samples(&self.desc)])?;
        Ok(true)
    }

    /// Encodes one interleaved batch and writes its frame.
    pub fn write_frame(&mut self, encoder: &mut Encoder, pcm: &[i16]) -> Result<(), SessionError> {
        let len = encoder.encode(pcm, self.desc.channels(), &self.desc, &mut self.buf)?;
        self.sink.write_all(&self.buf[..len])?;

        self.frames += 1;
        self.bytes += len as u64;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SessionError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn descriptor(&self) -> &FrameDescriptor {
        &self.desc
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    /// Whether a partial final batch was dropped.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}
