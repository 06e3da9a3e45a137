//! RIFF/WAVE container for 16-bit linear PCM.
//!
//! The writer always emits the canonical 44-byte header. When the total
//! length is not known upfront both size fields carry `0xFFFFFFFF`, and
//! [`WaveWriter::finish`] patches them if the sink can seek back.

use std::io::{self, Read, Write};

use sbc_macros::{ToBytes, riff_chunk};

use crate::byteorder::WriteBytesLe;
use crate::input::read_full;
use crate::join_bytes_le;

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Size field value meaning "unknown length".
pub const UNSPECIFIED_SIZE: u32 = 0xFFFF_FFFF;

const RIFF_SIZE_OFFSET: u64 = 4;
const DATA_SIZE_OFFSET: u64 = 40;

/// `fmt ` body length of the extensible layout.
const FMT_EXTENSIBLE_SIZE: usize = 40;

/// Bytes between the RIFF size field and the start of the sample data.
const HEADER_OVERHEAD: u32 = 36;

#[derive(thiserror::Error, Debug)]
pub enum ContainerError {
    #[error("Not a RIFF file")]
    NotRiff,

    #[error("RIFF form type is not WAVE")]
    NotWave,

    #[error("Missing {0:?} chunk")]
    MissingChunk(&'static str),

    #[error("Malformed {0:?} chunk")]
    MalformedChunk(&'static str),

    #[error("Unsupported WAVE format tag {0:#06X}")]
    UnsupportedFormatTag(u16),

    #[error("WAVE header truncated")]
    Truncated,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Container metadata exchanged with the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// Bytes per sample in the container, per channel.
    pub sample_bytes: u16,
    /// Sample frames in the data chunk; `None` when unspecified.
    pub sample_count: Option<u64>,
}

impl ContainerFormat {
    pub fn pcm16(sample_rate: u32, channels: u16, sample_count: Option<u64>) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample: 16,
            sample_bytes: 2,
            sample_count,
        }
    }

    pub fn block_align(&self) -> usize {
        self.sample_bytes as usize * self.channels as usize
    }

    fn data_size(&self) -> Option<u32> {
        self.sample_count
            .and_then(|count| count.checked_mul(self.block_align() as u64))
            .and_then(|size| u32::try_from(size).ok())
            .filter(|&size| size <= UNSPECIFIED_SIZE - HEADER_OVERHEAD - 1)
    }
}

pub trait RiffChunk {
    fn chunk_id(&self) -> &[u8; 4];
    fn chunk_data(&self) -> Vec<u8>;

    fn write_all<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let data = self.chunk_data();
        writer.write_all(&join_bytes_le!(*self.chunk_id(), data.len() as u32))?;
        writer.write_all(&data)?;
        if data.len() % 2 == 1 {
            writer.write_all(&[0])?;
        }

        Ok(())
    }
}

#[derive(Debug, ToBytes)]
#[riff_chunk(b"fmt ")]
pub struct FormatChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl From<&ContainerFormat> for FormatChunk {
    fn from(format: &ContainerFormat) -> Self {
        let block_align = format.block_align() as u32;
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels: format.channels,
            sample_rate: format.sample_rate,
            byte_rate: format.sample_rate * block_align,
            block_align: block_align as u16,
            bits_per_sample: format.bits_per_sample,
        }
    }
}

/// A sink whose already-written bytes may be rewritten.
pub trait PatchableSink: Write {
    /// Overwrites `bytes` at `offset`, leaving the write position at the end.
    /// Returns `Ok(false)` when the sink cannot seek back.
    fn patch(&mut self, offset: u64, bytes: &[u8]) -> io::Result<bool>;
}

impl PatchableSink for Vec<u8> {
    fn patch(&mut self, offset: u64, bytes: &[u8]) -> io::Result<bool> {
        let start = offset as usize;
        let Some(dst) = self.get_mut(start..start + bytes.len()) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "patch past end of buffer",
            ));
        };
        dst.copy_from_slice(bytes);
        Ok(true)
    }
}

impl<P: PatchableSink + ?Sized> PatchableSink for &mut P {
    fn patch(&mut self, offset: u64, bytes: &[u8]) -> io::Result<bool> {
        (**self).patch(offset, bytes)
    }
}

pub struct WaveWriter<W: PatchableSink> {
    writer: W,
    format: Option<ContainerFormat>,
    data_written: u64,
    scratch: Vec<u8>,
}

impl<W: PatchableSink> WaveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            format: None,
            data_written: 0,
            scratch: Vec::new(),
        }
    }

    /// Writes the 44-byte header; must precede any sample data.
    pub fn write_header(&mut self, format: &ContainerFormat) -> io::Result<()> {
        if self.format.is_some() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "WAVE header already written",
            ));
        }

        let (riff_size, data_size) = match format.data_size() {
            Some(size) => (size + HEADER_OVERHEAD, size),
            None => (UNSPECIFIED_SIZE, UNSPECIFIED_SIZE),
        };

        self.writer
            .write_all(&join_bytes_le!(*b"RIFF", riff_size, *b"WAVE"))?;
        FormatChunk::from(format).write_all(&mut self.writer)?;
        self.writer.write_all(&join_bytes_le!(*b"data", data_size))?;

        self.format = Some(*format);
        Ok(())
    }

    /// Appends channel-interleaved samples.
    pub fn write_pcm(&mut self, samples: &[i16]) -> io::Result<()> {
        if self.format.is_none() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "WAVE header not written",
            ));
        }

        self.scratch.clear();
        samples.write_le(&mut self.scratch);
        self.writer.write_all(&self.scratch)?;
        self.data_written += self.scratch.len() as u64;

        Ok(())
    }

    /// Flushes and, when possible, replaces the size fields with the real
    /// byte counts. Returns whether the header was patched.
    pub fn finish(&mut self) -> io::Result<bool> {
        self.writer.flush()?;

        if self.format.is_none() {
            return Ok(false);
        }

        let Some(data_size) = u32::try_from(self.data_written)
            .ok()
            .filter(|&size| size <= UNSPECIFIED_SIZE - HEADER_OVERHEAD - 1)
        else {
            log::warn!(
                "{} bytes of samples exceed the WAVE size fields, leaving them unspecified",
                self.data_written
            );
            return Ok(false);
        };

        let patched = self
            .writer
            .patch(RIFF_SIZE_OFFSET, &(data_size + HEADER_OVERHEAD).to_le_bytes())?
            && self.writer.patch(DATA_SIZE_OFFSET, &data_size.to_le_bytes())?;
        self.writer.flush()?;

        Ok(patched)
    }

    pub fn data_written(&self) -> u64 {
        self.data_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

pub struct WaveReader<R: Read> {
    reader: R,
    format: Option<ContainerFormat>,
    /// Bytes left in a data chunk of known size.
    remaining: Option<u64>,
    scratch: Vec<u8>,
}

fn eof_is_truncation(err: io::Error) -> ContainerError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        ContainerError::Truncated
    } else {
        ContainerError::Io(err)
    }
}

fn le_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn le_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

impl<R: Read> WaveReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            format: None,
            remaining: None,
            scratch: Vec::new(),
        }
    }

    fn skip(&mut self, len: u64) -> Result<(), ContainerError> {
        let skipped = io::copy(&mut self.reader.by_ref().take(len), &mut io::sink())?;
        if skipped < len {
            return Err(ContainerError::Truncated);
        }

        Ok(())
    }

    /// Walks the RIFF chunks up to the start of the sample data.
    pub fn read_header(&mut self) -> Result<ContainerFormat, ContainerError> {
        let mut riff = [0u8; 12];
        self.reader
            .read_exact(&mut riff)
            .map_err(eof_is_truncation)?;
        if &riff[0..4] != b"RIFF" {
            return Err(ContainerError::NotRiff);
        }
        if &riff[8..12] != b"WAVE" {
            return Err(ContainerError::NotWave);
        }

        let mut fmt: Option<(u16, u16, u32, u16)> = None;

        loop {
            let mut header = [0u8; 8];
            self.reader
                .read_exact(&mut header)
                .map_err(eof_is_truncation)?;
            let size = le_u32(&header, 4);

            match &header[0..4] {
                b"fmt " => {
                    if size < 16 {
                        return Err(ContainerError::MalformedChunk("fmt "));
                    }
                    // Only the extensible layout's first 40 bytes are used.
                    let mut body = [0u8; FMT_EXTENSIBLE_SIZE];
                    let kept = (size as usize).min(FMT_EXTENSIBLE_SIZE);
                    self.reader
                        .read_exact(&mut body[..kept])
                        .map_err(eof_is_truncation)?;
                    self.skip(size as u64 - kept as u64 + (size & 1) as u64)?;

                    let mut format_tag = le_u16(&body, 0);
                    if format_tag == WAVE_FORMAT_EXTENSIBLE {
                        if kept < FMT_EXTENSIBLE_SIZE {
                            return Err(ContainerError::MalformedChunk("fmt "));
                        }
                        // First two bytes of the sub-format GUID hold the format code.
                        format_tag = le_u16(&body, 24);
                    }
                    if format_tag != WAVE_FORMAT_PCM {
                        return Err(ContainerError::UnsupportedFormatTag(format_tag));
                    }

                    fmt = Some((
                        le_u16(&body, 2),
                        le_u16(&body, 14),
                        le_u32(&body, 4),
                        le_u16(&body, 12),
                    ));
                }
                b"data" => {
                    let Some((channels, bits_per_sample, sample_rate, block_align)) = fmt
                    else {
                        return Err(ContainerError::MissingChunk("fmt "));
                    };

                    let sample_bytes = if channels > 0 {
                        block_align / channels
                    } else {
                        0
                    };
                    let data_size = match size {
                        0 | UNSPECIFIED_SIZE => None,
                        size => Some(size as u64),
                    };
                    let sample_count = data_size
                        .filter(|_| block_align > 0)
                        .map(|size| size / block_align as u64);

                    let format = ContainerFormat {
                        sample_rate,
                        channels,
                        bits_per_sample,
                        sample_bytes,
                        sample_count,
                    };
                    self.format = Some(format);
                    self.remaining = data_size;

                    return Ok(format);
                }
                id => {
                    log::debug!(
                        "Skipping {:?} chunk, {size} bytes",
                        String::from_utf8_lossy(id)
                    );
                    self.skip(size as u64 + (size & 1) as u64)?;
                }
            }
        }
    }

    /// Reads up to `batch` interleaved sample frames into `out`.
    ///
    /// Returns the number of complete frames read; fewer than `batch` means
    /// the data chunk or the input ended.
    pub fn read_pcm(&mut self, out: &mut [i16], batch: usize) -> io::Result<usize> {
        let Some(format) = self.format else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "WAVE header not read",
            ));
        };
        if format.sample_bytes != 2 || format.channels == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "{} channels of {}-byte samples are not supported",
                    format.channels, format.sample_bytes
                ),
            ));
        }

        let channels = format.channels as usize;
        let block_align = format.block_align();

        let mut wanted = (batch * block_align) as u64;
        if let Some(remaining) = self.remaining {
            wanted = wanted.min(remaining - remaining % block_align as u64);
        }

        self.scratch.resize(wanted as usize, 0);
        let read = read_full(&mut self.reader, &mut self.scratch)?;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= read as u64;
        }

        let frames = read / block_align;
        for (dst, src) in out[..frames * channels]
            .iter_mut()
            .zip(self.scratch.chunks_exact(2))
        {
            *dst = i16::from_le_bytes([src[0], src[1]]);
        }

        Ok(frames)
    }

    pub fn format(&self) -> Option<&ContainerFormat> {
        self.format.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Sink that refuses to seek, like a pipe.
    struct Pipe(Vec<u8>);

    impl Write for Pipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl PatchableSink for Pipe {
        fn patch(&mut self, _offset: u64, _bytes: &[u8]) -> io::Result<bool> {
            Ok(false)
        }
    }

    fn chunk(id: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = join_bytes_le!(*id, body.len() as u32);
        out.extend_from_slice(body);
        if body.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn fmt_body(tag: u16, channels: u16, rate: u32, bits: u16) -> Vec<u8> {
        let align = channels * bits / 8;
        join_bytes_le!(tag, channels, rate, rate * align as u32, align, bits)
    }

    fn riff(chunks: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = chunks.concat();
        let mut out = join_bytes_le!(*b"RIFF", body.len() as u32 + 4, *b"WAVE");
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn header_layout() -> io::Result<()> {
        let mut writer = WaveWriter::new(Vec::new());
        writer.write_header(&ContainerFormat::pcm16(44100, 2, Some(10)))?;
        let buf = writer.into_inner();

        assert_eq!(buf.len(), 44);
        assert_eq!(&buf[0..4], b"RIFF");
        assert_eq!(le_u32(&buf, 4), 36 + 40);
        assert_eq!(&buf[8..16], b"WAVEfmt ");
        assert_eq!(le_u32(&buf, 16), 16);
        assert_eq!(le_u16(&buf, 20), WAVE_FORMAT_PCM);
        assert_eq!(le_u16(&buf, 22), 2);
        assert_eq!(le_u32(&buf, 24), 44100);
        assert_eq!(le_u32(&buf, 28), 44100 * 4);
        assert_eq!(le_u16(&buf, 32), 4);
        assert_eq!(le_u16(&buf, 34), 16);
        assert_eq!(&buf[36..40], b"data");
        assert_eq!(le_u32(&buf, 40), 40);

        Ok(())
    }

    #[test]
    fn unspecified_sizes_patched_on_finish() -> io::Result<()> {
        let mut writer = WaveWriter::new(Vec::new());
        writer.write_header(&ContainerFormat::pcm16(16000, 1, None))?;
        writer.write_pcm(&[1, -2, 3])?;

        assert_eq!(le_u32(writer.writer.as_slice(), 4), UNSPECIFIED_SIZE);
        assert_eq!(le_u32(writer.writer.as_slice(), 40), UNSPECIFIED_SIZE);

        assert!(writer.finish()?);
        let buf = writer.into_inner();
        assert_eq!(le_u32(&buf, 4), 36 + 6);
        assert_eq!(le_u32(&buf, 40), 6);
        assert_eq!(&buf[44..], &[0x01, 0x00, 0xFE, 0xFF, 0x03, 0x00]);

        Ok(())
    }

    #[test]
    fn pipe_keeps_unspecified_sizes() -> io::Result<()> {
        let mut writer = WaveWriter::new(Pipe(Vec::new()));
        writer.write_header(&ContainerFormat::pcm16(48000, 2, None))?;
        writer.write_pcm(&[0; 4])?;

        assert!(!writer.finish()?);
        let buf = writer.into_inner().0;
        assert_eq!(le_u32(&buf, 40), UNSPECIFIED_SIZE);
        assert_eq!(buf.len(), 44 + 8);

        Ok(())
    }

    #[test]
    fn samples_before_header_rejected() {
        let mut writer = WaveWriter::new(Vec::new());
        assert!(writer.write_pcm(&[0; 2]).is_err());
    }

    #[test]
    fn written_header_reads_back() -> Result<(), ContainerError> {
        let mut writer = WaveWriter::new(Vec::new());
        writer.write_header(&ContainerFormat::pcm16(32000, 2, None))?;
        writer.write_pcm(&[10, -10, 20, -20])?;
        writer.finish()?;

        let mut reader = WaveReader::new(Cursor::new(writer.into_inner()));
        let format = reader.read_header()?;
        assert_eq!(format, ContainerFormat::pcm16(32000, 2, Some(2)));

        let mut out = [0i16; 8];
        assert_eq!(reader.read_pcm(&mut out, 4)?, 2);
        assert_eq!(&out[..4], &[10, -10, 20, -20]);
        assert_eq!(reader.read_pcm(&mut out, 4)?, 0);

        Ok(())
    }

    #[test]
    fn skips_unknown_chunks_with_padding() -> Result<(), ContainerError> {
        let data: Vec<u8> = join_bytes_le!([7i16, 8, 9]);
        let input = riff(&[
            chunk(b"LIST", b"odd"),
            chunk(b"fmt ", &fmt_body(WAVE_FORMAT_PCM, 1, 16000, 16)),
            chunk(b"fact", &[0, 0, 0, 0]),
            chunk(b"data", &data),
        ]);

        let mut reader = WaveReader::new(Cursor::new(input));
        let format = reader.read_header()?;
        assert_eq!(format.channels, 1);
        assert_eq!(format.sample_count, Some(3));

        let mut out = [0i16; 3];
        assert_eq!(reader.read_pcm(&mut out, 3)?, 3);
        assert_eq!(out, [7, 8, 9]);

        Ok(())
    }

    #[test]
    fn never_reads_past_data_chunk() -> Result<(), ContainerError> {
        let mut input = riff(&[
            chunk(b"fmt ", &fmt_body(WAVE_FORMAT_PCM, 2, 48000, 16)),
            chunk(b"data", &join_bytes_le!([1i16, 2, 3, 4])),
            chunk(b"LIST", b"trailing metadata"),
        ]);
        input.extend_from_slice(&[0xAA; 32]);

        let mut reader = WaveReader::new(Cursor::new(input));
        reader.read_header()?;

        let mut out = [0i16; 16];
        assert_eq!(reader.read_pcm(&mut out, 8)?, 2);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
        assert_eq!(reader.read_pcm(&mut out, 8)?, 0);

        Ok(())
    }

    #[test]
    fn unspecified_data_size_reads_to_eof() -> Result<(), ContainerError> {
        for size in [0u32, UNSPECIFIED_SIZE] {
            let mut input = riff(&[chunk(b"fmt ", &fmt_body(WAVE_FORMAT_PCM, 1, 16000, 16))]);
            input.extend_from_slice(&join_bytes_le!(*b"data", size, [5i16, 6, 7]));
            input.push(0x01);

            let mut reader = WaveReader::new(Cursor::new(input));
            assert_eq!(reader.read_header()?.sample_count, None);

            let mut out = [0i16; 8];
            assert_eq!(reader.read_pcm(&mut out, 8)?, 3);
            assert_eq!(&out[..3], &[5, 6, 7]);
        }

        Ok(())
    }

    #[test]
    fn extensible_pcm_accepted() -> Result<(), ContainerError> {
        let mut body = fmt_body(WAVE_FORMAT_EXTENSIBLE, 2, 44100, 16);
        body.extend_from_slice(&join_bytes_le!(22u16, 16u16, 3u32, WAVE_FORMAT_PCM));
        body.extend_from_slice(&[0u8; 14]);
        let input = riff(&[chunk(b"fmt ", &body), chunk(b"data", &[])]);

        let format = WaveReader::new(Cursor::new(input)).read_header()?;
        assert_eq!(format.sample_rate, 44100);
        assert_eq!(format.sample_bytes, 2);

        Ok(())
    }

    #[test]
    fn long_fmt_chunk_tail_skipped() -> Result<(), ContainerError> {
        let mut body = fmt_body(WAVE_FORMAT_PCM, 2, 48000, 16);
        body.extend_from_slice(&join_bytes_le!(33u16));
        body.extend_from_slice(&[0x5A; 33]);
        let input = riff(&[
            chunk(b"fmt ", &body),
            chunk(b"data", &join_bytes_le!([3i16, -3])),
        ]);

        let mut reader = WaveReader::new(Cursor::new(input));
        assert_eq!(
            reader.read_header()?,
            ContainerFormat::pcm16(48000, 2, Some(1))
        );
        let mut out = [0i16; 2];
        assert_eq!(reader.read_pcm(&mut out, 1)?, 1);
        assert_eq!(out, [3, -3]);

        Ok(())
    }

    #[test]
    fn huge_fmt_size_is_truncation() {
        let mut input = join_bytes_le!(*b"RIFF", UNSPECIFIED_SIZE, *b"WAVE", *b"fmt ", 0xFFFF_FFF0u32);
        input.extend_from_slice(&fmt_body(WAVE_FORMAT_PCM, 2, 48000, 16));
        input.extend_from_slice(&[0u8; 64]);

        assert!(matches!(
            WaveReader::new(Cursor::new(input)).read_header(),
            Err(ContainerError::Truncated)
        ));
    }

    #[test]
    fn malformed_headers() {
        let read = |bytes: Vec<u8>| WaveReader::new(Cursor::new(bytes)).read_header();

        assert!(matches!(
            read(b"RIFX\0\0\0\0WAVE".to_vec()),
            Err(ContainerError::NotRiff)
        ));
        assert!(matches!(
            read(b"RIFF\0\0\0\0AVI ".to_vec()),
            Err(ContainerError::NotWave)
        ));
        assert!(matches!(read(b"RIFF\0\0".to_vec()), Err(ContainerError::Truncated)));
        assert!(matches!(
            read(riff(&[chunk(b"data", &[0, 0])])),
            Err(ContainerError::MissingChunk("fmt "))
        ));
        assert!(matches!(
            read(riff(&[chunk(b"fmt ", &fmt_body(3, 1, 48000, 32))])),
            Err(ContainerError::UnsupportedFormatTag(3))
        ));
        assert!(matches!(
            read(riff(&[chunk(b"fmt ", &fmt_body(WAVE_FORMAT_PCM, 1, 48000, 16))])),
            Err(ContainerError::Truncated)
        ));
    }
}
