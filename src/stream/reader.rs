use std::io::Read;

use sbc::{FrameDescriptor, MAX_FRAME_SIZE, PROBE_SIZE, probe};

use crate::error::SessionError;
use crate::input::read_full;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    AwaitingHeader,
    AwaitingBody(FrameDescriptor),
}

/// One complete frame borrowed from the reader's buffer.
#[derive(Debug)]
pub struct Frame<'a> {
    pub desc: FrameDescriptor,
    pub data: &'a [u8],
}

/// Splits a byte source into frames: read the header prefix, probe it, then
/// read exactly the rest of the frame it describes.
///
/// A source ending on a frame boundary is a clean end. A source ending inside
/// a header prefix is an error; one ending inside a frame body is a soft end
/// and the partial frame is dropped.
pub struct FrameStreamReader<R: Read> {
    reader: R,
    state: ReaderState,
    buf: [u8; MAX_FRAME_SIZE],
    offset: u64,
    frames: u64,
    first: Option<FrameDescriptor>,
    truncated: bool,
}

impl<R: Read> FrameStreamReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: ReaderState::AwaitingHeader,
            buf: [0; MAX_FRAME_SIZE],
            offset: 0,
            frames: 0,
            first: None,
            truncated: false,
        }
    }

    /// Returns the next complete frame, or `None` once the stream has ended.
    pub fn next_frame(&mut self) -> Result<Option<Frame<'_>>, SessionError> {
        loop {
            match self.state {
                ReaderState::AwaitingHeader => match self.read_header()? {
                    Some(desc) => self.state = ReaderState::AwaitingBody(desc),
                    None => return Ok(None),
                },
                ReaderState::AwaitingBody(desc) => {
                    self.state = ReaderState::AwaitingHeader;
                    if !self.read_body(&desc)? {
                        return Ok(None);
                    }

                    self.frames += 1;
                    return Ok(Some(Frame {
                        desc,
                        data: &self.buf[..desc.frame_size()],
                    }));
                }
            }
        }
    }

    fn read_header(&mut self) -> Result<Option<FrameDescriptor>, SessionError> {
        if self.truncated {
            return Ok(None);
        }

        let start = self.offset;
        let got = read_full(&mut self.reader, &mut self.buf[..PROBE_SIZE])?;
        self.offset += got as u64;

        if got == 0 {
            return Ok(None);
        }
        if got < PROBE_SIZE {
            return Err(SessionError::TruncatedStream {
                offset: start,
                got,
                expected: PROBE_SIZE,
            });
        }

        let desc = probe(&self.buf[..PROBE_SIZE]).map_err(|source| SessionError::Format {
            offset: start,
            source,
        })?;
        self.first.get_or_insert(desc);

        Ok(Some(desc))
    }

    /// Returns `false` when the source ended inside the body.
    fn read_body(&mut self, desc: &FrameDescriptor) -> Result<bool, SessionError> {
        let size = desc.frame_size();
        let got = read_full(&mut self.reader, &mut self.buf[PROBE_SIZE..size])?;
        self.offset += got as u64;

        if got < size - PROBE_SIZE {
            log::warn!(
                "Dropping truncated trailing frame: {} of {} bytes",
                PROBE_SIZE + got,
                size
            );
            self.truncated = true;
            return Ok(false);
        }

        Ok(true)
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Descriptor of the first successfully probed header.
    pub fn first_descriptor(&self) -> Option<&FrameDescriptor> {
        self.first.as_ref()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Bytes consumed from the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the stream ended inside a frame body.
    pub fn truncated(&self) -> bool {
        self.truncated
    }
}
