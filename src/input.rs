use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Unified input reader that handles both file and pipe input with buffered reading
pub struct InputReader {
    reader: Box<dyn Read>,
    is_pipe: bool,
    len: Option<u64>,
}

/// Whether `path` selects a standard stream: omitted or `-`.
pub fn is_std_stream(path: Option<&Path>) -> bool {
    path.is_none_or(|p| p.as_os_str() == "-")
}

impl InputReader {
    /// Create a new InputReader from a path
    /// Use `None` or "-" for stdin pipe input
    pub fn new(input_path: Option<&Path>) -> io::Result<Self> {
        match input_path {
            Some(path) if !is_std_stream(input_path) => {
                let file = File::open(path)?;
                let len = file.metadata().ok().filter(|m| m.is_file()).map(|m| m.len());
                Ok(Self {
                    reader: Box::new(BufReader::new(file)),
                    is_pipe: false,
                    len,
                })
            }
            _ => Ok(Self {
                reader: Box::new(io::stdin().lock()),
                is_pipe: true,
                len: None,
            }),
        }
    }

    /// Check if this is pipe input
    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }

    /// Total input length when reading a regular file.
    pub fn byte_len(&self) -> Option<u64> {
        self.len
    }
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

/// Fills `buf` unless the source ends first; returns the bytes read.
///
/// Unlike `read_exact`, a short count is not an error so callers can tell
/// a clean end (0) from a cut-off one.
pub fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}
