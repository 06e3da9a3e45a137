use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use crate::input::is_std_stream;
use crate::wav::PatchableSink;

/// Output sink: a created file, or stdout for `None` / "-".
pub enum OutputWriter {
    File(BufWriter<File>),
    Stdout(BufWriter<io::Stdout>),
}

impl OutputWriter {
    pub fn create(output_path: Option<&Path>) -> io::Result<Self> {
        match output_path {
            Some(path) if !is_std_stream(output_path) => {
                Ok(OutputWriter::File(BufWriter::new(File::create(path)?)))
            }
            _ => Ok(OutputWriter::Stdout(BufWriter::new(io::stdout()))),
        }
    }
}

impl Write for OutputWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputWriter::File(w) => w.write(buf),
            OutputWriter::Stdout(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputWriter::File(w) => w.flush(),
            OutputWriter::Stdout(w) => w.flush(),
        }
    }
}

impl PatchableSink for OutputWriter {
    fn patch(&mut self, offset: u64, bytes: &[u8]) -> io::Result<bool> {
        let OutputWriter::File(w) = self else {
            return Ok(false);
        };

        // Named pipes open as files but cannot seek.
        let Ok(end) = w.stream_position() else {
            return Ok(false);
        };

        w.seek(SeekFrom::Start(offset))?;
        w.write_all(bytes)?;
        w.seek(SeekFrom::Start(end))?;

        Ok(true)
    }
}
