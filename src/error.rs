use std::io;
use std::path::PathBuf;

use sbc::{DecodeError, EncodeError, FrameError};

use crate::wav::ContainerError;

const EIO: u8 = 5;
const EINVAL: u8 = 22;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("SBC input file format at byte {offset}: {source}")]
    Format {
        offset: u64,
        #[source]
        source: FrameError,
    },

    #[error("Truncated frame header at byte {offset}: {got} of {expected} bytes")]
    TruncatedStream {
        offset: u64,
        got: usize,
        expected: usize,
    },

    #[error("Bad or unsupported WAVE input file: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid encoder configuration: {0}")]
    InvalidConfig(String),

    #[error("Stream parameters changed at frame {frame}: {detail}")]
    StreamMismatch { frame: u64, detail: String },

    #[error("{}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<ContainerError> for SessionError {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::Io(e) => SessionError::Io(e),
            other => SessionError::UnsupportedFormat(other.to_string()),
        }
    }
}

fn os_status(err: &io::Error) -> u8 {
    err.raw_os_error()
        .and_then(|code| u8::try_from(code).ok())
        .filter(|&code| code != 0)
        .unwrap_or(EIO)
}

impl SessionError {
    /// errno-style process exit status.
    pub fn exit_status(&self) -> u8 {
        match self {
            SessionError::Open { source, .. } => os_status(source),
            SessionError::Io(e)
            | SessionError::Decode(DecodeError::Io(e))
            | SessionError::Encode(EncodeError::Io(e)) => os_status(e),
            _ => EINVAL,
        }
    }
}
