use std::path::{Path, PathBuf};

use crate::error::SessionError;
use crate::input::{InputReader, is_std_stream};
use crate::output::OutputWriter;

pub mod command;
pub mod logging;

/// Display form of an optional path; standard streams show as `-`.
pub fn path_label(path: Option<&Path>) -> String {
    match path {
        Some(p) if !is_std_stream(path) => p.display().to_string(),
        _ => "-".to_string(),
    }
}

fn open_error(path: Option<&Path>, source: std::io::Error) -> SessionError {
    SessionError::Open {
        path: PathBuf::from(path_label(path)),
        source,
    }
}

pub fn open_input(path: Option<&Path>) -> Result<InputReader, SessionError> {
    InputReader::new(path).map_err(|e| open_error(path, e))
}

pub fn create_output(path: Option<&Path>) -> Result<OutputWriter, SessionError> {
    OutputWriter::create(path).map_err(|e| open_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(path_label(None), "-");
        assert_eq!(path_label(Some(Path::new("-"))), "-");
        assert_eq!(path_label(Some(Path::new("a.sbc"))), "a.sbc");
    }

    #[test]
    fn missing_input_is_open_error() {
        let path = Path::new("/nonexistent/dir/input.sbc");
        let err = open_input(Some(path)).err().unwrap();
        assert!(matches!(err, SessionError::Open { .. }));
        assert_eq!(err.exit_status(), 2);
        assert!(err.to_string().starts_with("/nonexistent/dir/input.sbc: "));
    }
}
