use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type shared by every stage of a benchmark run.
///
/// None of these are recoverable inside the harness: the task that hits one
/// stops and the error travels up to whoever called `dispatch`.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("Failed to parse configuration: {0}")]
    ConfigError(String),

    #[error("Task {task} not supported, please choose between {available:?}")]
    UnknownTask {
        task: String,
        available: Vec<&'static str>,
    },

    #[error("Unsupported format '{extension}' for file {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Failed to align files: {0}")]
    AlignmentError(String),

    #[error("Failed to decode {path}: {message}")]
    DecodeError { path: PathBuf, message: String },

    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("No {0} available, it must be provided by the embedding application")]
    ServiceUnavailable(&'static str),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl BenchError {
    /// True for errors caused by the run configuration rather than the data.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            BenchError::ConfigError(_) | BenchError::UnknownTask { .. }
        )
    }
}

/// Result type for benchmark operations
pub type BenchResult<T> = Result<T, BenchError>;

/// Utility functions for working with BenchError
pub mod util {
    use super::*;
    use std::path::Path;

    /// Check if a file exists, returning a FileNotFound error if it doesn't
    pub fn ensure_file_exists<P: AsRef<Path>>(path: P) -> BenchResult<()> {
        let path_ref = path.as_ref();
        if !path_ref.is_file() {
            return Err(BenchError::FileNotFound(path_ref.to_path_buf()));
        }
        Ok(())
    }

    /// Wrap a decoder failure with the path that was being decoded
    pub fn decode_error<E: fmt::Display>(path: &Path, e: E) -> BenchError {
        BenchError::DecodeError {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    }
}

impl From<anyhow::Error> for BenchError {
    fn from(err: anyhow::Error) -> Self {
        BenchError::Other(err.to_string())
    }
}

impl From<config::ConfigError> for BenchError {
    fn from(err: config::ConfigError) -> Self {
        BenchError::ConfigError(err.to_string())
    }
}
