//! Error types for the packer.
//!
//! Failures are grouped by the stage that raised them so the binary can
//! report which side (input tree, codec, or output path) needs attention.

use rarc_format::RarcError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Input tree errors.
#[derive(Debug, Error)]
pub enum InputError {
    /// Input root does not exist
    #[error("input directory {0} does not exist")]
    NotFound(PathBuf),

    /// Input root is a file or something else
    #[error("input path {0} is not a directory")]
    NotADirectory(PathBuf),

    /// Directory traversal failed
    #[error("failed to walk {path}: {source}")]
    Walk {
        /// Entry being visited
        path: PathBuf,
        /// Underlying traversal error
        #[source]
        source: walkdir::Error,
    },

    /// File contents could not be read
    #[error("failed to read {path}: {source}")]
    ReadFile {
        /// File being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Entry name is not valid UTF-8
    #[error("entry name is not valid UTF-8: {0}")]
    NonUtf8Name(PathBuf),

    /// Entry name cannot be stored in the string table
    #[error("entry name is not ASCII: {0}")]
    NonAsciiName(PathBuf),
}

/// External compressor errors.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No compressor binary could be located
    #[error("compressor not found: {0}")]
    NotFound(String),

    /// Compressor could not be started
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// Program that failed to start
        program: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Compressor ran but reported failure
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// Program that failed
        program: PathBuf,
        /// Exit status description
        status: String,
        /// Captured diagnostic output
        stderr: String,
    },

    /// Compressor did not finish in time and was killed
    #[error("{program} timed out after {}s", timeout.as_secs())]
    Timeout {
        /// Program that timed out
        program: PathBuf,
        /// Configured limit
        timeout: Duration,
    },

    /// Compressor reported success but produced no output file
    #[error("compressor produced no output at {0}")]
    MissingOutput(PathBuf),

    /// Scratch file handling failed
    #[error("codec I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output file errors.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Parent directory could not be created
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory being created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Archive bytes could not be written
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Top-level packer errors.
#[derive(Debug, Error)]
pub enum PackError {
    /// Input tree problem
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// Compression was required but the codec is unusable
    #[error("compressor unavailable and raw fallback is disabled: {0}")]
    CodecUnavailable(#[source] CodecError),

    /// A single file failed to compress
    #[error("failed to compress {file}: {source}")]
    Compress {
        /// Archive-relative path of the file
        file: PathBuf,
        /// Codec failure
        #[source]
        source: CodecError,
    },

    /// Layout or encoding failure in the archive tables
    #[error("archive layout error: {0}")]
    Layout(#[from] RarcError),

    /// Output problem
    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Result type for packer operations.
pub type Result<T> = std::result::Result<T, PackError>;
