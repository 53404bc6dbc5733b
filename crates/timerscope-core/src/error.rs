//! Error types for the timerscope-core library.
//!
//! Decoding failures are fatal to the whole decode: the decoder never returns
//! a partial channel list, it returns one of the variants below instead.

use std::path::PathBuf;
use std::str::Utf8Error;
use thiserror::Error;

/// Result type alias for timerscope operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all timerscope operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A field read needed more bytes than remain in the buffer
    #[error(
        "truncated input at offset {offset}: {field} needs {needed} bytes, {remaining} remaining"
    )]
    TruncatedInput {
        /// Cursor position where the read was attempted
        offset: usize,
        /// Name of the field being read
        field: &'static str,
        /// Number of bytes the field requires (saturated on overflow)
        needed: usize,
        /// Number of bytes left in the buffer
        remaining: usize,
    },

    /// A channel name is not valid UTF-8
    #[error("invalid UTF-8 in channel name at offset {offset}: {source}")]
    InvalidText {
        /// Offset of the first byte of the name
        offset: usize,
        /// Underlying UTF-8 error
        #[source]
        source: Utf8Error,
    },

    /// Failed to read input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write output file
    #[error("failed to write file '{path}': {source}")]
    FileWrite {
        /// Path to the file that failed to write
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A channel name cannot be turned into a file name inside the output directory
    #[error("path traversal detected: channel name '{name}' would escape output directory")]
    PathTraversal {
        /// The offending channel name
        name: String,
    },

    /// Bandwidth series length disagrees with the runtime series length
    #[error("bandwidth series has {bandwidths} values but the channel has {runtimes} calls")]
    LengthMismatch {
        /// Number of runtime values
        runtimes: usize,
        /// Number of bandwidth values
        bandwidths: usize,
    },

    /// A channel cannot be represented in the wire format
    #[error("failed to encode timer file: {0}")]
    Encode(String),

    /// A renderer failed to produce output
    #[error("failed to render channel: {0}")]
    Render(String),
}

impl Error {
    /// Creates a new truncated input error
    pub fn truncated(offset: usize, field: &'static str, needed: usize, remaining: usize) -> Self {
        Self::TruncatedInput {
            offset,
            field,
            needed,
            remaining,
        }
    }

    /// Creates a new invalid text error
    pub fn invalid_text(offset: usize, source: Utf8Error) -> Self {
        Self::InvalidText { offset, source }
    }

    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new path traversal error
    pub fn path_traversal(name: impl Into<String>) -> Self {
        Self::PathTraversal { name: name.into() }
    }

    /// Creates a new encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Creates a new render error
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Returns true if the error came from malformed timer file bytes
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::TruncatedInput { .. } | Self::InvalidText { .. })
    }
}

impl From<std::fmt::Error> for Error {
    fn from(_: std::fmt::Error) -> Self {
        Self::render("formatter error")
    }
}
