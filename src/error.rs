//! Error types for cvdeck library.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for cvdeck operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while processing a résumé deck.
///
/// Only fatal conditions live here. Ambiguous extraction, unbound fields and
/// unresolved overflow are reported as data in [`crate::JobReport`].
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// An input document could not be read.
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The container or one of its parts is structurally broken.
    #[error("Corrupt document: {0}")]
    CorruptDocument(String),

    /// The package declares a schema or document kind this engine does not handle.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The template declares a placeholder role outside the recognized schema.
    #[error("Unknown placeholder role: {0}")]
    UnknownRole(String),

    /// A mapping override could not be understood.
    #[error("Invalid mapping override: {0}")]
    InvalidOverride(String),

    /// Error while serializing the rendered package.
    #[error("Rendering error: {0}")]
    Render(String),

    /// The job did not finish within its deadline.
    #[error("Job timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The job was cancelled before it completed.
    #[error("Job cancelled")]
    Cancelled,

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Pipeline stage an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Decoding the container.
    Parse,
    /// Loading the template or binding content to it.
    Bind,
    /// Serializing and writing the output.
    Render,
}

impl Error {
    /// The stage this error aborts.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Read { .. } | Error::CorruptDocument(_) | Error::UnsupportedFormat(_) => {
                Stage::Parse
            }
            Error::UnknownRole(_) | Error::InvalidOverride(_) => Stage::Bind,
            Error::Io(_)
            | Error::Render(_)
            | Error::Timeout(_)
            | Error::Cancelled
            | Error::Json(_) => Stage::Render,
        }
    }

    /// Process exit code for the command surface.
    pub fn exit_code(&self) -> i32 {
        match self.stage() {
            Stage::Parse => 1,
            Stage::Bind => 2,
            Stage::Render => 3,
        }
    }

    /// Wrap a failure to read the input document at `path`.
    pub fn read(path: &Path, source: io::Error) -> Self {
        Error::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the error describes a broken or unsupported input document.
    pub fn is_structural(&self) -> bool {
        self.stage() == Stage::Parse
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => Error::CorruptDocument(format!("archive: {}", e)),
            _ => Error::CorruptDocument(format!("archive: {}", err)),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::CorruptDocument(format!("XML: {}", err))
    }
}
