//! Error types shared by the scanner, the deletion engine and the results store.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures that are tied to a single path.
///
/// Per-file variants (`UnreadableFile`, `DeletionIo`) are recovered from by the
/// caller; per-argument variants end processing of that argument only.
#[derive(Debug, Error)]
pub enum DupError {
    /// Operator-supplied argument does not exist.
    #[error("path not found: {path}")]
    PathNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Argument exists but is neither a directory nor a `.json` results file.
    #[error("not a directory or .json results file: {0}")]
    UnsupportedArgument(PathBuf),

    /// File could not be read while hashing.
    #[error("cannot read {path}: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Scan root could not be enumerated.
    #[error("cannot walk {path}: {message}")]
    Walk { path: PathBuf, message: String },

    /// Results file is not a JSON object of digest to list of paths.
    #[error("malformed results file {path}: {source}")]
    MalformedPersistedData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Results file could not be read or written.
    #[error("cannot access results file {path}: {message}")]
    PersistIo { path: PathBuf, message: String },

    /// Removing a duplicate failed.
    #[error("failed to delete {path}: {source}")]
    DeletionIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DupError {
    pub fn path(&self) -> &Path {
        match self {
            Self::PathNotFound { path, .. }
            | Self::UnreadableFile { path, .. }
            | Self::Walk { path, .. }
            | Self::MalformedPersistedData { path, .. }
            | Self::PersistIo { path, .. }
            | Self::DeletionIo { path, .. } => path,
            Self::UnsupportedArgument(path) => path,
        }
    }

    pub fn unreadable(path: &Path, source: io::Error) -> Self {
        Self::UnreadableFile {
            path: path.to_path_buf(),
            source,
        }
    }
}
