//! Error types for the transfer engine.
//!
//! The primary error type is `EngineError`. Errors returned from the public
//! `TransferEngine` methods are caller errors; everything that goes wrong while
//! a queued task is being transferred is absorbed by the processor and reported
//! through the task's `TransferOutcome` instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the transfer engine and its collaborators.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Source file does not exist
    #[error("Source file not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Source file is not accessible (permissions)
    #[error("Source file access denied: {}", path.display())]
    SourceAccessDenied { path: PathBuf, source: io::Error },

    /// Destination already holds a file; the collision signal
    #[error("Destination already exists: {}", path.display())]
    DestinationExists { path: PathBuf },

    /// Destination is not writable
    #[error("Destination access denied: {}", path.display())]
    DestinationAccessDenied { path: PathBuf, source: io::Error },

    /// Failed to read from source file
    #[error("Failed to read file: {}", path.display())]
    ReadError { path: PathBuf, source: io::Error },

    /// Failed to write to destination file
    #[error("Failed to write file: {}", path.display())]
    WriteError { path: PathBuf, source: io::Error },

    /// Path is not usable for the requested operation
    #[error("Invalid path: {} ({reason})", path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// Failed to create a directory
    #[error("Failed to create directory: {}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    /// A duplicate was found but no duplicates directory is configured
    #[error("No duplicates directory configured for duplicate of {}", path.display())]
    DuplicatesDirNotConfigured { path: PathBuf },

    /// No capture date could be derived for a file
    #[error("Could not resolve date folder for {}: {reason}", path.display())]
    DateUnresolved { path: PathBuf, reason: String },

    /// The queue processor is no longer running
    #[error("Transfer engine has stopped")]
    EngineStopped,
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<u32> {
        match self {
            Self::SourceAccessDenied { source, .. }
            | Self::DestinationAccessDenied { source, .. }
            | Self::ReadError { source, .. }
            | Self::WriteError { source, .. }
            | Self::DirectoryCreationFailed { source, .. } => {
                source.raw_os_error().map(|e| e as u32)
            }
            _ => None,
        }
    }

    /// True when the destination was occupied, which the collision resolver
    /// may be able to recover from.
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::DestinationExists { .. })
    }

    /// Map an I/O error raised while reading `path`.
    pub(crate) fn from_read(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::SourceNotFound { path },
            io::ErrorKind::PermissionDenied => Self::SourceAccessDenied { path, source: err },
            _ => Self::ReadError { path, source: err },
        }
    }

    /// Attribute a read failure to a file already sitting at the destination.
    pub(crate) fn on_destination(self) -> Self {
        match self {
            Self::SourceNotFound { path } => Self::ReadError {
                path,
                source: io::Error::from(io::ErrorKind::NotFound),
            },
            Self::SourceAccessDenied { path, source } => Self::DestinationAccessDenied { path, source },
            other => other,
        }
    }

    /// Map an I/O error raised while writing `path`.
    pub(crate) fn from_write(err: io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::AlreadyExists => Self::DestinationExists { path },
            io::ErrorKind::PermissionDenied => Self::DestinationAccessDenied { path, source: err },
            _ => Self::WriteError { path, source: err },
        }
    }
}
