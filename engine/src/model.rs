//! Core data model for transfer tasks.
//!
//! This module defines the data structures moved through the transfer queue:
//! - TransferTask: one source -> destination relocation request
//! - TaskId: handle used to replace a queued task in place
//! - Mode, ProcessorState, TransferOutcome: enums describing behavior and results

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Handle to a task that has been submitted to the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(Uuid);

impl TaskId {
    pub(crate) fn new() -> Self {
        TaskId(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The operation mode for a transfer task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Copy the file; source remains unchanged
    #[default]
    Copy,
    /// Move the file; source is removed once the destination is written
    Move,
}

impl Mode {
    /// Parse mode from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "copy" => Some(Self::Copy),
            "move" => Some(Self::Move),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Copy => write!(f, "Copy"),
            Mode::Move => write!(f, "Move"),
        }
    }
}

/// A single source -> destination relocation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTask {
    /// Full source path
    pub source: PathBuf,

    /// Full destination path, always naming a file
    pub destination: PathBuf,

    /// Copy or Move
    pub mode: Mode,

    /// Reroute byte-identical collisions to the duplicates directory instead
    /// of versioning the filename
    pub preserve_duplicate: bool,
}

impl TransferTask {
    /// Create a task, normalizing a directory-shaped destination to
    /// `destination/basename(source)`.
    ///
    /// A destination is treated as a directory when it has no extension or
    /// when it names an existing directory.
    pub fn new(
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        mode: Mode,
        preserve_duplicate: bool,
    ) -> Self {
        let source = source.into();
        let destination = normalize_destination(&source, destination.into());
        TransferTask {
            source,
            destination,
            mode,
            preserve_duplicate,
        }
    }

    /// Same task aimed at another file-shaped destination.
    ///
    /// Used for retries; the destination is taken as-is.
    pub fn retarget(&self, destination: PathBuf, preserve_duplicate: bool) -> Self {
        TransferTask {
            source: self.source.clone(),
            destination,
            mode: self.mode,
            preserve_duplicate,
        }
    }
}

fn normalize_destination(source: &Path, destination: PathBuf) -> PathBuf {
    let is_dir_shaped = destination.extension().is_none() || destination.is_dir();
    match source.file_name() {
        Some(name) if is_dir_shaped => destination.join(name),
        _ => destination,
    }
}

/// Lifecycle state of the queue processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    /// Queue is empty; waiting for submissions
    Idle,
    /// Working through the queue
    Running,
}

/// Result of an advanced task, reported through the item-processed signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// File landed at `destination`
    Done { destination: PathBuf, bytes: u64 },
    /// Transfer was abandoned; the queue moved on
    Failed {
        /// OS error code, if the failure came from the OS
        error_code: Option<u32>,
        /// Human-readable error message
        error_message: String,
    },
}

impl TransferOutcome {
    /// Returns true if the file was transferred.
    pub fn is_success(&self) -> bool {
        matches!(self, TransferOutcome::Done { .. })
    }
}

impl From<&crate::error::EngineError> for TransferOutcome {
    fn from(err: &crate::error::EngineError) -> Self {
        TransferOutcome::Failed {
            error_code: err.raw_os_error(),
            error_message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_destination_gets_source_name() {
        let task = TransferTask::new("/card/DCIM/img.jpg", "/photos/2021-05", Mode::Copy, true);
        assert_eq!(task.destination, PathBuf::from("/photos/2021-05/img.jpg"));
    }

    #[test]
    fn test_file_destination_is_kept() {
        let task = TransferTask::new("/card/DCIM/img.jpg", "/photos/2021-05/renamed.jpg", Mode::Move, false);
        assert_eq!(task.destination, PathBuf::from("/photos/2021-05/renamed.jpg"));
        assert_eq!(task.mode, Mode::Move);
        assert!(!task.preserve_duplicate);
    }

    #[test]
    fn test_existing_directory_with_dot_is_treated_as_directory() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let dir = temp_dir.path().join("holiday.2021");
        std::fs::create_dir(&dir).expect("Failed to create dir");

        let task = TransferTask::new("/card/img.jpg", &dir, Mode::Copy, false);
        assert_eq!(task.destination, dir.join("img.jpg"));
    }

    #[test]
    fn test_retarget_does_not_renormalize() {
        let task = TransferTask::new("/card/README", "/docs", Mode::Copy, true);
        assert_eq!(task.destination, PathBuf::from("/docs/README"));

        let retry = task.retarget(PathBuf::from("/docs/README_00"), true);
        assert_eq!(retry.destination, PathBuf::from("/docs/README_00"));
        assert_eq!(retry.source, task.source);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!(Mode::from_str("copy"), Some(Mode::Copy));
        assert_eq!(Mode::from_str("MOVE"), Some(Mode::Move));
        assert_eq!(Mode::from_str("link"), None);
    }

    #[test]
    fn test_outcome_success() {
        let done = TransferOutcome::Done { destination: PathBuf::from("/a.jpg"), bytes: 3 };
        assert!(done.is_success());

        let failed = TransferOutcome::from(&crate::error::EngineError::EngineStopped);
        assert!(!failed.is_success());
    }
}
