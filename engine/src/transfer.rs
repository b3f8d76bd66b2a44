//! The public engine handle.
//!
//! `TransferEngine` spawns the queue processor on a tokio runtime and hands
//! requests to it. All methods return immediately; results arrive through the
//! `TransferListener` the engine was built with.

use crate::checksums::ContentHasher;
use crate::error::EngineError;
use crate::events::TransferListener;
use crate::fs_ops;
use crate::model::{ProcessorState, TaskId, TransferTask};
use crate::processor::{Command, QueueProcessor};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};

/// Handle to a running transfer queue.
///
/// Clones share the same queue. Once every handle is dropped the processor
/// finishes the work already queued and stops.
#[derive(Clone)]
pub struct TransferEngine {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<ProcessorState>,
}

impl TransferEngine {
    /// Start a transfer engine on `runtime`.
    ///
    /// # Arguments
    /// * `runtime` - Runtime the processor task is spawned on
    /// * `hasher` - Digest used to tell duplicates from name clashes
    /// * `listener` - Receives item-processed and queue-drained signals
    pub fn new(
        runtime: &Handle,
        hasher: impl ContentHasher + 'static,
        listener: impl TransferListener + 'static,
    ) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(ProcessorState::Idle);

        let processor = QueueProcessor::new(Arc::new(hasher), Arc::new(listener), receiver, state_tx);
        runtime.spawn(processor.run());

        TransferEngine { commands, state }
    }

    /// Queue a task at the back and wake the processor if it is idle.
    ///
    /// # Returns
    /// Handle for replacing the task in place later
    ///
    /// # Errors
    /// Returns EngineError if the source is not an existing file or the engine
    /// has stopped.
    pub fn submit(&self, task: TransferTask) -> Result<TaskId, EngineError> {
        validate_source(&task.source)?;
        let id = TaskId::new();
        self.send(Command::Submit { id, task })?;
        Ok(id)
    }

    /// Overwrite the queued task `id` without changing its queue position.
    ///
    /// If the task has already left the queue, `task` is appended under the
    /// same handle instead.
    pub fn replace(&self, id: TaskId, task: TransferTask) -> Result<TaskId, EngineError> {
        validate_source(&task.source)?;
        self.send(Command::Replace { id, task })?;
        Ok(id)
    }

    /// Configure the directory confirmed duplicates are rerouted to.
    ///
    /// The directory and its parents are created before this returns, and
    /// every task submitted afterwards sees the new setting.
    pub fn set_duplicates_dir(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let path = path.as_ref();
        fs_ops::ensure_dir_exists(path)?;
        self.send(Command::SetDuplicatesDir(path.to_path_buf()))
    }

    /// Current processor state.
    pub fn state(&self) -> ProcessorState {
        *self.state.borrow()
    }

    fn send(&self, command: Command) -> Result<(), EngineError> {
        self.commands.send(command).map_err(|_| EngineError::EngineStopped)
    }
}

fn validate_source(source: &Path) -> Result<(), EngineError> {
    let metadata = std::fs::metadata(source).map_err(|e| EngineError::from_read(e, source))?;
    if !metadata.is_file() {
        return Err(EngineError::InvalidPath {
            path: source.to_path_buf(),
            reason: "Source must be a file".to_string(),
        });
    }
    Ok(())
}
