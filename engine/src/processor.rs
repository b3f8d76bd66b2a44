//! The queue processor.
//!
//! A single tokio task owns the queue and the duplicates directory. Callers
//! talk to it through a command channel; it works through the queue one task
//! at a time, retrying corrected tasks in place and yielding between steps.

use crate::checksums::ContentHasher;
use crate::collision::{resolve_collision, Resolution};
use crate::events::TransferListener;
use crate::fs_ops;
use crate::model::{ProcessorState, TaskId, TransferOutcome, TransferTask};
use crate::queue::TransferQueue;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Requests sent from `TransferEngine` handles to the processor.
#[derive(Debug)]
pub(crate) enum Command {
    Submit { id: TaskId, task: TransferTask },
    Replace { id: TaskId, task: TransferTask },
    SetDuplicatesDir(PathBuf),
}

/// What one attempt at the head task decided.
#[derive(Debug)]
enum Step {
    /// Head leaves the queue with this outcome
    Advance(TransferOutcome),
    /// Head is replaced by a corrected task and attempted again
    Retry(TransferTask),
}

pub(crate) struct QueueProcessor {
    queue: TransferQueue,
    duplicates_dir: Option<PathBuf>,
    hasher: Arc<dyn ContentHasher>,
    listener: Arc<dyn TransferListener>,
    commands: UnboundedReceiver<Command>,
    current: ProcessorState,
    state: watch::Sender<ProcessorState>,
}

impl QueueProcessor {
    pub(crate) fn new(
        hasher: Arc<dyn ContentHasher>,
        listener: Arc<dyn TransferListener>,
        commands: UnboundedReceiver<Command>,
        state: watch::Sender<ProcessorState>,
    ) -> Self {
        QueueProcessor {
            queue: TransferQueue::new(),
            duplicates_dir: None,
            hasher,
            listener,
            commands,
            current: ProcessorState::Idle,
            state,
        }
    }

    /// Drive the queue until every engine handle is dropped and no work is left.
    pub(crate) async fn run(mut self) {
        loop {
            loop {
                match self.commands.try_recv() {
                    Ok(command) => self.apply(command),
                    Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
                }
            }

            if self.queue.is_empty() {
                if self.current == ProcessorState::Running {
                    self.set_state(ProcessorState::Idle);
                    debug!("transfer queue drained");
                    self.listener.on_queue_drained();
                }

                match self.commands.recv().await {
                    Some(command) => self.apply(command),
                    None => break,
                }
                continue;
            }

            if self.current == ProcessorState::Idle {
                debug!(queued = self.queue.len(), "transfer queue started");
                self.set_state(ProcessorState::Running);
            }

            self.step().await;
            tokio::task::yield_now().await;
        }

        debug!("transfer engine stopped");
    }

    fn set_state(&mut self, state: ProcessorState) {
        self.current = state;
        self.state.send_replace(state);
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Submit { id, task } => self.queue.push_back(id, task),
            Command::Replace { id, task } => match self.queue.position(id) {
                Some(position) => {
                    debug!(task = %id, position, "replacing queued task in place");
                    self.queue.replace(id, task);
                }
                None => {
                    debug!(task = %id, "task no longer queued, appending replacement");
                    self.queue.push_back(id, task);
                }
            },
            Command::SetDuplicatesDir(path) => self.duplicates_dir = Some(path),
        }
    }

    /// Attempt the head task once and either advance or retry in place.
    async fn step(&mut self) {
        let Some(head) = self.queue.head().cloned() else {
            return;
        };

        match self.attempt(&head.task).await {
            Step::Advance(outcome) => {
                self.queue.pop_head();
                self.listener.on_item_processed(head.id, &head.task, &outcome);
            }
            Step::Retry(task) => {
                self.queue.replace_head(task);
            }
        }
    }

    async fn attempt(&self, task: &TransferTask) -> Step {
        info!(
            source = %task.source.display(),
            destination = %task.destination.display(),
            mode = %task.mode,
            "processing transfer"
        );

        let err = match fs_ops::transfer_file(task).await {
            Ok(bytes) => {
                return Step::Advance(TransferOutcome::Done {
                    destination: task.destination.clone(),
                    bytes,
                })
            }
            Err(err) => err,
        };

        let err = if err.is_collision() {
            match resolve_collision(task, self.duplicates_dir.as_deref(), Arc::clone(&self.hasher)).await {
                Resolution::Duplicate(next) | Resolution::Versioned(next) => return Step::Retry(next),
                Resolution::Abandon(err) => err,
            }
        } else {
            err
        };

        error!(
            source = %task.source.display(),
            destination = %task.destination.display(),
            error = %err,
            "could not transfer file"
        );
        Step::Advance(TransferOutcome::from(&err))
    }
}
