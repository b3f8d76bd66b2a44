//! Lifecycle signals.
//!
//! This module defines the TransferListener trait, which decouples the engine
//! from whoever consumes its results (CLI, tests, a future UI). Only two
//! signals exist: one per advanced task, and one when the queue drains.

use crate::model::{TaskId, TransferOutcome, TransferTask};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Trait for receiving lifecycle signals from the queue processor.
///
/// Methods are called from the processor task, so they should return quickly.
pub trait TransferListener: Send + Sync {
    /// Called once for every task that leaves the queue, successful or not.
    fn on_item_processed(&self, id: TaskId, task: &TransferTask, outcome: &TransferOutcome);

    /// Called once each time the queue goes from non-empty to empty.
    fn on_queue_drained(&self);
}

/// A lifecycle signal as a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    ItemProcessed {
        id: TaskId,
        task: TransferTask,
        outcome: TransferOutcome,
    },
    QueueDrained,
}

/// A TransferListener that forwards every signal over a channel.
pub struct ChannelListener {
    sender: Sender<TransferEvent>,
}

impl ChannelListener {
    /// Create a listener and the receiving end of its channel.
    pub fn new() -> (Self, Receiver<TransferEvent>) {
        let (sender, receiver) = unbounded();
        (ChannelListener { sender }, receiver)
    }
}

impl TransferListener for ChannelListener {
    fn on_item_processed(&self, id: TaskId, task: &TransferTask, outcome: &TransferOutcome) {
        let _ = self.sender.send(TransferEvent::ItemProcessed {
            id,
            task: task.clone(),
            outcome: outcome.clone(),
        });
    }

    fn on_queue_drained(&self) {
        let _ = self.sender.send(TransferEvent::QueueDrained);
    }
}
