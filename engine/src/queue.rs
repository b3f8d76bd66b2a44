//! The pending-task queue.
//!
//! A FIFO of tasks that also supports replacing an entry in place, so a retry
//! keeps the position of the task it corrects.

use crate::model::{TaskId, TransferTask};
use std::collections::VecDeque;

/// A queued task and its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: TaskId,
    pub task: TransferTask,
}

/// Ordered collection of pending transfer tasks.
#[derive(Debug, Default)]
pub struct TransferQueue {
    entries: VecDeque<QueueEntry>,
}

impl TransferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the back of the queue.
    pub fn push_back(&mut self, id: TaskId, task: TransferTask) {
        self.entries.push_back(QueueEntry { id, task });
    }

    /// Overwrite the task with handle `id` without moving it.
    ///
    /// Returns false when no such task is queued.
    pub fn replace(&mut self, id: TaskId, task: TransferTask) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.task = task;
                true
            }
            None => false,
        }
    }

    /// Overwrite the head task, keeping its handle. Returns the handle, or
    /// None on an empty queue.
    pub fn replace_head(&mut self, task: TransferTask) -> Option<TaskId> {
        let head = self.entries.front_mut()?;
        head.task = task;
        Some(head.id)
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn pop_head(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Queue position of the task with handle `id`.
    pub fn position(&self, id: TaskId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;
    use std::path::PathBuf;

    fn task(name: &str) -> TransferTask {
        TransferTask::new(format!("/card/{}", name), "/photos/2021-05", Mode::Copy, true)
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = TransferQueue::new();
        let (a, b) = (TaskId::new(), TaskId::new());
        queue.push_back(a, task("a.jpg"));
        queue.push_back(b, task("b.jpg"));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop_head().map(|e| e.id), Some(a));
        assert_eq!(queue.pop_head().map(|e| e.id), Some(b));
        assert!(queue.is_empty());
        assert!(queue.pop_head().is_none());
    }

    #[test]
    fn test_replace_head_keeps_position_and_handle() {
        let mut queue = TransferQueue::new();
        let (a, b) = (TaskId::new(), TaskId::new());
        queue.push_back(a, task("a.jpg"));
        queue.push_back(b, task("b.jpg"));

        let retry = task("a.jpg").retarget(PathBuf::from("/photos/2021-05/a_00.jpg"), true);
        assert_eq!(queue.replace_head(retry.clone()), Some(a));

        assert_eq!(queue.len(), 2);
        let head = queue.head().expect("queue has a head");
        assert_eq!(head.id, a);
        assert_eq!(head.task, retry);
        assert_eq!(queue.position(b), Some(1));
    }

    #[test]
    fn test_replace_by_handle() {
        let mut queue = TransferQueue::new();
        let (a, b, c) = (TaskId::new(), TaskId::new(), TaskId::new());
        queue.push_back(a, task("a.jpg"));
        queue.push_back(b, task("b.jpg"));
        queue.push_back(c, task("c.jpg"));

        assert!(queue.replace(b, task("z.jpg")));
        assert_eq!((queue.position(a), queue.position(b), queue.position(c)), (Some(0), Some(1), Some(2)));
        queue.pop_head();
        let replaced = queue.head().expect("queue has a head");
        assert_eq!(replaced.id, b);
        assert_eq!(replaced.task.source, PathBuf::from("/card/z.jpg"));

        assert!(!queue.replace(TaskId::new(), task("x.jpg")));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_replace_head_on_empty_queue() {
        let mut queue = TransferQueue::new();
        assert_eq!(queue.replace_head(task("a.jpg")), None);
        assert!(queue.is_empty());
    }
}
