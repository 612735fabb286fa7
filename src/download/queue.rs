//! Unbounded FIFO shared by the crawler (producer) and the workers (consumers).
//!
//! Tracks outstanding work the way a joinable queue does: every pushed task
//! raises the pending count and every [`WorkQueue::task_done`] lowers it, so
//! [`WorkQueue::join`] returns only when everything pushed so far, requeues
//! included, has been processed. Shutdown messages are not counted.

use tokio::sync::{Mutex, mpsc, watch};
use tracing::warn;

use crate::item::DownloadTask;

/// One message handed to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueMessage {
    Task(DownloadTask),
    /// Tells exactly one worker to exit.
    Shutdown,
}

/// Joinable multi-consumer queue of [`DownloadTask`]s.
#[derive(Debug)]
pub struct WorkQueue {
    sender: mpsc::UnboundedSender<QueueMessage>,
    receiver: Mutex<mpsc::UnboundedReceiver<QueueMessage>>,
    pending: watch::Sender<usize>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (pending, _) = watch::channel(0);
        Self {
            sender,
            receiver: Mutex::new(receiver),
            pending,
        }
    }

    /// Enqueues a task. Never blocks.
    pub fn push(&self, task: DownloadTask) {
        self.pending.send_modify(|n| *n += 1);
        if let Err(err) = self.sender.send(QueueMessage::Task(task)) {
            self.pending.send_modify(|n| *n = n.saturating_sub(1));
            warn!(error = %err, "work queue closed, task dropped");
        }
    }

    /// Enqueues one shutdown message.
    pub fn push_shutdown(&self) {
        if self.sender.send(QueueMessage::Shutdown).is_err() {
            warn!("work queue closed, shutdown message dropped");
        }
    }

    /// Takes the next message, waiting until one is available.
    ///
    /// Returns `None` only if the queue was closed.
    pub async fn next(&self) -> Option<QueueMessage> {
        self.receiver.lock().await.recv().await
    }

    /// Marks one dequeued task as finished.
    pub fn task_done(&self) {
        self.pending.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Tasks pushed but not yet marked done.
    #[must_use]
    pub fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    /// Waits until every pushed task has been marked done.
    pub async fn join(&self) {
        let mut rx = self.pending.subscribe();
        // The sender lives as long as `self`, so this only errors if it was dropped.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    fn task(n: u64) -> DownloadTask {
        DownloadTask::new(format!("https://live.example/{n}.jpg"), format!("{n}.jpg"), n)
    }

    #[tokio::test]
    async fn test_queue_is_fifo() {
        let queue = WorkQueue::new();
        queue.push(task(1));
        queue.push(task(2));

        assert_eq!(queue.next().await, Some(QueueMessage::Task(task(1))));
        assert_eq!(queue.next().await, Some(QueueMessage::Task(task(2))));
        assert_eq!(queue.pending(), 2);
    }

    #[tokio::test]
    async fn test_join_on_empty_queue_returns_immediately() {
        let queue = WorkQueue::new();
        tokio::time::timeout(Duration::from_millis(100), queue.join())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_join_waits_for_task_done() {
        let queue = Arc::new(WorkQueue::new());
        queue.push(task(1));

        let joiner = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move { queue.join().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(!joiner.is_finished());

        let _ = queue.next().await;
        queue.task_done();
        tokio::time::timeout(Duration::from_millis(200), joiner)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_requeue_before_task_done_keeps_join_blocked() {
        let queue = WorkQueue::new();
        queue.push(task(1));

        let Some(QueueMessage::Task(first)) = queue.next().await else {
            panic!("expected a task");
        };
        queue.push(first);
        queue.task_done();
        assert_eq!(queue.pending(), 1);

        let _ = queue.next().await;
        queue.task_done();
        assert_eq!(queue.pending(), 0);
    }

    #[tokio::test]
    async fn test_shutdown_is_not_counted() {
        let queue = WorkQueue::new();
        queue.push_shutdown();
        assert_eq!(queue.pending(), 0);
        assert_eq!(queue.next().await, Some(QueueMessage::Shutdown));
    }
}
