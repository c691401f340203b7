//! Channel wrappers for the two hand-off points in the pipeline.
//!
//! The task queue carries work from the coordinator into the executor loop;
//! the response queue carries completion records from the executor into the
//! reconciler. Both are unbounded multi-producer single-consumer channels, so
//! enqueue never blocks a submitter and ordering is preserved per producer.
//!
//! The executor consumes without an async runtime, so [`Receiver::try_dequeue`]
//! exposes the non-blocking poll it needs; the reconciler lives on the runtime
//! and awaits [`Receiver::recv`] instead.

use crate::response::Response;
use crate::task::Task;
use tokio::sync::mpsc;

/// Outcome of a non-blocking dequeue attempt.
#[derive(Debug)]
pub enum Dequeue<T> {
    /// An item was removed from the queue.
    Item(T),

    /// The queue is currently empty; senders may still exist.
    Empty,

    /// Every sender has been dropped and the queue is drained.
    Closed,
}

/// Sending half of a queue. Cheap to clone, one per producer.
#[derive(Debug)]
pub struct Sender<T> {
    inner: mpsc::UnboundedSender<T>,
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Sender<T> {
    /// Enqueues an item. Never blocks.
    ///
    /// Returns the item back if the consumer has shut down, so the caller
    /// can report the loss instead of silently dropping it.
    pub fn enqueue(&self, item: T) -> Result<(), T> {
        self.inner.send(item).map_err(|err| err.0)
    }
}

/// Receiving half of a queue. Exactly one per queue.
#[derive(Debug)]
pub struct Receiver<T> {
    inner: mpsc::UnboundedReceiver<T>,
}

impl<T> Receiver<T> {
    /// Attempts to dequeue without blocking or awaiting.
    pub fn try_dequeue(&mut self) -> Dequeue<T> {
        match self.inner.try_recv() {
            Ok(item) => Dequeue::Item(item),
            Err(mpsc::error::TryRecvError::Empty) => Dequeue::Empty,
            Err(mpsc::error::TryRecvError::Disconnected) => Dequeue::Closed,
        }
    }

    /// Awaits the next item. Returns `None` once all senders are dropped
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.inner.recv().await
    }
}

fn queue<T>() -> (Sender<T>, Receiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Sender { inner: tx }, Receiver { inner: rx })
}

pub type TaskSender = Sender<Task>;
pub type TaskReceiver = Receiver<Task>;
pub type ResponseSender = Sender<Response>;
pub type ResponseReceiver = Receiver<Response>;

/// Creates the coordinator-to-executor task queue.
pub fn task_queue() -> (TaskSender, TaskReceiver) {
    queue()
}

/// Creates the executor-to-reconciler response queue.
pub fn response_queue() -> (ResponseSender, ResponseReceiver) {
    queue()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Task;

    #[test]
    fn test_fifo_order_single_producer() {
        let (tx, mut rx) = task_queue();
        let first = Task::client_code("1");
        let second = Task::client_code("2");
        let first_id = first.id().to_string();
        let second_id = second.id().to_string();

        tx.enqueue(first).unwrap();
        tx.enqueue(second).unwrap();

        match rx.try_dequeue() {
            Dequeue::Item(task) => assert_eq!(task.id(), first_id),
            other => panic!("expected item, got {:?}", other),
        }
        match rx.try_dequeue() {
            Dequeue::Item(task) => assert_eq!(task.id(), second_id),
            other => panic!("expected item, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_queue_reports_empty() {
        let (_tx, mut rx) = task_queue();
        assert!(matches!(rx.try_dequeue(), Dequeue::Empty));
    }

    #[test]
    fn test_closed_queue_drains_before_reporting_closed() {
        let (tx, mut rx) = task_queue();
        tx.enqueue(Task::client_code("x")).unwrap();
        drop(tx);

        assert!(matches!(rx.try_dequeue(), Dequeue::Item(_)));
        assert!(matches!(rx.try_dequeue(), Dequeue::Closed));
    }

    #[test]
    fn test_enqueue_after_receiver_dropped_returns_item() {
        let (tx, rx) = task_queue();
        drop(rx);
        let task = Task::client_code("x");
        let id = task.id().to_string();
        match tx.enqueue(task) {
            Err(returned) => assert_eq!(returned.id(), id),
            Ok(()) => panic!("enqueue should fail with no receiver"),
        }
    }

    #[tokio::test]
    async fn test_async_recv_sees_enqueued_item() {
        let (tx, mut rx) = response_queue();
        tx.enqueue(crate::response::Response::command_success("id", "hello"))
            .unwrap();
        let response = rx.recv().await.unwrap();
        assert_eq!(response.task_id(), "id");
    }

    #[tokio::test]
    async fn test_async_recv_none_after_all_senders_dropped() {
        let (tx, mut rx) = response_queue();
        drop(tx);
        assert!(rx.recv().await.is_none());
    }
}
