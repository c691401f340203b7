//! Coordinator façade and runtime wiring.
//!
//! [`Coordinator`] is the cheap-to-clone handle the service layer holds: it
//! creates operation records, enqueues tasks and answers lookups.
//! [`CoordinatorRuntime`] owns the moving parts behind it, the executor
//! thread and the reconciler task, and tears them down in order on shutdown.

use crate::engine::ExecutionEngine;
use crate::queue::{response_queue, task_queue, TaskSender};
use crate::reconciler::ResponseReconciler;
use crate::store::{OperationRecord, OperationStore};
use crate::task::Task;
use crate::worker::{ExecutorLoop, DEFAULT_POLL_INTERVAL};
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Tunables for the coordinator's loops.
#[derive(Clone, Copy, Debug)]
pub struct RuntimeSettings {
    /// Sleep between executor polls of an empty task queue.
    pub poll_interval: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Submission and lookup handle shared with request handlers.
#[derive(Clone)]
pub struct Coordinator {
    store: Arc<OperationStore>,
    tasks: TaskSender,
}

impl Coordinator {
    /// Submits client code for execution and returns the pending record.
    ///
    /// The record is created before the task is enqueued, so the id in the
    /// returned snapshot is always resolvable through [`Coordinator::lookup`].
    pub fn submit_code(&self, code: impl Into<String>) -> OperationRecord {
        self.submit(Task::client_code(code))
    }

    /// Submits a host-management command, serialized with code execution.
    pub fn submit_host_command(
        &self,
        command: impl Into<String>,
        args: Vec<String>,
    ) -> OperationRecord {
        self.submit(Task::host_command(command, args))
    }

    fn submit(&self, task: Task) -> OperationRecord {
        let record = self.store.create(task.id());
        info!(task_id = %task.id(), kind = %task.kind(), "task submitted");
        if self.tasks.enqueue(task).is_err() {
            // Only possible mid-shutdown; the record stays pending and the
            // client sees an operation that never completes.
            warn!(task_id = %record.id(), "task queue closed, submission dropped");
        }
        record
    }

    /// Returns a snapshot of the operation, or `None` for an unknown id.
    pub fn lookup(&self, id: &str) -> Option<OperationRecord> {
        self.store.get(id)
    }
}

/// Owns the executor thread, reconciler task and their stop signal.
pub struct CoordinatorRuntime {
    coordinator: Coordinator,
    shutdown: CancellationToken,
    executor: Option<thread::JoinHandle<()>>,
    reconciler: tokio::task::JoinHandle<()>,
}

impl CoordinatorRuntime {
    /// Wires up the pipeline and starts both consumer loops.
    ///
    /// Must run inside a tokio runtime. The engine moves onto the executor
    /// thread here and stays there for the life of the runtime.
    pub fn start<E: ExecutionEngine>(engine: E, settings: RuntimeSettings) -> io::Result<Self> {
        let store = Arc::new(OperationStore::new());
        let (task_tx, task_rx) = task_queue();
        let (response_tx, response_rx) = response_queue();
        let shutdown = CancellationToken::new();

        let executor = ExecutorLoop::new(task_rx, response_tx, engine, settings.poll_interval)
            .spawn(shutdown.clone())?;

        let reconciler = tokio::spawn(
            ResponseReconciler::new(response_rx, Arc::clone(&store)).run(shutdown.clone()),
        );

        Ok(Self {
            coordinator: Coordinator {
                store,
                tasks: task_tx,
            },
            shutdown,
            executor: Some(executor),
            reconciler,
        })
    }

    pub fn coordinator(&self) -> Coordinator {
        self.coordinator.clone()
    }

    /// Stops both loops: signals cancellation, joins the executor thread,
    /// then awaits the reconciler. Tasks already enqueued are drained first.
    pub async fn shutdown(mut self) {
        info!("coordinator runtime shutting down");
        self.shutdown.cancel();

        if let Some(handle) = self.executor.take() {
            let joined = tokio::task::spawn_blocking(move || handle.join()).await;
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(_)) => warn!("executor thread panicked before join"),
                Err(err) => warn!(error = %err, "failed to join executor thread"),
            }
        }

        if let Err(err) = self.reconciler.await {
            warn!(error = %err, "reconciler task failed");
        }
        info!("coordinator runtime stopped");
    }
}
