//! Executor loop - the single serial consumer of the task queue.
//!
//! The loop runs as a plain blocking function on its own named OS thread
//! because the execution engine must live on one thread for its whole life.
//! It polls the task queue without blocking, executes one task at a time,
//! and emits exactly one response per dequeued task regardless of outcome.
//!
//! Shutdown is cooperative: the loop checks its cancellation token only when
//! the queue is empty, so every task already enqueued is drained before the
//! thread exits.

use crate::engine::{EngineError, ExecutionEngine};
use crate::queue::{Dequeue, ResponseSender, TaskReceiver};
use crate::response::{ExecutionOutput, Response, ResponseStatus};
use crate::task::{Task, TaskKind, TaskPayload};
use std::io;
use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default sleep between polls of an empty task queue.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// The serial task consumer. Owns the engine, the task receiver and the
/// response sender for the life of its thread.
pub struct ExecutorLoop<E: ExecutionEngine> {
    tasks: TaskReceiver,
    responses: ResponseSender,
    engine: E,
    poll_interval: Duration,
}

impl<E: ExecutionEngine> ExecutorLoop<E> {
    pub fn new(
        tasks: TaskReceiver,
        responses: ResponseSender,
        engine: E,
        poll_interval: Duration,
    ) -> Self {
        Self {
            tasks,
            responses,
            engine,
            poll_interval,
        }
    }

    /// Spawns the loop on a dedicated named OS thread.
    pub fn spawn(self, shutdown: CancellationToken) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("executor".to_string())
            .spawn(move || self.run(shutdown))
    }

    /// Runs the consume cycle until cancelled with an empty queue, or until
    /// the task queue closes.
    pub fn run(mut self, shutdown: CancellationToken) {
        info!("executor loop started");
        loop {
            match self.tasks.try_dequeue() {
                Dequeue::Item(task) => {
                    let task_id = task.id().to_string();
                    let response = self.process(task);
                    debug!(task_id = %task_id, status = %response.status(), "task processed");
                    if self.responses.enqueue(response).is_err() {
                        warn!(task_id = %task_id, "response queue closed, dropping response");
                    }
                }
                Dequeue::Empty => {
                    if shutdown.is_cancelled() {
                        break;
                    }
                    thread::sleep(self.poll_interval);
                }
                Dequeue::Closed => {
                    info!("task queue closed");
                    break;
                }
            }
        }
        info!("executor loop stopped");
    }

    /// Executes one task and builds its response. Never panics on task
    /// content; every failure mode maps to a failure response.
    fn process(&mut self, task: Task) -> Response {
        match (task.kind(), task.payload()) {
            (TaskKind::ClientCode, TaskPayload::Code { code }) => {
                self.execute_code(task.id(), code)
            }
            (TaskKind::ManagementCode, TaskPayload::Code { .. }) => {
                // Reserved extension point. Answer so the operation still
                // completes instead of pending forever.
                warn!(task_id = %task.id(), "management code tasks are not handled");
                Response::failure(
                    task.id(),
                    ResponseStatus::InvalidTask,
                    "management code tasks are not handled",
                )
            }
            (TaskKind::HostCommand, TaskPayload::Command { command, args }) => {
                run_host_command(task.id(), command, args)
            }
            (kind, payload) => {
                // The factories are the only way to build a task, and each
                // pairs its kind with the right payload. Reaching this arm
                // is a coordinator bug; the panic hook turns it into an
                // abort.
                unreachable!(
                    "task {} pairs kind {} with payload {:?}",
                    task.id(),
                    kind,
                    payload
                )
            }
        }
    }

    fn execute_code(&mut self, task_id: &str, code: &str) -> Response {
        match self.engine.execute(code) {
            Ok(outcome) => {
                let output = ExecutionOutput {
                    text_lines: outcome.text_lines,
                    graphic_artifacts: outcome.graphic_artifacts,
                };
                if outcome.had_error {
                    Response::script_error(task_id, output)
                } else {
                    Response::execution_success(task_id, output)
                }
            }
            Err(EngineError::Execution(message)) => {
                warn!(task_id = %task_id, error = %message, "engine could not run task");
                Response::failure(task_id, ResponseStatus::ExecutionFailure, message)
            }
            Err(EngineError::Init(message)) => {
                // Init errors belong to startup; one surfacing here means
                // the engine lost its process. Fail the task, keep looping.
                warn!(task_id = %task_id, error = %message, "engine reported init failure mid-run");
                Response::failure(task_id, ResponseStatus::ExecutionFailure, message)
            }
        }
    }
}

/// Host-management commands run by the coordinator process itself,
/// serialized with code execution because they need the engine quiescent.
fn run_host_command(task_id: &str, command: &str, args: &[String]) -> Response {
    match command {
        "echo" => match args.first() {
            Some(first) => Response::command_success(task_id, first.clone()),
            None => Response::failure(
                task_id,
                ResponseStatus::HostCommandError,
                "echo requires at least one argument",
            ),
        },
        other => Response::failure(
            task_id,
            ResponseStatus::HostCommandError,
            format!("unknown host command: {}", other),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOutcome;
    use crate::queue::{response_queue, task_queue};
    use crate::response::ResultPayload;

    /// Scripted engine: returns canned outcomes in order.
    struct StubEngine {
        outcomes: Vec<Result<EngineOutcome, EngineError>>,
    }

    impl StubEngine {
        fn new(mut outcomes: Vec<Result<EngineOutcome, EngineError>>) -> Self {
            outcomes.reverse();
            Self { outcomes }
        }
    }

    impl ExecutionEngine for StubEngine {
        fn execute(&mut self, _code: &str) -> Result<EngineOutcome, EngineError> {
            self.outcomes.pop().unwrap_or_else(|| Ok(EngineOutcome::default()))
        }
    }

    fn drain_one(
        engine: StubEngine,
        task: Task,
    ) -> Response {
        let (task_tx, task_rx) = task_queue();
        let (response_tx, mut response_rx) = response_queue();
        task_tx.enqueue(task).unwrap();
        drop(task_tx);

        let executor = ExecutorLoop::new(task_rx, response_tx, engine, DEFAULT_POLL_INTERVAL);
        executor.run(CancellationToken::new());

        match response_rx.try_dequeue() {
            Dequeue::Item(response) => response,
            other => panic!("expected one response, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_outcome_maps_to_success() {
        let engine = StubEngine::new(vec![Ok(EngineOutcome {
            text_lines: vec!["[1] 2".to_string()],
            graphic_artifacts: vec![],
            had_error: false,
        })]);
        let task = Task::client_code("1 + 1");
        let expected_id = task.id().to_string();

        let response = drain_one(engine, task);
        assert_eq!(response.task_id(), expected_id);
        assert_eq!(response.status(), ResponseStatus::Success);
    }

    #[test]
    fn test_errored_outcome_maps_to_script_error() {
        let engine = StubEngine::new(vec![Ok(EngineOutcome {
            text_lines: vec!["Error: object 'x' not found".to_string()],
            graphic_artifacts: vec![],
            had_error: true,
        })]);

        let response = drain_one(engine, Task::client_code("x"));
        assert_eq!(response.status(), ResponseStatus::ScriptError);
        match response.result() {
            ResultPayload::Execution(output) => {
                assert_eq!(output.text_lines, vec!["Error: object 'x' not found"]);
            }
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_engine_error_becomes_failure_response_not_loop_exit() {
        let engine = StubEngine::new(vec![
            Err(EngineError::Execution("engine went away".to_string())),
            Ok(EngineOutcome::default()),
        ]);
        let (task_tx, task_rx) = task_queue();
        let (response_tx, mut response_rx) = response_queue();
        task_tx.enqueue(Task::client_code("boom")).unwrap();
        task_tx.enqueue(Task::client_code("fine")).unwrap();
        drop(task_tx);

        ExecutorLoop::new(task_rx, response_tx, engine, DEFAULT_POLL_INTERVAL)
            .run(CancellationToken::new());

        let first = match response_rx.try_dequeue() {
            Dequeue::Item(response) => response,
            other => panic!("expected response, got {:?}", other),
        };
        assert_eq!(first.status(), ResponseStatus::ExecutionFailure);
        assert_eq!(first.error_message(), Some("engine went away"));

        // The loop survived the engine error and processed the second task.
        assert!(matches!(response_rx.try_dequeue(), Dequeue::Item(_)));
    }

    #[test]
    fn test_management_code_answered_with_invalid_task() {
        let engine = StubEngine::new(vec![]);
        let response = drain_one(engine, Task::management_code("View(df)"));
        assert_eq!(response.status(), ResponseStatus::InvalidTask);
    }

    #[test]
    fn test_echo_returns_first_argument() {
        let engine = StubEngine::new(vec![]);
        let task = Task::host_command("echo", vec!["hello".to_string(), "ignored".to_string()]);
        let response = drain_one(engine, task);
        assert_eq!(response.status(), ResponseStatus::Success);
        match response.result() {
            ResultPayload::Command(output) => assert_eq!(output.message, "hello"),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn test_echo_without_arguments_fails() {
        let engine = StubEngine::new(vec![]);
        let response = drain_one(engine, Task::host_command("echo", vec![]));
        assert_eq!(response.status(), ResponseStatus::HostCommandError);
    }

    #[test]
    fn test_unknown_host_command_fails() {
        let engine = StubEngine::new(vec![]);
        let response = drain_one(engine, Task::host_command("reboot", vec![]));
        assert_eq!(response.status(), ResponseStatus::HostCommandError);
        assert_eq!(
            response.error_message(),
            Some("unknown host command: reboot")
        );
    }

    #[test]
    fn test_cancelled_loop_drains_pending_tasks_before_exit() {
        let engine = StubEngine::new((0..3).map(|_| Ok(EngineOutcome::default())).collect());
        let (task_tx, task_rx) = task_queue();
        let (response_tx, mut response_rx) = response_queue();
        for i in 0..3 {
            task_tx.enqueue(Task::client_code(format!("{}", i))).unwrap();
        }

        let shutdown = CancellationToken::new();
        shutdown.cancel();
        ExecutorLoop::new(task_rx, response_tx, engine, DEFAULT_POLL_INTERVAL).run(shutdown);

        let mut seen = 0;
        while let Dequeue::Item(_) = response_rx.try_dequeue() {
            seen += 1;
        }
        assert_eq!(seen, 3);
    }
}
