//! Response reconciler - the single consumer of the response queue.
//!
//! Runs as an async task on the runtime, folding each response into the
//! operation store so pollers observe completion. It is the only writer of
//! record completion, which is what makes the exactly-once fold hold.

use crate::queue::ResponseReceiver;
use crate::response::{Response, ResponseStatus, ResultPayload};
use crate::store::{OperationResult, OperationStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Builds the stored result from a response, per status.
fn result_from_response(response: &Response) -> OperationResult {
    let (interpreter_lines, graphic_artifacts, message) = match response.result() {
        ResultPayload::Execution(output) => (
            output.text_lines.clone(),
            output.graphic_artifacts.clone(),
            response.error_message().map(str::to_string),
        ),
        ResultPayload::Command(output) => {
            (Vec::new(), Vec::new(), Some(output.message.clone()))
        }
        ResultPayload::None => (
            Vec::new(),
            Vec::new(),
            response.error_message().map(str::to_string),
        ),
    };
    OperationResult {
        status: response.status(),
        interpreter_lines,
        graphic_artifacts,
        message,
    }
}

/// The response-to-store fold loop.
pub struct ResponseReconciler {
    responses: ResponseReceiver,
    store: Arc<OperationStore>,
}

impl ResponseReconciler {
    pub fn new(responses: ResponseReceiver, store: Arc<OperationStore>) -> Self {
        Self { responses, store }
    }

    /// Consumes responses until the stop signal fires or every producer is
    /// gone.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("response reconciler started");
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    // The executor drains its queue before dropping the
                    // sender; keep folding until it does so no completed
                    // task is lost between its exit and ours.
                    while let Some(response) = self.responses.recv().await {
                        self.apply(response);
                    }
                    break;
                }
                received = self.responses.recv() => {
                    match received {
                        Some(response) => self.apply(response),
                        None => {
                            info!("response queue closed");
                            break;
                        }
                    }
                }
            }
        }
        info!("response reconciler stopped");
    }

    fn apply(&self, response: Response) {
        let task_id = response.task_id().to_string();
        let status = response.status();
        let result = result_from_response(&response);

        let mut already_done = false;
        let found = self.store.update(&task_id, |record| {
            already_done = !record.complete(result);
        });

        if !found {
            warn!(task_id = %task_id, "response for unknown operation, dropping");
        } else if already_done {
            warn!(task_id = %task_id, "operation already completed, keeping first result");
        } else {
            debug!(task_id = %task_id, status = %status, "operation completed");
        }
    }
}
