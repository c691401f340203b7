//! HTTP service surface.
//!
//! A small JSON API over the coordinator: submit code, poll an operation,
//! a liveness probe. Submission always answers immediately with the pending
//! operation; clients poll until `done` flips and the result appears.

mod error;

pub use error::ServiceError;

use crate::coordinator::Coordinator;
use crate::response::ResponseStatus;
use crate::store::OperationRecord;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Body of `POST /v1/eval`.
#[derive(Debug, Deserialize, Serialize)]
pub struct EvalRequest {
    pub code: String,
}

/// Terminal result as rendered on the wire. Absent until `done` is true.
#[derive(Debug, Deserialize, Serialize)]
pub struct ResultBody {
    pub status: ResponseStatus,
    pub interpreter_lines: Vec<String>,
    pub graphic_artifacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// An operation as rendered on the wire.
#[derive(Debug, Deserialize, Serialize)]
pub struct OperationBody {
    pub id: String,
    pub done: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ResultBody>,
}

impl From<OperationRecord> for OperationBody {
    fn from(record: OperationRecord) -> Self {
        let result = record.result().map(|result| ResultBody {
            status: result.status,
            interpreter_lines: result.interpreter_lines.clone(),
            graphic_artifacts: result.graphic_artifacts.clone(),
            message: result.message.clone(),
        });
        Self {
            id: record.id().to_string(),
            done: record.is_done(),
            result,
        }
    }
}

async fn submit_eval(
    State(coordinator): State<Coordinator>,
    Json(request): Json<EvalRequest>,
) -> Json<OperationBody> {
    let record = coordinator.submit_code(request.code);
    debug!(task_id = %record.id(), "eval submitted over http");
    Json(record.into())
}

async fn get_operation(
    State(coordinator): State<Coordinator>,
    Path(id): Path<String>,
) -> Result<Json<OperationBody>, ServiceError> {
    match coordinator.lookup(&id) {
        Some(record) => Ok(Json(record.into())),
        None => Err(ServiceError::OperationNotFound(id)),
    }
}

async fn cancel_operation(Path(_id): Path<String>) -> ServiceError {
    // In-flight execution cannot be interrupted; the endpoint is reserved.
    ServiceError::NotImplemented("operation cancellation")
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Builds the service router over a coordinator handle.
pub fn router(coordinator: Coordinator) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/eval", post(submit_eval))
        .route("/v1/operations/{id}", get(get_operation))
        .route("/v1/operations/{id}/cancel", post(cancel_operation))
        .layer(TraceLayer::new_for_http())
        .with_state(coordinator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{OperationResult, OperationStore};

    #[test]
    fn test_pending_record_renders_without_result() {
        let store = OperationStore::new();
        let record = store.create("op-1");
        let body: OperationBody = record.into();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["id"], "op-1");
        assert_eq!(json["done"], false);
        assert!(json.get("result").is_none());
    }

    #[test]
    fn test_done_record_renders_result() {
        let store = OperationStore::new();
        store.create("op-1");
        store.update("op-1", |record| {
            record.complete(OperationResult {
                status: ResponseStatus::Success,
                interpreter_lines: vec!["[1] 2".to_string()],
                graphic_artifacts: vec![],
                message: None,
            });
        });

        let body: OperationBody = store.get("op-1").unwrap().into();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["done"], true);
        assert_eq!(json["result"]["status"], "success");
        assert_eq!(json["result"]["interpreter_lines"][0], "[1] 2");
        assert!(json["result"].get("message").is_none());
    }
}
