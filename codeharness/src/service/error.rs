//! Service-level errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use std::fmt;

/// JSON envelope every error response carries.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Errors a service handler can answer with.
#[derive(Debug)]
pub enum ServiceError {
    /// The requested operation id is not in the store.
    OperationNotFound(String),

    /// The endpoint exists but its behavior is not implemented.
    NotImplemented(&'static str),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperationNotFound(id) => write!(f, "operation not found: {}", id),
            Self::NotImplemented(what) => write!(f, "not implemented: {}", what),
        }
    }
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            Self::OperationNotFound(_) => StatusCode::NOT_FOUND,
            Self::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            ServiceError::OperationNotFound("abc".to_string()).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_not_implemented_maps_to_501() {
        assert_eq!(
            ServiceError::NotImplemented("cancel").status(),
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[test]
    fn test_display_names_the_operation() {
        let err = ServiceError::OperationNotFound("abc".to_string());
        assert_eq!(err.to_string(), "operation not found: abc");
    }
}
