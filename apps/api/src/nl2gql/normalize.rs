//! The uniform `(payload, status)` shape every pipeline exit reduces to,
//! and the mapping from executed results onto it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::graphql::Execution;

/// Used when an error entry has no readable `message`.
const FALLBACK_ERROR_MESSAGE: &str = "Operation failed";

/// Universal return value of the translation pipeline.
///
/// `payload` is always a JSON object:
/// - `{"error": {"message": ...}}` on any failure
/// - `{"graphql": ...}` for a dry run
/// - `{"graphql": ..., "result": ...}` after execution
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub payload: Value,
    pub status: StatusCode,
}

impl Outcome {
    pub fn error(message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            payload: json!({ "error": { "message": message.into() } }),
            status,
        }
    }

    pub fn dry_run(query: &str) -> Self {
        Self {
            payload: json!({ "graphql": query }),
            status: StatusCode::OK,
        }
    }

    pub fn executed(query: &str, result: Value, success: bool) -> Self {
        Self {
            payload: json!({ "graphql": query, "result": result }),
            status: if success {
                StatusCode::OK
            } else {
                StatusCode::BAD_REQUEST
            },
        }
    }

    pub fn is_error(&self) -> bool {
        self.payload.get("error").is_some()
    }

    /// The error message, if this is an error outcome.
    pub fn error_message(&self) -> Option<&str> {
        self.payload
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(Value::as_str)
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (self.status, Json(self.payload)).into_response()
    }
}

/// First operation-level error message carried in `result["errors"]`, if any.
///
/// An empty or non-list `errors` value counts as no errors.
pub fn first_operation_error(result: &Value) -> Option<String> {
    let first = result.get("errors")?.as_array()?.first()?;
    let message = first
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| first.as_str().map(str::to_string))
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string());
    Some(message)
}

/// Maps an execution onto an `Outcome`.
///
/// Embedded operation errors win over the success flag and are always
/// reported as 400, whatever their underlying cause (not found, validation,
/// permission). Otherwise the result is passed through untouched.
pub fn normalize_execution(query: &str, execution: Execution) -> Outcome {
    if let Some(message) = first_operation_error(&execution.result) {
        return Outcome::error(message, StatusCode::BAD_REQUEST);
    }
    Outcome::executed(query, execution.result, execution.success)
}
