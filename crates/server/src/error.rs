//! Server-level errors. `AgentError` already carries its own
//! machine-readable `code()` for the dispatch envelope; `ServerError` is
//! the thinner set of transport/session-layer failures that sit above it.

use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("session error: {0}")]
    Session(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Agent(#[from] voice_agent_agent::AgentError),

    #[error(transparent)]
    Ledger(#[from] voice_agent_ledger::LedgerError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<&ServerError> for axum::http::StatusCode {
    fn from(err: &ServerError) -> Self {
        use axum::http::StatusCode;
        match err {
            ServerError::Session(_) => StatusCode::NOT_FOUND,
            ServerError::WebSocket(_) | ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Agent(e) => match e.code() {
                "CUSTOMER_NOT_FOUND" | "NO_INVOICE" | "NO_REMINDER" | "PRODUCT_NOT_FOUND" | "INVOICE_NOT_FOUND" => StatusCode::NOT_FOUND,
                "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
                "CONFLICT" | "ALREADY_CANCELLED" | "DUPLICATE_FOUND" => StatusCode::CONFLICT,
                "VALIDATION_ERROR" | "MISSING_FIELD" | "MULTIPLE_CUSTOMERS" => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Ledger(e) => match e.code() {
                "CUSTOMER_NOT_FOUND" | "PRODUCT_NOT_FOUND" | "INVOICE_NOT_FOUND" | "NO_INVOICE" | "NO_REMINDER" => StatusCode::NOT_FOUND,
                "CONFLICT" | "ALREADY_CANCELLED" | "DUPLICATE_FOUND" => StatusCode::CONFLICT,
                "INSUFFICIENT_STOCK" | "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        Self::from(&err)
    }
}

/// REST handlers return `Result<Json<_>, ServerError>` and let this impl
/// turn any error into the same `{success:false, error, data}` envelope the
/// WebSocket side already templates.
impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = axum::http::StatusCode::from(&self);
        let (code, data) = match &self {
            ServerError::Session(msg) => ("SESSION_ERROR", serde_json::json!({ "message": msg })),
            ServerError::WebSocket(msg) => ("WEBSOCKET_ERROR", serde_json::json!({ "message": msg })),
            ServerError::InvalidRequest(msg) => ("INVALID_REQUEST", serde_json::json!({ "message": msg })),
            ServerError::Agent(e) => (e.code(), e.data()),
            ServerError::Ledger(e) => (e.code(), serde_json::Value::Null),
            ServerError::Internal(msg) => ("INTERNAL_ERROR", serde_json::json!({ "message": msg })),
        };
        (status, Json(serde_json::json!({ "success": false, "error": code, "data": data }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
