use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Upstream service error: {0}")]
    TransientUpstream(String),

    #[error("Tool execution error: {0}")]
    ToolException(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, used in audit rows and client payloads.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::AuthRequired(_) => "auth_required",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "validation",
            AppError::BusinessRule(_) => "business_rule",
            AppError::TransientUpstream(_) => "transient_upstream",
            AppError::ToolException(_) => "tool_exception",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::AuthRequired(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::BusinessRule(msg) => (StatusCode::CONFLICT, msg),
            AppError::TransientUpstream(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::ToolException(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        tracing::error!("Error: {}: {}", status, message);

        let body = Json(json!({
            "error": message,
            "code": self.code()
        }));

        (status, body).into_response()
    }
}
