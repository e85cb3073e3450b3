use thiserror::Error;

use calendar_cell::CalendarError;
use shared_store::StoreError;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Authentication required")]
    AuthRequired,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Duplicate booking: {0}")]
    Duplicate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {0}")]
    Exception(String),
}

impl ToolError {
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::AuthRequired => "auth_required",
            ToolError::Validation(_) => "validation",
            ToolError::BusinessRule(_) => "business_rule",
            ToolError::Duplicate(_) => "duplicate",
            ToolError::NotFound(_) => "not_found",
            ToolError::Exception(_) => "tool_exception",
        }
    }

    /// The follow-up or explanation the user should see for this failure.
    pub fn user_reply(&self) -> Option<&str> {
        match self {
            ToolError::AuthRequired => Some(crate::models::AUTH_REQUIRED_REPLY),
            ToolError::Validation(msg)
            | ToolError::BusinessRule(msg)
            | ToolError::Duplicate(msg)
            | ToolError::NotFound(msg) => Some(msg),
            ToolError::Exception(_) => None,
        }
    }
}

impl From<StoreError> for ToolError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateSlot => ToolError::Duplicate(
                "해당 시간대에 이미 예약이 있습니다. 다른 시간을 선택해주세요.".to_string(),
            ),
            StoreError::NotFound(what) => ToolError::NotFound(what),
            StoreError::Unavailable(msg) => ToolError::Exception(msg),
        }
    }
}

impl From<CalendarError> for ToolError {
    fn from(err: CalendarError) -> Self {
        match err {
            CalendarError::PastTime => {
                ToolError::BusinessRule(crate::models::PAST_TIME_REPLY.to_string())
            }
            CalendarError::Closed => {
                ToolError::BusinessRule(crate::models::CLINIC_CLOSED_REPLY.to_string())
            }
        }
    }
}
