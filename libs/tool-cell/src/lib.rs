//! Reservation and information tools behind a single audited executor.
//! Every call passes the auth gate, gets its arguments back-filled from
//! session metadata, and leaves one masked audit row.

pub mod error;
pub mod executor;
pub mod handlers;
pub mod mask;
pub mod models;
pub mod schemas;

pub use error::ToolError;
pub use executor::{ToolExecutor, AUTH_METADATA_KEYS};
pub use handlers::ToolHandlers;
pub use mask::{mask_args, mask_phone};
pub use models::{
    ToolContext, ToolName, ToolOutput, AUTH_REQUIRED_REPLY, CLINIC_CLOSED_REPLY,
    DEPARTMENT_REQUIRED_REPLY, PAST_TIME_REPLY, TIME_REQUIRED_REPLY,
};
pub use schemas::{schema_for, tool_schemas};
