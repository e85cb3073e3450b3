use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDateTime, Utc};
use serde_json::{Map, Value};
use tracing::{info, warn};

use shared_models::ToolAuditLogEntry;
use shared_store::AuditLogStore;

use crate::error::ToolError;
use crate::handlers::ToolHandlers;
use crate::mask::mask_args;
use crate::models::{ToolContext, ToolName, ToolOutput};

/// Metadata keys whose presence marks the caller as authenticated.
pub const AUTH_METADATA_KEYS: [&str; 8] = [
    "user_id",
    "patient_id",
    "patient_identifier",
    "patient_phone",
    "account_id",
    "patient_pk",
    "auth_user_id",
    "verified_user",
];

/// Front door for every tool call. Applies the auth gate before any
/// handler runs and writes exactly one audit row per call, success or
/// failure included.
pub struct ToolExecutor {
    handlers: ToolHandlers,
    audit: Arc<dyn AuditLogStore>,
    auth_required: bool,
}

impl ToolExecutor {
    pub fn new(handlers: ToolHandlers, audit: Arc<dyn AuditLogStore>, auth_required: bool) -> Self {
        Self {
            handlers,
            audit,
            auth_required,
        }
    }

    pub fn is_authenticated(&self, ctx: &ToolContext) -> bool {
        if ctx.user_id.is_some() {
            return true;
        }
        AUTH_METADATA_KEYS.iter().any(|key| {
            ctx.metadata
                .get(*key)
                .map(|v| match v {
                    Value::String(s) => !s.trim().is_empty(),
                    Value::Null => false,
                    Value::Bool(b) => *b,
                    _ => true,
                })
                .unwrap_or(false)
        })
    }

    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        self.execute_at(name, args, ctx, Local::now().naive_local())
            .await
    }

    /// Same as [`execute`](Self::execute) with the clock pinned, so time
    /// sensitive paths stay reproducible under test.
    pub async fn execute_at(
        &self,
        name: &str,
        args: Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        let started = Instant::now();

        let Ok(tool) = name.parse::<ToolName>() else {
            let err = ToolError::Validation(format!("알 수 없는 도구입니다: {name}"));
            self.write_audit(name, &args, ctx, Some(err.code()), started)
                .await;
            return Err(err);
        };

        if self.auth_required && tool.is_sensitive() && !self.is_authenticated(ctx) {
            let err = ToolError::AuthRequired;
            self.write_audit(name, &args, ctx, Some(err.code()), started)
                .await;
            return Err(err);
        }

        let merged = self.merge_args(args, ctx);
        let result = self.handlers.dispatch(tool, &merged, ctx, now).await;
        let error_code = result.as_ref().err().map(|e| e.code());
        self.write_audit(name, &merged, ctx, error_code, started)
            .await;

        match &result {
            Ok(_) => info!(
                tool = name,
                session_id = %ctx.session_id,
                latency_ms = started.elapsed().as_millis() as u64,
                "tool executed"
            ),
            Err(err) => warn!(
                tool = name,
                session_id = %ctx.session_id,
                code = err.code(),
                "tool failed: {err}"
            ),
        }
        result
    }

    /// Session metadata back-fills identity and slot arguments the model
    /// left out. Explicit arguments always win.
    fn merge_args(&self, args: Value, ctx: &ToolContext) -> Value {
        let mut object = match args {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        if !object.contains_key("session_id") {
            object.insert(
                "session_id".to_string(),
                Value::String(ctx.session_id.clone()),
            );
        }
        for (meta_key, arg_key) in [
            ("patient_phone", "patient_phone"),
            ("patient_identifier", "patient_id"),
            ("patient_id", "patient_id"),
            ("department", "department"),
            ("preferred_time", "preferred_time"),
            ("doctor_name", "doctor_name"),
        ] {
            if object.get(arg_key).map(is_blank).unwrap_or(true) {
                if let Some(Value::String(s)) = ctx.metadata.get(meta_key) {
                    if !s.trim().is_empty() {
                        object.insert(arg_key.to_string(), Value::String(s.clone()));
                    }
                }
            }
        }
        Value::Object(object)
    }

    async fn write_audit(
        &self,
        name: &str,
        args: &Value,
        ctx: &ToolContext,
        error_code: Option<&'static str>,
        started: Instant,
    ) {
        let entry = ToolAuditLogEntry {
            request_id: ctx.request_id.clone(),
            session_id: ctx.session_id.clone(),
            user_id: ctx.user_id.clone(),
            tool_name: name.to_string(),
            status: if error_code.is_none() { "ok" } else { "error" }.to_string(),
            error_code: error_code.map(str::to_string),
            latency_ms: started.elapsed().as_millis() as u64,
            args_masked: mask_args(args),
            created_at: Utc::now(),
        };
        // Audit persistence must never change the tool outcome.
        if let Err(err) = self.audit.append(entry).await {
            warn!(tool = name, "audit append failed: {err}");
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
