use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde_json::Value;

use calendar_cell::ClinicCalendar;
use extraction_cell::datetime::DateTimeExtractor;
use extraction_cell::departments::{extract_department, is_department};
use extraction_cell::phone::normalize_phone;
use shared_store::{
    DoctorDirectory, MedicalHistoryStore, NotificationOutbox, PatientKey, ReservationStore,
    TurnStore, WaitStatusStore,
};

use crate::error::ToolError;
use crate::models::{ToolContext, ToolName, ToolOutput};

mod info;
mod reservation;

/// All tool implementations behind one dispatch point. Handlers never
/// write audit rows; the executor owns that.
pub struct ToolHandlers {
    pub(crate) reservations: Arc<dyn ReservationStore>,
    pub(crate) doctors: Arc<dyn DoctorDirectory>,
    pub(crate) wait: Arc<dyn WaitStatusStore>,
    pub(crate) history: Arc<dyn MedicalHistoryStore>,
    pub(crate) turns: Arc<dyn TurnStore>,
    pub(crate) outbox: Arc<dyn NotificationOutbox>,
    pub(crate) calendar: Arc<ClinicCalendar>,
    pub(crate) datetime: DateTimeExtractor,
}

impl ToolHandlers {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reservations: Arc<dyn ReservationStore>,
        doctors: Arc<dyn DoctorDirectory>,
        wait: Arc<dyn WaitStatusStore>,
        history: Arc<dyn MedicalHistoryStore>,
        turns: Arc<dyn TurnStore>,
        outbox: Arc<dyn NotificationOutbox>,
        calendar: Arc<ClinicCalendar>,
    ) -> Self {
        Self {
            reservations,
            doctors,
            wait,
            history,
            turns,
            outbox,
            calendar,
            datetime: DateTimeExtractor::new(),
        }
    }

    pub async fn dispatch(
        &self,
        name: ToolName,
        args: &Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        match name {
            ToolName::ReservationLookup => self.reservation_lookup(args, ctx, now).await,
            ToolName::ReservationCreate => self.reservation_create(args, ctx, now).await,
            ToolName::ReservationCancel => self.reservation_cancel(args, ctx, now).await,
            ToolName::ReservationReschedule => self.reservation_reschedule(args, ctx, now).await,
            ToolName::ReservationHistory => self.reservation_history(args, ctx, now).await,
            ToolName::AvailableTimeSlots => self.available_time_slots(args, now).await,
            ToolName::MedicalHistory => self.medical_history(args, ctx).await,
            ToolName::WaitStatus => self.wait_status(args).await,
            ToolName::DoctorList => self.doctor_list(args).await,
            ToolName::NotificationSend => self.notification_send(args, ctx, now).await,
            ToolName::SessionHistory => self.session_history(args, ctx).await,
        }
    }

    /// Who the tool acts on behalf of. Arguments win over session
    /// metadata so the model can target explicitly when it has to.
    pub(crate) fn patient_key(&self, args: &Value, ctx: &ToolContext) -> PatientKey {
        let phone = arg_str(args, "patient_phone")
            .or_else(|| meta_str(&ctx.metadata, &["patient_phone"]))
            .and_then(|raw| normalize_phone(&raw));
        let identifier = arg_str(args, "patient_id")
            .or_else(|| meta_str(&ctx.metadata, &["patient_identifier", "patient_id", "patient_pk"]));
        PatientKey { phone, identifier }
    }

    pub(crate) fn require_patient_key(
        &self,
        args: &Value,
        ctx: &ToolContext,
    ) -> Result<PatientKey, ToolError> {
        let key = self.patient_key(args, ctx);
        if key.is_empty() {
            return Err(ToolError::Validation(
                "환자 정보를 확인할 수 없습니다. 로그인 정보를 확인해주세요.".to_string(),
            ));
        }
        Ok(key)
    }
}

pub(crate) fn arg_str(args: &Value, key: &str) -> Option<String> {
    match args.get(key) {
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

pub(crate) fn arg_bool(args: &Value, key: &str) -> bool {
    match args.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim(), "true" | "1" | "yes"),
        _ => false,
    }
}

pub(crate) fn arg_usize(args: &Value, key: &str) -> Option<usize> {
    match args.get(key) {
        Some(Value::Number(n)) => n.as_u64().map(|v| v as usize),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

fn meta_str(metadata: &HashMap<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(Value::String(s)) = metadata.get(*key) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Department named in `key`, normalized against the directory list.
pub(crate) fn department_arg(args: &Value, key: &str) -> Option<String> {
    let raw = arg_str(args, key)?;
    if is_department(&raw) {
        return Some(raw);
    }
    extract_department(&raw).map(|d| d.to_string())
}

pub(crate) fn fmt_date(date: NaiveDate) -> String {
    format!("{}년 {}월 {}일", date.year(), date.month(), date.day())
}

pub(crate) fn fmt_time(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

pub(crate) fn fmt_datetime(at: NaiveDateTime) -> String {
    format!("{} {}", fmt_date(at.date()), fmt_time(at.time()))
}

pub(crate) fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...")
    }
}
