use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use shared_models::TablePayload;

pub const AUTH_REQUIRED_REPLY: &str =
    "로그인 후 이용해 주세요, 전화 문의는 대표번호 1577-3330으로 부탁드립니다.";
pub const DEPARTMENT_REQUIRED_REPLY: &str = "예약을 위해 진료과명을 알려주세요.";
pub const TIME_REQUIRED_REPLY: &str = "예약 희망 날짜와 시간을 알려주세요.";
pub const CLINIC_CLOSED_REPLY: &str = "진료 예약 가능 시간이 아닙니다. 평일 08:30~17:00, \
토요일(1,3주) 08:30~12:00(공휴일 제외) 시간으로 알려주세요.";
pub const PAST_TIME_REPLY: &str =
    "이미 지난 시간입니다. 예약 희망 날짜와 시간을 다시 알려주세요.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ReservationLookup,
    ReservationCreate,
    ReservationCancel,
    ReservationReschedule,
    ReservationHistory,
    AvailableTimeSlots,
    MedicalHistory,
    WaitStatus,
    DoctorList,
    NotificationSend,
    SessionHistory,
}

impl ToolName {
    pub const ALL: [ToolName; 11] = [
        ToolName::ReservationLookup,
        ToolName::ReservationCreate,
        ToolName::ReservationCancel,
        ToolName::ReservationReschedule,
        ToolName::ReservationHistory,
        ToolName::AvailableTimeSlots,
        ToolName::MedicalHistory,
        ToolName::WaitStatus,
        ToolName::DoctorList,
        ToolName::NotificationSend,
        ToolName::SessionHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::ReservationLookup => "reservation_lookup",
            ToolName::ReservationCreate => "reservation_create",
            ToolName::ReservationCancel => "reservation_cancel",
            ToolName::ReservationReschedule => "reservation_reschedule",
            ToolName::ReservationHistory => "reservation_history",
            ToolName::AvailableTimeSlots => "available_time_slots",
            ToolName::MedicalHistory => "medical_history",
            ToolName::WaitStatus => "wait_status",
            ToolName::DoctorList => "doctor_list",
            ToolName::NotificationSend => "notification_send",
            ToolName::SessionHistory => "session_history",
        }
    }

    /// Sensitive tools require an authenticated caller when the global
    /// auth flag is on.
    pub fn is_sensitive(&self) -> bool {
        !matches!(
            self,
            ToolName::WaitStatus | ToolName::DoctorList | ToolName::AvailableTimeSlots
        )
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or(())
    }
}

/// Per-call context the executor threads into every handler.
#[derive(Debug, Clone, Default)]
pub struct ToolContext {
    pub session_id: String,
    pub request_id: String,
    pub user_id: Option<String>,
    pub metadata: HashMap<String, Value>,
}

/// Handler result: machine-readable data plus the optional human reply
/// and table the transport can surface directly.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub data: Value,
    pub reply: Option<String>,
    pub table: Option<TablePayload>,
}

impl ToolOutput {
    pub fn with_reply(data: Value, reply: impl Into<String>) -> Self {
        Self {
            data,
            reply: Some(reply.into()),
            table: None,
        }
    }
}
