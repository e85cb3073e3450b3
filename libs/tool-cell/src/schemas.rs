use serde_json::json;

use generation_cell::ToolSchema;

use crate::models::ToolName;

fn object_schema(properties: serde_json::Value, required: &[&str]) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// Generator-facing schemas for every tool, colocated with the registry
/// so the parameter names stay in lockstep with the handlers.
pub fn tool_schemas() -> Vec<ToolSchema> {
    ToolName::ALL.iter().map(|name| schema_for(*name)).collect()
}

pub fn schema_for(name: ToolName) -> ToolSchema {
    let (description, parameters) = match name {
        ToolName::ReservationLookup => (
            "현재 예정된 예약을 조회합니다.",
            object_schema(
                json!({
                    "patient_id": {"type": "string"},
                    "patient_phone": {"type": "string"},
                }),
                &[],
            ),
        ),
        ToolName::ReservationCreate => (
            "진료 예약을 생성합니다. 진료과와 희망 날짜/시간이 필요합니다.",
            object_schema(
                json!({
                    "department": {"type": "string"},
                    "preferred_time": {"type": "string"},
                    "doctor_name": {"type": "string"},
                    "doctor_id": {"type": "string"},
                    "patient_id": {"type": "string"},
                    "patient_phone": {"type": "string"},
                    "memo": {"type": "string"},
                }),
                &["department", "preferred_time"],
            ),
        ),
        ToolName::ReservationCancel => (
            "예약을 취소합니다. 단건, 예약번호 지정, 전체 취소를 지원합니다.",
            object_schema(
                json!({
                    "reservation_id": {"type": "string"},
                    "cancel_all": {"type": "boolean"},
                    "dates_text": {"type": "string", "description": "취소할 날짜가 담긴 문장"},
                    "reason": {"type": "string"},
                    "patient_id": {"type": "string"},
                    "patient_phone": {"type": "string"},
                }),
                &[],
            ),
        ),
        ToolName::ReservationReschedule => (
            "기존 예약의 시간/진료과/의료진을 변경합니다.",
            object_schema(
                json!({
                    "reservation_id": {"type": "string"},
                    "preferred_time": {"type": "string"},
                    "department": {"type": "string"},
                    "doctor_name": {"type": "string"},
                    "original_time": {"type": "string", "description": "변경 대상 예약의 기존 시간 힌트"},
                    "patient_id": {"type": "string"},
                    "patient_phone": {"type": "string"},
                }),
                &[],
            ),
        ),
        ToolName::ReservationHistory => (
            "예약 내역을 조회합니다. reply_style=single은 다가오는 N번째 예약 한 건을 요약합니다.",
            object_schema(
                json!({
                    "reply_style": {"type": "string", "enum": ["single", "table"]},
                    "offset": {"type": "integer"},
                    "limit": {"type": "integer"},
                    "patient_id": {"type": "string"},
                    "patient_phone": {"type": "string"},
                }),
                &[],
            ),
        ),
        ToolName::AvailableTimeSlots => (
            "특정 날짜의 예약 가능한 시간대를 조회합니다.",
            object_schema(
                json!({
                    "date": {"type": "string", "description": "날짜 표현 (예: 내일, 9월 13일)"},
                }),
                &["date"],
            ),
        ),
        ToolName::MedicalHistory => (
            "환자의 진료 내역을 조회합니다.",
            object_schema(
                json!({
                    "patient_id": {"type": "string"},
                    "limit": {"type": "integer"},
                }),
                &[],
            ),
        ),
        ToolName::WaitStatus => (
            "진료과별 현재 대기 현황을 조회합니다.",
            object_schema(
                json!({
                    "department": {"type": "string"},
                }),
                &["department"],
            ),
        ),
        ToolName::DoctorList => (
            "진료과의 의료진 목록을 조회합니다.",
            object_schema(
                json!({
                    "department": {"type": "string"},
                }),
                &[],
            ),
        ),
        ToolName::NotificationSend => (
            "예약 안내 알림을 발송합니다. 채널은 sms 또는 kakao입니다.",
            object_schema(
                json!({
                    "channel": {"type": "string", "enum": ["sms", "kakao"]},
                    "message": {"type": "string"},
                    "target": {"type": "string", "description": "수신자 전화번호"},
                    "schedule_at": {"type": "string"},
                }),
                &["channel", "message"],
            ),
        ),
        ToolName::SessionHistory => (
            "현재 세션의 이전 대화 기록을 조회합니다.",
            object_schema(
                json!({
                    "session_id": {"type": "string"},
                    "limit": {"type": "integer"},
                }),
                &[],
            ),
        ),
    };
    ToolSchema {
        name: name.as_str().to_string(),
        description: description.to_string(),
        parameters,
    }
}
