use std::collections::HashMap;
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};

use calendar_cell::{ClinicCalendar, HolidayClient};
use shared_models::{Doctor, WaitStatus};
use shared_store::memory::{
    InMemoryAuditLogStore, InMemoryDoctorDirectory, InMemoryMedicalHistoryStore,
    InMemoryNotificationOutbox, InMemoryReservationStore, InMemoryTurnStore,
    InMemoryWaitStatusStore,
};
use shared_store::{AuditLogStore, PatientKey, ReservationStore};
use tool_cell::{ToolContext, ToolError, ToolExecutor, ToolHandlers};

fn doctors() -> Vec<Doctor> {
    vec![
        Doctor {
            id: "d-100".to_string(),
            code: "100".to_string(),
            display_name: "김철수".to_string(),
            department: "외과".to_string(),
            title: Some("원장".to_string()),
            phone: None,
        },
        Doctor {
            id: "d-101".to_string(),
            code: "101".to_string(),
            display_name: "박영희".to_string(),
            department: "외과".to_string(),
            title: Some("과장".to_string()),
            phone: None,
        },
    ]
}

struct Fixture {
    executor: ToolExecutor,
    reservations: Arc<InMemoryReservationStore>,
    audit: Arc<InMemoryAuditLogStore>,
    outbox: Arc<InMemoryNotificationOutbox>,
}

fn fixture(auth_required: bool) -> Fixture {
    let reservations = Arc::new(InMemoryReservationStore::new());
    let audit = Arc::new(InMemoryAuditLogStore::new());
    let outbox = Arc::new(InMemoryNotificationOutbox::new());
    let wait = Arc::new(InMemoryWaitStatusStore::new(vec![WaitStatus {
        department: "외과".to_string(),
        current_waiting: 4,
        estimated_minutes: 20,
        last_updated: Utc::now(),
    }]));
    let handlers = ToolHandlers::new(
        reservations.clone(),
        Arc::new(InMemoryDoctorDirectory::new(doctors())),
        wait,
        Arc::new(InMemoryMedicalHistoryStore::new()),
        Arc::new(InMemoryTurnStore::new()),
        outbox.clone(),
        Arc::new(ClinicCalendar::new(Arc::new(HolidayClient::new("", "")))),
    );
    Fixture {
        executor: ToolExecutor::new(handlers, audit.clone(), auth_required),
        reservations,
        audit,
        outbox,
    }
}

fn authed_ctx() -> ToolContext {
    let mut metadata = HashMap::new();
    metadata.insert(
        "patient_phone".to_string(),
        Value::String("01012345678".to_string()),
    );
    metadata.insert(
        "patient_identifier".to_string(),
        Value::String("P-7".to_string()),
    );
    ToolContext {
        session_id: "sess-1".to_string(),
        request_id: "req-1".to_string(),
        user_id: None,
        metadata,
    }
}

fn anon_ctx() -> ToolContext {
    ToolContext {
        session_id: "sess-1".to_string(),
        request_id: "req-1".to_string(),
        user_id: None,
        metadata: HashMap::new(),
    }
}

// Monday inside opening hours, pinned well into the future.
fn monday_morning() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2030, 9, 9)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

#[tokio::test]
async fn sensitive_tool_without_auth_is_denied_and_audited() {
    let fx = fixture(true);
    let result = fx
        .executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "내일 10시"}),
            &anon_ctx(),
            monday_morning(),
        )
        .await;
    assert_matches!(result, Err(ToolError::AuthRequired));

    // Nothing was booked, but the denial still left its audit row.
    let key = PatientKey {
        phone: Some("01012345678".to_string()),
        identifier: None,
    };
    assert!(fx.reservations.list_for_patient(&key).await.unwrap().is_empty());

    let rows = fx.audit.for_session("sess-1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, "error");
    assert_eq!(rows[0].error_code.as_deref(), Some("auth_required"));
}

#[tokio::test]
async fn non_sensitive_tool_runs_without_auth() {
    let fx = fixture(true);
    let out = fx
        .executor
        .execute_at(
            "wait_status",
            json!({"department": "외과"}),
            &anon_ctx(),
            monday_morning(),
        )
        .await
        .unwrap();
    assert_eq!(
        out.reply.as_deref(),
        Some("외과 현재 대기중인 사람은 4명이며, 약 20분 뒤에 진료가 가능합니다.")
    );
}

#[tokio::test]
async fn metadata_slots_back_fill_empty_tool_args() {
    let fx = fixture(true);
    let mut ctx = authed_ctx();
    ctx.metadata.insert(
        "department".to_string(),
        Value::String("외과".to_string()),
    );
    ctx.metadata.insert(
        "preferred_time".to_string(),
        Value::String("내일 10시".to_string()),
    );
    ctx.metadata.insert(
        "doctor_name".to_string(),
        Value::String("박영희".to_string()),
    );

    let out = fx
        .executor
        .execute_at("reservation_create", json!({}), &ctx, monday_morning())
        .await
        .unwrap();
    let reply = out.reply.unwrap();
    assert!(reply.contains("외과 박영희진료 예약 요청이 접수되었습니다"), "{reply}");
    assert!(reply.contains("2030년 9월 10일 10:00"), "{reply}");

    // Explicit arguments still win over metadata.
    let out = fx
        .executor
        .execute_at(
            "reservation_create",
            json!({"preferred_time": "내일 14시"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();
    assert!(out.reply.unwrap().contains("2030년 9월 10일 14:00"));
}

#[tokio::test]
async fn duplicate_slot_is_rejected_on_second_booking() {
    let fx = fixture(true);
    let ctx = authed_ctx();
    let args = json!({"department": "외과", "doctor_name": "김철수", "preferred_time": "내일 10시"});

    let first = fx
        .executor
        .execute_at("reservation_create", args.clone(), &ctx, monday_morning())
        .await
        .unwrap();
    let reply = first.reply.unwrap();
    assert!(reply.contains("외과 김철수진료 예약 요청이 접수되었습니다."), "{reply}");
    assert!(reply.contains("2030년 9월 10일 10:00"), "{reply}");

    let second = fx
        .executor
        .execute_at("reservation_create", args, &ctx, monday_morning())
        .await;
    assert_matches!(second, Err(ToolError::Duplicate(msg)) => {
        assert!(msg.contains("이미 예약이 있습니다"));
    });

    let rows = fx.audit.for_session("sess-1").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].status, "ok");
    assert_eq!(rows[1].error_code.as_deref(), Some("duplicate"));
}

#[tokio::test]
async fn missing_department_prompts_for_it() {
    let fx = fixture(true);
    let result = fx
        .executor
        .execute_at(
            "reservation_create",
            json!({"preferred_time": "내일 10시"}),
            &authed_ctx(),
            monday_morning(),
        )
        .await;
    assert_matches!(result, Err(ToolError::Validation(msg)) => {
        assert_eq!(msg, "예약을 위해 진료과명을 알려주세요.");
    });
}

#[tokio::test]
async fn vague_time_prompts_for_a_specific_one() {
    let fx = fixture(true);
    let result = fx
        .executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "다음주쯤"}),
            &authed_ctx(),
            monday_morning(),
        )
        .await;
    assert_matches!(result, Err(ToolError::Validation(msg)) => {
        assert_eq!(msg, "예약 희망 날짜와 시간을 알려주세요.");
    });
}

#[tokio::test]
async fn closed_hours_booking_is_refused_with_hours_reply() {
    let fx = fixture(true);
    // Sunday is always closed.
    let result = fx
        .executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "2030년 9월 15일 10시"}),
            &authed_ctx(),
            monday_morning(),
        )
        .await;
    assert_matches!(result, Err(ToolError::BusinessRule(msg)) => {
        assert!(msg.contains("진료 예약 가능 시간이 아닙니다"));
    });
}

#[tokio::test]
async fn cancel_after_booking_reports_the_slot() {
    let fx = fixture(true);
    let ctx = authed_ctx();
    fx.executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "내일 10시"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();

    let out = fx
        .executor
        .execute_at("reservation_cancel", json!({}), &ctx, monday_morning())
        .await
        .unwrap();
    assert_eq!(
        out.reply.as_deref(),
        Some("2030년 9월 10일 10:00 외과 예약을 취소했습니다.")
    );

    // The freed slot can be booked again.
    fx.executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "내일 10시"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn bulk_cancel_counts_all_upcoming() {
    let fx = fixture(true);
    let ctx = authed_ctx();
    for time in ["내일 10시", "내일 11시", "내일 14시"] {
        fx.executor
            .execute_at(
                "reservation_create",
                json!({"department": "외과", "preferred_time": time}),
                &ctx,
                monday_morning(),
            )
            .await
            .unwrap();
    }
    let out = fx
        .executor
        .execute_at(
            "reservation_cancel",
            json!({"cancel_all": true}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();
    assert_eq!(out.reply.as_deref(), Some("총 3건의 예약을 취소했습니다."));
}

#[tokio::test]
async fn reschedule_moves_the_reservation() {
    let fx = fixture(true);
    let ctx = authed_ctx();
    fx.executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "내일 10시"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();

    let out = fx
        .executor
        .execute_at(
            "reservation_reschedule",
            json!({"preferred_time": "내일 14시"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();
    let reply = out.reply.unwrap();
    assert!(reply.contains("2030년 9월 10일 14:00"), "{reply}");
    assert!(reply.contains("변경했습니다"), "{reply}");

    // Old slot is free again, new one is taken.
    fx.executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "내일 10시"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();
    let clash = fx
        .executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "내일 14시"}),
            &ctx,
            monday_morning(),
        )
        .await;
    assert_matches!(clash, Err(ToolError::Duplicate(_)));
}

#[tokio::test]
async fn date_only_reschedule_keeps_the_original_clock() {
    let fx = fixture(true);
    let ctx = authed_ctx();
    fx.executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "내일 10시"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();

    // "13일" names a day but no clock; the booking keeps 10:00.
    let out = fx
        .executor
        .execute_at(
            "reservation_reschedule",
            json!({"preferred_time": "13일"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();
    let reply = out.reply.unwrap();
    assert!(reply.contains("2030년 9월 13일 10:00"), "{reply}");
    assert!(reply.contains("변경했습니다"), "{reply}");
}

#[tokio::test]
async fn lookup_lists_upcoming_as_table() {
    let fx = fixture(true);
    let ctx = authed_ctx();
    fx.executor
        .execute_at(
            "reservation_create",
            json!({"department": "외과", "preferred_time": "내일 10시"}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();

    let out = fx
        .executor
        .execute_at("reservation_lookup", json!({}), &ctx, monday_morning())
        .await
        .unwrap();
    assert_eq!(out.reply.as_deref(), Some("예정된 예약 1건입니다."));
    let table = out.table.unwrap();
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0][2], "외과");
}

#[tokio::test]
async fn available_slots_excludes_sunday() {
    let fx = fixture(true);
    let result = fx
        .executor
        .execute_at(
            "available_time_slots",
            json!({"date": "2030년 9월 15일"}),
            &anon_ctx(),
            monday_morning(),
        )
        .await;
    assert_matches!(result, Err(ToolError::BusinessRule(_)));

    let out = fx
        .executor
        .execute_at(
            "available_time_slots",
            json!({"date": "2030년 9월 10일"}),
            &anon_ctx(),
            monday_morning(),
        )
        .await
        .unwrap();
    // Weekday grid: 08:30 through 16:30, 30-minute steps.
    let table = out.table.unwrap();
    assert_eq!(table.rows.len(), 17);
    assert_eq!(table.rows[0][0], "08:30");
}

#[tokio::test]
async fn notification_audit_masks_phone_and_truncates_message() {
    let fx = fixture(true);
    let ctx = authed_ctx();
    let long_message = "가".repeat(60);
    fx.executor
        .execute_at(
            "notification_send",
            json!({"channel": "카카오", "message": long_message}),
            &ctx,
            monday_morning(),
        )
        .await
        .unwrap();

    let sent = fx.outbox.all().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, "kakao");
    assert_eq!(sent[0].message_masked.chars().count(), 43);

    let rows = fx.audit.for_session("sess-1").await.unwrap();
    let masked = &rows[0].args_masked;
    assert_eq!(masked["patient_phone"], "010****5678");
    let message = masked["message"].as_str().unwrap();
    assert!(message.chars().count() <= 43, "{message}");
}

#[tokio::test]
async fn unknown_tool_is_rejected_but_audited() {
    let fx = fixture(false);
    let result = fx
        .executor
        .execute_at("no_such_tool", json!({}), &anon_ctx(), monday_morning())
        .await;
    assert_matches!(result, Err(ToolError::Validation(_)));
    let rows = fx.audit.for_session("sess-1").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].tool_name, "no_such_tool");
}
