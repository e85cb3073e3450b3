use chrono::{Datelike, Duration, NaiveDateTime, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::{Reservation, ReservationStatus, TablePayload};
use shared_store::StoreError;

use crate::error::ToolError;
use crate::models::{
    ToolContext, ToolOutput, DEPARTMENT_REQUIRED_REPLY, CLINIC_CLOSED_REPLY, TIME_REQUIRED_REPLY,
};

use super::{
    arg_bool, arg_str, arg_usize, department_arg, fmt_date, fmt_datetime, fmt_time, ToolHandlers,
};

const SLOT_MINUTES: i64 = 30;
const HISTORY_DEFAULT_LIMIT: usize = 5;
const HISTORY_MAX_LIMIT: usize = 20;

impl ToolHandlers {
    pub(super) async fn reservation_create(
        &self,
        args: &Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        let department = department_arg(args, "department")
            .ok_or_else(|| ToolError::Validation(DEPARTMENT_REQUIRED_REPLY.to_string()))?;
        let preferred = arg_str(args, "preferred_time")
            .ok_or_else(|| ToolError::Validation(TIME_REQUIRED_REPLY.to_string()))?;

        let asap = self.datetime.contains_asap(&preferred);
        if !asap && !self.datetime.has_specific_time(&preferred) {
            return Err(ToolError::Validation(TIME_REQUIRED_REPLY.to_string()));
        }
        let start = self
            .datetime
            .resolve_datetime(&preferred, now)
            .ok_or_else(|| ToolError::Validation(TIME_REQUIRED_REPLY.to_string()))?;
        self.calendar.validate_booking_time(start, now).await?;

        let doctor = self.resolve_doctor(args, &department).await?;
        let key = self.patient_key(args, ctx);

        let reservation = Reservation {
            id: Uuid::new_v4(),
            session_id: ctx.session_id.clone(),
            patient_name: None,
            patient_phone: key.phone,
            patient_identifier: key.identifier,
            department: department.clone(),
            doctor_name: doctor.display_name.clone(),
            doctor_code: doctor.code.clone(),
            doctor_id: doctor.id.clone(),
            scheduled_start: start,
            scheduled_end: start + Duration::minutes(SLOT_MINUTES),
            status: ReservationStatus::Scheduled,
            memo: arg_str(args, "memo"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            cancelled_at: None,
            cancel_reason: None,
        };
        let stored = self.reservations.insert_if_slot_free(reservation).await?;

        let reply = format!(
            "{} {}진료 예약 요청이 접수되었습니다. 희망 일정은 {}입니다.",
            stored.department,
            stored.doctor_name,
            fmt_datetime(stored.scheduled_start),
        );
        Ok(ToolOutput::with_reply(json!({"reservation": stored}), reply))
    }

    pub(super) async fn reservation_cancel(
        &self,
        args: &Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        let key = self.require_patient_key(args, ctx)?;
        let reason = arg_str(args, "reason");

        if let Some(raw_id) = arg_str(args, "reservation_id") {
            let id = Uuid::parse_str(&raw_id).map_err(|_| {
                ToolError::Validation("예약번호 형식이 올바르지 않습니다.".to_string())
            })?;
            let reservation = self
                .reservations
                .get(id)
                .await?
                .filter(|r| r.is_active())
                .ok_or_else(|| ToolError::NotFound("취소할 예약을 찾을 수 없습니다.".to_string()))?;
            let cancelled = self.mark_cancelled(reservation, reason).await?;
            return Ok(ToolOutput::with_reply(
                json!({"cancelled": [&cancelled]}),
                single_cancel_reply(&cancelled),
            ));
        }

        let upcoming: Vec<Reservation> = self
            .reservations
            .list_for_patient(&key)
            .await?
            .into_iter()
            .filter(|r| r.is_upcoming(now))
            .collect();
        if upcoming.is_empty() {
            return Err(ToolError::NotFound("취소할 예약이 없습니다.".to_string()));
        }

        if arg_bool(args, "cancel_all") {
            let days = arg_str(args, "dates_text")
                .map(|text| self.datetime.extract_day_only_list(&text))
                .unwrap_or_default();
            let targets: Vec<Reservation> = upcoming
                .into_iter()
                .filter(|r| days.is_empty() || days.contains(&r.scheduled_start.day()))
                .collect();
            if targets.is_empty() {
                return Err(ToolError::NotFound(
                    "해당 날짜에 취소할 예약이 없습니다.".to_string(),
                ));
            }
            let mut cancelled = Vec::with_capacity(targets.len());
            for reservation in targets {
                cancelled.push(self.mark_cancelled(reservation, reason.clone()).await?);
            }
            let reply = format!("총 {}건의 예약을 취소했습니다.", cancelled.len());
            return Ok(ToolOutput::with_reply(json!({"cancelled": cancelled}), reply));
        }

        // No id, no bulk flag: the soonest upcoming reservation.
        let target = upcoming
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::NotFound("취소할 예약이 없습니다.".to_string()))?;
        let cancelled = self.mark_cancelled(target, reason).await?;
        Ok(ToolOutput::with_reply(
            json!({"cancelled": [&cancelled]}),
            single_cancel_reply(&cancelled),
        ))
    }

    pub(super) async fn reservation_reschedule(
        &self,
        args: &Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        let key = self.require_patient_key(args, ctx)?;
        let original = self.locate_reschedule_target(args, &key, now).await?;

        let new_department = department_arg(args, "department");
        let wants_new_doctor =
            new_department.is_some() || arg_str(args, "doctor_name").is_some();

        let duration = original.scheduled_end - original.scheduled_start;
        let new_start = match arg_str(args, "preferred_time") {
            Some(preferred) => {
                if self.datetime.contains_asap(&preferred)
                    || self.datetime.has_specific_time(&preferred)
                {
                    self.datetime
                        .resolve_datetime(&preferred, now)
                        .ok_or_else(|| ToolError::Validation(TIME_REQUIRED_REPLY.to_string()))?
                } else {
                    // A date without a clock keeps the original hour.
                    let date = self
                        .datetime
                        .resolve_date(&preferred, now.date())
                        .ok_or_else(|| ToolError::Validation(TIME_REQUIRED_REPLY.to_string()))?;
                    date.and_time(original.scheduled_start.time())
                }
            }
            None if wants_new_doctor => original.scheduled_start,
            None => return Err(ToolError::Validation(TIME_REQUIRED_REPLY.to_string())),
        };
        self.calendar.validate_booking_time(new_start, now).await?;

        let department = new_department.unwrap_or_else(|| original.department.clone());
        let doctor = if wants_new_doctor {
            self.resolve_doctor(args, &department).await?
        } else {
            // Same doctor as before.
            shared_models::Doctor {
                id: original.doctor_id.clone(),
                code: original.doctor_code.clone(),
                display_name: original.doctor_name.clone(),
                department: original.department.clone(),
                title: None,
                phone: None,
            }
        };

        // The slot guard lives on insert, so the swap goes cancel first,
        // insert second, and reverts the cancel when the new slot is taken.
        let mut old = original.clone();
        old.status = ReservationStatus::Cancelled;
        old.cancelled_at = Some(Utc::now());
        old.cancel_reason = Some("일정 변경".to_string());
        old.updated_at = Utc::now();
        self.reservations.update(old).await?;

        let replacement = Reservation {
            id: Uuid::new_v4(),
            session_id: ctx.session_id.clone(),
            patient_name: original.patient_name.clone(),
            patient_phone: original.patient_phone.clone(),
            patient_identifier: original.patient_identifier.clone(),
            department: department.clone(),
            doctor_name: doctor.display_name.clone(),
            doctor_code: doctor.code.clone(),
            doctor_id: doctor.id.clone(),
            scheduled_start: new_start,
            scheduled_end: new_start + duration,
            status: ReservationStatus::Scheduled,
            memo: original.memo.clone(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            cancelled_at: None,
            cancel_reason: None,
        };
        match self.reservations.insert_if_slot_free(replacement).await {
            Ok(stored) => {
                let reply = format!(
                    "예약을 {} {} {} 일정으로 변경했습니다.",
                    fmt_datetime(stored.scheduled_start),
                    stored.department,
                    stored.doctor_name,
                );
                Ok(ToolOutput::with_reply(json!({"reservation": stored}), reply))
            }
            Err(StoreError::DuplicateSlot) => {
                self.reservations.update(original).await?;
                Err(StoreError::DuplicateSlot.into())
            }
            Err(err) => {
                self.reservations.update(original).await?;
                Err(err.into())
            }
        }
    }

    pub(super) async fn reservation_history(
        &self,
        args: &Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        let key = self.require_patient_key(args, ctx)?;
        let all = self.reservations.list_for_patient(&key).await?;

        if arg_str(args, "reply_style").as_deref() == Some("single") {
            let offset = arg_usize(args, "offset").unwrap_or(0);
            let upcoming: Vec<&Reservation> =
                all.iter().filter(|r| r.is_upcoming(now)).collect();
            let Some(hit) = upcoming.get(offset) else {
                return Ok(ToolOutput::with_reply(
                    json!({"reservations": []}),
                    "다음 예약이 없습니다. 새로 예약하시겠어요?",
                ));
            };
            let reply = format!(
                "다가오는 예약은 {} {} {} 입니다.",
                fmt_datetime(hit.scheduled_start),
                hit.department,
                hit.doctor_name,
            );
            return Ok(ToolOutput::with_reply(json!({"reservations": [hit]}), reply));
        }

        let limit = arg_usize(args, "limit")
            .unwrap_or(HISTORY_DEFAULT_LIMIT)
            .min(HISTORY_MAX_LIMIT);
        // Most recent first for the table view.
        let mut recent: Vec<Reservation> = all;
        recent.reverse();
        recent.truncate(limit);
        if recent.is_empty() {
            return Ok(ToolOutput::with_reply(
                json!({"reservations": []}),
                "예약 내역이 없습니다.",
            ));
        }
        let table = reservation_table(&recent, true);
        Ok(ToolOutput {
            data: json!({"reservations": recent}),
            reply: Some("최근 예약 내역입니다.".to_string()),
            table: Some(table),
        })
    }

    pub(super) async fn reservation_lookup(
        &self,
        args: &Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        let key = self.require_patient_key(args, ctx)?;
        let upcoming: Vec<Reservation> = self
            .reservations
            .list_for_patient(&key)
            .await?
            .into_iter()
            .filter(|r| r.is_upcoming(now))
            .collect();
        if upcoming.is_empty() {
            return Ok(ToolOutput::with_reply(
                json!({"reservations": []}),
                "예정된 예약이 없습니다.",
            ));
        }
        let reply = format!("예정된 예약 {}건입니다.", upcoming.len());
        let table = reservation_table(&upcoming, false);
        Ok(ToolOutput {
            data: json!({"reservations": upcoming}),
            reply: Some(reply),
            table: Some(table),
        })
    }

    pub(super) async fn available_time_slots(
        &self,
        args: &Value,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        let text = arg_str(args, "date")
            .ok_or_else(|| ToolError::Validation("조회할 날짜를 알려주세요.".to_string()))?;
        let date = self
            .datetime
            .resolve_date(&text, now.date())
            .ok_or_else(|| ToolError::Validation("조회할 날짜를 알려주세요.".to_string()))?;

        let slots = self.calendar.open_slots_for_date(date, now).await;
        if slots.is_empty() {
            return Err(ToolError::BusinessRule(CLINIC_CLOSED_REPLY.to_string()));
        }
        let rows: Vec<Vec<String>> = slots.iter().map(|s| vec![fmt_time(s.time())]).collect();
        let reply = format!(
            "{} 예약 가능 시간은 총 {}개입니다.",
            fmt_date(date),
            slots.len()
        );
        Ok(ToolOutput {
            data: json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "slots": slots
                    .iter()
                    .map(|s| fmt_time(s.time()))
                    .collect::<Vec<_>>(),
            }),
            reply: Some(reply),
            table: Some(TablePayload {
                headers: vec!["시간".to_string()],
                rows,
            }),
        })
    }

    async fn resolve_doctor(
        &self,
        args: &Value,
        department: &str,
    ) -> Result<shared_models::Doctor, ToolError> {
        let roster = self.doctors.list_by_department(department).await?;
        if let Some(wanted_id) = arg_str(args, "doctor_id") {
            if let Some(hit) = roster
                .iter()
                .find(|d| d.id == wanted_id || d.code == wanted_id)
            {
                return Ok(hit.clone());
            }
        }
        if let Some(wanted_name) = arg_str(args, "doctor_name") {
            if let Some(hit) = roster
                .iter()
                .find(|d| d.display_name.contains(&wanted_name) || wanted_name.contains(&d.display_name))
            {
                return Ok(hit.clone());
            }
        }
        self.doctors
            .default_for(department)
            .await?
            .ok_or_else(|| {
                ToolError::NotFound(format!("{department} 의료진 정보를 찾을 수 없습니다."))
            })
    }

    async fn locate_reschedule_target(
        &self,
        args: &Value,
        key: &shared_store::PatientKey,
        now: NaiveDateTime,
    ) -> Result<Reservation, ToolError> {
        if let Some(raw_id) = arg_str(args, "reservation_id") {
            let id = Uuid::parse_str(&raw_id).map_err(|_| {
                ToolError::Validation("예약번호 형식이 올바르지 않습니다.".to_string())
            })?;
            return self
                .reservations
                .get(id)
                .await?
                .filter(|r| r.is_active())
                .ok_or_else(|| {
                    ToolError::NotFound("변경할 예약을 찾을 수 없습니다.".to_string())
                });
        }

        let upcoming: Vec<Reservation> = self
            .reservations
            .list_for_patient(key)
            .await?
            .into_iter()
            .filter(|r| r.is_upcoming(now))
            .collect();

        if let Some(hint) = arg_str(args, "original_time") {
            if let Some(at) = self.datetime.resolve_datetime(&hint, now) {
                if let Some(hit) = upcoming.iter().find(|r| r.scheduled_start == at) {
                    return Ok(hit.clone());
                }
            }
            // Date-only hint still narrows to one reservation on that day.
            if let Some(date) = self.datetime.resolve_date(&hint, now.date()) {
                if let Some(hit) = upcoming.iter().find(|r| r.scheduled_start.date() == date) {
                    return Ok(hit.clone());
                }
            }
        }

        upcoming
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::NotFound("변경할 예약이 없습니다.".to_string()))
    }

    async fn mark_cancelled(
        &self,
        mut reservation: Reservation,
        reason: Option<String>,
    ) -> Result<Reservation, ToolError> {
        reservation.status = ReservationStatus::Cancelled;
        reservation.cancelled_at = Some(Utc::now());
        reservation.cancel_reason = reason;
        reservation.updated_at = Utc::now();
        self.reservations.update(reservation.clone()).await?;
        Ok(reservation)
    }
}

fn single_cancel_reply(reservation: &Reservation) -> String {
    format!(
        "{} {} {} 예약을 취소했습니다.",
        fmt_date(reservation.scheduled_start.date()),
        fmt_time(reservation.scheduled_start.time()),
        reservation.department,
    )
}

fn reservation_table(reservations: &[Reservation], with_status: bool) -> TablePayload {
    let mut headers = vec![
        "날짜".to_string(),
        "시간".to_string(),
        "진료과".to_string(),
        "의료진".to_string(),
    ];
    if with_status {
        headers.push("상태".to_string());
    }
    let rows = reservations
        .iter()
        .map(|r| {
            let mut row = vec![
                fmt_date(r.scheduled_start.date()),
                fmt_time(r.scheduled_start.time()),
                r.department.clone(),
                r.doctor_name.clone(),
            ];
            if with_status {
                row.push(match r.status {
                    ReservationStatus::Pending => "대기".to_string(),
                    ReservationStatus::Scheduled => "예약됨".to_string(),
                    ReservationStatus::Cancelled => "취소됨".to_string(),
                });
            }
            row
        })
        .collect();
    TablePayload { headers, rows }
}
