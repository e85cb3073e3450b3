use chrono::NaiveDateTime;
use serde_json::{json, Value};

use shared_models::TablePayload;
use shared_store::NotificationRecord;

use crate::error::ToolError;
use crate::models::{ToolContext, ToolOutput};

use super::{arg_str, arg_usize, department_arg, truncate_chars, ToolHandlers};

const SESSION_DEFAULT_LIMIT: usize = 5;
const SESSION_MAX_LIMIT: usize = 20;
const HISTORY_DEFAULT_LIMIT: usize = 5;
const TEXT_TRUNCATE_LEN: usize = 40;

impl ToolHandlers {
    pub(super) async fn wait_status(&self, args: &Value) -> Result<ToolOutput, ToolError> {
        let department = department_arg(args, "department").ok_or_else(|| {
            ToolError::Validation("대기 현황을 확인할 진료과를 알려주세요.".to_string())
        })?;
        let status = self.wait.get(&department).await?.ok_or_else(|| {
            ToolError::NotFound(format!(
                "{department} 대기 현황 데이터가 없습니다. 잠시 후 다시 확인해주세요."
            ))
        })?;
        let reply = format!(
            "{} 현재 대기중인 사람은 {}명이며, 약 {}분 뒤에 진료가 가능합니다.",
            status.department, status.current_waiting, status.estimated_minutes,
        );
        Ok(ToolOutput::with_reply(json!({"wait_status": status}), reply))
    }

    pub(super) async fn doctor_list(&self, args: &Value) -> Result<ToolOutput, ToolError> {
        let department = department_arg(args, "department").ok_or_else(|| {
            ToolError::Validation("의료진을 조회할 진료과를 알려주세요.".to_string())
        })?;
        let roster = self.doctors.list_by_department(&department).await?;
        if roster.is_empty() {
            return Err(ToolError::NotFound(format!(
                "{department} 의료진 정보가 없습니다."
            )));
        }
        let rows = roster
            .iter()
            .map(|d| {
                vec![
                    d.display_name.clone(),
                    d.title.clone().unwrap_or_else(|| "원장".to_string()),
                ]
            })
            .collect();
        let reply = format!("{} 의료진은 총 {}명입니다.", department, roster.len());
        Ok(ToolOutput {
            data: json!({"doctors": roster}),
            reply: Some(reply),
            table: Some(TablePayload {
                headers: vec!["의료진".to_string(), "직함".to_string()],
                rows,
            }),
        })
    }

    pub(super) async fn medical_history(
        &self,
        args: &Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let key = self.require_patient_key(args, ctx)?;
        let identifier = key.identifier.ok_or_else(|| {
            ToolError::Validation(
                "환자 정보를 확인할 수 없습니다. 로그인 정보를 확인해주세요.".to_string(),
            )
        })?;
        let limit = arg_usize(args, "limit").unwrap_or(HISTORY_DEFAULT_LIMIT);
        let mut entries = self.history.for_patient(&identifier).await?;
        entries.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        entries.truncate(limit);
        if entries.is_empty() {
            return Ok(ToolOutput::with_reply(
                json!({"entries": []}),
                "진료 내역이 없습니다.",
            ));
        }
        let rows = entries
            .iter()
            .map(|e| {
                vec![
                    e.visited_at.format("%Y-%m-%d").to_string(),
                    e.department.clone(),
                    e.doctor_name.clone(),
                    truncate_chars(&e.summary, TEXT_TRUNCATE_LEN),
                ]
            })
            .collect();
        let reply = format!("최근 진료 내역 {}건입니다.", entries.len());
        Ok(ToolOutput {
            data: json!({"entries": entries}),
            reply: Some(reply),
            table: Some(TablePayload {
                headers: vec![
                    "일자".to_string(),
                    "진료과".to_string(),
                    "의료진".to_string(),
                    "내용".to_string(),
                ],
                rows,
            }),
        })
    }

    pub(super) async fn notification_send(
        &self,
        args: &Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ToolOutput, ToolError> {
        let channel = arg_str(args, "channel")
            .map(|c| normalize_channel(&c))
            .unwrap_or(None)
            .ok_or_else(|| {
                ToolError::Validation(
                    "지원하지 않는 알림 채널입니다. sms 또는 kakao 중에서 선택해주세요."
                        .to_string(),
                )
            })?;
        let message = arg_str(args, "message").ok_or_else(|| {
            ToolError::Validation("발송할 메시지 내용을 알려주세요.".to_string())
        })?;
        let phone = self
            .patient_key(args, ctx)
            .phone
            .or_else(|| arg_str(args, "target").and_then(|t| extraction_cell::normalize_phone(&t)))
            .ok_or_else(|| {
                ToolError::Validation(
                    "알림을 받을 전화번호를 확인할 수 없습니다.".to_string(),
                )
            })?;
        let schedule_at = arg_str(args, "schedule_at")
            .and_then(|raw| self.datetime.resolve_datetime(&raw, now));

        self.outbox
            .record(NotificationRecord {
                channel: channel.to_string(),
                phone,
                message_masked: truncate_chars(&message, TEXT_TRUNCATE_LEN),
                schedule_at,
                created_at: chrono::Utc::now(),
            })
            .await?;
        let reply = match channel {
            "kakao" => "카카오 알림 발송을 접수했습니다.",
            _ => "문자 알림 발송을 접수했습니다.",
        };
        Ok(ToolOutput::with_reply(json!({"channel": channel}), reply))
    }

    pub(super) async fn session_history(
        &self,
        args: &Value,
        ctx: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let session_id = arg_str(args, "session_id").unwrap_or_else(|| ctx.session_id.clone());
        let limit = arg_usize(args, "limit")
            .unwrap_or(SESSION_DEFAULT_LIMIT)
            .min(SESSION_MAX_LIMIT);
        let turns = self.turns.recent(&session_id, limit).await?;
        if turns.is_empty() {
            return Ok(ToolOutput::with_reply(
                json!({"turns": []}),
                "이전 대화 기록이 없습니다.",
            ));
        }
        let rows = turns
            .iter()
            .map(|t| {
                vec![
                    t.created_at.format("%m-%d %H:%M").to_string(),
                    truncate_chars(&t.user_text, TEXT_TRUNCATE_LEN),
                    truncate_chars(&t.bot_text, TEXT_TRUNCATE_LEN),
                ]
            })
            .collect();
        let reply = format!("최근 대화 {}건입니다.", turns.len());
        Ok(ToolOutput {
            data: json!({"turns": turns}),
            reply: Some(reply),
            table: Some(TablePayload {
                headers: vec!["시각".to_string(), "질문".to_string(), "답변".to_string()],
                rows,
            }),
        })
    }
}

/// Accepts Korean channel aliases the model tends to emit verbatim.
fn normalize_channel(raw: &str) -> Option<&'static str> {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "sms" | "문자" | "문자메시지" => Some("sms"),
        "kakao" | "카카오" | "카톡" | "카카오톡" => Some("kakao"),
        _ => None,
    }
}
