use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Utc};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use cache_cell::ResponseCacheGate;
use extraction_cell::SlotExtractor;
use generation_cell::{
    ChatMessage, DocumentRetriever, GenerationOutcome, RetrievedPassage, TextGenerator,
};
use intent_cell::{
    cues, match_symptom_department, match_symptom_guide, SafetyClassifier, SmalltalkClassifier,
    StaticAnswerCatalog, ToolIntentRouter,
};
use shared_models::{CacheScope, ChatRequest, ChatResponse, SourceRef, Turn};
use shared_store::TurnStore;
use tool_cell::{
    tool_schemas, ToolContext, ToolError, ToolExecutor, ToolName, ToolOutput, AUTH_REQUIRED_REPLY,
};

use crate::error::DialogueError;
use crate::funnel::{BookingFunnel, FunnelStep};
use crate::models::{Awaiting, SessionState, RESCHEDULE_MARKER};
use crate::recovery::StateRecovery;
use crate::replies::{
    ResponseCleaner, APOLOGY_REPLY, EMPTY_MESSAGE_REPLY, GREETING_REPLY, RETRY_REPLY,
};

const MAX_TOOL_CALLS_PER_TURN: usize = 3;
const TOOL_CALL_TIMEOUT_SECS: u64 = 5;

const RAG_SYSTEM_PROMPT: &str = "\
당신은 하늘병원의 안내 챗봇입니다. 아래 참고 자료를 근거로 정중하고 간결하게 \
한국어로 답변하세요. 자료에 없는 내용은 지어내지 말고 대표번호 1577-3330 안내로 \
대신하세요. 마크다운 서식 없이 일반 문장으로만 답하세요.\n\n[참고 자료]\n";

/// Tools whose reply text goes to the user verbatim instead of being
/// re-worded by the generator.
const STRICT_REPLY_TOOLS: [&str; 2] = ["wait_status", "doctor_list"];

/// Routes one user turn through the fixed precedence chain and persists
/// exactly one Turn per handled message.
pub struct DialogueOrchestrator {
    smalltalk: SmalltalkClassifier,
    safety: SafetyClassifier,
    statics: StaticAnswerCatalog,
    router: ToolIntentRouter,
    slot_extractor: SlotExtractor,
    recovery: StateRecovery,
    funnel: BookingFunnel,
    executor: Arc<ToolExecutor>,
    generator: Arc<dyn TextGenerator>,
    retriever: Arc<dyn DocumentRetriever>,
    cache: ResponseCacheGate,
    turns: Arc<dyn TurnStore>,
    cleaner: ResponseCleaner,
    auth_required: bool,
    rag_top_k: u32,
}

pub struct OrchestratorDeps {
    pub statics: StaticAnswerCatalog,
    pub router: ToolIntentRouter,
    pub recovery: StateRecovery,
    pub funnel: BookingFunnel,
    pub executor: Arc<ToolExecutor>,
    pub generator: Arc<dyn TextGenerator>,
    pub retriever: Arc<dyn DocumentRetriever>,
    pub cache: ResponseCacheGate,
    pub turns: Arc<dyn TurnStore>,
    pub auth_required: bool,
    pub rag_top_k: u32,
}

impl DialogueOrchestrator {
    pub fn new(deps: OrchestratorDeps) -> Self {
        Self {
            smalltalk: SmalltalkClassifier::new(),
            safety: SafetyClassifier::new(),
            statics: deps.statics,
            router: deps.router,
            slot_extractor: SlotExtractor::new(),
            recovery: deps.recovery,
            funnel: deps.funnel,
            executor: deps.executor,
            generator: deps.generator,
            retriever: deps.retriever,
            cache: deps.cache,
            turns: deps.turns,
            cleaner: ResponseCleaner::new(),
            auth_required: deps.auth_required,
            rag_top_k: deps.rag_top_k,
        }
    }

    pub async fn handle_message(&self, request: ChatRequest) -> ChatResponse {
        self.handle_message_at(request, Local::now().naive_local())
            .await
    }

    /// Clock-pinned variant so date resolution stays reproducible under
    /// test.
    pub async fn handle_message_at(
        &self,
        request: ChatRequest,
        now: NaiveDateTime,
    ) -> ChatResponse {
        let request_id = request
            .request_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let ctx = ToolContext {
            session_id: request.session_id.clone(),
            request_id: request_id.clone(),
            user_id: meta_string(&request.metadata, "user_id"),
            metadata: request.metadata.clone(),
        };

        let response = match self.route(&request, &ctx, now).await {
            Ok(response) => response,
            Err(err) => {
                error!(session_id = %request.session_id, "turn failed: {err}");
                ChatResponse::text(APOLOGY_REPLY, &request_id)
            }
        };

        self.persist_turn(&request, &response).await;
        response
    }

    async fn route(
        &self,
        request: &ChatRequest,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ChatResponse, DialogueError> {
        let message = request.message.trim();
        let rid = &ctx.request_id;

        // Pre-routing guard: reservation-cued messages never leak any
        // detail before authentication.
        if self.auth_required
            && !self.executor.is_authenticated(ctx)
            && cues::needs_reservation_login_guard(message)
        {
            return Ok(ChatResponse::text(AUTH_REQUIRED_REPLY, rid));
        }

        if message.is_empty() {
            return Ok(ChatResponse::text(EMPTY_MESSAGE_REPLY, rid));
        }
        if self.smalltalk.is_smalltalk(message) {
            return Ok(ChatResponse::text(GREETING_REPLY, rid));
        }
        if let Some(hit) = self.safety.detect(message) {
            info!(category = hit.category, "safety script served");
            self.cache
                .store("safety", message, CacheScope::QueryOnly, &[], hit.reply)
                .await;
            return Ok(ChatResponse::text(hit.reply, rid));
        }

        let current = self.slot_extractor.extract(message, &request.metadata);
        let state = self.recovery.recover(&ctx.session_id, current).await;

        if cues::has_medical_history_cue(message) {
            return Ok(self
                .run_tool(ToolName::MedicalHistory.as_str(), json!({}), ctx, now)
                .await);
        }

        if let Some(response) = self.reschedule_branch(message, &state, ctx, now).await {
            return Ok(response);
        }
        if let Some(response) = self.follow_up_branch(message, &state, ctx, now).await {
            return Ok(response);
        }

        if !cues::has_booking_intent(message) && !cues::is_doctor_query(message) {
            if let Some(answer) = self.statics.answer(message) {
                self.cache
                    .store(
                        "static_info",
                        message,
                        CacheScope::QueryOnly,
                        &answer.sources,
                        &answer.reply,
                    )
                    .await;
                let mut response = ChatResponse::text(answer.reply, rid);
                response.sources = answer.sources;
                response.table = answer.table;
                response.buttons = answer.buttons;
                return Ok(response);
            }
        }

        if cues::is_doctor_query(message) || cues::has_doctor_change_cue(message) {
            let args = match &state.slots.department {
                Some(dept) => json!({"department": dept}),
                None => json!({}),
            };
            return Ok(self
                .run_tool(ToolName::DoctorList.as_str(), args, ctx, now)
                .await);
        }

        let symptom_department = match_symptom_department(message);
        let booking = cues::has_booking_intent(message)
            || cues::has_additional_booking_intent(message)
            || (symptom_department.is_some() && state.slots.preferred_time.is_some());
        if booking {
            let mut slots = state.slots.clone();
            if slots.department.is_none() {
                slots.department = symptom_department.map(str::to_string);
            }
            return Ok(self.drive_funnel(message, &slots, ctx, now).await);
        }

        if let Some(guide) = match_symptom_guide(message) {
            let reply = format!(
                "{} 증상은 {}에서 진료합니다. {} 원하시면 예약을 도와드릴게요.",
                guide.name, guide.department, guide.summary,
            );
            let mut response = ChatResponse::text(reply, rid);
            response.buttons = vec![shared_models::ButtonPayload {
                text: format!("{} 예약하기", guide.department),
                action: format!("{} 예약", guide.department),
            }];
            return Ok(response);
        }
        if let Some(department) = symptom_department {
            let mut response = ChatResponse::text(
                format!("말씀하신 증상은 {department} 진료를 권해드립니다."),
                rid,
            );
            response.buttons = vec![shared_models::ButtonPayload {
                text: format!("{department} 예약하기"),
                action: format!("{department} 예약"),
            }];
            return Ok(response);
        }

        if self.router.should_use_tools(message, &request.metadata).await {
            if let Some(tool_name) = self
                .router
                .classify_tool_name(message, &request.metadata)
                .await
            {
                let args = tool_args_from_slots(&state, message);
                return Ok(self.run_tool(&tool_name, args, ctx, now).await);
            }
        }

        self.rag_branch(message, ctx, now).await
    }

    /// Step 5: an explicit reschedule cue, or a pending reschedule pick
    /// from the previous turn.
    async fn reschedule_branch(
        &self,
        message: &str,
        state: &SessionState,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Option<ChatResponse> {
        // History-carried times must not count as "the user gave a new
        // time"; only the current utterance does. A bare date is enough,
        // the handler keeps the original hour then.
        let new_time = self.new_time_phrase(message);

        if state.awaiting == Awaiting::RescheduleConfirm {
            if let Some(new_time) = &new_time {
                let mut args = json!({
                    "preferred_time": new_time,
                });
                if let Some(dept) = &state.slots.department {
                    args["department"] = json!(dept);
                }
                if let Some(doctor) = &state.slots.doctor_name {
                    args["doctor_name"] = json!(doctor);
                }
                return Some(
                    self.run_tool(ToolName::ReservationReschedule.as_str(), args, ctx, now)
                        .await,
                );
            }
        }

        if !cues::has_reschedule_cue(message) || cues::has_cancel_cue(message) {
            return None;
        }
        if let Some(new_time) = new_time {
            let args = json!({"preferred_time": new_time});
            return Some(
                self.run_tool(ToolName::ReservationReschedule.as_str(), args, ctx, now)
                    .await,
            );
        }

        // No new time yet: show what can be moved and wait for the pick.
        let lookup = self
            .run_tool(ToolName::ReservationLookup.as_str(), json!({}), ctx, now)
            .await;
        let mut response = ChatResponse::text(
            format!("{RESCHEDULE_MARKER}. 변경할 예약과 새 일정을 알려주세요."),
            &ctx.request_id,
        );
        response.table = lookup.table;
        response.reschedule_mode = true;
        Some(response)
    }

    /// Date and/or clock phrase of the current utterance, assembled into
    /// one resolvable string. None when the message names neither.
    fn new_time_phrase(&self, message: &str) -> Option<String> {
        let dt = &self.slot_extractor.datetime;
        let date = dt
            .extract_date_phrase(message)
            .or_else(|| dt.extract_day_only(message).map(|d| format!("{d}일")));
        if dt.has_specific_time(message) {
            let time = dt.extract_time_phrase(message)?;
            return Some(match &date {
                Some(date) if !time.contains(date.as_str()) => format!("{date} {time}"),
                _ => time,
            });
        }
        date
    }

    /// Step 6: continue the funnel the previous bot turn opened, when
    /// this message actually answers it. Otherwise fall through.
    async fn follow_up_branch(
        &self,
        message: &str,
        state: &SessionState,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Option<ChatResponse> {
        match state.awaiting {
            Awaiting::DoctorSelection => {
                let answered = state.slots.doctor_name.is_some()
                    || StateRecovery::is_bare_department_selection(message, &state.awaiting)
                    || cues::is_negative_reply(message);
                if !answered {
                    return None;
                }
                let mut slots = state.slots.clone();
                if cues::is_negative_reply(message) {
                    // "아무나요" books the department default.
                    slots.doctor_name = None;
                    slots.doctor_id = None;
                    return Some(self.create_reservation(&slots, ctx, now).await);
                }
                Some(self.drive_funnel(message, &slots, ctx, now).await)
            }
            Awaiting::DateDisambiguation => {
                let datetime = &self.slot_extractor.datetime;
                if datetime.extract_day_only(message).is_none()
                    && !datetime.has_date_hint(message)
                {
                    return None;
                }
                Some(self.drive_funnel(message, &state.slots, ctx, now).await)
            }
            _ => None,
        }
    }

    async fn drive_funnel(
        &self,
        message: &str,
        slots: &extraction_cell::Slots,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> ChatResponse {
        match self.funnel.next_step(message, slots, now).await {
            FunnelStep::Prompt {
                reply,
                table,
                buttons,
            } => {
                let mut response = ChatResponse::text(reply, &ctx.request_id);
                response.table = table;
                response.buttons = buttons;
                response
            }
            FunnelStep::Ready { args } => {
                self.run_tool(ToolName::ReservationCreate.as_str(), args, ctx, now)
                    .await
            }
        }
    }

    async fn create_reservation(
        &self,
        slots: &extraction_cell::Slots,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> ChatResponse {
        let datetime = &self.slot_extractor.datetime;
        let preferred = datetime
            .normalize_preferred_time(slots.preferred_time.as_deref(), slots.asap)
            .and_then(|p| datetime.merge_date_with_time(Some(&p), slots.date_hint.as_deref()));
        let mut args = json!({
            "department": slots.department,
            "preferred_time": preferred,
        });
        if let Some(doctor) = &slots.doctor_name {
            args["doctor_name"] = json!(doctor);
        }
        self.run_tool(ToolName::ReservationCreate.as_str(), args, ctx, now)
            .await
    }

    async fn run_tool(
        &self,
        tool_name: &str,
        args: Value,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> ChatResponse {
        match self.executor.execute_at(tool_name, args, ctx, now).await {
            Ok(output) => tool_response(output, &ctx.request_id),
            Err(err) => tool_error_response(&err, &ctx.request_id),
        }
    }

    /// Step 12: cache-gated retrieval + generation with a bounded,
    /// sequential tool-calling loop.
    async fn rag_branch(
        &self,
        query: &str,
        ctx: &ToolContext,
        now: NaiveDateTime,
    ) -> Result<ChatResponse, DialogueError> {
        let rid = &ctx.request_id;
        if let Some(hit) = self
            .cache
            .lookup("rag", query, CacheScope::QueryOnly, &[])
            .await
        {
            let mut response = ChatResponse::text(hit.response_text, rid);
            response.sources = hit.sources;
            return Ok(response);
        }

        let passages = match self.retriever.search(query, self.rag_top_k).await {
            Ok(passages) => passages,
            Err(err) => {
                warn!("retrieval failed, generating without context: {err}");
                Vec::new()
            }
        };
        let sources = sources_from_passages(&passages);
        if let Some(hit) = self
            .cache
            .lookup("rag", query, CacheScope::RagContext, &sources)
            .await
        {
            let mut response = ChatResponse::text(hit.response_text, rid);
            response.sources = hit.sources;
            return Ok(response);
        }

        let context = passages
            .iter()
            .map(|p| format!("- {}", p.snippet))
            .collect::<Vec<_>>()
            .join("\n");
        let mut messages = vec![
            ChatMessage::system(format!("{RAG_SYSTEM_PROMPT}{context}")),
            ChatMessage::user(query),
        ];
        let tools = tool_schemas();
        let mut calls_used = 0usize;

        // One extra round for the final text after the last tool result.
        for _ in 0..=MAX_TOOL_CALLS_PER_TURN {
            let outcome = match self
                .generator
                .complete_with_tools(messages.clone(), &tools)
                .await
            {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("generation failed: {err}");
                    return Ok(ChatResponse::text(RETRY_REPLY, rid));
                }
            };
            match outcome {
                GenerationOutcome::Text(text) => {
                    let reply = self.cleaner.clean(&text);
                    self.cache
                        .store("rag", query, CacheScope::RagContext, &sources, &reply)
                        .await;
                    let mut response = ChatResponse::text(reply, rid);
                    response.sources = sources;
                    return Ok(response);
                }
                GenerationOutcome::ToolCalls(calls) => {
                    messages.push(ChatMessage::assistant_tool_calls(echo_tool_calls(&calls)));
                    for call in calls {
                        if calls_used >= MAX_TOOL_CALLS_PER_TURN {
                            warn!("tool call budget exhausted mid-turn");
                            return Ok(ChatResponse::text(RETRY_REPLY, rid));
                        }
                        calls_used += 1;
                        let run = tokio::time::timeout(
                            Duration::from_secs(TOOL_CALL_TIMEOUT_SECS),
                            self.executor
                                .execute_at(&call.name, call.arguments.clone(), ctx, now),
                        )
                        .await;
                        match run {
                            Err(_) => {
                                warn!(tool = %call.name, "tool call timed out");
                                return Ok(ChatResponse::text(RETRY_REPLY, rid));
                            }
                            Ok(Err(ToolError::AuthRequired)) => {
                                return Ok(ChatResponse::text(AUTH_REQUIRED_REPLY, rid));
                            }
                            Ok(Err(err)) => {
                                let reply = err
                                    .user_reply()
                                    .unwrap_or(RETRY_REPLY)
                                    .to_string();
                                return Ok(ChatResponse::text(reply, rid));
                            }
                            Ok(Ok(output)) => {
                                if STRICT_REPLY_TOOLS.contains(&call.name.as_str()) {
                                    if let Some(reply) = output.reply {
                                        let mut response = ChatResponse::text(reply, rid);
                                        response.table = output.table;
                                        return Ok(response);
                                    }
                                }
                                let content = json!({
                                    "data": output.data,
                                    "reply": output.reply,
                                })
                                .to_string();
                                messages.push(ChatMessage::tool_result(call.id, content));
                            }
                        }
                    }
                }
            }
        }
        Ok(ChatResponse::text(RETRY_REPLY, rid))
    }

    /// The one Turn write per handled message. Failure is logged, never
    /// surfaced; the user already has their reply.
    async fn persist_turn(&self, request: &ChatRequest, response: &ChatResponse) {
        let slots = self
            .slot_extractor
            .extract(request.message.trim(), &request.metadata);
        let mut metadata: HashMap<String, Value> = HashMap::new();
        for (key, value) in [
            ("department", &slots.department),
            ("doctor_name", &slots.doctor_name),
            ("doctor_id", &slots.doctor_id),
            ("preferred_time", &slots.preferred_time),
            ("date_hint", &slots.date_hint),
        ] {
            if let Some(v) = value {
                metadata.insert(key.to_string(), Value::String(v.clone()));
            }
        }
        let turn = Turn {
            session_id: request.session_id.clone(),
            created_at: Utc::now(),
            user_text: request.message.clone(),
            bot_text: response.reply.clone(),
            sources: response.sources.clone(),
            metadata,
        };
        if let Err(err) = self.turns.append(turn).await {
            warn!(session_id = %request.session_id, "turn persist failed: {err}");
        }
    }
}

fn meta_string(metadata: &HashMap<String, Value>, key: &str) -> Option<String> {
    match metadata.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn tool_args_from_slots(state: &SessionState, message: &str) -> Value {
    let mut args = serde_json::Map::new();
    if let Some(dept) = &state.slots.department {
        args.insert("department".to_string(), json!(dept));
    }
    if let Some(preferred) = &state.slots.preferred_time {
        args.insert("preferred_time".to_string(), json!(preferred));
        args.insert("date".to_string(), json!(preferred));
    } else if let Some(hint) = &state.slots.date_hint {
        args.insert("date".to_string(), json!(hint));
    }
    if let Some(doctor) = &state.slots.doctor_name {
        args.insert("doctor_name".to_string(), json!(doctor));
    }
    args.insert("dates_text".to_string(), json!(message));
    if cues::has_bulk_cancel_cue(message) {
        args.insert("cancel_all".to_string(), json!(true));
    }
    Value::Object(args)
}

fn tool_response(output: ToolOutput, request_id: &str) -> ChatResponse {
    let reply = output
        .reply
        .unwrap_or_else(|| "요청하신 내용을 처리했습니다.".to_string());
    let mut response = ChatResponse::text(reply, request_id);
    response.table = output.table;
    response
}

fn tool_error_response(err: &ToolError, request_id: &str) -> ChatResponse {
    let reply = match err {
        ToolError::AuthRequired => AUTH_REQUIRED_REPLY,
        other => other.user_reply().unwrap_or(RETRY_REPLY),
    };
    ChatResponse::text(reply, request_id)
}

fn sources_from_passages(passages: &[RetrievedPassage]) -> Vec<SourceRef> {
    passages
        .iter()
        .map(|p| SourceRef {
            kind: "document".to_string(),
            id: Some(p.id.clone()),
            title: p.title.clone(),
            score: Some(p.score),
            snippet: Some(p.snippet.clone()),
        })
        .collect()
}

fn echo_tool_calls(calls: &[generation_cell::ToolCallRequest]) -> Value {
    Value::Array(
        calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments.to_string(),
                    },
                })
            })
            .collect(),
    )
}
