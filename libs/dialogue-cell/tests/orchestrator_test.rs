use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use cache_cell::{KeyVersions, ResponseCacheGate, TtlSettings};
use calendar_cell::{ClinicCalendar, HolidayClient};
use dialogue_cell::{BookingFunnel, DialogueOrchestrator, OrchestratorDeps, StateRecovery};
use generation_cell::{
    ChatMessage, CorpusDocument, GenerationError, GenerationOutcome, KeywordRetriever,
    TextGenerator, ToolSchema,
};
use intent_cell::{ClinicInfo, StaticAnswerCatalog, ToolIntentRouter};
use shared_models::{ChatRequest, Doctor, WaitStatus};
use shared_store::memory::{
    InMemoryAuditLogStore, InMemoryCacheStore, InMemoryDoctorDirectory,
    InMemoryMedicalHistoryStore, InMemoryNotificationOutbox, InMemoryReservationStore,
    InMemoryTurnStore, InMemoryWaitStatusStore,
};
use shared_store::{AuditLogStore, TurnStore};
use tool_cell::{ToolExecutor, ToolHandlers};

struct ScriptedGenerator {
    outcomes: Mutex<VecDeque<GenerationOutcome>>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn new(outcomes: Vec<GenerationOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(
        &self,
        _system_prompt: &str,
        _user_message: &str,
        _temperature: f32,
    ) -> Result<String, GenerationError> {
        Ok("RAG".to_string())
    }

    async fn complete_with_tools(
        &self,
        _messages: Vec<ChatMessage>,
        _tools: &[ToolSchema],
    ) -> Result<GenerationOutcome, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut outcomes = self.outcomes.lock().await;
        outcomes
            .pop_front()
            .ok_or_else(|| GenerationError::Upstream("script exhausted".to_string()))
    }
}

fn doctors(count: usize) -> Vec<Doctor> {
    let all = [("d-100", "100", "김철수"), ("d-101", "101", "박영희")];
    all.iter()
        .take(count)
        .map(|(id, code, name)| Doctor {
            id: id.to_string(),
            code: code.to_string(),
            display_name: name.to_string(),
            department: "외과".to_string(),
            title: Some("원장".to_string()),
            phone: None,
        })
        .collect()
}

struct Fixture {
    orchestrator: DialogueOrchestrator,
    turns: Arc<InMemoryTurnStore>,
    audit: Arc<InMemoryAuditLogStore>,
    generator: Arc<ScriptedGenerator>,
}

fn fixture(roster: Vec<Doctor>, script: Vec<GenerationOutcome>) -> Fixture {
    let turns = Arc::new(InMemoryTurnStore::new());
    let audit = Arc::new(InMemoryAuditLogStore::new());
    let generator = Arc::new(ScriptedGenerator::new(script));
    let directory = Arc::new(InMemoryDoctorDirectory::new(roster));
    let calendar = Arc::new(ClinicCalendar::new(Arc::new(HolidayClient::new("", ""))));
    let wait = Arc::new(InMemoryWaitStatusStore::new(vec![WaitStatus {
        department: "외과".to_string(),
        current_waiting: 4,
        estimated_minutes: 20,
        last_updated: Utc::now(),
    }]));
    let handlers = ToolHandlers::new(
        Arc::new(InMemoryReservationStore::new()),
        directory.clone(),
        wait,
        Arc::new(InMemoryMedicalHistoryStore::new()),
        turns.clone(),
        Arc::new(InMemoryNotificationOutbox::new()),
        calendar,
    );
    let executor = Arc::new(ToolExecutor::new(handlers, audit.clone(), true));
    let cache = ResponseCacheGate::new(
        Arc::new(InMemoryCacheStore::new()),
        KeyVersions {
            index_version: "v1".to_string(),
            top_k: 4,
            prompt_version: "p1".to_string(),
        },
        TtlSettings {
            default_secs: 3600,
            dynamic_secs: 600,
            static_secs: 86400,
        },
    );
    let retriever = Arc::new(KeywordRetriever::new(vec![CorpusDocument {
        id: "doc-1".to_string(),
        title: "독감 예방접종 안내".to_string(),
        text: "독감 예방접종 비용은 5만원이며 내과에서 접종합니다.".to_string(),
    }]));
    let orchestrator = DialogueOrchestrator::new(OrchestratorDeps {
        statics: StaticAnswerCatalog::new(ClinicInfo::default()),
        router: ToolIntentRouter::new(generator.clone()),
        recovery: StateRecovery::new(turns.clone()),
        funnel: BookingFunnel::new(directory),
        executor,
        generator: generator.clone(),
        retriever,
        cache,
        turns: turns.clone(),
        auth_required: true,
        rag_top_k: 4,
    });
    Fixture {
        orchestrator,
        turns,
        audit,
        generator,
    }
}

fn now() -> NaiveDateTime {
    // A Monday morning well in the future.
    NaiveDate::from_ymd_opt(2030, 9, 9)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn authed_request(message: &str) -> ChatRequest {
    let mut metadata = HashMap::new();
    metadata.insert(
        "patient_phone".to_string(),
        Value::String("01012345678".to_string()),
    );
    metadata.insert(
        "patient_identifier".to_string(),
        Value::String("P-7".to_string()),
    );
    ChatRequest {
        message: message.to_string(),
        session_id: "sess-1".to_string(),
        metadata,
        request_id: Some("req-1".to_string()),
    }
}

fn anon_request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.to_string(),
        session_id: "sess-1".to_string(),
        metadata: HashMap::new(),
        request_id: Some("req-1".to_string()),
    }
}

#[tokio::test]
async fn greeting_is_answered_without_generation() {
    let fx = fixture(doctors(2), vec![]);
    let response = fx
        .orchestrator
        .handle_message_at(authed_request("안녕하세요"), now())
        .await;
    assert!(response.reply.contains("안녕하세요"), "{}", response.reply);
    assert_eq!(fx.generator.call_count(), 0);
}

#[tokio::test]
async fn safety_script_beats_booking_keywords() {
    let fx = fixture(doctors(2), vec![]);
    let response = fx
        .orchestrator
        .handle_message_at(authed_request("죽고 싶어... 예약 같은 건 됐어"), now())
        .await;
    assert!(response.reply.contains("안전"), "{}", response.reply);
    assert_eq!(fx.generator.call_count(), 0);
    // No tool ran for a safety turn.
    assert!(fx.audit.for_session("sess-1").await.unwrap().is_empty());
}

#[tokio::test]
async fn reservation_cues_without_auth_short_circuit() {
    let fx = fixture(doctors(2), vec![]);
    let response = fx
        .orchestrator
        .handle_message_at(anon_request("내 예약 확인해줘"), now())
        .await;
    assert!(response.reply.contains("로그인 후 이용해 주세요"), "{}", response.reply);
    // Guard fires before any tool dispatch, so no audit row exists.
    assert!(fx.audit.for_session("sess-1").await.unwrap().is_empty());
    // The turn is still persisted.
    assert_eq!(fx.turns.recent("sess-1", 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn booking_funnel_asks_for_doctor_then_books() {
    let fx = fixture(doctors(2), vec![]);

    let first = fx
        .orchestrator
        .handle_message_at(authed_request("외과 예약하고 싶어요 내일 10시"), now())
        .await;
    assert!(first.reply.contains("의료진을 선택해 주세요"), "{}", first.reply);
    assert_eq!(first.table.unwrap().rows.len(), 2);

    let second = fx
        .orchestrator
        .handle_message_at(authed_request("김철수 원장으로 할게요"), now())
        .await;
    assert!(
        second.reply.contains("외과 김철수진료 예약 요청이 접수되었습니다"),
        "{}",
        second.reply
    );
    assert!(second.reply.contains("2030년 9월 10일 10:00"), "{}", second.reply);

    // Exactly one Turn per handled message.
    assert_eq!(fx.turns.recent("sess-1", 10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn ambiguous_days_are_disambiguated_before_booking() {
    let fx = fixture(doctors(1), vec![]);

    let first = fx
        .orchestrator
        .handle_message_at(authed_request("외과 예약해줘 13일이나 27일 10시"), now())
        .await;
    assert!(first.reply.contains("여러 날짜가 있습니다"), "{}", first.reply);
    assert_eq!(first.buttons.len(), 2);

    let second = fx
        .orchestrator
        .handle_message_at(authed_request("13일로 해줘"), now())
        .await;
    assert!(second.reply.contains("접수되었습니다"), "{}", second.reply);
    assert!(second.reply.contains("2030년 9월 13일 10:00"), "{}", second.reply);
}

#[tokio::test]
async fn bulk_cancel_routes_through_tools() {
    let fx = fixture(doctors(1), vec![]);
    fx.orchestrator
        .handle_message_at(authed_request("외과 예약하고 싶어요 내일 10시"), now())
        .await;

    let response = fx
        .orchestrator
        .handle_message_at(authed_request("예약 전부 취소해줘"), now())
        .await;
    assert_eq!(response.reply, "총 1건의 예약을 취소했습니다.");
}

#[tokio::test]
async fn parking_question_gets_the_static_answer() {
    let fx = fixture(doctors(2), vec![]);
    let response = fx
        .orchestrator
        .handle_message_at(anon_request("주차장 어디에 있어요?"), now())
        .await;
    assert!(response.reply.contains("주차장"), "{}", response.reply);
    assert_eq!(fx.generator.call_count(), 0);
}

#[tokio::test]
async fn rag_fallback_cleans_markdown_and_caches() {
    let fx = fixture(
        doctors(2),
        vec![GenerationOutcome::Text(
            "**독감 예방접종 비용**은 5만원입니다.".to_string(),
        )],
    );

    let first = fx
        .orchestrator
        .handle_message_at(anon_request("독감 예방접종 비용이 궁금해요"), now())
        .await;
    assert_eq!(first.reply, "독감 예방접종 비용은 5만원입니다.");
    assert!(!first.sources.is_empty());
    assert_eq!(fx.generator.call_count(), 1);

    // Identical question again: served from cache, no second generation.
    let second = fx
        .orchestrator
        .handle_message_at(anon_request("독감 예방접종 비용이 궁금해요"), now())
        .await;
    assert_eq!(second.reply, "독감 예방접종 비용은 5만원입니다.");
    assert_eq!(fx.generator.call_count(), 1);
}

#[tokio::test]
async fn strict_reply_tool_result_is_returned_verbatim() {
    let fx = fixture(
        doctors(2),
        vec![GenerationOutcome::ToolCalls(vec![
            generation_cell::ToolCallRequest {
                id: "call-1".to_string(),
                name: "wait_status".to_string(),
                arguments: json!({"department": "외과"}),
            },
        ])],
    );
    let response = fx
        .orchestrator
        .handle_message_at(anon_request("외과 진료비 말고 다른 것도 궁금해요"), now())
        .await;
    assert_eq!(
        response.reply,
        "외과 현재 대기중인 사람은 4명이며, 약 20분 뒤에 진료가 가능합니다."
    );
}

#[tokio::test]
async fn reschedule_cue_without_time_lists_reservations() {
    let fx = fixture(doctors(1), vec![]);
    fx.orchestrator
        .handle_message_at(authed_request("외과 예약하고 싶어요 내일 10시"), now())
        .await;

    let listing = fx
        .orchestrator
        .handle_message_at(authed_request("예약 변경하고 싶어요"), now())
        .await;
    assert!(listing.reply.contains("변경하실 예약을 선택해 주세요"), "{}", listing.reply);
    assert!(listing.reschedule_mode);
    assert!(listing.table.is_some());

    let moved = fx
        .orchestrator
        .handle_message_at(authed_request("내일 14시로 해주세요"), now())
        .await;
    assert!(moved.reply.contains("변경했습니다"), "{}", moved.reply);
    assert!(moved.reply.contains("2030년 9월 10일 14:00"), "{}", moved.reply);
}

#[tokio::test]
async fn date_only_reschedule_keeps_the_booked_clock() {
    let fx = fixture(doctors(1), vec![]);
    fx.orchestrator
        .handle_message_at(authed_request("외과 예약하고 싶어요 내일 10시"), now())
        .await;

    let moved = fx
        .orchestrator
        .handle_message_at(authed_request("13일로 예약 변경해줘"), now())
        .await;
    assert!(moved.reply.contains("변경했습니다"), "{}", moved.reply);
    assert!(moved.reply.contains("2030년 9월 13일 10:00"), "{}", moved.reply);
}

#[tokio::test]
async fn generation_failure_degrades_to_retry_reply() {
    let fx = fixture(doctors(2), vec![]);
    let response = fx
        .orchestrator
        .handle_message_at(anon_request("병원 근처 맛집이 궁금해요"), now())
        .await;
    assert_eq!(response.reply, "요청을 처리하지 못했습니다. 잠시 후 다시 시도해주세요.");
}
