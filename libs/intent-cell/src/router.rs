use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use generation_cell::TextGenerator;

use crate::cues;
use crate::keywords::*;
use crate::lru::LruCache;

const MEMO_CAPACITY: usize = 256;

const USE_TOOLS_PROMPT: &str = "You are a router for a hospital chatbot. Decide whether the user request \
requires TOOL calls for live actions (reservation lookup/create/cancel/history, medical history, \
wait status, notification send, session history, doctor list) or can be answered from documents. \
If the user asks to check/change/cancel a reservation, medical history, wait status, send notifications, \
view session history, or list doctors -> TOOL. If the user asks about parking, location, hours, \
departments, admissions, costs, reservation guidance/policy, or general info -> RAG. \
Respond with only TOOL or RAG.";

const TOOL_NAME_PROMPT: &str = "You are a router for a hospital chatbot. Choose the single best tool name \
for the user request. Return one of: reservation_lookup, reservation_create, \
reservation_cancel, reservation_reschedule, reservation_history, available_time_slots, \
medical_history, wait_status, notification_send, session_history, doctor_list, unknown. \
Respond with only the tool name.";

const KNOWN_TOOL_NAMES: [&str; 11] = [
    "reservation_lookup",
    "reservation_create",
    "reservation_cancel",
    "reservation_reschedule",
    "reservation_history",
    "available_time_slots",
    "medical_history",
    "wait_status",
    "notification_send",
    "session_history",
    "doctor_list",
];

fn meta_str(metadata: &HashMap<String, Value>, key: &str) -> Option<String> {
    match metadata.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Two-tier tool-intent routing: keyword scoring decides the clear cases,
/// ambiguous ones escalate to the text generator. LLM verdicts are
/// memoized per exact query in a bounded LRU so repeated traffic never
/// pays the network call twice.
pub struct ToolIntentRouter {
    generator: Arc<dyn TextGenerator>,
    use_tools_memo: Mutex<LruCache<String, Option<bool>>>,
    tool_name_memo: Mutex<LruCache<String, Option<String>>>,
}

impl ToolIntentRouter {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            use_tools_memo: Mutex::new(LruCache::new(MEMO_CAPACITY)),
            tool_name_memo: Mutex::new(LruCache::new(MEMO_CAPACITY)),
        }
    }

    /// Should this turn go to the tool executor at all?
    pub async fn should_use_tools(
        &self,
        query: &str,
        metadata: &HashMap<String, Value>,
    ) -> bool {
        let q = query.trim();
        if q.is_empty() {
            return false;
        }
        // Medical history goes through its own dedicated branch.
        if cues::has_medical_history_cue(q) {
            return false;
        }
        if let Some(hint) = meta_str(metadata, "use_tools") {
            return hint != "0" && !hint.eq_ignore_ascii_case("false");
        }
        let lower = q.to_lowercase();
        let tool_hit = contains_any(&lower, &TOOL_KEYWORDS) || contains_any(q, &TOOL_KEYWORDS);
        let non_tool_hit =
            contains_any(&lower, &NON_TOOL_KEYWORDS) || contains_any(q, &NON_TOOL_KEYWORDS);

        if tool_hit && !non_tool_hit {
            return true;
        }
        if non_tool_hit && !tool_hit {
            return false;
        }
        if q.contains("예약") && contains_any(q, &RESERVATION_EXISTING_CUES) {
            return true;
        }
        let ambiguous = tool_hit || non_tool_hit || contains_any(q, &AMBIGUOUS_CUES);
        if ambiguous {
            if let Some(decision) = self.llm_use_tools(q).await {
                info!("tool intent via llm: {} -> {}", truncate(q, 120), decision);
                return decision;
            }
        }
        if non_tool_hit {
            false
        } else {
            tool_hit
        }
    }

    /// The specific tool for a tool-bound turn. Rule-based first; the LLM
    /// gets the leftovers.
    pub async fn classify_tool_name(
        &self,
        query: &str,
        metadata: &HashMap<String, Value>,
    ) -> Option<String> {
        let q = query.trim();
        if q.is_empty() {
            return None;
        }
        if let Some(hint) = meta_str(metadata, "tool_name") {
            if KNOWN_TOOL_NAMES.contains(&hint.as_str()) {
                return Some(hint);
            }
        }
        if cues::has_medical_history_cue(q) {
            return Some("medical_history".to_string());
        }
        if cues::has_bulk_cancel_cue(q) || cues::has_cancel_cue(q) {
            return Some("reservation_cancel".to_string());
        }
        if cues::has_reschedule_cue(q) {
            return Some("reservation_reschedule".to_string());
        }
        if contains_any(q, &SLOT_QUERY_KEYWORDS) {
            return Some("available_time_slots".to_string());
        }
        if contains_any(q, &WAIT_KEYWORDS) {
            return Some("wait_status".to_string());
        }
        if contains_any(q, &NOTIFICATION_KEYWORDS) {
            return Some("notification_send".to_string());
        }
        if contains_any(q, &SESSION_HISTORY_KEYWORDS) {
            return Some("session_history".to_string());
        }
        if cues::is_doctor_query(q) {
            return Some("doctor_list".to_string());
        }
        if q.contains("예약") && contains_any(q, &RESERVATION_EXISTING_CUES) {
            return Some("reservation_lookup".to_string());
        }
        if cues::has_booking_intent(q) {
            return Some("reservation_create".to_string());
        }
        self.llm_tool_name(q).await
    }

    async fn llm_use_tools(&self, query: &str) -> Option<bool> {
        {
            let mut memo = self.use_tools_memo.lock().await;
            if let Some(cached) = memo.get(&query.to_string()) {
                return cached;
            }
        }
        let verdict = match self
            .generator
            .complete(USE_TOOLS_PROMPT, query, 0.0)
            .await
        {
            Ok(raw) => {
                let token = first_token(&raw);
                match token.as_str() {
                    "tool" | "tools" => Some(true),
                    "rag" | "static" | "info" => Some(false),
                    _ => {
                        debug!("unrecognized router verdict: {}", token);
                        None
                    }
                }
            }
            Err(e) => {
                warn!("LLM intent classifier failed: {}", e);
                None
            }
        };
        self.use_tools_memo
            .lock()
            .await
            .insert(query.to_string(), verdict);
        verdict
    }

    async fn llm_tool_name(&self, query: &str) -> Option<String> {
        {
            let mut memo = self.tool_name_memo.lock().await;
            if let Some(cached) = memo.get(&query.to_string()) {
                return cached;
            }
        }
        let name = match self
            .generator
            .complete(TOOL_NAME_PROMPT, query, 0.0)
            .await
        {
            Ok(raw) => {
                let token = first_token(&raw);
                KNOWN_TOOL_NAMES
                    .iter()
                    .find(|n| **n == token)
                    .map(|n| n.to_string())
            }
            Err(e) => {
                warn!("LLM tool-name classifier failed: {}", e);
                None
            }
        };
        self.tool_name_memo
            .lock()
            .await
            .insert(query.to_string(), name.clone());
        name
    }
}

fn first_token(raw: &str) -> String {
    raw.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use generation_cell::{
        ChatMessage, GenerationError, GenerationOutcome, ToolSchema,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedGenerator {
        reply: String,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn complete(
            &self,
            _system: &str,
            _user: &str,
            _temperature: f32,
        ) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }

        async fn complete_with_tools(
            &self,
            _messages: Vec<ChatMessage>,
            _tools: &[ToolSchema],
        ) -> Result<GenerationOutcome, GenerationError> {
            Err(GenerationError::AllProvidersFailed)
        }
    }

    #[tokio::test]
    async fn clear_keyword_cases_never_hit_the_llm() {
        let gen = Arc::new(ScriptedGenerator::new("TOOL"));
        let router = ToolIntentRouter::new(gen.clone());
        assert!(router.should_use_tools("예약 취소해줘", &HashMap::new()).await);
        assert!(!router.should_use_tools("주차 요금 얼마야", &HashMap::new()).await);
        assert_eq!(gen.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn ambiguous_case_escalates_once_then_memoizes() {
        let gen = Arc::new(ScriptedGenerator::new("TOOL"));
        let router = ToolIntentRouter::new(gen.clone());
        // "확인" alone is ambiguous with no tool/non-tool keyword.
        assert!(router.should_use_tools("지금 상태 확인 좀", &HashMap::new()).await);
        assert!(router.should_use_tools("지금 상태 확인 좀", &HashMap::new()).await);
        assert_eq!(gen.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rule_based_tool_names() {
        let gen = Arc::new(ScriptedGenerator::new("unknown"));
        let router = ToolIntentRouter::new(gen);
        let meta = HashMap::new();
        assert_eq!(
            router.classify_tool_name("예약 전부 취소해줘", &meta).await.as_deref(),
            Some("reservation_cancel")
        );
        assert_eq!(
            router.classify_tool_name("내과 대기 현황 알려줘", &meta).await.as_deref(),
            Some("wait_status")
        );
        assert_eq!(
            router.classify_tool_name("내 예약 확인해줘", &meta).await.as_deref(),
            Some("reservation_lookup")
        );
        assert_eq!(
            router.classify_tool_name("내일 오후에 예약해줘", &meta).await.as_deref(),
            Some("reservation_create")
        );
    }

    #[tokio::test]
    async fn metadata_tool_hint_wins() {
        let gen = Arc::new(ScriptedGenerator::new("unknown"));
        let router = ToolIntentRouter::new(gen);
        let mut meta = HashMap::new();
        meta.insert("tool_name".to_string(), serde_json::json!("doctor_list"));
        assert_eq!(
            router.classify_tool_name("아무거나", &meta).await.as_deref(),
            Some("doctor_list")
        );
    }
}
