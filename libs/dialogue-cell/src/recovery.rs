use std::sync::Arc;

use serde_json::Value;
use tracing::warn;

use extraction_cell::{extract_department, is_department, SlotExtractor, Slots};
use shared_models::Turn;
use shared_store::TurnStore;

use crate::models::{
    Awaiting, SessionState, DATE_AMBIGUOUS_MARKER, DOCTOR_SELECT_MARKER, RESCHEDULE_MARKER,
};

const SCAN_TURNS: usize = 8;

/// Rebuilds conversational state from stored turns. Current-turn values
/// always win; history only back-fills what this message left out.
pub struct StateRecovery {
    turns: Arc<dyn TurnStore>,
    extractor: SlotExtractor,
}

impl StateRecovery {
    pub fn new(turns: Arc<dyn TurnStore>) -> Self {
        Self {
            turns,
            extractor: SlotExtractor::new(),
        }
    }

    pub async fn recover(&self, session_id: &str, current: Slots) -> SessionState {
        let history = match self.turns.recent(session_id, SCAN_TURNS).await {
            Ok(turns) => turns,
            Err(err) => {
                warn!("state recovery skipped, turn store failed: {err}");
                Vec::new()
            }
        };

        let awaiting = history
            .first()
            .map(|last| awaiting_from_bot_text(&last.bot_text))
            .unwrap_or_default();

        let mut slots = current;
        // The previous turn's derived slots are the freshest history.
        if let Some(last) = history.first() {
            slots.fill_missing_from(&slots_from_metadata(last));
        }
        for turn in &history {
            if slots.department.is_some() && slots.doctor_name.is_some() {
                break;
            }
            let mut scanned = self
                .extractor
                .extract(&turn.user_text, &std::collections::HashMap::new());
            // Time phrases go stale across turns; only identity slots carry.
            scanned.preferred_time = None;
            scanned.date_hint = None;
            scanned.asap = false;
            slots.fill_missing_from(&scanned);
        }

        SessionState { awaiting, slots }
    }

    /// A short message that is exactly one department name counts as a
    /// follow-up selection when the bot just asked for one.
    pub fn is_bare_department_selection(message: &str, awaiting: &Awaiting) -> bool {
        if *awaiting == Awaiting::None {
            return false;
        }
        let trimmed = message.trim();
        trimmed.chars().count() <= 6
            && (is_department(trimmed) || extract_department(trimmed).is_some())
    }
}

fn awaiting_from_bot_text(bot_text: &str) -> Awaiting {
    if bot_text.contains(DOCTOR_SELECT_MARKER) {
        Awaiting::DoctorSelection
    } else if bot_text.contains(DATE_AMBIGUOUS_MARKER) {
        Awaiting::DateDisambiguation
    } else if bot_text.contains(RESCHEDULE_MARKER) {
        Awaiting::RescheduleConfirm
    } else {
        Awaiting::None
    }
}

fn slots_from_metadata(turn: &Turn) -> Slots {
    let get = |key: &str| match turn.metadata.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };
    Slots {
        department: get("department"),
        doctor_name: get("doctor_name"),
        doctor_id: get("doctor_id"),
        preferred_time: get("preferred_time"),
        date_hint: get("date_hint"),
        asap: false,
    }
}
