//! Cue predicates over a single user message. These are cheap checks the
//! orchestrator combines under its fixed precedence; none of them is a
//! final routing decision on its own.

use crate::keywords::*;
use extraction_cell::extract_department;

pub fn has_booking_intent(query: &str) -> bool {
    contains_any(query, &BOOKING_CUES)
}

pub fn has_additional_booking_intent(query: &str) -> bool {
    contains_any(query, &ADDITIONAL_BOOKING_CUES)
}

pub fn has_reschedule_cue(query: &str) -> bool {
    contains_any(query, &RESCHEDULE_CUES)
}

pub fn has_cancel_cue(query: &str) -> bool {
    contains_any(query, &CANCEL_CUES)
}

pub fn has_bulk_cancel_cue(query: &str) -> bool {
    if !has_cancel_cue(query) {
        return false;
    }
    contains_any(query, &BULK_CANCEL_CUES)
        || compact_contains_any(query, &BULK_CANCEL_COMPACT_FORMS)
        || query.contains(" 다 ")
}

pub fn has_doctor_change_cue(query: &str) -> bool {
    contains_any(query, &DOCTOR_CHANGE_CUES)
}

pub fn is_doctor_query(query: &str) -> bool {
    contains_any(query, &DOCTOR_QUERY_CUES)
        && contains_any(query, &DOCTOR_FOLLOWUP_CUES)
}

pub fn is_negative_reply(query: &str) -> bool {
    let compact: String = query
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    !compact.is_empty() && NEGATIVE_CUES.iter().any(|cue| compact.contains(cue))
}

pub fn has_medical_history_cue(query: &str) -> bool {
    contains_any(query, &MEDICAL_HISTORY_KEYWORDS)
}

pub fn needs_reservation_login_guard(query: &str) -> bool {
    contains_any(query, &RESERVATION_LOGIN_GUARD_CUES)
}

/// A symptom question that is not already a booking request with a
/// department spelled out.
pub fn is_symptom_department_request(query: &str) -> bool {
    if contains_any(query, &SYMPTOM_INFO_CUES) {
        return false;
    }
    if has_booking_intent(query) && extract_department(query).is_some() {
        return false;
    }
    contains_any(query, &SYMPTOM_WORDS)
}
