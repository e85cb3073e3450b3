use extraction_cell::Slots;

/// Phrases a prior bot turn leaves behind so the next turn can tell
/// which follow-up branch is active. State recovery matches on these.
pub const DOCTOR_SELECT_MARKER: &str = "의료진을 선택해 주세요";
pub const DATE_AMBIGUOUS_MARKER: &str = "여러 날짜가 있습니다";
pub const RESCHEDULE_MARKER: &str = "변경하실 예약을 선택해 주세요";

/// Which follow-up the previous bot turn is waiting on.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Awaiting {
    #[default]
    None,
    /// Bot listed doctors and asked the user to pick one.
    DoctorSelection,
    /// The message carried several bare day numbers; bot asked for one.
    DateDisambiguation,
    /// Bot listed reservations pending a new time from the user.
    RescheduleConfirm,
}

/// Recovered conversational state for the current turn: the active
/// follow-up branch plus the best-guess slots merged from history.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub awaiting: Awaiting,
    pub slots: Slots,
}
