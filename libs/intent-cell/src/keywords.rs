//! Keyword catalogues driving the rule-based classifiers. Grouped by the
//! classifier that consumes them; greetings and cue lists are deliberately
//! short and conservative.

pub const SMALLTALK_GREETINGS: [&str; 9] = [
    "안녕",
    "안녕하세요",
    "하이",
    "hello",
    "hi",
    "반가워",
    "좋은아침",
    "좋은오후",
    "좋은저녁",
];

pub const SMALLTALK_TOKENS: [&str; 6] = ["ㅎㅎ", "ㅋㅋ", "ㅎ", "ㅋ", "ㅇㅇ", "ㅇㅋ"];

/// Loaded words that disqualify a short message from being small talk.
pub const SMALLTALK_EXCLUDE_KEYWORDS: [&str; 12] = [
    "예약", "취소", "변경", "진료", "접수", "대기", "아파", "아프", "증상", "병원", "의사", "약",
];

pub const FIXED_INFO_KEYWORDS: [&str; 18] = [
    "대표번호",
    "전화번호",
    "연락처",
    "응급실",
    "위치",
    "주소",
    "주차",
    "정산",
    "정산소",
    "진료시간",
    "진료 시간",
    "운영시간",
    "운영 시간",
    "접수시간",
    "접수 시간",
    "콜센터",
    "암센터",
    "parking",
];

/// "내 진료시간" and friends are personal lookups, not static info.
pub const FIXED_INFO_PERSONAL_EXCEPTIONS: [&str; 6] =
    ["내", "나의", "언제", "예약", "몇 시", "몇시"];

pub const BOOKING_CUES: [&str; 8] = [
    "예약해",
    "예약 해",
    "예약하고 싶",
    "예약 하고 싶",
    "예약잡",
    "예약 잡",
    "접수해",
    "진료 보고 싶",
];

pub const ADDITIONAL_BOOKING_CUES: [&str; 9] = [
    "예약도",
    "추가 예약",
    "예약 추가해",
    "추가해줘",
    "추가해 줘",
    "하나 더",
    "한번 더",
    "또 예약",
    "추가로 예약",
];

pub const RESCHEDULE_CUES: [&str; 12] = [
    "예약변경",
    "예약 변경",
    "예약 바꿔",
    "예약 미뤄",
    "예약 연기",
    "시간 변경",
    "시간 바꿔",
    "시간 미뤄",
    "진료과 변경",
    "진료과 바꿔",
    "날짜 변경",
    "날짜 바꿔",
];

pub const CANCEL_CUES: [&str; 5] = ["예약취소", "예약 취소", "취소해", "취소하고", "취소 해"];

pub const BULK_CANCEL_CUES: [&str; 5] = ["전부", "모두", "전체", "일괄", "싹"];

/// Whitespace-insensitive cancel-all forms, matched against compacted text.
pub const BULK_CANCEL_COMPACT_FORMS: [&str; 5] =
    ["다취소", "전부취소", "모두취소", "전체취소", "일괄취소"];

pub const NEGATIVE_CUES: [&str; 6] = ["아니", "아냐", "없어", "괜찮", "안할", "안 할"];

pub const DOCTOR_QUERY_CUES: [&str; 6] =
    ["의사", "의료진", "교수", "선생님", "원장", "닥터"];

pub const DOCTOR_FOLLOWUP_CUES: [&str; 5] = ["누구", "어떤", "있나요", "계신가요", "알려줘"];

pub const DOCTOR_CHANGE_CUES: [&str; 4] =
    ["의사 변경", "의사 바꿔", "의료진 변경", "의료진 바꿔"];

pub const DOCTOR_SELECT_CUES: [&str; 4] = ["선택", "으로 할게", "로 할게", "부탁"];

pub const SYMPTOM_VISIT_CUES: [&str; 4] = ["가야", "가고 싶", "방문", "진료 받"];

pub const SYMPTOM_WORDS: [&str; 9] = [
    "멍울", "통증", "아파", "증상", "아프", "불편", "괴로워", "힘들", "출혈",
];

pub const SYMPTOM_INFO_CUES: [&str; 3] = ["무슨 과", "어느 과", "어떤 과"];

/// Messages that must not leak reservation details before login.
pub const RESERVATION_LOGIN_GUARD_CUES: [&str; 6] = [
    "예약",
    "접수",
    "내 진료",
    "진료내역",
    "진료 내역",
    "대기 순번",
];

// Two-tier tool routing -----------------------------------------------------

pub const TOOL_KEYWORDS: [&str; 26] = [
    "예약",
    "예약확인",
    "예약 확인",
    "예약조회",
    "예약 조회",
    "예약변경",
    "예약 변경",
    "예약취소",
    "예약 취소",
    "예약내역",
    "예약 내역",
    "접수",
    "대기",
    "대기시간",
    "대기 시간",
    "대기현황",
    "대기 현황",
    "순번",
    "알림",
    "문자",
    "sms",
    "카카오",
    "카톡",
    "히스토리",
    "세션",
    "대화 기록",
];

pub const NON_TOOL_KEYWORDS: [&str; 24] = [
    "주차",
    "parking",
    "주차비",
    "위치",
    "주소",
    "오시는 길",
    "교통",
    "버스",
    "지하철",
    "예약 방법",
    "예약방법",
    "예약 안내",
    "예약안내",
    "예약 절차",
    "예약 문의",
    "접수시간",
    "운영시간",
    "운영 시간",
    "진료과목",
    "입원",
    "퇴원",
    "비용",
    "진료비",
    "암센터",
];

pub const AMBIGUOUS_CUES: [&str; 6] = ["확인", "조회", "내역", "이력", "현황", "상태"];

/// Phrasings that reference an existing booking rather than making one.
pub const RESERVATION_EXISTING_CUES: [&str; 12] = [
    "예약확인",
    "예약 확인",
    "예약조회",
    "예약 조회",
    "예약내역",
    "예약 내역",
    "내 예약",
    "내예약",
    "예약시간",
    "예약 시간",
    "예약했",
    "예약되어",
];

pub const MEDICAL_HISTORY_KEYWORDS: [&str; 6] = [
    "진료내역",
    "진료 내역",
    "진료기록",
    "진료 기록",
    "진료이력",
    "진료 이력",
];

pub const SESSION_HISTORY_KEYWORDS: [&str; 4] =
    ["이전 대화", "대화 기록", "세션", "히스토리"];

pub const NOTIFICATION_KEYWORDS: [&str; 5] = ["알림", "문자", "sms", "카톡", "카카오"];

pub const WAIT_KEYWORDS: [&str; 5] = ["대기", "대기시간", "대기 현황", "대기현황", "순번"];

pub const SLOT_QUERY_KEYWORDS: [&str; 4] =
    ["예약 가능 시간", "가능한 시간", "빈 시간", "빈 자리"];

pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Match ignoring inserted whitespace, for compact Korean forms.
pub fn compact_contains_any(text: &str, compact_forms: &[&str]) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact_forms.iter().any(|k| compact.contains(k))
}
