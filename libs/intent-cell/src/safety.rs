use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct SafetyResult {
    pub category: &'static str,
    pub reply: &'static str,
}

/// Category order is priority order: the first matching category wins.
const CATEGORY_SPECS: [(&str, &[&str], &str); 6] = [
    (
        "self_harm",
        &[
            r"죽고\s*싶",
            r"자살",
            r"자해",
            r"해치고\s*싶",
            r"살기\s*싫",
            r"끝내고\s*싶",
        ],
        "현재 안전이 가장 중요합니다. 지금 위험하거나 혼자 감당하기 어렵다면 119나 가까운 응급실로 도움을 요청해 주세요.",
    ),
    (
        "violence",
        &[r"폭력", r"위협", r"살해", r"폭행", r"칼", r"총"],
        "위험하거나 폭력 상황이라면 즉시 안전한 곳으로 이동하고 112 또는 119에 도움을 요청해 주세요.",
    ),
    (
        "abuse",
        &[r"학대", r"가정폭력", r"아동\s*학대", r"노인\s*학대"],
        "학대나 폭력 위험이 의심되면 즉시 안전을 확보하고 112 또는 119에 도움을 요청해 주세요.",
    ),
    (
        "overdose",
        &[r"과다\s*복용", r"약물\s*중독", r"약을\s*너무", r"독성"],
        "약물 과다복용이나 중독이 의심되면 즉시 119에 연락하거나 가까운 응급실을 방문해 주세요.",
    ),
    (
        "pregnancy_highrisk",
        &[
            r"임신.*(출혈|심한\s*통증|구토|실신)",
            r"임산부.*(응급|위급|출혈)",
        ],
        "임신 중 심한 통증이나 출혈 등 위험 증상이 있다면 즉시 119에 연락하거나 응급실로 이동해 주세요.",
    ),
    (
        "legal_diagnosis",
        &[r"진단서", r"법적", r"소송", r"책임"],
        "법적 판단이나 진단이 필요한 경우에는 진료를 통해 확인이 필요합니다. 원하시면 접수 방법을 안내해 드리겠습니다.",
    ),
];

pub struct SafetyClassifier {
    categories: Vec<(&'static str, Vec<Regex>, &'static str)>,
}

impl Default for SafetyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SafetyClassifier {
    pub fn new() -> Self {
        let categories = CATEGORY_SPECS
            .iter()
            .map(|(category, patterns, reply)| {
                let compiled = patterns
                    .iter()
                    .filter_map(|p| Regex::new(p).ok())
                    .collect();
                (*category, compiled, *reply)
            })
            .collect();
        Self { categories }
    }

    pub fn detect(&self, query: &str) -> Option<SafetyResult> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return None;
        }
        for (category, patterns, reply) in &self.categories {
            if patterns.iter().any(|p| p.is_match(&q)) {
                return Some(SafetyResult { category, reply });
            }
        }
        None
    }
}
