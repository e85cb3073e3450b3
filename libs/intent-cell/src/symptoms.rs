/// Symptom keyword routing is limited to the departments the clinic wants
/// auto-suggested; everything else goes through the RAG path.
const SUGGESTIBLE_DEPARTMENTS: [&str; 2] = ["외과", "호흡기내과"];

const SYMPTOM_DEPARTMENT_RULES: [(&[&str], &str); 4] = [
    (&["멍울", "혹", "종기", "상처", "탈장", "맹장"], "외과"),
    (&["기침", "가래", "숨이", "호흡", "천식", "폐렴"], "호흡기내과"),
    (&["배가 아", "복통", "소화", "속쓰림"], "내과"),
    (&["두통", "어지러", "저림"], "신경과"),
];

pub fn match_symptom_department(query: &str) -> Option<&'static str> {
    let q = query.to_lowercase();
    SYMPTOM_DEPARTMENT_RULES
        .iter()
        .find(|(keywords, department)| {
            SUGGESTIBLE_DEPARTMENTS.contains(department)
                && keywords.iter().any(|k| q.contains(k))
        })
        .map(|(_, department)| *department)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymptomGuideEntry {
    pub name: &'static str,
    pub department: &'static str,
    pub keywords: &'static [&'static str],
    pub summary: &'static str,
    pub possible_causes: &'static [&'static str],
}

const SYMPTOM_GUIDE: [SymptomGuideEntry; 3] = [
    SymptomGuideEntry {
        name: "멍울",
        department: "외과",
        keywords: &["멍울", "혹", "만져", "덩어리"],
        summary: "피부 아래 멍울은 대부분 양성 혹이지만, 크기가 커지거나 통증이 있으면 진료가 필요합니다.",
        possible_causes: &["지방종", "림프절 비대", "피지낭종"],
    },
    SymptomGuideEntry {
        name: "기침",
        department: "호흡기내과",
        keywords: &["기침", "가래", "숨", "쌕쌕"],
        summary: "3주 이상 지속되는 기침이나 가래, 호흡 곤란은 호흡기 진료가 필요합니다.",
        possible_causes: &["감기", "기관지염", "천식", "폐렴"],
    },
    SymptomGuideEntry {
        name: "상처",
        department: "외과",
        keywords: &["상처", "찢어", "베였", "꿰매"],
        summary: "깊은 상처나 지혈되지 않는 상처는 빠른 봉합 처치가 필요합니다.",
        possible_causes: &["열상", "자상", "감염 위험"],
    },
];

/// Best keyword-scored guide entry, ties broken by declaration order.
pub fn match_symptom_guide(query: &str) -> Option<&'static SymptomGuideEntry> {
    let q = query.to_lowercase();
    let mut best: Option<(usize, &'static SymptomGuideEntry)> = None;
    for entry in &SYMPTOM_GUIDE {
        let score = entry.keywords.iter().filter(|k| q.contains(**k)).count();
        if score > 0 && best.map_or(true, |(top, _)| score > top) {
            best = Some((score, entry));
        }
    }
    best.map(|(_, entry)| entry)
}
