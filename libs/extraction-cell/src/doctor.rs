use regex::Regex;

use crate::departments::is_department;

pub struct DoctorNameExtractor {
    name_with_suffix: Regex,
    bare_name: Regex,
}

impl Default for DoctorNameExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DoctorNameExtractor {
    pub fn new() -> Self {
        Self {
            // "김민준 원장" / "김민준(D012)" / "김민준 선생님"
            name_with_suffix: Regex::new(
                r"([가-힣]{2,4})\s*(?:\(([A-Za-z0-9]+)\)|원장|교수|과장|선생님?|의사)",
            )
            .unwrap(),
            bare_name: Regex::new(r"^([가-힣]{2,4})$").unwrap(),
        }
    }

    /// Pull a doctor name out of free text. Department names are never
    /// doctor names, however well they match the shape.
    pub fn extract(&self, text: &str) -> Option<String> {
        if let Some(caps) = self.name_with_suffix.captures(text) {
            let name = caps[1].to_string();
            if !is_department(&name) {
                return Some(name);
            }
        }
        let trimmed = text.trim();
        if let Some(caps) = self.bare_name.captures(trimmed) {
            let name = caps[1].to_string();
            if !is_department(&name) && !is_common_word(&name) {
                return Some(name);
            }
        }
        None
    }
}

// A short stoplist keeps bare two-character replies like "예약" or "취소"
// from being read as names.
fn is_common_word(value: &str) -> bool {
    const STOPLIST: [&str; 10] = [
        "예약", "취소", "변경", "확인", "조회", "문의", "안녕", "감사", "오늘", "내일",
    ];
    STOPLIST.contains(&value)
}
