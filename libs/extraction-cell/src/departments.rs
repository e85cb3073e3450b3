/// Departments the reservation flow accepts. Doubles as the doctor-name
/// rejection list: a string matching one of these is never a person.
pub const DEPARTMENTS: [&str; 15] = [
    "외과",
    "호흡기내과",
    "내과",
    "소아과",
    "산부인과",
    "정형외과",
    "신경과",
    "정신과",
    "안과",
    "이비인후과",
    "피부과",
    "비뇨의학과",
    "영상의학과",
    "방사선과",
    "원무과",
];

pub fn is_department(value: &str) -> bool {
    let trimmed = value.trim();
    DEPARTMENTS.iter().any(|d| *d == trimmed)
}

/// Longest match first, so "정형외과" never resolves as "외과".
pub fn extract_department(text: &str) -> Option<&'static str> {
    let normalized: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut candidates: Vec<&'static str> = DEPARTMENTS.to_vec();
    candidates.sort_by_key(|d| std::cmp::Reverse(d.chars().count()));
    candidates.into_iter().find(|d| normalized.contains(d))
}
