/// Strip separators and validate a Korean mobile/landline number.
/// Returns digits only, or None when the shape is wrong.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(10..=11).contains(&digits.len()) {
        return None;
    }
    if !digits.starts_with('0') {
        return None;
    }
    Some(digits)
}

#[cfg(test)]
mod tests {
    use super::normalize_phone;

    #[test]
    fn strips_separators() {
        assert_eq!(normalize_phone("010-1234-5678").as_deref(), Some("01012345678"));
        assert_eq!(normalize_phone("010 1234 5678").as_deref(), Some("01012345678"));
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("11012345678"), None);
        assert_eq!(normalize_phone("안녕하세요"), None);
    }
}
