use regex::Regex;

use crate::keywords::{
    contains_any, SMALLTALK_EXCLUDE_KEYWORDS, SMALLTALK_GREETINGS, SMALLTALK_TOKENS,
};

pub struct SmalltalkClassifier {
    digit: Regex,
    strip: Regex,
    laughter: Regex,
}

impl Default for SmalltalkClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SmalltalkClassifier {
    pub fn new() -> Self {
        Self {
            digit: Regex::new(r"\d").unwrap(),
            strip: Regex::new(r"[\s\W_]+").unwrap(),
            laughter: Regex::new(r"^[ㅎㅋ]+$").unwrap(),
        }
    }

    pub fn is_smalltalk(&self, query: &str) -> bool {
        if query.is_empty() || contains_any(query, &SMALLTALK_EXCLUDE_KEYWORDS) {
            return false;
        }
        if self.digit.is_match(query) {
            return false;
        }
        let compact = self.strip.replace_all(query, "").to_lowercase();
        if compact.is_empty() {
            return false;
        }
        if self.laughter.is_match(&compact) {
            return true;
        }
        SMALLTALK_GREETINGS.contains(&compact.as_str())
            || SMALLTALK_TOKENS.contains(&compact.as_str())
    }
}
