use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;

/// Relative-day words and their offsets from today.
pub const RELATIVE_DAY_WORDS: [(&str, i64); 6] = [
    ("오늘", 0),
    ("금일", 0),
    ("내일", 1),
    ("모레", 2),
    ("이번주", 0),
    ("다음주", 7),
];

pub const WEEKDAY_WORDS: [(&str, Weekday); 7] = [
    ("월요일", Weekday::Mon),
    ("화요일", Weekday::Tue),
    ("수요일", Weekday::Wed),
    ("목요일", Weekday::Thu),
    ("금요일", Weekday::Fri),
    ("토요일", Weekday::Sat),
    ("일요일", Weekday::Sun),
];

pub const ASAP_HINT_WORDS: [&str; 5] = [
    "당장",
    "가능한 빠른",
    "가장 빠른",
    "최대한 빨리",
    "빨리 잡아",
];

/// Placeholder phrase standing in for an explicit time when the user asked
/// for the soonest slot.
pub const ASAP_PHRASE: &str = "가능한 빠른 시간";

pub struct DateTimeExtractor {
    date_kor: Regex,
    date_slash: Regex,
    date_dash: Regex,
    date_any: Regex,
    day_only: Regex,
    time_colon: Regex,
    time_kor: Regex,
    time_specific: Regex,
    time_any: Regex,
}

impl Default for DateTimeExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DateTimeExtractor {
    pub fn new() -> Self {
        Self {
            date_kor: Regex::new(r"(?:(\d{4})년\s*)?(\d{1,2})월\s*(\d{1,2})일").unwrap(),
            date_slash: Regex::new(r"(?:(\d{4})/)?(\d{1,2})/(\d{1,2})").unwrap(),
            date_dash: Regex::new(r"(?:(\d{4})-)?(\d{1,2})-(\d{1,2})").unwrap(),
            date_any: Regex::new(
                r"(?:\d{4}년\s*)?\d{1,2}월\s*\d{1,2}일|(?:\d{4}/)?\d{1,2}/\d{1,2}|(?:\d{4}-)?\d{1,2}-\d{1,2}",
            )
            .unwrap(),
            day_only: Regex::new(r"(\d{1,2})일").unwrap(),
            time_colon: Regex::new(r"(\d{1,2})\s*:\s*(\d{2})").unwrap(),
            time_kor: Regex::new(r"(오전|오후|저녁|밤|새벽)?\s*(\d{1,2})시(?:\s*(\d{1,2})분|\s*(반))?")
                .unwrap(),
            time_specific: Regex::new(r"\d{1,2}\s*:\s*\d{2}|\d{1,2}\s*시").unwrap(),
            time_any: Regex::new(
                r"\d{1,2}\s*:\s*\d{2}|(?:오전|오후|저녁|밤|새벽)\s*\d{1,2}시(?:\s*\d{1,2}분|\s*반)?|\d{1,2}시(?:\s*\d{1,2}분|\s*반)?",
            )
            .unwrap(),
        }
    }

    pub fn contains_asap(&self, text: &str) -> bool {
        ASAP_HINT_WORDS.iter().any(|w| text.contains(w))
    }

    /// The literal date-ish span of the text ("9월 13일", "내일", ...),
    /// kept verbatim for prompt echoing.
    pub fn extract_date_phrase(&self, text: &str) -> Option<String> {
        if let Some(m) = self.date_any.find(text) {
            return Some(m.as_str().trim().to_string());
        }
        for (word, _) in RELATIVE_DAY_WORDS {
            if text.contains(word) {
                return Some(word.to_string());
            }
        }
        for (word, _) in WEEKDAY_WORDS {
            if text.contains(word) {
                return Some(word.to_string());
            }
        }
        None
    }

    /// A bare "13일" with no month context. Returns None when the text
    /// carries a full date form.
    pub fn extract_day_only(&self, text: &str) -> Option<u32> {
        self.extract_day_only_list(text).into_iter().next()
    }

    pub fn extract_day_only_list(&self, text: &str) -> Vec<u32> {
        if text.contains('월') || text.contains('/') || text.contains('-') {
            return Vec::new();
        }
        let mut days = Vec::new();
        for caps in self.day_only.captures_iter(text) {
            if let Ok(day) = caps[1].parse::<u32>() {
                if (1..=31).contains(&day) && !days.contains(&day) {
                    days.push(day);
                }
            }
        }
        days
    }

    /// "13" typed alone, as a reply to a date disambiguation prompt.
    pub fn extract_numeric_day(&self, text: &str) -> Option<u32> {
        let stripped = text.trim();
        if stripped.is_empty() || !stripped.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let day: u32 = stripped.parse().ok()?;
        (1..=31).contains(&day).then_some(day)
    }

    /// Time-of-day span of the text, plus a leading relative-day word when
    /// no explicit date form is present. Falls back to the ASAP phrase.
    pub fn extract_time_phrase(&self, text: &str) -> Option<String> {
        let mut parts: Vec<String> = Vec::new();
        for m in self.time_any.find_iter(text) {
            let token = m.as_str().trim().to_string();
            if !token.is_empty() && !parts.contains(&token) {
                parts.push(token);
            }
        }
        if !parts.is_empty() {
            if self.date_any.find(text).is_none() {
                if let Some(word) = self.relative_word_in(text) {
                    parts.insert(0, word.to_string());
                }
            }
            return Some(parts.join(" "));
        }
        if let Some(word) = self.relative_word_in(text) {
            return Some(word.to_string());
        }
        if self.contains_asap(text) {
            return Some(ASAP_PHRASE.to_string());
        }
        None
    }

    fn relative_word_in(&self, text: &str) -> Option<&'static str> {
        RELATIVE_DAY_WORDS
            .iter()
            .map(|(w, _)| *w)
            .chain(WEEKDAY_WORDS.iter().map(|(w, _)| *w))
            .find(|w| text.contains(w))
    }

    /// True when the text pins an actual clock time, not just a day.
    pub fn has_specific_time(&self, text: &str) -> bool {
        self.time_specific.is_match(text)
    }

    pub fn has_date_hint(&self, text: &str) -> bool {
        self.date_any.is_match(text) || self.relative_word_in(text).is_some()
    }

    /// Resolve an explicit date form against today. A year-less date that
    /// already passed rolls to next year.
    pub fn parse_date_only(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        let caps = self
            .date_kor
            .captures(text)
            .or_else(|| self.date_slash.captures(text))
            .or_else(|| self.date_dash.captures(text))?;
        let month: u32 = caps.get(2)?.as_str().parse().ok()?;
        let day: u32 = caps.get(3)?.as_str().parse().ok()?;
        match caps.get(1) {
            Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day),
            None => {
                let candidate = NaiveDate::from_ymd_opt(today.year(), month, day)?;
                if candidate < today {
                    NaiveDate::from_ymd_opt(today.year() + 1, month, day)
                } else {
                    Some(candidate)
                }
            }
        }
    }

    /// Resolve the full date of the phrase: explicit form, relative word,
    /// weekday name, or bare day-of-month against the base date.
    pub fn resolve_date(&self, text: &str, today: NaiveDate) -> Option<NaiveDate> {
        if let Some(explicit) = self.parse_date_only(text, today) {
            return Some(explicit);
        }
        for (word, offset) in RELATIVE_DAY_WORDS {
            if text.contains(word) {
                let base = today + Duration::days(offset);
                // "다음주 수요일" lands inside next week, not on today+7.
                if let Some((_, weekday)) =
                    WEEKDAY_WORDS.iter().find(|(w, _)| text.contains(w))
                {
                    return Some(next_weekday_on_or_after(base, *weekday));
                }
                return Some(base);
            }
        }
        if let Some((_, weekday)) = WEEKDAY_WORDS.iter().find(|(w, _)| text.contains(w)) {
            return Some(next_weekday_on_or_after(today, *weekday));
        }
        if let Some(day) = self.extract_day_only(text) {
            return build_date_from_base_day(today, day);
        }
        None
    }

    pub fn resolve_time(&self, text: &str) -> Option<NaiveTime> {
        if let Some(caps) = self.time_colon.captures(text) {
            let hour: u32 = caps[1].parse().ok()?;
            let minute: u32 = caps[2].parse().ok()?;
            return NaiveTime::from_hms_opt(hour, minute, 0);
        }
        let caps = self.time_kor.captures(text)?;
        let mut hour: u32 = caps.get(2)?.as_str().parse().ok()?;
        let minute: u32 = if caps.get(4).is_some() {
            30
        } else {
            caps.get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0)
        };
        if let Some(meridiem) = caps.get(1) {
            if matches!(meridiem.as_str(), "오후" | "저녁" | "밤") && hour < 12 {
                hour += 12;
            }
        }
        NaiveTime::from_hms_opt(hour, minute, 0)
    }

    /// Full datetime for a preferred-time phrase. ASAP phrases resolve to
    /// one hour from now; a pinned time with no date defaults to today.
    pub fn resolve_datetime(&self, text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
        if self.contains_asap(text) || text.contains(ASAP_PHRASE) {
            return Some(now + Duration::hours(1));
        }
        let time = self.resolve_time(text)?;
        let date = self.resolve_date(text, now.date()).unwrap_or(now.date());
        Some(date.and_time(time))
    }

    /// Combine a separately known date phrase with a time-only preferred
    /// phrase. A phrase that already carries its own date wins unchanged.
    pub fn merge_date_with_time(
        &self,
        preferred_time: Option<&str>,
        date_hint: Option<&str>,
    ) -> Option<String> {
        let preferred = preferred_time?;
        match date_hint {
            Some(hint)
                if self.has_specific_time(preferred)
                    && self.extract_date_phrase(preferred).is_none() =>
            {
                Some(format!("{hint} {preferred}"))
            }
            _ => Some(preferred.to_string()),
        }
    }

    pub fn normalize_preferred_time(&self, value: Option<&str>, asap: bool) -> Option<String> {
        match value {
            None => asap.then(|| ASAP_PHRASE.to_string()),
            Some(v) if self.has_specific_time(v) => Some(v.to_string()),
            Some(v) if asap => {
                if v.contains("빠른") || v.contains("가능한") {
                    Some(ASAP_PHRASE.to_string())
                } else {
                    Some(format!("{v} {ASAP_PHRASE}"))
                }
            }
            Some(v) => Some(v.to_string()),
        }
    }
}

/// Resolve a bare day-of-month against a base date, rolling to the next
/// month when the day already passed.
pub fn build_date_from_base_day(base: NaiveDate, day: u32) -> Option<NaiveDate> {
    let (mut year, mut month) = (base.year(), base.month());
    if day < base.day() {
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn build_date_same_month(base: NaiveDate, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(base.year(), base.month(), day)
}

fn next_weekday_on_or_after(base: NaiveDate, weekday: Weekday) -> NaiveDate {
    let mut candidate = base;
    while candidate.weekday() != weekday {
        candidate += Duration::days(1);
    }
    candidate
}
