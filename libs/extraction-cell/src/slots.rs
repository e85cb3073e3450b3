use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datetime::DateTimeExtractor;
use crate::departments::extract_department;
use crate::doctor::DoctorNameExtractor;

/// The structured values a booking needs, recomputed every turn.
/// Explicit metadata always wins over anything read out of the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slots {
    pub department: Option<String>,
    pub doctor_name: Option<String>,
    pub doctor_id: Option<String>,
    pub preferred_time: Option<String>,
    pub date_hint: Option<String>,
    pub asap: bool,
}

impl Slots {
    /// Back-fill empty fields from an older snapshot. Never overwrites a
    /// value the current turn already produced.
    pub fn fill_missing_from(&mut self, prior: &Slots) {
        if self.department.is_none() {
            self.department = prior.department.clone();
        }
        if self.doctor_name.is_none() {
            self.doctor_name = prior.doctor_name.clone();
        }
        if self.doctor_id.is_none() {
            self.doctor_id = prior.doctor_id.clone();
        }
        if self.preferred_time.is_none() {
            self.preferred_time = prior.preferred_time.clone();
        }
        if self.date_hint.is_none() {
            self.date_hint = prior.date_hint.clone();
        }
        self.asap = self.asap || prior.asap;
    }
}

fn meta_str(metadata: &HashMap<String, Value>, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(Value::String(s)) = metadata.get(*key) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

pub struct SlotExtractor {
    pub datetime: DateTimeExtractor,
    pub doctor: DoctorNameExtractor,
}

impl Default for SlotExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SlotExtractor {
    pub fn new() -> Self {
        Self {
            datetime: DateTimeExtractor::new(),
            doctor: DoctorNameExtractor::new(),
        }
    }

    pub fn extract(&self, text: &str, metadata: &HashMap<String, Value>) -> Slots {
        let asap = self.datetime.contains_asap(text);
        let department = meta_str(metadata, &["department"])
            .or_else(|| extract_department(text).map(str::to_string));
        let doctor_name = meta_str(metadata, &["doctor_name", "doctor", "doctorName"])
            .or_else(|| self.doctor.extract(text));
        let doctor_id = meta_str(metadata, &["doctor_id"]);
        let date_hint = self.datetime.extract_date_phrase(text);
        let preferred_time = meta_str(metadata, &["preferred_time"]).or_else(|| {
            let phrase = self.datetime.extract_time_phrase(text);
            self.datetime
                .merge_date_with_time(phrase.as_deref(), date_hint.as_deref())
        });
        let preferred_time = self
            .datetime
            .normalize_preferred_time(preferred_time.as_deref(), asap);

        Slots {
            department,
            doctor_name,
            doctor_id,
            preferred_time,
            date_hint,
            asap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_wins_over_text() {
        let ex = SlotExtractor::new();
        let mut meta = HashMap::new();
        meta.insert("department".to_string(), json!("내과"));
        let slots = ex.extract("외과 예약해줘", &meta);
        assert_eq!(slots.department.as_deref(), Some("내과"));
    }

    #[test]
    fn prior_department_survives_time_only_turn() {
        let ex = SlotExtractor::new();
        let prior = Slots {
            department: Some("외과".to_string()),
            ..Slots::default()
        };
        let mut current = ex.extract("내일 오후 3시", &HashMap::new());
        current.fill_missing_from(&prior);
        assert_eq!(current.department.as_deref(), Some("외과"));
        assert_eq!(current.preferred_time.as_deref(), Some("내일 오후 3시"));
    }

    #[test]
    fn asap_turn_gets_placeholder_time() {
        let ex = SlotExtractor::new();
        let slots = ex.extract("외과 최대한 빨리 예약해줘", &HashMap::new());
        assert!(slots.asap);
        assert_eq!(slots.preferred_time.as_deref(), Some("가능한 빠른 시간"));
    }
}
