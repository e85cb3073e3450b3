use std::sync::Arc;

use chrono::{Datelike, NaiveDateTime};
use serde_json::{json, Value};
use tracing::warn;

use extraction_cell::{build_date_from_base_day, DateTimeExtractor, Slots};
use shared_models::{ButtonPayload, Doctor, TablePayload};
use shared_store::DoctorDirectory;
use tool_cell::{DEPARTMENT_REQUIRED_REPLY, TIME_REQUIRED_REPLY};

use crate::models::{DATE_AMBIGUOUS_MARKER, DOCTOR_SELECT_MARKER};

/// What the booking flow needs next. Both the fresh-booking branch and
/// the follow-up branch drive the same funnel.
#[derive(Debug)]
pub enum FunnelStep {
    /// Ask for a missing slot or a disambiguation; the turn ends here.
    Prompt {
        reply: String,
        table: Option<TablePayload>,
        buttons: Vec<ButtonPayload>,
    },
    /// Everything needed for `reservation_create` is in hand.
    Ready { args: Value },
}

pub struct BookingFunnel {
    doctors: Arc<dyn DoctorDirectory>,
    datetime: DateTimeExtractor,
}

impl BookingFunnel {
    pub fn new(doctors: Arc<dyn DoctorDirectory>) -> Self {
        Self {
            doctors,
            datetime: DateTimeExtractor::new(),
        }
    }

    /// One funnel pass over the merged slots. `message` is consulted for
    /// bare day numbers: several in one utterance need disambiguation,
    /// exactly one is a date pick and folds into the preferred time.
    pub async fn next_step(&self, message: &str, slots: &Slots, now: NaiveDateTime) -> FunnelStep {
        let Some(department) = slots.department.as_deref() else {
            return FunnelStep::Prompt {
                reply: DEPARTMENT_REQUIRED_REPLY.to_string(),
                table: None,
                buttons: department_buttons(),
            };
        };

        // "13일이나 27일" style input cannot be booked as-is.
        let days = self.datetime.extract_day_only_list(message);
        if days.len() > 1 {
            let listed = days
                .iter()
                .map(|d| format!("{d}일"))
                .collect::<Vec<_>>()
                .join(", ");
            return FunnelStep::Prompt {
                reply: format!(
                    "{DATE_AMBIGUOUS_MARKER}. 원하시는 날짜를 하나만 알려주세요. ({listed})"
                ),
                table: None,
                buttons: days
                    .iter()
                    .map(|d| ButtonPayload {
                        text: format!("{d}일"),
                        action: format!("{d}일"),
                    })
                    .collect(),
            };
        }

        let day_pick = days
            .first()
            .copied()
            .or_else(|| self.datetime.extract_numeric_day(message));

        let preferred = self
            .datetime
            .normalize_preferred_time(slots.preferred_time.as_deref(), slots.asap)
            .and_then(|p| {
                self.datetime
                    .merge_date_with_time(Some(&p), slots.date_hint.as_deref())
            });
        let Some(mut preferred) = preferred else {
            return FunnelStep::Prompt {
                reply: TIME_REQUIRED_REPLY.to_string(),
                table: None,
                buttons: Vec::new(),
            };
        };
        // A day picked in this utterance ("13일로 해줘") dates a phrase
        // that only carries a clock so far.
        if let Some(day) = day_pick {
            if !slots.asap && self.datetime.extract_date_phrase(&preferred).is_none() {
                if let Some(date) = build_date_from_base_day(now.date(), day) {
                    preferred = format!("{}월 {}일 {preferred}", date.month(), date.day());
                }
            }
        }
        if !slots.asap
            && (!self.datetime.has_specific_time(&preferred)
                || self.datetime.resolve_datetime(&preferred, now).is_none())
        {
            return FunnelStep::Prompt {
                reply: TIME_REQUIRED_REPLY.to_string(),
                table: None,
                buttons: Vec::new(),
            };
        }

        // A department with several doctors and no pick yet becomes a
        // selection prompt; a single-doctor roster books directly.
        if slots.doctor_name.is_none() && slots.doctor_id.is_none() {
            let roster = match self.doctors.list_by_department(department).await {
                Ok(roster) => roster,
                Err(err) => {
                    warn!("doctor roster unavailable, booking with default: {err}");
                    Vec::new()
                }
            };
            if roster.len() > 1 {
                return FunnelStep::Prompt {
                    reply: format!("{department} {DOCTOR_SELECT_MARKER}."),
                    table: Some(roster_table(&roster)),
                    buttons: roster
                        .iter()
                        .map(|d| ButtonPayload {
                            text: d.display_name.clone(),
                            action: d.display_name.clone(),
                        })
                        .collect(),
                };
            }
        }

        let mut args = json!({
            "department": department,
            "preferred_time": preferred,
        });
        if let Some(doctor_name) = &slots.doctor_name {
            args["doctor_name"] = json!(doctor_name);
        }
        if let Some(doctor_id) = &slots.doctor_id {
            args["doctor_id"] = json!(doctor_id);
        }
        FunnelStep::Ready { args }
    }
}

fn roster_table(roster: &[Doctor]) -> TablePayload {
    TablePayload {
        headers: vec!["의료진".to_string(), "직함".to_string()],
        rows: roster
            .iter()
            .map(|d| {
                vec![
                    d.display_name.clone(),
                    d.title.clone().unwrap_or_else(|| "원장".to_string()),
                ]
            })
            .collect(),
    }
}

fn department_buttons() -> Vec<ButtonPayload> {
    extraction_cell::DEPARTMENTS
        .iter()
        .take(6)
        .map(|d| ButtonPayload {
            text: d.to_string(),
            action: d.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared_store::memory::InMemoryDoctorDirectory;

    fn doctor(id: &str, name: &str) -> Doctor {
        Doctor {
            id: id.to_string(),
            code: id.to_string(),
            display_name: name.to_string(),
            department: "외과".to_string(),
            title: Some("원장".to_string()),
            phone: None,
        }
    }

    fn funnel(roster: Vec<Doctor>) -> BookingFunnel {
        BookingFunnel::new(Arc::new(InMemoryDoctorDirectory::new(roster)))
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 9, 9)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn missing_department_prompts_with_buttons() {
        let step = funnel(vec![])
            .next_step("내일 10시 예약", &Slots::default(), now())
            .await;
        match step {
            FunnelStep::Prompt { reply, buttons, .. } => {
                assert_eq!(reply, DEPARTMENT_REQUIRED_REPLY);
                assert!(!buttons.is_empty());
            }
            other => panic!("expected prompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn multiple_bare_days_ask_for_one() {
        let slots = Slots {
            department: Some("외과".to_string()),
            preferred_time: Some("10시".to_string()),
            ..Slots::default()
        };
        let step = funnel(vec![doctor("100", "김철수")])
            .next_step("13일이나 27일 중에 예약해줘", &slots, now())
            .await;
        match step {
            FunnelStep::Prompt { reply, buttons, .. } => {
                assert!(reply.contains(DATE_AMBIGUOUS_MARKER), "{reply}");
                assert_eq!(buttons.len(), 2);
                assert_eq!(buttons[0].text, "13일");
            }
            other => panic!("expected prompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn two_doctor_roster_asks_for_a_pick() {
        let slots = Slots {
            department: Some("외과".to_string()),
            preferred_time: Some("내일 10시".to_string()),
            ..Slots::default()
        };
        let step = funnel(vec![doctor("100", "김철수"), doctor("101", "박영희")])
            .next_step("외과 내일 10시 예약", &slots, now())
            .await;
        match step {
            FunnelStep::Prompt { reply, table, .. } => {
                assert!(reply.contains(DOCTOR_SELECT_MARKER), "{reply}");
                assert_eq!(table.unwrap().rows.len(), 2);
            }
            other => panic!("expected prompt, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn complete_slots_are_ready_for_create() {
        let slots = Slots {
            department: Some("외과".to_string()),
            doctor_name: Some("김철수".to_string()),
            preferred_time: Some("내일 10시".to_string()),
            ..Slots::default()
        };
        let step = funnel(vec![doctor("100", "김철수"), doctor("101", "박영희")])
            .next_step("김철수 원장으로 해주세요", &slots, now())
            .await;
        match step {
            FunnelStep::Ready { args } => {
                assert_eq!(args["department"], "외과");
                assert_eq!(args["preferred_time"], "내일 10시");
                assert_eq!(args["doctor_name"], "김철수");
            }
            other => panic!("expected ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn single_day_reply_dates_the_known_time() {
        let slots = Slots {
            department: Some("외과".to_string()),
            doctor_name: Some("김철수".to_string()),
            preferred_time: Some("10시".to_string()),
            ..Slots::default()
        };
        let step = funnel(vec![doctor("100", "김철수")])
            .next_step("13일로 해줘", &slots, now())
            .await;
        match step {
            FunnelStep::Ready { args } => {
                assert_eq!(args["preferred_time"], "9월 13일 10시");
            }
            other => panic!("expected ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bare_numeric_day_reply_counts_as_a_pick() {
        let slots = Slots {
            department: Some("외과".to_string()),
            doctor_name: Some("김철수".to_string()),
            preferred_time: Some("10시".to_string()),
            ..Slots::default()
        };
        let step = funnel(vec![doctor("100", "김철수")])
            .next_step("27", &slots, now())
            .await;
        match step {
            FunnelStep::Ready { args } => {
                assert_eq!(args["preferred_time"], "9월 27일 10시");
            }
            other => panic!("expected ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn date_hint_merges_into_time_only_preference() {
        let slots = Slots {
            department: Some("외과".to_string()),
            doctor_name: Some("김철수".to_string()),
            preferred_time: Some("10시".to_string()),
            date_hint: Some("내일".to_string()),
            ..Slots::default()
        };
        let step = funnel(vec![doctor("100", "김철수")])
            .next_step("10시에 갈게요", &slots, now())
            .await;
        match step {
            FunnelStep::Ready { args } => {
                assert_eq!(args["preferred_time"], "내일 10시");
            }
            other => panic!("expected ready, got {other:?}"),
        }
    }
}
