use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

use crate::error::CalendarError;
use crate::services::holiday::HolidayClient;

const WEEKDAY_OPEN: (u32, u32) = (8, 30);
const WEEKDAY_CLOSE: (u32, u32) = (17, 0);
const SATURDAY_CLOSE: (u32, u32) = (12, 0);
const SLOT_MINUTES: i64 = 30;

fn hm(pair: (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(pair.0, pair.1, 0).unwrap_or_default()
}

/// Saturday service runs on the 1st and 3rd Saturday of each month only.
fn is_open_saturday(date: NaiveDate) -> bool {
    let week_of_month = (date.day() - 1) / 7 + 1;
    week_of_month == 1 || week_of_month == 3
}

pub struct ClinicCalendar {
    holiday: Arc<HolidayClient>,
}

impl ClinicCalendar {
    pub fn new(holiday: Arc<HolidayClient>) -> Self {
        Self { holiday }
    }

    /// Open window for the date, holidays excluded.
    pub async fn open_hours_for(&self, date: NaiveDate) -> Option<(NaiveTime, NaiveTime)> {
        if self.holiday.is_holiday(date).await {
            return None;
        }
        match date.weekday() {
            Weekday::Sun => None,
            Weekday::Sat => {
                is_open_saturday(date).then(|| (hm(WEEKDAY_OPEN), hm(SATURDAY_CLOSE)))
            }
            _ => Some((hm(WEEKDAY_OPEN), hm(WEEKDAY_CLOSE))),
        }
    }

    pub async fn is_closed_date(&self, date: NaiveDate) -> bool {
        self.open_hours_for(date).await.is_none()
    }

    pub async fn is_clinic_open(&self, at: NaiveDateTime) -> bool {
        match self.open_hours_for(at.date()).await {
            Some((open, close)) => at.time() >= open && at.time() < close,
            None => false,
        }
    }

    /// Gate for reservation times. Past times fail distinctly from closed
    /// hours so the user gets the right correction prompt.
    pub async fn validate_booking_time(
        &self,
        at: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<(), CalendarError> {
        if at <= now {
            return Err(CalendarError::PastTime);
        }
        if !self.is_clinic_open(at).await {
            return Err(CalendarError::Closed);
        }
        Ok(())
    }

    /// 30-minute slot grid for the date, excluding slots already past.
    pub async fn open_slots_for_date(
        &self,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Vec<NaiveDateTime> {
        let Some((open, close)) = self.open_hours_for(date).await else {
            return Vec::new();
        };
        let mut slots = Vec::new();
        let mut cursor = date.and_time(open);
        let end = date.and_time(close);
        while cursor < end {
            if cursor > now {
                slots.push(cursor);
            }
            cursor += Duration::minutes(SLOT_MINUTES);
        }
        slots
    }
}
