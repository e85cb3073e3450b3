use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct HolidayResponse {
    #[serde(default)]
    holidays: Vec<HolidayItem>,
}

#[derive(Debug, Deserialize)]
struct HolidayItem {
    date: NaiveDate,
    #[serde(default)]
    #[allow(dead_code)]
    name: String,
}

/// Public-holiday lookup, cached per (year, month). A failed fetch is
/// cached as an empty month so one outage never fails a whole turn and
/// never hammers the upstream.
pub struct HolidayClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    cache: RwLock<HashMap<(i32, u32), HashSet<NaiveDate>>>,
}

impl HolidayClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub async fn holidays_for(&self, year: i32, month: u32) -> HashSet<NaiveDate> {
        if let Some(cached) = self.cache.read().await.get(&(year, month)) {
            return cached.clone();
        }
        let fetched = self.fetch_month(year, month).await.unwrap_or_else(|err| {
            warn!(year, month, "holiday lookup failed, assuming no holidays: {}", err);
            HashSet::new()
        });
        self.cache
            .write()
            .await
            .insert((year, month), fetched.clone());
        fetched
    }

    pub async fn is_holiday(&self, date: NaiveDate) -> bool {
        use chrono::Datelike;
        self.holidays_for(date.year(), date.month())
            .await
            .contains(&date)
    }

    async fn fetch_month(&self, year: i32, month: u32) -> Result<HashSet<NaiveDate>, reqwest::Error> {
        if self.base_url.is_empty() {
            return Ok(HashSet::new());
        }
        let url = format!("{}/holidays", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("year", year.to_string()),
                ("month", month.to_string()),
                ("serviceKey", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?;
        let parsed: HolidayResponse = response.json().await?;
        debug!(year, month, count = parsed.holidays.len(), "fetched holiday month");
        Ok(parsed.holidays.into_iter().map(|h| h.date).collect())
    }
}
