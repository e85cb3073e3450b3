use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use shared_store::CacheStore;

/// Daily expired-row sweep. Multiple processes may share one store; a
/// date-stamped lock file created with `create_new` picks one winner
/// per day.
pub struct CacheSweeper {
    store: Arc<dyn CacheStore>,
    lock_dir: PathBuf,
    hour: u32,
}

impl CacheSweeper {
    pub fn new(store: Arc<dyn CacheStore>, lock_dir: impl Into<PathBuf>, hour: u32) -> Self {
        Self {
            store,
            lock_dir: lock_dir.into(),
            hour: hour.min(23),
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let now = Local::now().naive_local();
                let wait = seconds_until_hour(now, self.hour);
                tokio::time::sleep(StdDuration::from_secs(wait)).await;
                self.run_once(Local::now().date_naive()).await;
            }
        })
    }

    /// One sweep attempt for `date`. Returns whether this process won
    /// the lock and performed the sweep.
    pub async fn run_once(&self, date: NaiveDate) -> bool {
        if !self.acquire_lock(date) {
            info!("cache sweep already claimed for {date}");
            return false;
        }
        match self.store.delete_expired(Utc::now()).await {
            Ok(removed) => info!(removed, "cache sweep finished"),
            Err(err) => warn!("cache sweep failed: {err}"),
        }
        true
    }

    fn acquire_lock(&self, date: NaiveDate) -> bool {
        if let Err(err) = std::fs::create_dir_all(&self.lock_dir) {
            warn!("cache sweep lock dir unavailable: {err}");
            return false;
        }
        let path = lock_path(&self.lock_dir, date);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => true,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => false,
            Err(err) => {
                warn!("cache sweep lock failed: {err}");
                false
            }
        }
    }
}

fn lock_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("cache-sweep-{}.lock", date.format("%Y-%m-%d")))
}

/// Seconds until the next wall-clock occurrence of `hour`:00.
fn seconds_until_hour(now: NaiveDateTime, hour: u32) -> u64 {
    let today_target = now
        .date()
        .and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default());
    let target = if today_target > now {
        today_target
    } else {
        today_target + Duration::days(1)
    };
    (target - now).num_seconds().max(1) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use shared_models::{CacheEntry, CacheScope};
    use shared_store::memory::InMemoryCacheStore;

    fn entry(hash: &str, expires_at: Option<chrono::DateTime<Utc>>) -> CacheEntry {
        CacheEntry {
            query_hash: hash.to_string(),
            normalized_query: "q".to_string(),
            intent: "rag".to_string(),
            cache_scope: CacheScope::QueryOnly,
            index_version: "v1".to_string(),
            top_k: 4,
            prompt_version: "p1".to_string(),
            response_text: "a".to_string(),
            sources: Vec::new(),
            expires_at,
            hit_count: 0,
        }
    }

    #[tokio::test]
    async fn only_one_winner_per_date() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryCacheStore::new());
        let sweeper = CacheSweeper::new(store.clone(), dir.path(), 4);
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        assert!(sweeper.run_once(date).await);
        assert!(!sweeper.run_once(date).await);
        // A new date is a fresh lock.
        assert!(sweeper.run_once(date + Duration::days(1)).await);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryCacheStore::new());
        store
            .upsert(entry("dead", Some(Utc::now() - Duration::minutes(1))))
            .await
            .unwrap();
        store
            .upsert(entry("live", Some(Utc::now() + Duration::minutes(10))))
            .await
            .unwrap();
        store.upsert(entry("eternal", None)).await.unwrap();

        let sweeper = CacheSweeper::new(store.clone(), dir.path(), 4);
        assert!(sweeper.run_once(NaiveDate::from_ymd_opt(2026, 9, 2).unwrap()).await);

        assert!(store.get("dead").await.unwrap().is_none());
        assert!(store.get("live").await.unwrap().is_some());
        assert!(store.get("eternal").await.unwrap().is_some());
    }

    #[test]
    fn wait_rolls_to_tomorrow_after_the_hour() {
        let now = NaiveDate::from_ymd_opt(2026, 9, 1)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap();
        // 4:00 already passed, next run is tomorrow 4:00.
        assert_eq!(seconds_until_hour(now, 4), 23 * 3600);
        // 6:00 is still ahead today.
        assert_eq!(seconds_until_hour(now, 6), 3600);
    }
}
