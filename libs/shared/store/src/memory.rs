//! In-memory store implementations. Used by the app when no external
//! database is wired in, and by the integration tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_models::{
    CacheEntry, Doctor, MedicalHistoryEntry, Reservation, ToolAuditLogEntry, Turn, WaitStatus,
};

use crate::error::StoreError;
use crate::traits::{
    AuditLogStore, CacheStore, DoctorDirectory, MedicalHistoryStore, NotificationOutbox,
    NotificationRecord, PatientKey, ReservationStore, TurnStore, WaitStatusStore,
};

#[derive(Default)]
pub struct InMemoryTurnStore {
    turns: RwLock<Vec<Turn>>,
}

impl InMemoryTurnStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TurnStore for InMemoryTurnStore {
    async fn append(&self, turn: Turn) -> Result<(), StoreError> {
        self.turns.write().await.push(turn);
        Ok(())
    }

    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<Turn>, StoreError> {
        let turns = self.turns.read().await;
        let mut found: Vec<Turn> = turns
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(limit);
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryReservationStore {
    reservations: RwLock<Vec<Reservation>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReservationStore for InMemoryReservationStore {
    async fn insert_if_slot_free(
        &self,
        reservation: Reservation,
    ) -> Result<Reservation, StoreError> {
        // Write lock held across check and push keeps this atomic.
        let mut reservations = self.reservations.write().await;
        let taken = reservations.iter().any(|r| {
            r.is_active()
                && r.doctor_id == reservation.doctor_id
                && r.scheduled_start == reservation.scheduled_start
        });
        if taken {
            return Err(StoreError::DuplicateSlot);
        }
        reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        Ok(reservations.iter().find(|r| r.id == id).cloned())
    }

    async fn update(&self, reservation: Reservation) -> Result<(), StoreError> {
        let mut reservations = self.reservations.write().await;
        match reservations.iter_mut().find(|r| r.id == reservation.id) {
            Some(slot) => {
                *slot = reservation;
                Ok(())
            }
            None => Err(StoreError::NotFound(reservation.id.to_string())),
        }
    }

    async fn list_for_patient(&self, key: &PatientKey) -> Result<Vec<Reservation>, StoreError> {
        let reservations = self.reservations.read().await;
        let mut found: Vec<Reservation> = reservations
            .iter()
            .filter(|r| key.matches(r))
            .cloned()
            .collect();
        found.sort_by_key(|r| r.scheduled_start);
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryAuditLogStore {
    entries: RwLock<Vec<ToolAuditLogEntry>>,
}

impl InMemoryAuditLogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn append(&self, entry: ToolAuditLogEntry) -> Result<(), StoreError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn for_session(&self, session_id: &str) -> Result<Vec<ToolAuditLogEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryCacheStore {
    rows: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, query_hash: &str) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.rows.read().await.get(query_hash).cloned())
    }

    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError> {
        self.rows
            .write()
            .await
            .insert(entry.query_hash.clone(), entry);
        Ok(())
    }

    async fn delete(&self, query_hash: &str) -> Result<(), StoreError> {
        self.rows.write().await.remove(query_hash);
        Ok(())
    }

    async fn record_hit(&self, query_hash: &str) -> Result<(), StoreError> {
        if let Some(entry) = self.rows.write().await.get_mut(query_hash) {
            entry.hit_count += 1;
        }
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|_, entry| match entry.expires_at {
            Some(expires_at) => expires_at > now,
            None => true,
        });
        Ok(before - rows.len())
    }
}

pub struct InMemoryWaitStatusStore {
    rows: RwLock<HashMap<String, WaitStatus>>,
}

impl InMemoryWaitStatusStore {
    pub fn new(rows: Vec<WaitStatus>) -> Self {
        let map = rows.into_iter().map(|w| (w.department.clone(), w)).collect();
        Self {
            rows: RwLock::new(map),
        }
    }
}

#[async_trait]
impl WaitStatusStore for InMemoryWaitStatusStore {
    async fn get(&self, department: &str) -> Result<Option<WaitStatus>, StoreError> {
        Ok(self.rows.read().await.get(department).cloned())
    }
}

pub struct InMemoryDoctorDirectory {
    doctors: Vec<Doctor>,
}

impl InMemoryDoctorDirectory {
    pub fn new(doctors: Vec<Doctor>) -> Self {
        Self { doctors }
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn list_by_department(&self, department: &str) -> Result<Vec<Doctor>, StoreError> {
        Ok(self
            .doctors
            .iter()
            .filter(|d| d.department == department)
            .cloned()
            .collect())
    }

    async fn default_for(&self, department: &str) -> Result<Option<Doctor>, StoreError> {
        let mut in_department = self.list_by_department(department).await?;
        in_department.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(in_department.into_iter().next())
    }
}

#[derive(Default)]
pub struct InMemoryMedicalHistoryStore {
    entries: RwLock<Vec<MedicalHistoryEntry>>,
}

impl InMemoryMedicalHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, entries: Vec<MedicalHistoryEntry>) {
        self.entries.write().await.extend(entries);
    }
}

#[async_trait]
impl MedicalHistoryStore for InMemoryMedicalHistoryStore {
    async fn for_patient(
        &self,
        patient_identifier: &str,
    ) -> Result<Vec<MedicalHistoryEntry>, StoreError> {
        let entries = self.entries.read().await;
        let mut found: Vec<MedicalHistoryEntry> = entries
            .iter()
            .filter(|e| e.patient_identifier == patient_identifier)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
        Ok(found)
    }
}

#[derive(Default)]
pub struct InMemoryNotificationOutbox {
    records: RwLock<Vec<NotificationRecord>>,
}

impl InMemoryNotificationOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<NotificationRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl NotificationOutbox for InMemoryNotificationOutbox {
    async fn record(&self, record: NotificationRecord) -> Result<(), StoreError> {
        self.records.write().await.push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn sample_reservation(doctor_id: &str, start: chrono::NaiveDateTime) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            session_id: "s1".to_string(),
            patient_name: None,
            patient_phone: Some("01012345678".to_string()),
            patient_identifier: None,
            department: "외과".to_string(),
            doctor_name: "김민준".to_string(),
            doctor_code: "D001".to_string(),
            doctor_id: doctor_id.to_string(),
            scheduled_start: start,
            scheduled_end: start + chrono::Duration::minutes(30),
            status: shared_models::ReservationStatus::Scheduled,
            memo: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            cancelled_at: None,
            cancel_reason: None,
        }
    }

    fn at(h: u32, m: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 9, 7)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_slot_is_rejected() {
        let store = InMemoryReservationStore::new();
        store
            .insert_if_slot_free(sample_reservation("doc-1", at(10, 0)))
            .await
            .unwrap();
        let second = store
            .insert_if_slot_free(sample_reservation("doc-1", at(10, 0)))
            .await;
        assert_matches!(second, Err(StoreError::DuplicateSlot));
    }

    #[tokio::test]
    async fn cancelled_row_frees_the_slot() {
        let store = InMemoryReservationStore::new();
        let mut first = store
            .insert_if_slot_free(sample_reservation("doc-1", at(10, 0)))
            .await
            .unwrap();
        first.status = shared_models::ReservationStatus::Cancelled;
        first.cancelled_at = Some(Utc::now());
        store.update(first).await.unwrap();

        let second = store
            .insert_if_slot_free(sample_reservation("doc-1", at(10, 0)))
            .await;
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn other_doctor_same_time_is_fine() {
        let store = InMemoryReservationStore::new();
        store
            .insert_if_slot_free(sample_reservation("doc-1", at(10, 0)))
            .await
            .unwrap();
        assert!(store
            .insert_if_slot_free(sample_reservation("doc-2", at(10, 0)))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn cache_hit_count_does_not_touch_expiry() {
        let store = InMemoryCacheStore::new();
        let expires = Utc::now() + chrono::Duration::hours(1);
        store
            .upsert(CacheEntry {
                query_hash: "h1".to_string(),
                normalized_query: "진료시간".to_string(),
                intent: "rag".to_string(),
                cache_scope: shared_models::CacheScope::QueryOnly,
                index_version: "v1".to_string(),
                top_k: 4,
                prompt_version: "v1".to_string(),
                response_text: "r".to_string(),
                sources: vec![],
                expires_at: Some(expires),
                hit_count: 0,
            })
            .await
            .unwrap();

        store.record_hit("h1").await.unwrap();
        let row = store.get("h1").await.unwrap().unwrap();
        assert_eq!(row.hit_count, 1);
        assert_eq!(row.expires_at, Some(expires));
    }

    #[tokio::test]
    async fn delete_expired_keeps_live_and_eternal_rows() {
        let store = InMemoryCacheStore::new();
        let mk = |hash: &str, expires_at| CacheEntry {
            query_hash: hash.to_string(),
            normalized_query: String::new(),
            intent: "rag".to_string(),
            cache_scope: shared_models::CacheScope::QueryOnly,
            index_version: "v1".to_string(),
            top_k: 4,
            prompt_version: "v1".to_string(),
            response_text: String::new(),
            sources: vec![],
            expires_at,
            hit_count: 0,
        };
        let now = Utc::now();
        store.upsert(mk("old", Some(now - chrono::Duration::hours(1)))).await.unwrap();
        store.upsert(mk("live", Some(now + chrono::Duration::hours(1)))).await.unwrap();
        store.upsert(mk("eternal", None)).await.unwrap();

        let removed = store.delete_expired(now).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get("old").await.unwrap().is_none());
        assert!(store.get("live").await.unwrap().is_some());
        assert!(store.get("eternal").await.unwrap().is_some());
    }
}
