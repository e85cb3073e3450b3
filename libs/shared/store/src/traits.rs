use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_models::{
    CacheEntry, Doctor, MedicalHistoryEntry, Reservation, ToolAuditLogEntry, Turn, WaitStatus,
};

use crate::error::StoreError;

/// Identifies a patient across stores. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientKey {
    pub phone: Option<String>,
    pub identifier: Option<String>,
}

impl PatientKey {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none() && self.identifier.is_none()
    }

    pub fn matches(&self, reservation: &Reservation) -> bool {
        let phone_hit = match (&self.phone, &reservation.patient_phone) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        let id_hit = match (&self.identifier, &reservation.patient_identifier) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
        phone_hit || id_hit
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub channel: String,
    pub phone: String,
    pub message_masked: String,
    pub schedule_at: Option<NaiveDateTime>,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait TurnStore: Send + Sync {
    async fn append(&self, turn: Turn) -> Result<(), StoreError>;

    /// Most recent first.
    async fn recent(&self, session_id: &str, limit: usize) -> Result<Vec<Turn>, StoreError>;
}

#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Atomic conditional insert: fails with [`StoreError::DuplicateSlot`]
    /// when an active reservation already holds the same doctor and start
    /// time. Check and insert happen under one critical section.
    async fn insert_if_slot_free(
        &self,
        reservation: Reservation,
    ) -> Result<Reservation, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<Reservation>, StoreError>;

    async fn update(&self, reservation: Reservation) -> Result<(), StoreError>;

    /// All reservations for the patient, ascending by start time.
    async fn list_for_patient(&self, key: &PatientKey) -> Result<Vec<Reservation>, StoreError>;
}

#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn append(&self, entry: ToolAuditLogEntry) -> Result<(), StoreError>;

    async fn for_session(&self, session_id: &str) -> Result<Vec<ToolAuditLogEntry>, StoreError>;
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, query_hash: &str) -> Result<Option<CacheEntry>, StoreError>;

    /// Insert or replace the row for `entry.query_hash`.
    async fn upsert(&self, entry: CacheEntry) -> Result<(), StoreError>;

    async fn delete(&self, query_hash: &str) -> Result<(), StoreError>;

    /// Increment hit_count without touching expires_at.
    async fn record_hit(&self, query_hash: &str) -> Result<(), StoreError>;

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

#[async_trait]
pub trait WaitStatusStore: Send + Sync {
    async fn get(&self, department: &str) -> Result<Option<WaitStatus>, StoreError>;
}

#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn list_by_department(&self, department: &str) -> Result<Vec<Doctor>, StoreError>;

    /// Deterministic fallback assignment: lowest code in the department.
    async fn default_for(&self, department: &str) -> Result<Option<Doctor>, StoreError>;
}

#[async_trait]
pub trait MedicalHistoryStore: Send + Sync {
    async fn for_patient(
        &self,
        patient_identifier: &str,
    ) -> Result<Vec<MedicalHistoryEntry>, StoreError>;
}

#[async_trait]
pub trait NotificationOutbox: Send + Sync {
    async fn record(&self, record: NotificationRecord) -> Result<(), StoreError>;
}
