use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entry from the hospital staff directory. Read-only for this service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub code: String,
    pub display_name: String,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitStatus {
    pub department: String,
    pub current_waiting: u32,
    pub estimated_minutes: u32,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalHistoryEntry {
    pub patient_identifier: String,
    pub visited_at: DateTime<Utc>,
    pub department: String,
    pub doctor_name: String,
    pub summary: String,
}
