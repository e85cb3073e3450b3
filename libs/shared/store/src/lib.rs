pub mod error;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use traits::{
    AuditLogStore, CacheStore, DoctorDirectory, MedicalHistoryStore, NotificationOutbox,
    NotificationRecord, PatientKey, ReservationStore, TurnStore, WaitStatusStore,
};
