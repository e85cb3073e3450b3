pub mod audit;
pub mod cache;
pub mod chat;
pub mod doctor;
pub mod error;
pub mod reservation;
pub mod turn;

pub use audit::ToolAuditLogEntry;
pub use cache::{CacheEntry, CacheScope};
pub use chat::{ButtonPayload, ChatRequest, ChatResponse, SourceRef, TablePayload};
pub use doctor::{Doctor, MedicalHistoryEntry, WaitStatus};
pub use error::AppError;
pub use reservation::{Reservation, ReservationStatus};
pub use turn::Turn;
