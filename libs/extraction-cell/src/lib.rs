//! Slot extractors: structured values (department, doctor, date, time,
//! phone, urgency) pulled from free text and request metadata.

pub mod datetime;
pub mod departments;
pub mod doctor;
pub mod phone;
pub mod slots;

pub use datetime::{
    build_date_from_base_day, build_date_same_month, DateTimeExtractor, ASAP_PHRASE,
};
pub use departments::{extract_department, is_department, DEPARTMENTS};
pub use doctor::DoctorNameExtractor;
pub use phone::normalize_phone;
pub use slots::{SlotExtractor, Slots};
