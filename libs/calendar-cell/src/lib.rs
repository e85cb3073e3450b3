pub mod error;
pub mod services;

pub use error::CalendarError;
pub use services::{ClinicCalendar, HolidayClient};
