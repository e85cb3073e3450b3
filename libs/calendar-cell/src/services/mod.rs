pub mod calendar;
pub mod holiday;

pub use calendar::ClinicCalendar;
pub use holiday::HolidayClient;
