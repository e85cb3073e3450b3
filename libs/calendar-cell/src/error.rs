use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum CalendarError {
    #[error("Requested time is in the past")]
    PastTime,

    #[error("Clinic is closed at the requested time")]
    Closed,
}
