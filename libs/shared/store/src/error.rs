use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Booking slot already taken")]
    DuplicateSlot,

    #[error("Record not found: {0}")]
    NotFound(String),
}
