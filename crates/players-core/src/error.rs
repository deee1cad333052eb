use thiserror::Error;
use uuid::Uuid;

use crate::status::Status;

/// Errors the caller of the application service can observe.
///
/// Storage failures are folded into these kinds so transport layers only
/// ever match on one taxonomy.
#[derive(Error, Debug)]
pub enum PlayerError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlayerError {
    /// Only conflicts are worth a reload-and-retry by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PlayerError::Conflict(_))
    }
}

impl From<StorageError> for PlayerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(what) => PlayerError::NotFound(what),
            StorageError::DuplicateKey(_)
            | StorageError::VersionConflict { .. }
            | StorageError::Conflict(_) => PlayerError::Conflict(err.to_string()),
            StorageError::Corrupt(_)
            | StorageError::Serialization(_)
            | StorageError::Database(_) => PlayerError::Internal(err.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid phone: {0}")]
    InvalidPhone(String),

    #[error("Invalid country_code: {0}")]
    InvalidCountryCode(String),

    #[error("Invalid locale: {0}")]
    InvalidLocale(String),

    #[error("Invalid time_zone: {0}")]
    InvalidTimeZone(String),

    #[error("Invalid gender: {0}")]
    InvalidGender(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid actor: {0}")]
    InvalidActor(String),

    #[error("Invalid registration_ip: {0}")]
    InvalidRegistrationIp(String),

    #[error("status_reason required")]
    MissingReason,

    #[error("status already {0}")]
    UnchangedStatus(Status),
}

impl ValidationError {
    /// True for the failures that make up an invalid address.
    pub fn is_address(&self) -> bool {
        matches!(
            self,
            ValidationError::InvalidCountryCode(_)
                | ValidationError::InvalidLocale(_)
                | ValidationError::InvalidTimeZone(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Version conflict: player {id} is no longer at version {expected}")]
    VersionConflict { id: Uuid, expected: i64 },

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}
