use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Recording error: {0}")]
    Recording(#[from] SinkError),

    /// The code is unknown, expired or already redeemed.
    #[error("Invalid code")]
    NotFound,

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Mail error: {0}")]
    Mail(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Email is too long")]
    EmailTooLong,
}

/// Failure of the recording sink. None of these are retried.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Sink timed out")]
    Timeout,

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

impl Error {
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }

    pub fn is_recording_error(&self) -> bool {
        matches!(self, Error::Recording(_))
    }

    /// The code store could not be reached or did not answer in time.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Timeout(_))
    }
}
