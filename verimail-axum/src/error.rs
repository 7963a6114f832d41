use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use verimail_core::{Error, ValidationError};

/// Failures as the HTTP client sees them
///
/// The message of each variant is the `error` field of the JSON body.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Code is required")]
    CodeRequired,

    #[error("Invalid code")]
    InvalidCode,

    #[error("Failed to record email")]
    RecordingFailed,

    #[error("Email is required")]
    EmailRequired,

    #[error("Email invalid")]
    EmailInvalid,

    #[error("Failed to send verification email")]
    SendFailed,

    #[error("Service unavailable")]
    Unavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::CodeRequired | ApiError::EmailRequired | ApiError::EmailInvalid => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidCode => StatusCode::NOT_FOUND,
            ApiError::RecordingFailed | ApiError::SendFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Map a failed redemption
    pub fn from_confirmation(err: Error) -> Self {
        match err {
            Error::Validation(_) => ApiError::CodeRequired,
            Error::NotFound => ApiError::InvalidCode,
            Error::Storage(_) | Error::Timeout(_) => ApiError::Unavailable,
            Error::Recording(_) | Error::Mail(_) => ApiError::RecordingFailed,
        }
    }

    /// Map a failed newsletter signup
    pub fn from_signup(err: Error) -> Self {
        match err {
            Error::Validation(ValidationError::MissingField(_)) => ApiError::EmailRequired,
            Error::Validation(_) => ApiError::EmailInvalid,
            _ => ApiError::SendFailed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
