use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;

/// Lazy-loaded email validation regex
///
/// A practical subset of RFC 5322, compiled once and shared.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("Invalid email regex pattern")
});

const MAX_EMAIL_LENGTH: usize = 254;

/// Validates an email address submitted for a newsletter signup
///
/// Surrounding whitespace is not accepted; callers trim before validating.
///
/// # Examples
///
/// ```rust
/// use verimail_core::validation::validate_email;
///
/// assert!(validate_email("driver@example.com").is_ok());
/// assert!(validate_email("driver@").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField("email"));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Validates a confirmation code taken from a request and returns it trimmed.
///
/// Only presence is checked: a well-formed but unknown code is a lookup
/// miss, not a validation failure.
pub fn validate_code(code: Option<&str>) -> Result<&str, ValidationError> {
    match code.map(str::trim) {
        Some(code) if !code.is_empty() => Ok(code),
        _ => Err(ValidationError::MissingField("code")),
    }
}
