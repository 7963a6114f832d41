//! One-time verification codes and the values handed back to callers.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default lifetime of a verification code (1 hour)
pub const DEFAULT_CODE_TTL: Duration = Duration::hours(1);

/// Longest lifetime a code may be given
pub const MAX_CODE_TTL: Duration = Duration::days(30);

/// When a code issued at `issued_at` with `ttl` stops being valid.
/// Saturates at the latest representable instant instead of overflowing.
pub fn expiry_after(issued_at: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    issued_at
        .checked_add_signed(ttl)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Generate a fresh verification code: the hyphenated form of a random UUID v4.
pub fn generate_code() -> String {
    Uuid::new_v4().to_string()
}

/// A pending code → email mapping as held by a code store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    pub code: String,
    pub email: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl VerificationCode {
    pub fn new(code: String, email: String, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            code,
            email,
            issued_at,
            expires_at: expiry_after(issued_at, ttl),
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Result of issuing a confirmation link.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedLink {
    pub code: String,
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmedEmail {
    pub email: String,
    pub confirmed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code_is_uuid_v4() {
        let code = generate_code();
        let parsed = Uuid::parse_str(&code).unwrap();

        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(code.len(), 36);
    }

    #[test]
    fn test_generate_code_is_unique() {
        assert_ne!(generate_code(), generate_code());
    }

    #[test]
    fn test_expiry() {
        let issued_at = Utc::now();
        let code = VerificationCode::new(
            "abc".to_string(),
            "a@b.com".to_string(),
            issued_at,
            DEFAULT_CODE_TTL,
        );

        assert_eq!(code.expires_at - code.issued_at, Duration::seconds(3600));
        assert!(!code.is_expired_at(issued_at + Duration::minutes(59)));
        assert!(code.is_expired_at(issued_at + Duration::hours(1)));
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let issued_at = Utc::now();
        let code = VerificationCode::new(
            "abc".to_string(),
            "a@b.com".to_string(),
            issued_at,
            Duration::seconds(9_000_000_000_000),
        );

        assert_eq!(code.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(!code.is_expired_at(issued_at));
    }
}
