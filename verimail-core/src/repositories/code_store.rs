use crate::{Error, VerificationCode};
use async_trait::async_trait;
use chrono::Duration;

/// Expiring key-value storage for one-time verification codes
///
/// Implementations own the clock: `put` stamps the entry with the store's
/// notion of "now" and `take` compares against the same clock.
#[async_trait]
pub trait CodeStore: Send + Sync + 'static {
    /// Store `code → email` for `ttl`, replacing any existing entry for `code`
    async fn put(&self, code: &str, email: &str, ttl: Duration)
    -> Result<VerificationCode, Error>;

    /// Atomically fetch and delete a live code
    ///
    /// Returns the email if the code existed and had not expired. Of any
    /// number of concurrent calls for the same code at most one returns
    /// `Some`.
    async fn take(&self, code: &str) -> Result<Option<String>, Error>;

    /// Remove expired entries, returning how many were removed
    async fn purge_expired(&self) -> Result<u64, Error>;

    /// Check that the store is reachable
    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}
