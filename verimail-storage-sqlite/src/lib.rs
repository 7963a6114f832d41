//! SQLite-backed [`CodeStore`] for verimail
//!
//! Codes live in a single `verification_codes` table keyed by the code.
//! Redemption is one `DELETE … RETURNING` statement filtered on expiry, so
//! the read and the invalidation cannot interleave with another redemption.
//!
//! ```rust,no_run
//! use verimail_storage_sqlite::SqliteCodeStore;
//!
//! # async fn run() -> Result<(), verimail_core::Error> {
//! let store = SqliteCodeStore::connect("sqlite://codes.db?mode=rwc").await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use verimail_core::{CodeStore, Error, StorageError, VerificationCode, code::expiry_after};

mod migrations;

pub struct SqliteCodeStore {
    pool: SqlitePool,
}

impl SqliteCodeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to `url`
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = pool_options(url).connect(url).await.map_err(|e| {
            Error::Storage(StorageError::Connection(format!(
                "Failed to connect to {url}: {e}"
            )))
        })?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the codes table if needed
    pub async fn migrate(&self) -> Result<(), Error> {
        migrations::apply(&self.pool).await
    }
}

/// An in-memory database lives and dies with its connection, so `:memory:`
/// URLs get exactly one connection that is never reaped or recycled.
fn pool_options(url: &str) -> SqlitePoolOptions {
    let options = SqlitePoolOptions::new();
    if url.contains(":memory:") || url.contains("mode=memory") {
        options
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options
    }
}

fn storage_error(e: sqlx::Error) -> Error {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            Error::Storage(StorageError::Connection(e.to_string()))
        }
        other => Error::Storage(StorageError::Database(other.to_string())),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SqliteVerificationCode {
    code: String,
    email: String,
    issued_at: i64,
    expires_at: i64,
}

impl From<SqliteVerificationCode> for VerificationCode {
    fn from(row: SqliteVerificationCode) -> Self {
        VerificationCode {
            code: row.code,
            email: row.email,
            issued_at: DateTime::from_timestamp_millis(row.issued_at).unwrap_or_default(),
            expires_at: DateTime::from_timestamp_millis(row.expires_at).unwrap_or_default(),
        }
    }
}

#[async_trait]
impl CodeStore for SqliteCodeStore {
    async fn put(
        &self,
        code: &str,
        email: &str,
        ttl: Duration,
    ) -> Result<VerificationCode, Error> {
        let issued_at = Utc::now();
        let expires_at = expiry_after(issued_at, ttl);

        let row: SqliteVerificationCode = sqlx::query_as(
            r#"
            INSERT INTO verification_codes (code, email, issued_at, expires_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                email = excluded.email,
                issued_at = excluded.issued_at,
                expires_at = excluded.expires_at
            RETURNING code, email, issued_at, expires_at
            "#,
        )
        .bind(code)
        .bind(email)
        .bind(issued_at.timestamp_millis())
        .bind(expires_at.timestamp_millis())
        .fetch_one(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(row.into())
    }

    async fn take(&self, code: &str) -> Result<Option<String>, Error> {
        let email: Option<String> = sqlx::query_scalar(
            "DELETE FROM verification_codes WHERE code = ? AND expires_at > ? RETURNING email",
        )
        .bind(code)
        .bind(Utc::now().timestamp_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        Ok(email)
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM verification_codes WHERE expires_at <= ?")
            .bind(Utc::now().timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        if result.rows_affected() > 0 {
            tracing::info!(removed = result.rows_affected(), "Purged expired verification codes");
        }
        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
