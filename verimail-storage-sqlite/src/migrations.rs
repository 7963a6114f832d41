use chrono::Utc;
use sqlx::SqlitePool;
use verimail_core::{Error, StorageError};

const MIGRATION_TABLE: &str = "verimail_migrations";

struct Migration {
    version: i64,
    name: &'static str,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "CreateVerificationCodes",
    statements: &[
        r#"
        CREATE TABLE IF NOT EXISTS verification_codes (
            code TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL,
            issued_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_verification_codes_expires_at ON verification_codes(expires_at)",
    ],
}];

fn migration_error(e: sqlx::Error) -> Error {
    Error::Storage(StorageError::Migration(e.to_string()))
}

/// Apply every migration not yet recorded in the migration table
pub(crate) async fn apply(pool: &SqlitePool) -> Result<(), Error> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {MIGRATION_TABLE} (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at INTEGER NOT NULL
        )"#
    ))
    .execute(pool)
    .await
    .map_err(migration_error)?;

    for migration in MIGRATIONS {
        let applied: Option<i64> = sqlx::query_scalar(&format!(
            "SELECT version FROM {MIGRATION_TABLE} WHERE version = ?"
        ))
        .bind(migration.version)
        .fetch_optional(pool)
        .await
        .map_err(migration_error)?;

        if applied.is_some() {
            continue;
        }

        tracing::info!(
            "Applying migration {} ({})",
            migration.name,
            migration.version
        );

        let mut tx = pool.begin().await.map_err(migration_error)?;
        for statement in migration.statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(migration_error)?;
        }
        sqlx::query(&format!(
            "INSERT INTO {MIGRATION_TABLE} (version, name, applied_at) VALUES (?, ?, ?)"
        ))
        .bind(migration.version)
        .bind(migration.name)
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await
        .map_err(migration_error)?;
        tx.commit().await.map_err(migration_error)?;
    }

    Ok(())
}
