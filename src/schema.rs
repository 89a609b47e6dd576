//! Database schema management for the alarm store.
//!
//! Ensures the `alarm_settings` table exists before serving requests.
//! Applied once on startup from `main.rs`.

use anyhow::Result;
use sqlx::PgPool;

// ---

/// Create the database schema (idempotent).
///
/// Safe to call on every startup; no-op if the objects already exist.
/// A pre-existing table that lacks the `timezone` column is upgraded in place.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS alarm_settings (
            id            SERIAL      PRIMARY KEY,
            alarm_time    VARCHAR(5)  NOT NULL
                          CHECK (alarm_time ~ '^([01][0-9]|2[0-3]):[0-5][0-9]$'),
            active        BOOLEAN     NOT NULL DEFAULT TRUE,
            timezone      REAL        NOT NULL DEFAULT 0,
            last_updated  TIMESTAMP   DEFAULT CURRENT_TIMESTAMP
        );
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Tables created by the single-row deployments predate the timezone column
    sqlx::query(
        r#"
        ALTER TABLE alarm_settings
            ADD COLUMN IF NOT EXISTS timezone REAL NOT NULL DEFAULT 0;
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // Serves both the active listing and the next-alarm lookups
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_alarm_settings_active_time
            ON alarm_settings (active, alarm_time);
        "#,
    )
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!("alarm_settings table ensured");
    Ok(())
}
