use async_trait::async_trait;
use sqlx::PgPool;

use super::AlarmStore;
use crate::error::AlarmResult;
use crate::models::{AlarmDraft, AlarmId, AlarmRecord, AlarmTime};

// ---

/// [`AlarmStore`] over the `alarm_settings` table.
#[derive(Debug, Clone)]
pub struct PgAlarmStore {
    pool: PgPool,
}

impl PgAlarmStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlarmStore for PgAlarmStore {
    // ---
    async fn list_active(&self) -> AlarmResult<Vec<AlarmRecord>> {
        // ---
        let rows = sqlx::query_as::<_, AlarmRecord>(
            r#"
            SELECT id, alarm_time, active, timezone, last_updated
            FROM alarm_settings
            WHERE active = TRUE
            ORDER BY alarm_time ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn first_active_from(&self, time: &AlarmTime) -> AlarmResult<Option<AlarmRecord>> {
        // ---
        let row = sqlx::query_as::<_, AlarmRecord>(
            r#"
            SELECT id, alarm_time, active, timezone, last_updated
            FROM alarm_settings
            WHERE active = TRUE AND alarm_time >= $1
            ORDER BY alarm_time ASC, id ASC
            LIMIT 1
            "#,
        )
        .bind(time)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn first_active(&self) -> AlarmResult<Option<AlarmRecord>> {
        // ---
        let row = sqlx::query_as::<_, AlarmRecord>(
            r#"
            SELECT id, alarm_time, active, timezone, last_updated
            FROM alarm_settings
            WHERE active = TRUE
            ORDER BY alarm_time ASC, id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn first_record(&self) -> AlarmResult<Option<AlarmRecord>> {
        // ---
        let row = sqlx::query_as::<_, AlarmRecord>(
            r#"
            SELECT id, alarm_time, active, timezone, last_updated
            FROM alarm_settings
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn insert(&self, draft: &AlarmDraft) -> AlarmResult<AlarmRecord> {
        // ---
        let row = sqlx::query_as::<_, AlarmRecord>(
            r#"
            INSERT INTO alarm_settings (alarm_time, active, timezone, last_updated)
            VALUES ($1, TRUE, $2, NOW())
            RETURNING id, alarm_time, active, timezone, last_updated
            "#,
        )
        .bind(&draft.alarm_time)
        .bind(draft.timezone.hours())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn update(&self, id: AlarmId, draft: &AlarmDraft) -> AlarmResult<Option<AlarmRecord>> {
        // ---
        let row = sqlx::query_as::<_, AlarmRecord>(
            r#"
            UPDATE alarm_settings
            SET alarm_time = $1, active = TRUE, timezone = $2, last_updated = NOW()
            WHERE id = $3
            RETURNING id, alarm_time, active, timezone, last_updated
            "#,
        )
        .bind(&draft.alarm_time)
        .bind(draft.timezone.hours())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn deactivate(&self, id: AlarmId) -> AlarmResult<bool> {
        // ---
        let result = sqlx::query("UPDATE alarm_settings SET active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
