//! Persistence gateway for alarm records.
//!
//! [`AlarmStore`] is the seam between [`crate::AlarmService`] and the
//! datastore. Each method is exactly one statement against the backing
//! table; nothing spans calls and nothing is retried.

use async_trait::async_trait;

use crate::error::AlarmResult;
use crate::models::{AlarmDraft, AlarmId, AlarmRecord, AlarmTime};

mod memory;
mod postgres;

pub use memory::MemoryAlarmStore;
pub use postgres::PgAlarmStore;

// ---

#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// Active records ordered by `alarm_time`, then `id`.
    async fn list_active(&self) -> AlarmResult<Vec<AlarmRecord>>;

    /// Earliest active record at or after `time` on the same day.
    async fn first_active_from(&self, time: &AlarmTime) -> AlarmResult<Option<AlarmRecord>>;

    /// Earliest active record of the day.
    async fn first_active(&self) -> AlarmResult<Option<AlarmRecord>>;

    /// Lowest-id record regardless of its `active` flag.
    async fn first_record(&self) -> AlarmResult<Option<AlarmRecord>>;

    /// Insert an active record and return it with its new id.
    async fn insert(&self, draft: &AlarmDraft) -> AlarmResult<AlarmRecord>;

    /// Overwrite time and timezone, force `active`, refresh `last_updated`.
    /// `None` when no record has `id`.
    async fn update(&self, id: AlarmId, draft: &AlarmDraft) -> AlarmResult<Option<AlarmRecord>>;

    /// Clear `active`. Returns `false` when no record has `id`.
    async fn deactivate(&self, id: AlarmId) -> AlarmResult<bool>;
}
