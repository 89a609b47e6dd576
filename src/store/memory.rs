use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::AlarmStore;
use crate::error::AlarmResult;
use crate::models::{AlarmDraft, AlarmId, AlarmRecord, AlarmTime};

// ---

/// In-process [`AlarmStore`] with the same ordering and id rules as the
/// Postgres table. Used by the tests and by `ALARM_STORE=memory` for
/// running the front end without a database.
#[derive(Debug, Default)]
pub struct MemoryAlarmStore {
    inner: Mutex<Table>,
}

#[derive(Debug, Default)]
struct Table {
    last_id: AlarmId,
    rows: BTreeMap<AlarmId, AlarmRecord>,
}

impl MemoryAlarmStore {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> MutexGuard<'_, Table> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Table {
    /// Active rows sorted the way `ORDER BY alarm_time, id` sorts them.
    fn active_sorted(&self) -> Vec<AlarmRecord> {
        // ---
        let mut rows: Vec<AlarmRecord> = self.rows.values().filter(|r| r.active).cloned().collect();
        rows.sort_by(|a, b| a.alarm_time.cmp(&b.alarm_time).then(a.id.cmp(&b.id)));
        rows
    }
}

#[async_trait]
impl AlarmStore for MemoryAlarmStore {
    // ---
    async fn list_active(&self) -> AlarmResult<Vec<AlarmRecord>> {
        Ok(self.table().active_sorted())
    }

    async fn first_active_from(&self, time: &AlarmTime) -> AlarmResult<Option<AlarmRecord>> {
        Ok(self
            .table()
            .active_sorted()
            .into_iter()
            .find(|r| &r.alarm_time >= time))
    }

    async fn first_active(&self) -> AlarmResult<Option<AlarmRecord>> {
        Ok(self.table().active_sorted().into_iter().next())
    }

    async fn first_record(&self) -> AlarmResult<Option<AlarmRecord>> {
        Ok(self.table().rows.values().next().cloned())
    }

    async fn insert(&self, draft: &AlarmDraft) -> AlarmResult<AlarmRecord> {
        // ---
        let mut table = self.table();
        table.last_id += 1;
        let record = AlarmRecord {
            id: table.last_id,
            alarm_time: draft.alarm_time.clone(),
            active: true,
            timezone: draft.timezone.hours(),
            last_updated: Some(Utc::now().naive_utc()),
        };
        table.rows.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update(&self, id: AlarmId, draft: &AlarmDraft) -> AlarmResult<Option<AlarmRecord>> {
        // ---
        let mut table = self.table();
        let Some(record) = table.rows.get_mut(&id) else {
            return Ok(None);
        };
        record.alarm_time = draft.alarm_time.clone();
        record.timezone = draft.timezone.hours();
        record.active = true;
        record.last_updated = Some(Utc::now().naive_utc());
        Ok(Some(record.clone()))
    }

    async fn deactivate(&self, id: AlarmId) -> AlarmResult<bool> {
        // ---
        match self.table().rows.get_mut(&id) {
            Some(record) => {
                record.active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
