//! Alarm lifecycle and next-alarm selection.
//!
//! `AlarmService` is the only thing handlers talk to. It owns no mutable
//! state of its own: every operation is one or two calls into the injected
//! [`AlarmStore`].

use std::{fmt, str::FromStr, sync::Arc};

use anyhow::anyhow;
use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use crate::error::{AlarmError, AlarmResult};
use crate::models::{AlarmDraft, AlarmId, AlarmRecord, AlarmTime};
use crate::store::AlarmStore;

// ---

/// How `now` is compared against stored alarm times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NextAlarmPolicy {
    /// Compare the server's local `HH:MM` directly with stored times,
    /// ignoring each record's timezone.
    #[default]
    ServerClock,
    /// Move `now` into each record's own zone and pick the record that
    /// fires soonest.
    RecordTimezone,
}

impl FromStr for NextAlarmPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "server-clock" => Ok(NextAlarmPolicy::ServerClock),
            "record-timezone" => Ok(NextAlarmPolicy::RecordTimezone),
            other => Err(anyhow!(
                "unknown policy '{}' (expected server-clock or record-timezone)",
                other
            )),
        }
    }
}

impl fmt::Display for NextAlarmPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextAlarmPolicy::ServerClock => f.write_str("server-clock"),
            NextAlarmPolicy::RecordTimezone => f.write_str("record-timezone"),
        }
    }
}

/// Outcome of [`AlarmService::upsert`].
#[derive(Debug, Clone, PartialEq)]
pub enum Upserted {
    Created(AlarmRecord),
    Updated(AlarmRecord),
}

#[derive(Clone)]
pub struct AlarmService {
    store: Arc<dyn AlarmStore>,
    policy: NextAlarmPolicy,
    singleton: bool,
}

impl AlarmService {
    // ---
    pub fn new(store: Arc<dyn AlarmStore>) -> Self {
        Self {
            store,
            policy: NextAlarmPolicy::default(),
            singleton: false,
        }
    }

    pub fn with_policy(mut self, policy: NextAlarmPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cap the alarm set at one row: creating an alarm overwrites the
    /// existing row instead of adding another.
    pub fn singleton(mut self, enabled: bool) -> Self {
        self.singleton = enabled;
        self
    }

    /// Every active alarm, earliest time first.
    pub async fn list_active(&self) -> AlarmResult<Vec<AlarmRecord>> {
        self.store.list_active().await
    }

    /// The alarm due next relative to `now`.
    ///
    /// Under [`NextAlarmPolicy::ServerClock`] this is the earliest active alarm
    /// at or after `now`'s wall-clock time, falling back to the earliest alarm
    /// overall (tomorrow's first). Alarms sharing a time are not ordered
    /// relative to each other; the current stores break the tie by id.
    pub async fn next_upcoming(
        &self,
        now: DateTime<FixedOffset>,
    ) -> AlarmResult<Option<AlarmRecord>> {
        // ---
        match self.policy {
            NextAlarmPolicy::ServerClock => {
                let clock = AlarmTime::from_clock(now.time());
                if let Some(record) = self.store.first_active_from(&clock).await? {
                    debug!(now = %clock, alarm = %record.alarm_time, "next alarm later today");
                    return Ok(Some(record));
                }
                let record = self.store.first_active().await?;
                debug!(
                    now = %clock,
                    found = record.is_some(),
                    "no alarm left today, using earliest"
                );
                Ok(record)
            }
            NextAlarmPolicy::RecordTimezone => {
                let utc_clock = AlarmTime::from_clock(now.naive_utc().time());
                let records = self.store.list_active().await?;
                Ok(select_by_record_zone(&records, &utc_clock).cloned())
            }
        }
    }

    /// Create (no `id`) or overwrite (with `id`) an alarm; the result is
    /// always active.
    pub async fn upsert(&self, id: Option<AlarmId>, draft: AlarmDraft) -> AlarmResult<Upserted> {
        // ---
        if let Some(id) = id {
            let record = self.store.update(id, &draft).await?.ok_or(AlarmError::NotFound)?;
            info!(id, alarm_time = %record.alarm_time, "alarm updated");
            return Ok(Upserted::Updated(record));
        }

        if self.singleton {
            if let Some(existing) = self.store.first_record().await? {
                if let Some(record) = self.store.update(existing.id, &draft).await? {
                    info!(
                        id = record.id,
                        alarm_time = %record.alarm_time,
                        "singleton alarm overwritten"
                    );
                    return Ok(Upserted::Updated(record));
                }
            }
        }

        let record = self.store.insert(&draft).await?;
        info!(id = record.id, alarm_time = %record.alarm_time, "alarm created");
        Ok(Upserted::Created(record))
    }

    /// Soft-delete an alarm. Deactivating an inactive alarm succeeds.
    pub async fn deactivate(&self, id: AlarmId) -> AlarmResult<()> {
        // ---
        if !self.store.deactivate(id).await? {
            return Err(AlarmError::NotFound);
        }
        info!(id, "alarm deactivated");
        Ok(())
    }

    /// Device acknowledgment that a ringing alarm was stopped. Same effect
    /// as [`AlarmService::deactivate`].
    pub async fn acknowledge_stopped(&self, id: AlarmId) -> AlarmResult<()> {
        // ---
        if !self.store.deactivate(id).await? {
            return Err(AlarmError::NotFound);
        }
        info!(id, "alarm stopped by device");
        Ok(())
    }
}

/// Pick the record that fires soonest once `utc_now` is moved into each
/// record's timezone. A record whose time equals its local `now` is due
/// immediately.
pub fn select_by_record_zone<'a>(
    records: &'a [AlarmRecord],
    utc_now: &AlarmTime,
) -> Option<&'a AlarmRecord> {
    // ---
    records
        .iter()
        .filter(|r| r.active)
        .min_by_key(|r| {
            let local_now = utc_now.shifted_by_hours(r.timezone_offset().hours());
            (local_now.minutes_until(&r.alarm_time), r.id)
        })
}
