//! Data models for the alarm store.
//!
//! `AlarmTime` and `TimezoneOffset` are only constructible from validated
//! input, so anything holding an [`AlarmDraft`] is safe to persist.

use std::{fmt, str::FromStr};

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::encode::IsNull;
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgArgumentBuffer, PgTypeInfo, PgValueRef, Postgres};
use sqlx::{Decode, Encode, Type};

use crate::error::AlarmError;

// ---

/// Store-assigned alarm identifier (`SERIAL` column).
pub type AlarmId = i32;

pub const INVALID_TIME_MESSAGE: &str = "Invalid alarm time format (HH:MM).";
pub const INVALID_TIMEZONE_MESSAGE: &str = "Invalid timezone provided.";

const MINUTES_PER_DAY: i32 = 24 * 60;

/// Wall-clock time of day with minute precision, always `HH:MM`.
///
/// Lexicographic order on the `HH:MM` text equals chronological order within
/// a day, which is what the SQL `ORDER BY alarm_time` relies on.
///
/// Values read back from the table go through the same check as request
/// input, so a malformed legacy row fails to decode instead of reaching
/// [`AlarmTime::minutes`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct AlarmTime(String);

impl AlarmTime {
    // ---
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Minutes since midnight (`0..1440`).
    pub fn minutes(&self) -> i32 {
        // ---
        let bytes = self.0.as_bytes();
        let digit = |i: usize| i32::from(bytes[i] - b'0');
        (digit(0) * 10 + digit(1)) * 60 + digit(3) * 10 + digit(4)
    }

    /// Truncate a clock reading to an `AlarmTime`.
    pub fn from_clock(time: NaiveTime) -> Self {
        AlarmTime(format!("{:02}:{:02}", time.hour(), time.minute()))
    }

    fn from_minutes(minutes: i32) -> Self {
        let minutes = minutes.rem_euclid(MINUTES_PER_DAY);
        AlarmTime(format!("{:02}:{:02}", minutes / 60, minutes % 60))
    }

    /// Shift by a (possibly fractional, possibly negative) number of hours,
    /// wrapping around midnight.
    pub fn shifted_by_hours(&self, hours: f32) -> Self {
        // ---
        let delta = (f64::from(hours) * 60.0).round() as i32;
        Self::from_minutes(self.minutes() + delta)
    }

    /// Minutes from `self` forward to `target`, wrapping past midnight.
    pub fn minutes_until(&self, target: &AlarmTime) -> i32 {
        (target.minutes() - self.minutes()).rem_euclid(MINUTES_PER_DAY)
    }
}

impl FromStr for AlarmTime {
    type Err = AlarmError;

    /// Accept exactly `([01]\d|2[0-3]):[0-5]\d`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        let b = s.as_bytes();
        let valid = b.len() == 5
            && b[2] == b':'
            && b[0..2].iter().chain(&b[3..5]).all(u8::is_ascii_digit)
            && (b[0] <= b'1' || (b[0] == b'2' && b[1] <= b'3'))
            && b[3] <= b'5';

        if valid {
            Ok(AlarmTime(s.to_string()))
        } else {
            Err(AlarmError::Validation(INVALID_TIME_MESSAGE.to_string()))
        }
    }
}

impl fmt::Display for AlarmTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AlarmTime> for String {
    fn from(time: AlarmTime) -> Self {
        time.0
    }
}

impl Type<Postgres> for AlarmTime {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as Type<Postgres>>::compatible(ty)
    }
}

impl Encode<'_, Postgres> for AlarmTime {
    fn encode_by_ref(&self, buf: &mut PgArgumentBuffer) -> Result<IsNull, BoxDynError> {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'r> Decode<'r, Postgres> for AlarmTime {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let text = <&str as Decode<Postgres>>::decode(value)?;
        decode_stored(text)
    }
}

/// Validate a stored `alarm_time` column value.
fn decode_stored(text: &str) -> Result<AlarmTime, BoxDynError> {
    text.parse::<AlarmTime>()
        .map_err(|_| format!("stored alarm_time {:?} is not HH:MM", text).into())
}

/// Signed offset from UTC in hours (e.g. `-5`, `5.5`). Always finite.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimezoneOffset(f32);

impl TimezoneOffset {
    // ---
    pub const UTC: TimezoneOffset = TimezoneOffset(0.0);

    pub fn new(hours: f64) -> Result<Self, AlarmError> {
        // ---
        let narrowed = hours as f32;
        if hours.is_finite() && narrowed.is_finite() {
            Ok(TimezoneOffset(narrowed))
        } else {
            Err(AlarmError::Validation(INVALID_TIMEZONE_MESSAGE.to_string()))
        }
    }

    pub fn hours(self) -> f32 {
        self.0
    }
}

impl FromStr for TimezoneOffset {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .map_err(|_| AlarmError::Validation(INVALID_TIMEZONE_MESSAGE.to_string()))
            .and_then(TimezoneOffset::new)
    }
}

/// One persisted alarm row.
///
/// `last_updated` is maintained by the store and kept off the wire.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AlarmRecord {
    // ---
    pub id: AlarmId,
    pub alarm_time: AlarmTime,
    pub active: bool,
    pub timezone: f32,
    #[serde(skip_serializing)]
    pub last_updated: Option<NaiveDateTime>,
}

impl AlarmRecord {
    pub fn timezone_offset(&self) -> TimezoneOffset {
        TimezoneOffset::new(f64::from(self.timezone)).unwrap_or(TimezoneOffset::UTC)
    }
}

/// Validated fields of an upsert, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmDraft {
    pub alarm_time: AlarmTime,
    pub timezone: TimezoneOffset,
}

// ---

/// Loosely typed scalar as sent by the browser or the device: either a JSON
/// number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrText {
    /// An empty or whitespace-only string, which form posts send for an
    /// unset field.
    pub fn is_blank(&self) -> bool {
        matches!(self, NumberOrText::Text(s) if s.trim().is_empty())
    }

    /// Interpret as an alarm id.
    pub fn to_id(&self) -> Result<AlarmId, AlarmError> {
        // ---
        let parsed = match self {
            NumberOrText::Number(n) => n.as_i64().and_then(|v| AlarmId::try_from(v).ok()),
            NumberOrText::Text(s) => s.trim().parse::<AlarmId>().ok(),
        };
        parsed.ok_or_else(|| AlarmError::Validation("Alarm ID must be an integer.".to_string()))
    }

    pub fn to_timezone(&self) -> Result<TimezoneOffset, AlarmError> {
        // ---
        match self {
            NumberOrText::Number(n) => n
                .as_f64()
                .ok_or_else(|| AlarmError::Validation(INVALID_TIMEZONE_MESSAGE.to_string()))
                .and_then(TimezoneOffset::new),
            NumberOrText::Text(s) => s.parse(),
        }
    }
}

/// Body of `POST /api/set-alarm`.
#[derive(Debug, Default, Deserialize)]
pub struct SetAlarmRequest {
    // ---
    pub id: Option<NumberOrText>,
    pub alarm_time: Option<String>,
    pub timezone: Option<NumberOrText>,
}

impl SetAlarmRequest {
    /// Validate into an optional target id and a draft.
    ///
    /// Time is checked before timezone so a request with both wrong reports
    /// the time error.
    pub fn validate(&self) -> Result<(Option<AlarmId>, AlarmDraft), AlarmError> {
        // ---
        let alarm_time = self
            .alarm_time
            .as_deref()
            .ok_or_else(|| AlarmError::Validation(INVALID_TIME_MESSAGE.to_string()))?
            .parse::<AlarmTime>()?;

        let timezone = self
            .timezone
            .as_ref()
            .ok_or_else(|| AlarmError::Validation(INVALID_TIMEZONE_MESSAGE.to_string()))?
            .to_timezone()?;

        let id = self
            .id
            .as_ref()
            .filter(|id| !id.is_blank())
            .map(NumberOrText::to_id)
            .transpose()?;

        Ok((id, AlarmDraft { alarm_time, timezone }))
    }
}

/// Body of `POST /api/delete-alarm`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteAlarmRequest {
    pub id: Option<NumberOrText>,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn request(value: serde_json::Value) -> SetAlarmRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_accepts_every_valid_time() {
        // ---
        for hour in 0..24 {
            for minute in 0..60 {
                let text = format!("{:02}:{:02}", hour, minute);
                let time: AlarmTime = text.parse().unwrap();
                assert_eq!(time.as_str(), text);
                assert_eq!(time.minutes(), hour * 60 + minute);
            }
        }
    }

    #[test]
    fn test_rejects_malformed_times() {
        // ---
        for bad in [
            "24:00", "9:30", "", "12:60", "12:5", "1230", "12-30", " 12:30", "12:30 ", "ab:cd",
            "29:00", "12:30:00", "+1:30",
        ] {
            let err = bad.parse::<AlarmTime>().unwrap_err();
            assert!(
                matches!(err, AlarmError::Validation(ref m) if m == INVALID_TIME_MESSAGE),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_alarm_time_ordering_is_chronological() {
        // ---
        let early: AlarmTime = "06:00".parse().unwrap();
        let late: AlarmTime = "22:00".parse().unwrap();
        assert!(early < late);
        assert_eq!(early.minutes_until(&late), 16 * 60);
        assert_eq!(late.minutes_until(&early), 8 * 60);
        assert_eq!(early.minutes_until(&early), 0);
    }

    #[test]
    fn test_shift_wraps_midnight() {
        // ---
        let t: AlarmTime = "23:30".parse().unwrap();
        assert_eq!(t.shifted_by_hours(1.0).as_str(), "00:30");
        assert_eq!(t.shifted_by_hours(-24.0).as_str(), "23:30");

        let t: AlarmTime = "00:15".parse().unwrap();
        assert_eq!(t.shifted_by_hours(-5.5).as_str(), "18:45");
    }

    #[test]
    fn test_from_clock_truncates_seconds() {
        // ---
        let clock = NaiveTime::from_hms_opt(7, 5, 59).unwrap();
        assert_eq!(AlarmTime::from_clock(clock).as_str(), "07:05");
    }

    #[test]
    fn test_timezone_parsing() {
        // ---
        assert_eq!("-5".parse::<TimezoneOffset>().unwrap().hours(), -5.0);
        assert_eq!(" 5.5 ".parse::<TimezoneOffset>().unwrap().hours(), 5.5);
        assert!("abc".parse::<TimezoneOffset>().is_err());
        assert!("".parse::<TimezoneOffset>().is_err());
        assert!("inf".parse::<TimezoneOffset>().is_err());
        assert!("NaN".parse::<TimezoneOffset>().is_err());
        assert!(TimezoneOffset::new(1e300).is_err());
    }

    #[test]
    fn test_validate_set_alarm_request() {
        // ---
        let (id, draft) = request(json!({"alarm_time": "07:30", "timezone": -5}))
            .validate()
            .unwrap();
        assert_eq!(id, None);
        assert_eq!(draft.alarm_time.as_str(), "07:30");
        assert_eq!(draft.timezone.hours(), -5.0);

        let (id, draft) = request(json!({"id": "12", "alarm_time": "23:59", "timezone": "5.5"}))
            .validate()
            .unwrap();
        assert_eq!(id, Some(12));
        assert_eq!(draft.timezone.hours(), 5.5);

        let (id, _) = request(json!({"id": null, "alarm_time": "00:00", "timezone": 0}))
            .validate()
            .unwrap();
        assert_eq!(id, None);

        // Front end forms post their hidden id field empty when creating
        for blank in ["", "  "] {
            let (id, draft) = request(json!({"id": blank, "alarm_time": "07:30", "timezone": 0}))
                .validate()
                .unwrap();
            assert_eq!(id, None);
            assert_eq!(draft.alarm_time.as_str(), "07:30");
        }
    }

    #[test]
    fn test_stored_time_is_revalidated() {
        // ---
        assert_eq!(decode_stored("06:45").unwrap().minutes(), 6 * 60 + 45);

        for legacy in ["7:30", "", "24:00", "12:3"] {
            let err = decode_stored(legacy).unwrap_err();
            assert!(err.to_string().contains("not HH:MM"), "{:?}: {}", legacy, err);
        }
    }

    #[test]
    fn test_validate_reports_first_problem() {
        // ---
        let err = request(json!({"timezone": 1})).validate().unwrap_err();
        assert_eq!(err.to_string(), INVALID_TIME_MESSAGE);

        let err = request(json!({"alarm_time": "24:00", "timezone": "x"}))
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_TIME_MESSAGE);

        let err = request(json!({"alarm_time": "08:00"})).validate().unwrap_err();
        assert_eq!(err.to_string(), INVALID_TIMEZONE_MESSAGE);

        let err = request(json!({"alarm_time": "08:00", "timezone": "east"}))
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), INVALID_TIMEZONE_MESSAGE);

        let err = request(json!({"id": "five", "alarm_time": "08:00", "timezone": 0}))
            .validate()
            .unwrap_err();
        assert!(matches!(err, AlarmError::Validation(_)));

        let err = request(json!({"id": 1.5, "alarm_time": "08:00", "timezone": 0}))
            .validate()
            .unwrap_err();
        assert!(matches!(err, AlarmError::Validation(_)));
    }

    #[test]
    fn test_record_serializes_wire_shape() {
        // ---
        let record = AlarmRecord {
            id: 3,
            alarm_time: "06:45".parse().unwrap(),
            active: true,
            timezone: -5.0,
            last_updated: None,
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            json!({"id": 3, "alarm_time": "06:45", "active": true, "timezone": -5.0})
        );
    }
}
