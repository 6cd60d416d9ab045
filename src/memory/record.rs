//! Indexed chat message records
//!
//! A `Record` is the atomic indexed unit: the raw message text, its embedding
//! vector, and its origination time normalized once at index time to the
//! canonical `YYYY-MM-DD HH:MM:SS` form in the process-local timezone.
//! Records are immutable after insertion; corrections are new records.

use crate::error::{Error, Result};
use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Canonical timestamp format for `Record::when`
pub const WHEN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// An indexed chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique record identifier, used only for storage addressing
    pub id: Uuid,

    /// Raw message content
    pub text: String,

    /// Embedding vector derived from `text` at creation time
    pub embedding: Vec<f32>,

    /// Origination time in canonical `YYYY-MM-DD HH:MM:SS` form
    pub when: String,
}

impl Record {
    /// Create a record with a fresh identifier
    pub fn new(text: impl Into<String>, embedding: Vec<f32>, when: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            embedding,
            when: when.into(),
        }
    }

    /// Replace the identifier with a freshly generated one
    pub fn refresh_id(&mut self) {
        self.id = Uuid::new_v4();
    }
}

/// Convert epoch seconds (possibly fractional) to the canonical `when` form.
///
/// Sub-second precision is dropped; the result is second-precision in the
/// process-local timezone.
pub fn format_when(epoch_secs: f64) -> Result<String> {
    if !epoch_secs.is_finite() {
        return Err(Error::MalformedMessage(format!(
            "timestamp is not a finite number: {epoch_secs}"
        )));
    }

    let secs = epoch_secs.floor();
    let nanos = ((epoch_secs - secs) * 1_000_000_000.0) as u32;
    let datetime = Local
        .timestamp_opt(secs as i64, nanos.min(999_999_999))
        .earliest()
        .ok_or_else(|| {
            Error::MalformedMessage(format!("timestamp out of range: {epoch_secs}"))
        })?;

    Ok(datetime.format(WHEN_FORMAT).to_string())
}

/// Parse a canonical `when` string back into a comparable time value.
///
/// All records share one timezone, so the naive value is totally ordered.
pub fn parse_when(when: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(when, WHEN_FORMAT)
        .map_err(|e| Error::CorruptRecord(format!("unparseable timestamp {when:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ids_are_unique() {
        let a = Record::new("hello", vec![1.0], "2023-06-01 10:00:00");
        let b = Record::new("hello", vec![1.0], "2023-06-01 10:00:00");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_refresh_id_changes_id() {
        let mut record = Record::new("hello", vec![1.0], "2023-06-01 10:00:00");
        let original = record.id;
        record.refresh_id();
        assert_ne!(record.id, original);
    }

    #[test]
    fn test_format_when_round_trips() {
        let when = format_when(1_685_600_000.0).unwrap();
        let parsed = parse_when(&when).unwrap();
        assert_eq!(parsed.format(WHEN_FORMAT).to_string(), when);
    }

    #[test]
    fn test_format_when_drops_fraction() {
        let whole = format_when(1_685_600_000.0).unwrap();
        let fractional = format_when(1_685_600_000.49).unwrap();
        assert_eq!(whole, fractional);
    }

    #[test]
    fn test_format_when_preserves_order() {
        let earlier = format_when(1_685_600_000.0).unwrap();
        let later = format_when(1_685_600_060.0).unwrap();
        assert!(parse_when(&earlier).unwrap() < parse_when(&later).unwrap());
    }

    #[test]
    fn test_format_when_rejects_nan_and_infinity() {
        assert!(matches!(
            format_when(f64::NAN),
            Err(Error::MalformedMessage(_))
        ));
        assert!(matches!(
            format_when(f64::INFINITY),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_format_when_rejects_out_of_range() {
        assert!(matches!(
            format_when(1e18),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_parse_when_rejects_garbage() {
        assert!(matches!(
            parse_when("not a timestamp"),
            Err(Error::CorruptRecord(_))
        ));
        assert!(matches!(
            parse_when("2023-13-99 99:99:99"),
            Err(Error::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_record_serde_round_trip() {
        let record = Record::new("hello world", vec![0.1, 0.2, 0.3], "2023-06-01 10:00:00");
        let json = serde_json::to_string(&record).unwrap();
        let parsed: Record = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
