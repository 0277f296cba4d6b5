/// Interaction events ("thinking of you" clicks) as read from the event store.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned timestamp in document form.
///
/// Kept raw so that partially written or corrupted records can still be
/// loaded; conversion to an instant happens in [`StoredTimestamp::to_instant`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTimestamp {
    pub seconds: i64,
    pub nanoseconds: i64,
}

impl StoredTimestamp {
    pub fn from_instant(instant: DateTime<Utc>) -> Self {
        Self {
            seconds: instant.timestamp(),
            nanoseconds: instant.timestamp_subsec_nanos() as i64,
        }
    }

    /// Convert to an instant at whole-second precision.
    ///
    /// Returns `None` for malformed values (nanoseconds outside one second,
    /// seconds outside the representable range).
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        if !(0..1_000_000_000).contains(&self.nanoseconds) {
            return None;
        }
        DateTime::from_timestamp(self.seconds, 0)
    }
}

/// One recorded interaction, attributed to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub actor_id: String,
    /// `None` when the stored timestamp is missing or malformed
    pub occurred_at: Option<DateTime<Utc>>,
}

impl InteractionEvent {
    pub fn new(actor_id: impl Into<String>, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            actor_id: actor_id.into(),
            occurred_at: Some(occurred_at),
        }
    }

    pub fn from_stored(id: Option<i64>, actor_id: String, timestamp: Option<StoredTimestamp>) -> Self {
        Self {
            id,
            actor_id,
            occurred_at: timestamp.and_then(|ts| ts.to_instant()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_instant_drops_subsecond_part() {
        let ts = StoredTimestamp {
            seconds: 1_718_010_000,
            nanoseconds: 999_000_000,
        };
        let instant = ts.to_instant().unwrap();
        assert_eq!(instant.timestamp(), 1_718_010_000);
        assert_eq!(instant.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_to_instant_rejects_bad_nanoseconds() {
        let negative = StoredTimestamp {
            seconds: 1_718_010_000,
            nanoseconds: -1,
        };
        let overflow = StoredTimestamp {
            seconds: 1_718_010_000,
            nanoseconds: 1_000_000_000,
        };
        assert!(negative.to_instant().is_none());
        assert!(overflow.to_instant().is_none());
    }

    #[test]
    fn test_to_instant_rejects_out_of_range_seconds() {
        let ts = StoredTimestamp {
            seconds: i64::MAX,
            nanoseconds: 0,
        };
        assert!(ts.to_instant().is_none());
    }

    #[test]
    fn test_from_stored_without_timestamp() {
        let event = InteractionEvent::from_stored(Some(7), "alice".to_string(), None);
        assert_eq!(event.id, Some(7));
        assert!(event.occurred_at.is_none());
    }

    #[test]
    fn test_stored_timestamp_from_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        let ts = StoredTimestamp::from_instant(instant);
        assert_eq!(ts.nanoseconds, 0);
        assert_eq!(ts.to_instant(), Some(instant));
    }

    #[test]
    fn test_deserialize_document_timestamp() {
        let ts: StoredTimestamp =
            serde_json::from_str(r#"{"seconds": 1718010000, "nanoseconds": 0}"#).unwrap();
        assert_eq!(ts.seconds, 1_718_010_000);
    }
}
