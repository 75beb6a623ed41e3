//! Store timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A point in time as persisted in documents: `{"seconds": .., "nanoseconds": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    /// Whole seconds since the Unix epoch.
    pub seconds: i64,
    /// Sub-second part.
    pub nanoseconds: u32,
}

impl Timestamp {
    /// The current time.
    #[must_use]
    pub fn now() -> Self {
        Utc::now().into()
    }

    /// Convert to a `chrono` UTC datetime.
    ///
    /// Out-of-range values collapse to the Unix epoch.
    #[must_use]
    pub fn to_datetime(self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.seconds, self.nanoseconds).unwrap_or_default()
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_chrono() {
        let dt = DateTime::parse_from_rfc3339("2024-11-19T08:30:00.250Z")
            .unwrap()
            .with_timezone(&Utc);
        let ts = Timestamp::from(dt);
        assert_eq!(ts.seconds, 1_732_005_000);
        assert_eq!(ts.nanoseconds, 250_000_000);
        assert_eq!(ts.to_datetime(), dt);
    }

    #[test]
    fn test_document_shape() {
        let ts = Timestamp {
            seconds: 10,
            nanoseconds: 0,
        };
        assert_eq!(
            serde_json::to_value(ts).unwrap(),
            serde_json::json!({"seconds": 10, "nanoseconds": 0})
        );
    }
}
