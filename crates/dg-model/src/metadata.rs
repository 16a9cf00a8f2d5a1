//! Operational metadata maintained by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation and modification timestamps of an entry. Read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// When the entry was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the entry was last modified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl EntryMetadata {
    /// Checks whether no timestamp is known.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.created_at.is_none() && self.modified_at.is_none()
    }
}

/// Parses a generalized-time value (`20240131120000Z`, `20240131120000.5+0100`).
///
/// Returns `None` on anything else.
#[must_use]
pub fn parse_generalized_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let normalized = value
        .strip_suffix('Z')
        .map_or_else(|| value.to_string(), |base| format!("{base}+0000"));
    DateTime::parse_from_str(&normalized, "%Y%m%d%H%M%S%.f%z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Formats a timestamp as generalized time in UTC.
#[must_use]
pub fn format_generalized_time(value: &DateTime<Utc>) -> String {
    value.format("%Y%m%d%H%M%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_utc_and_offsets() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(parse_generalized_time("20240131120000Z"), Some(expected));
        assert_eq!(
            parse_generalized_time("20240131130000+0100"),
            Some(expected)
        );
        assert!(parse_generalized_time("20240131120000.250Z").is_some());
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_generalized_time("yesterday"), None);
        assert_eq!(parse_generalized_time(""), None);
    }

    #[test]
    fn formats_round_trip() {
        let ts = Utc.with_ymd_and_hms(2023, 6, 1, 8, 30, 5).unwrap();
        assert_eq!(parse_generalized_time(&format_generalized_time(&ts)), Some(ts));
    }
}
