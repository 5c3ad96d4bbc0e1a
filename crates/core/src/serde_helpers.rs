//! Serde helpers for partial-update DTOs.

use serde::{Deserialize, Deserializer};

use crate::scheduling::parse_instant;
use crate::types::Timestamp;

/// Deserialize a window bound that distinguishes "absent" from "cleared".
///
/// Use with `#[serde(default, deserialize_with = "...")]` so that:
///
/// - a missing field stays `None` (keep the current value),
/// - `null` or `""` becomes `Some(None)` (clear the bound),
/// - an RFC 3339 timestamp or `YYYY-MM-DD` date becomes `Some(Some(ts))`.
pub fn window_bound<'de, D>(deserializer: D) -> Result<Option<Option<Timestamp>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(Some(None)),
        Some(value) => parse_instant(value)
            .map(|ts| Some(Some(ts)))
            .map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "window_bound")]
        start: Option<Option<Timestamp>>,
    }

    #[test]
    fn absent_field_keeps_value() {
        let patch: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(patch.start, None);
    }

    #[test]
    fn null_and_empty_clear_the_bound() {
        let patch: Patch = serde_json::from_str(r#"{"start": null}"#).unwrap();
        assert_eq!(patch.start, Some(None));

        let patch: Patch = serde_json::from_str(r#"{"start": ""}"#).unwrap();
        assert_eq!(patch.start, Some(None));
    }

    #[test]
    fn date_and_timestamp_are_accepted() {
        let patch: Patch = serde_json::from_str(r#"{"start": "2024-01-01"}"#).unwrap();
        assert_eq!(
            patch.start,
            Some(Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
        );

        let patch: Patch =
            serde_json::from_str(r#"{"start": "2024-01-01T12:30:00Z"}"#).unwrap();
        assert_eq!(
            patch.start,
            Some(Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 30, 0).unwrap()))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        let result: Result<Patch, _> = serde_json::from_str(r#"{"start": "next tuesday"}"#);
        assert!(result.is_err());
    }
}
