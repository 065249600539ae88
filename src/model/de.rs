//! Lenient deserializers for backend rows
//!
//! The analysis pipeline writes columns as nullable and mixes timestamp
//! formats, so rows are read with these helpers instead of failing outright.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Read JSON `null` as the type's default (empty list, zero, false)
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read an optional sub-object whose shape varies between pipeline
/// versions. A value of the wrong shape becomes `None` instead of
/// rejecting the whole row.
pub(crate) fn lenient_option<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Value::deserialize(deserializer)?;
    if raw.is_null() {
        return Ok(None);
    }

    match serde_json::from_value(raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring field of unexpected shape");
            Ok(None)
        }
    }
}

/// Like [`lenient_option`] for list fields: wrong shapes read as empty
pub(crate) fn lenient_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    Ok(lenient_option(deserializer)?.unwrap_or_default())
}

/// Read a timestamp that may be RFC 3339 or a naive `timestamp` column value.
/// Unparseable values become `None`.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_rfc3339_and_naive() {
        let ts = parse_timestamp("2025-01-12T08:30:00+09:00").unwrap();
        assert_eq!(ts.hour(), 23);
        assert_eq!(ts.day(), 11);

        let naive = parse_timestamp("2025-01-12T08:30:00.123456").unwrap();
        assert_eq!(naive.hour(), 8);

        let spaced = parse_timestamp("2025-01-12 08:30:00").unwrap();
        assert_eq!(spaced.minute(), 30);
    }

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "lenient_option")]
        tags: Option<Vec<String>>,
        #[serde(default, deserialize_with = "lenient_default")]
        steps: Vec<String>,
    }

    #[test]
    fn test_wrong_shape_is_dropped() {
        let row: Row = serde_json::from_value(serde_json::json!({
            "tags": {"unexpected": true},
            "steps": "a single sentence"
        }))
        .unwrap();
        assert!(row.tags.is_none());
        assert!(row.steps.is_empty());

        let row: Row =
            serde_json::from_value(serde_json::json!({"tags": ["a"], "steps": ["x", "y"]})).unwrap();
        assert_eq!(row.tags, Some(vec!["a".to_string()]));
        assert_eq!(row.steps.len(), 2);

        let row: Row = serde_json::from_value(serde_json::json!({"tags": null})).unwrap();
        assert!(row.tags.is_none());
    }

    #[test]
    fn test_parse_garbage_is_none() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
