//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. These helpers isolate the parsing and handle the dual datetime
//! format (`SQLite`'s `datetime('now')` vs Rust's `to_rfc3339()`).

use catsync_core::errors::CoreError;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::DatabaseError;

/// Maximum number of bound parameters used in one `IN (...)` list.
pub const IN_CLAUSE_BATCH: usize = 500;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-10-19T14:30:00+00:00"`) and `SQLite`'s default
/// format (`"2026-10-19 14:30:00"`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a `YYYY-MM-DD` TEXT column.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string is not a calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| DatabaseError::Query(format!("Failed to parse date '{s}': {e}")))
}

/// Format a date the way `SQLite`'s `date()` does.
#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with the catsync-core enums stored in `SCREAMING_SNAKE_CASE`.
///
/// # Errors
///
/// Returns `CoreError::UnknownVariant` if the string does not match any variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).map_err(|_| {
        CoreError::UnknownVariant {
            kind: std::any::type_name::<T>().rsplit("::").next().unwrap_or_default(),
            value: s.to_string(),
        }
        .into()
    })
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER flag column (`0` / non-zero).
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_flag(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Read a single `COUNT(*)`-style integer from a query.
///
/// # Errors
///
/// Returns `DatabaseError::NoResult` if the query yields no rows.
pub async fn query_count(
    conn: &libsql::Connection,
    sql: &str,
    params: impl libsql::params::IntoParams,
) -> Result<i64, DatabaseError> {
    let mut rows = conn.query(sql, params).await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    Ok(row.get::<i64>(0)?)
}

/// `?1, ?2, ..., ?n` for an `IN (...)` list.
#[must_use]
pub fn placeholders(n: usize) -> String {
    (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use catsync_core::enums::{DataQuality, SyncStatus};

    #[test]
    fn datetime_accepts_both_formats() {
        let rfc = parse_datetime("2026-10-19T08:15:00+00:00").unwrap();
        let sqlite = parse_datetime("2026-10-19 08:15:00").unwrap();
        assert_eq!(rfc, sqlite);
        assert!(parse_datetime("19/10/2026").is_err());
    }

    #[test]
    fn enums_parse_from_storage_values() {
        assert_eq!(parse_enum::<SyncStatus>("IN_PROGRESS").unwrap(), SyncStatus::InProgress);
        assert_eq!(parse_enum::<DataQuality>("NEEDS_REVIEW").unwrap(), DataQuality::NeedsReview);
        let err = parse_enum::<SyncStatus>("in_progress").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unknown SyncStatus value: 'in_progress'"
        );
    }

    #[test]
    fn dates_roundtrip_through_text() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        assert_eq!(parse_date(&format_date(date)).unwrap(), date);
    }

    #[test]
    fn placeholder_list() {
        assert_eq!(placeholders(3), "?1, ?2, ?3");
    }
}
