use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::model::issue::Issue;
use crate::schema::{ColumnConfig, ColumnType};
use crate::sink::RowSink;

/// Matches the source API's ISO-8601-like timestamps, fractional seconds and
/// offset included.
pub const DEFAULT_TIMESTAMP_PATTERN: &str = "%Y-%m-%dT%H:%M:%S%.f%z";

/// Project one issue's flattened view into typed cells and commit the record.
///
/// Never fails: a value that cannot be coerced to its column's declared type
/// becomes a null cell.
pub fn project_record(issue: &Issue, columns: &[ColumnConfig], sink: &mut dyn RowSink) {
    for (index, column) in columns.iter().enumerate() {
        let data = issue.value(&column.name);
        match column.column_type {
            ColumnType::Json => match data {
                Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
                    sink.set_null(index)
                }
                structured => sink.set_string(index, &structured.to_string()),
            },
            ColumnType::String => match data {
                Value::Null => sink.set_null(index),
                Value::Array(items) => sink.set_string(index, &join_array(items)),
                value => sink.set_string(index, &stringify(value)),
            },
            ColumnType::Timestamp => match timestamp_value(data, column.format.as_deref()) {
                Some(value) => sink.set_timestamp(index, value),
                None => sink.set_null(index),
            },
            ColumnType::Boolean => match boolean_value(data) {
                Some(value) => sink.set_boolean(index, value),
                None => sink.set_null(index),
            },
            ColumnType::Long => match long_value(data) {
                Some(value) => sink.set_long(index, value),
                None => sink.set_null(index),
            },
            ColumnType::Double => match double_value(data) {
                Some(value) => sink.set_double(index, value),
                None => sink.set_null(index),
            },
        }
    }
    sink.finish_record();
}

/// Bare contents for strings, JSON text for everything else.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn join_array(items: &[Value]) -> String {
    items.iter().map(stringify).collect::<Vec<_>>().join(",")
}

fn timestamp_value(data: &Value, format: Option<&str>) -> Option<DateTime<Utc>> {
    match data {
        Value::Null | Value::Object(_) | Value::Array(_) => None,
        value => parse_timestamp(&stringify(value), format.unwrap_or(DEFAULT_TIMESTAMP_PATTERN)),
    }
}

/// Parse a timestamp string against a strftime pattern, resolved to UTC.
/// Parse failures are swallowed; the caller projects them as null.
pub fn parse_timestamp(value: &str, pattern: &str) -> Option<DateTime<Utc>> {
    if let Ok(with_offset) = DateTime::parse_from_str(value, pattern) {
        return Some(with_offset.with_timezone(&Utc));
    }
    // Patterns without an offset directive resolve as naive UTC.
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, pattern) {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, pattern) {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    // The source emits RFC 3339 with a literal `Z` suffix, which the strftime
    // offset directive does not reliably accept.
    if pattern == DEFAULT_TIMESTAMP_PATTERN {
        if let Ok(rfc3339) = DateTime::parse_from_rfc3339(value) {
            return Some(rfc3339.with_timezone(&Utc));
        }
    }
    None
}

fn boolean_value(data: &Value) -> Option<bool> {
    match data {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn long_value(data: &Value) -> Option<i64> {
    match data {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn double_value(data: &Value) -> Option<f64> {
    match data {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}
