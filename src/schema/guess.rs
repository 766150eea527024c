use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;

use super::{ColumnConfig, ColumnType};
use crate::model::issue::Issue;
use crate::projector::{parse_timestamp, DEFAULT_TIMESTAMP_PATTERN};

#[derive(Error, Debug)]
pub enum GuessError {
    #[error("could not guess schema due to empty data set")]
    EmptySample,
}

/// Infer an ordered column schema from a sample of issues.
///
/// Column names are the union of flattened attribute keys across the sample,
/// sorted lexicographically. Each column's type comes from the shapes of its
/// sample values; records that lack a key contribute an explicit null.
pub fn guess_schema(issues: &[Issue]) -> Result<Vec<ColumnConfig>, GuessError> {
    if issues.is_empty() {
        return Err(GuessError::EmptySample);
    }

    let attributes = unique_attributes(issues);
    let rows = sample_matrix(issues, &attributes);

    let columns = attributes
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let column_type = infer_column_type(rows.iter().map(|row| &row[index]));
            let mut column = ColumnConfig::new(name.clone(), column_type);
            if column_type == ColumnType::Timestamp {
                column.format = Some(DEFAULT_TIMESTAMP_PATTERN.to_string());
            }
            column
        })
        .collect();

    Ok(columns)
}

fn unique_attributes(issues: &[Issue]) -> BTreeSet<String> {
    let mut keys = BTreeSet::new();
    for issue in issues {
        for key in issue.flatten().keys() {
            keys.insert(key.clone());
        }
    }
    keys
}

/// One rectangular row per issue, aligned with the sorted attribute set.
fn sample_matrix(issues: &[Issue], attributes: &BTreeSet<String>) -> Vec<Vec<Value>> {
    issues
        .iter()
        .map(|issue| attributes.iter().map(|key| issue.value(key).clone()).collect())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Boolean,
    Long,
    Double,
    Timestamp,
    Text,
    Structured,
}

fn value_shape(value: &Value) -> Option<Shape> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(Shape::Boolean),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Some(Shape::Long)
            } else {
                Some(Shape::Double)
            }
        }
        Value::String(s) => Some(string_shape(s)),
        Value::Array(_) | Value::Object(_) => Some(Shape::Structured),
    }
}

fn string_shape(s: &str) -> Shape {
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        Shape::Boolean
    } else if s.parse::<i64>().is_ok() {
        Shape::Long
    } else if s.parse::<f64>().is_ok() {
        Shape::Double
    } else if parse_timestamp(s, DEFAULT_TIMESTAMP_PATTERN).is_some() {
        Shape::Timestamp
    } else {
        Shape::Text
    }
}

/// Nulls carry no shape. Long widens to double when both appear; any other
/// mix, or an all-null column, falls back to string.
fn infer_column_type<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnType {
    let mut merged: Option<Shape> = None;
    for value in values {
        let Some(shape) = value_shape(value) else {
            continue;
        };
        merged = Some(match merged {
            None => shape,
            Some(prev) if prev == shape => shape,
            Some(Shape::Long) if shape == Shape::Double => Shape::Double,
            Some(Shape::Double) if shape == Shape::Long => Shape::Double,
            Some(_) => Shape::Text,
        });
    }

    match merged {
        None | Some(Shape::Text) => ColumnType::String,
        Some(Shape::Boolean) => ColumnType::Boolean,
        Some(Shape::Long) => ColumnType::Long,
        Some(Shape::Double) => ColumnType::Double,
        Some(Shape::Timestamp) => ColumnType::Timestamp,
        Some(Shape::Structured) => ColumnType::Json,
    }
}
