use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::schema::ColumnConfig;

/// Cell-write contract for one output row.
///
/// The projector writes cells in column order and commits with
/// `finish_record`; implementations own buffering and flushing.
pub trait RowSink {
    fn set_null(&mut self, column: usize);
    fn set_string(&mut self, column: usize, value: &str);
    fn set_boolean(&mut self, column: usize, value: bool);
    fn set_long(&mut self, column: usize, value: i64);
    fn set_double(&mut self, column: usize, value: f64);
    fn set_timestamp(&mut self, column: usize, value: DateTime<Utc>);
    fn finish_record(&mut self);
}

/// Writes each record as one JSON object per line, keyed by column name.
pub struct JsonLinesSink<W: Write> {
    columns: Vec<String>,
    row: Vec<Value>,
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(columns: &[ColumnConfig], writer: W) -> Self {
        Self {
            columns: columns.iter().map(|c| c.name.clone()).collect(),
            row: vec![Value::Null; columns.len()],
            writer,
        }
    }
}

impl<W: Write> RowSink for JsonLinesSink<W> {
    fn set_null(&mut self, column: usize) {
        self.row[column] = Value::Null;
    }

    fn set_string(&mut self, column: usize, value: &str) {
        self.row[column] = Value::String(value.to_string());
    }

    fn set_boolean(&mut self, column: usize, value: bool) {
        self.row[column] = Value::Bool(value);
    }

    fn set_long(&mut self, column: usize, value: i64) {
        self.row[column] = Value::from(value);
    }

    fn set_double(&mut self, column: usize, value: f64) {
        self.row[column] = Value::from(value);
    }

    fn set_timestamp(&mut self, column: usize, value: DateTime<Utc>) {
        self.row[column] = Value::String(value.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    }

    fn finish_record(&mut self) {
        let mut object = Map::new();
        for (name, value) in self.columns.iter().zip(self.row.iter_mut()) {
            object.insert(name.clone(), std::mem::take(value));
        }
        let _ = writeln!(self.writer, "{}", Value::Object(object));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use chrono::TimeZone;

    fn columns(names: &[&str]) -> Vec<ColumnConfig> {
        names
            .iter()
            .map(|n| ColumnConfig::new(*n, ColumnType::String))
            .collect()
    }

    #[test]
    fn writes_one_object_per_record() {
        let mut out = Vec::new();
        let cols = columns(&["id", "summary"]);
        let mut sink = JsonLinesSink::new(&cols, &mut out);

        sink.set_long(0, 1);
        sink.set_string(1, "first");
        sink.finish_record();
        sink.set_long(0, 2);
        sink.set_null(1);
        sink.finish_record();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "{\"id\":1,\"summary\":\"first\"}");
        assert_eq!(lines[1], "{\"id\":2,\"summary\":null}");
    }

    #[test]
    fn cells_reset_between_records() {
        let mut out = Vec::new();
        let cols = columns(&["a"]);
        let mut sink = JsonLinesSink::new(&cols, &mut out);

        sink.set_string(0, "x");
        sink.finish_record();
        // no cell written for the second record
        sink.finish_record();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("{\"a\":null}"));
    }

    #[test]
    fn timestamps_render_as_utc_rfc3339() {
        let mut out = Vec::new();
        let cols = columns(&["created"]);
        let mut sink = JsonLinesSink::new(&cols, &mut out);

        let ts = Utc.with_ymd_and_hms(2019, 3, 5, 7, 41, 58).unwrap();
        sink.set_timestamp(0, ts);
        sink.finish_record();

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.trim(), "{\"created\":\"2019-03-05T07:41:58Z\"}");
    }
}
