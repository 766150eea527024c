use serde_json::{Map, Value};

/// Sub-objects dropped before flattening. These hold file blobs and
/// star/custom-field metadata that never map to output columns.
const STRIPPED_KEYS: &[&str] = &["sharedFiles", "attachments", "stars", "customFields"];

/// One issue record fetched from the source API.
///
/// The flattened key -> value view is computed once at construction and shared
/// by the schema guesser and the record projector.
#[derive(Debug, Clone)]
pub struct Issue {
    flatten: Map<String, Value>,
}

impl Issue {
    pub fn new(raw: Value) -> Self {
        let mut flatten = match raw {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for key in STRIPPED_KEYS {
            flatten.remove(*key);
        }
        Self { flatten }
    }

    pub fn flatten(&self) -> &Map<String, Value> {
        &self.flatten
    }

    /// Value for a column name, `Null` when the record lacks the key.
    pub fn value(&self, name: &str) -> &Value {
        self.flatten.get(name).unwrap_or(&Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flatten_strips_excluded_keys() {
        let issue = Issue::new(json!({
            "id": 1,
            "summary": "Crash on startup",
            "sharedFiles": [{"id": 9}],
            "attachments": [{"id": 2, "name": "log.txt"}],
            "stars": [{"id": 3}],
            "customFields": [{"id": 4, "value": "x"}],
        }));

        assert_eq!(issue.value("id"), &json!(1));
        assert_eq!(issue.value("summary"), &json!("Crash on startup"));
        for key in ["sharedFiles", "attachments", "stars", "customFields"] {
            assert!(!issue.flatten().contains_key(key));
        }
    }

    #[test]
    fn flatten_without_excluded_keys_is_unchanged() {
        let raw = json!({"id": 7, "status": {"id": 1, "name": "Open"}});
        let issue = Issue::new(raw.clone());

        assert_eq!(issue.flatten().len(), 2);
        assert_eq!(issue.value("status"), &json!({"id": 1, "name": "Open"}));
    }

    #[test]
    fn flatten_is_idempotent() {
        let raw = json!({"id": 1, "attachments": [], "summary": "x"});
        let once = Issue::new(raw);
        let twice = Issue::new(Value::Object(once.flatten().clone()));

        assert_eq!(once.flatten(), twice.flatten());
    }

    #[test]
    fn flatten_is_deterministic() {
        let raw = json!({"b": 2, "a": 1, "stars": []});
        let first = Issue::new(raw.clone());
        let second = Issue::new(raw);

        assert_eq!(first.flatten(), second.flatten());
    }

    #[test]
    fn missing_key_reads_as_null() {
        let issue = Issue::new(json!({"id": 1}));
        assert_eq!(issue.value("assignee"), &Value::Null);
    }

    #[test]
    fn non_object_record_flattens_empty() {
        let issue = Issue::new(json!([1, 2, 3]));
        assert!(issue.flatten().is_empty());
    }
}
