pub mod guess;

use serde::{Deserialize, Serialize};

/// Declared type of an output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Json,
    String,
    Timestamp,
    Boolean,
    Long,
    Double,
}

/// One declared output column. `format` is the strftime pattern for
/// timestamp columns; other types ignore it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            format: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_type_serializes_lowercase() {
        let json = serde_json::to_string(&ColumnType::Timestamp).unwrap();
        assert_eq!(json, "\"timestamp\"");
    }

    #[test]
    fn column_config_parses_from_toml() {
        let column: ColumnConfig =
            toml::from_str("name = \"created\"\ntype = \"timestamp\"\nformat = \"%Y-%m-%d\"\n")
                .unwrap();
        assert_eq!(column.name, "created");
        assert_eq!(column.column_type, ColumnType::Timestamp);
        assert_eq!(column.format.as_deref(), Some("%Y-%m-%d"));
    }

    #[test]
    fn column_config_format_is_optional() {
        let column: ColumnConfig = toml::from_str("name = \"id\"\ntype = \"long\"\n").unwrap();
        assert_eq!(column.format, None);
    }
}
