//! Core row and value types

use crate::{NosqlError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single result row: column name to value, in column order
///
/// Rows coming back from a NoSQL store are self-describing, so unlike a
/// relational result there is no shared column header; every row carries
/// its own column names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    columns: IndexMap<String, Value>,
}

impl Row {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from a JSON object
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                columns: map.into_iter().collect(),
            }),
            other => Err(NosqlError::invalid_input(
                "row must be a JSON object",
                &other.to_string(),
            )),
        }
    }

    /// Builder: append a column
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    /// Set a column, keeping its position if it already exists
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.insert(column.into(), value.into());
    }

    /// Remove a column, preserving the order of the remaining ones
    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.columns.shift_remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    pub fn get_at(&self, index: usize) -> Option<(&str, &Value)> {
        self.columns
            .get_index(index)
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Column names in row order
    pub fn column_names(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Convert to a JSON object value
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.columns
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

/// Render a column value for display
///
/// Strings are shown without quotes; everything else uses its JSON form.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_from_json_keeps_column_order() {
        let row = Row::from_json(json!({"z": 1, "a": 2, "m": 3})).unwrap();
        assert_eq!(row.column_names(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_row_from_json_rejects_scalars() {
        let err = Row::from_json(json!(42)).unwrap_err();
        assert!(matches!(err, NosqlError::InvalidInput { .. }));
    }

    #[test]
    fn test_row_remove_preserves_order() {
        let mut row = Row::new().with("a", 1).with("b", 2).with("c", 3);
        assert_eq!(row.remove("b"), Some(json!(2)));
        assert_eq!(row.column_names(), vec!["a", "c"]);
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&json!("text")), "text");
        assert_eq!(display_value(&Value::Null), "null");
        assert_eq!(display_value(&json!(1.5)), "1.5");
        assert_eq!(display_value(&json!({"k": [1, 2]})), r#"{"k":[1,2]}"#);
    }
}
