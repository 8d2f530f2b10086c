//! Materialized result pages

use nosql_core::{Row, display_value};
use serde_json::{Map, Value};
use std::sync::OnceLock;

/// Key under which collection mode nests the non-key columns of a row
pub const ROW_DATA_KEY: &str = "Rowdata";

/// One row of a page, with its display text computed on first use
#[derive(Debug, Clone)]
pub struct TableRow {
    row: Row,
    cells: OnceLock<Vec<String>>,
}

impl TableRow {
    pub fn new(row: Row) -> Self {
        Self {
            row,
            cells: OnceLock::new(),
        }
    }

    pub fn row(&self) -> &Row {
        &self.row
    }

    /// Display text of every column, in row order
    pub fn cells(&self) -> &[String] {
        self.cells
            .get_or_init(|| self.row.iter().map(|(_, v)| display_value(v)).collect())
    }

    /// Display text of one column, empty when the row lacks it
    pub fn cell(&self, column: &str) -> String {
        self.row.get(column).map(display_value).unwrap_or_default()
    }
}

impl PartialEq for TableRow {
    fn eq(&self, other: &Self) -> bool {
        self.row == other.row
    }
}

/// A fixed page of rows; never changes once materialized
#[derive(Debug, Clone, PartialEq)]
pub struct TablePage {
    number: usize,
    rows: Vec<TableRow>,
}

impl TablePage {
    pub(crate) fn new(number: usize, rows: Vec<Row>) -> Self {
        Self {
            number,
            rows: rows.into_iter().map(TableRow::new).collect(),
        }
    }

    /// 1-based page number
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column headers, taken from the first row of the page
    ///
    /// Columns that only appear in later rows are not listed.
    pub fn column_names(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|r| r.row().column_names())
            .unwrap_or_default()
    }
}

/// Restructure a row for collection display
///
/// Primary-key columns stay at the top level in key order; every other
/// column is nested, in row order, under `ROW_DATA_KEY`. Key columns are
/// matched ignoring case and keep the name the row gives them.
pub fn collection_row(row: Row, primary_key: &[String]) -> Row {
    let mut keys: Vec<(String, Value)> = Vec::with_capacity(primary_key.len());
    let mut data = Map::new();
    let mut rest: Vec<(String, Value)> = row.into_iter().collect();
    for pk in primary_key {
        if let Some(pos) = rest.iter().position(|(name, _)| name.eq_ignore_ascii_case(pk)) {
            keys.push(rest.remove(pos));
        }
    }
    for (name, value) in rest {
        data.insert(name, value);
    }
    keys.into_iter()
        .chain(std::iter::once((ROW_DATA_KEY.to_string(), Value::Object(data))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_collection_row_hoists_primary_key() {
        let row = Row::new().with("a", "x").with("pk", 1).with("b", "y");
        let shaped = collection_row(row, &["pk".to_string()]);
        assert_eq!(
            shaped.to_json(),
            json!({"pk": 1, "Rowdata": {"a": "x", "b": "y"}})
        );
        assert_eq!(shaped.column_names(), vec!["pk", "Rowdata"]);
    }

    #[test]
    fn test_collection_row_follows_key_order() {
        let row = Row::new().with("b", 2).with("v", true).with("a", 1);
        let shaped = collection_row(row, &["a".to_string(), "b".to_string(), "gone".to_string()]);
        assert_eq!(shaped.column_names(), vec!["a", "b", "Rowdata"]);
        assert_eq!(shaped.get("Rowdata"), Some(&json!({"v": true})));
    }

    #[test]
    fn test_collection_row_matches_keys_ignoring_case() {
        let row = Row::new().with("id", 7).with("name", "x");
        let shaped = collection_row(row, &["ID".to_string()]);
        assert_eq!(shaped.to_json(), json!({"id": 7, "Rowdata": {"name": "x"}}));
    }

    #[test]
    fn test_cells_render_display_text() {
        let row = TableRow::new(Row::new().with("s", "text").with("n", 3).with("z", Value::Null));
        assert_eq!(row.cells(), &["text", "3", "null"]);
        assert_eq!(row.cell("n"), "3");
        assert_eq!(row.cell("missing"), "");
    }

    #[test]
    fn test_headers_come_from_first_row() {
        let page = TablePage::new(
            1,
            vec![
                Row::new().with("a", 1),
                Row::new().with("a", 2).with("extra", 3),
            ],
        );
        assert_eq!(page.column_names(), vec!["a"]);
    }
}
