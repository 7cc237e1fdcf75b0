//! In-memory table of row records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ViewerError};
use crate::history::Snapshot;

/// One row: column name to value, in column order.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl Snapshot for Table {
    fn snapshot(&self) -> Self {
        self.clone()
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table whose columns are the union of the record keys, in the
    /// order they are first seen.
    pub fn from_records(rows: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self { columns, rows }
    }

    pub fn with_columns(columns: Vec<String>, rows: Vec<Record>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| ViewerError::ColumnNotFound(name.to_string()))
    }

    pub fn require_row(&self, row: usize) -> Result<()> {
        if row < self.rows.len() {
            Ok(())
        } else {
            Err(ViewerError::RowOutOfRange { row, len: self.rows.len() })
        }
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    pub fn cell_text(&self, row: usize, column: &str) -> String {
        self.cell(row, column).map(value_text).unwrap_or_default()
    }

    /// Cells of one column, top to bottom. Missing cells read as `Null`.
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows.iter().map(move |r| r.get(column).unwrap_or(&Value::Null))
    }

    pub(crate) fn columns_mut(&mut self) -> &mut Vec<String> {
        &mut self.columns
    }

    pub(crate) fn rows_mut(&mut self) -> &mut Vec<Record> {
        &mut self.rows
    }
}

/// Display text of a cell: strings unquoted, `null` empty, anything else as JSON.
pub fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric reading of a cell, if it has one.
pub fn value_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(_) | Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Empty cells are skipped by aggregates and sort last.
pub fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn columns_are_union_in_first_seen_order() {
        let t = Table::from_records(vec![
            rec(json!({"b": 1, "a": 2})),
            rec(json!({"a": 3, "c": 4})),
        ]);
        assert_eq!(t.columns(), &["b", "a", "c"]);
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell_text(1, "b"), "");
        assert_eq!(t.cell_text(1, "c"), "4");
    }

    #[test]
    fn value_helpers() {
        assert_eq!(value_text(&json!("x")), "x");
        assert_eq!(value_text(&Value::Null), "");
        assert_eq!(value_text(&json!(1.5)), "1.5");
        assert_eq!(value_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(value_number(&json!("abc")), None);
        assert!(is_blank(&json!("  ")));
        assert!(!is_blank(&json!(0)));
    }

    #[test]
    fn snapshot_is_deep() {
        let t = Table::from_records(vec![rec(json!({"a": "1"}))]);
        let mut copy = t.snapshot();
        copy.rows_mut()[0].insert("a".into(), json!("2"));
        assert_eq!(t.cell_text(0, "a"), "1");
    }

    #[test]
    fn missing_column_and_row_errors() {
        let t = Table::from_records(vec![rec(json!({"a": "1"}))]);
        assert!(matches!(t.require_column("z"), Err(ViewerError::ColumnNotFound(_))));
        assert!(matches!(t.require_row(1), Err(ViewerError::RowOutOfRange { row: 1, len: 1 })));
        assert_eq!(t.column_values("a").count(), 1);
    }
}
