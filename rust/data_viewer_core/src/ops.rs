//! Column and row operations on a [`Table`].
//!
//! Each operation checks its inputs and computes its result before touching
//! the table, so an `Err` always leaves the table as it was.

use std::cmp::Ordering;
use std::fmt::{self, Write as _};
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::{json, Value};
use tracing::debug;

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::table::{is_blank, value_number, value_text, Record, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Sum,
    Mean,
    Min,
    Max,
    Count,
}

impl Aggregate {
    pub const ALL: [Aggregate; 5] = [Self::Sum, Self::Mean, Self::Min, Self::Max, Self::Count];

    pub fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregate {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == lower)
            .ok_or_else(|| ViewerError::UnknownAggregate(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub column: String,
    pub value: f64,
}

/// Computes `agg` over the non-empty cells of `column`.
pub fn aggregate(table: &Table, column: &str, agg: Aggregate) -> Result<f64> {
    table.require_column(column)?;
    let cells = table.column_values(column).enumerate().filter(|(_, v)| !is_blank(v));

    if agg == Aggregate::Count {
        return Ok(cells.count() as f64);
    }

    let mut values = Vec::new();
    for (row, v) in cells {
        let n = value_number(v).ok_or_else(|| ViewerError::NotNumeric {
            column: column.to_string(),
            row,
            value: value_text(v),
        })?;
        values.push(n);
    }

    if values.is_empty() && agg != Aggregate::Sum {
        return Err(ViewerError::NoNumericValues(column.to_string()));
    }
    let result = match agg {
        Aggregate::Sum => values.iter().sum::<f64>(),
        Aggregate::Mean => values.iter().sum::<f64>() / values.len() as f64,
        Aggregate::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregate::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Aggregate::Count => values.len() as f64,
    };
    Ok(result)
}

/// Writes the aggregate into a `{column}_{agg}` result column: the value in the
/// first row and an empty string below it.
pub fn append_aggregate(table: &mut Table, column: &str, agg: Aggregate) -> Result<AggregateResult> {
    let value = aggregate(table, column, agg)?;
    let result_column = format!("{column}_{agg}");
    let cell = if agg == Aggregate::Count { json!(value as u64) } else { json!(value) };

    if !table.has_column(&result_column) {
        table.columns_mut().push(result_column.clone());
    }
    for (i, row) in table.rows_mut().iter_mut().enumerate() {
        let v = if i == 0 { cell.clone() } else { Value::String(String::new()) };
        row.insert(result_column.clone(), v);
    }
    debug!(column, %agg, value, "aggregate column written");
    Ok(AggregateResult { column: result_column, value })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
}

impl FromStr for FilterOp {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s.trim() {
            "==" | "=" | "eq" => Self::Eq,
            "!=" | "ne" => Self::Ne,
            ">" | "gt" => Self::Gt,
            ">=" | "ge" => Self::Ge,
            "<" | "lt" => Self::Lt,
            "<=" | "le" => Self::Le,
            "contains" | "~" => Self::Contains,
            other => return Err(ViewerError::UnknownFilterOp(other.to_string())),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<String>) -> Self {
        Self { column: column.into(), op, value: value.into() }
    }

    pub fn matches(&self, record: &Record) -> bool {
        let text = record.get(&self.column).map(value_text).unwrap_or_default();
        let ord = match (text.trim().parse::<f64>(), self.value.trim().parse::<f64>()) {
            (Ok(a), Ok(b)) => a.total_cmp(&b),
            _ => text.as_str().cmp(self.value.as_str()),
        };
        match self.op {
            FilterOp::Eq => ord == Ordering::Equal,
            FilterOp::Ne => ord != Ordering::Equal,
            FilterOp::Gt => ord == Ordering::Greater,
            FilterOp::Ge => ord != Ordering::Less,
            FilterOp::Lt => ord == Ordering::Less,
            FilterOp::Le => ord != Ordering::Greater,
            FilterOp::Contains => text.contains(&self.value),
        }
    }
}

/// Keeps only the rows matching `filter`. Returns how many rows were dropped.
pub fn filter_rows(table: &mut Table, filter: &Filter) -> Result<usize> {
    table.require_column(&filter.column)?;
    let before = table.len();
    table.rows_mut().retain(|r| filter.matches(r));
    let removed = before - table.len();
    debug!(column = %filter.column, op = ?filter.op, removed, "rows filtered");
    Ok(removed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = ViewerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "a-z" => Ok(Self::Ascending),
            "desc" | "descending" | "z-a" => Ok(Self::Descending),
            other => Err(ViewerError::UnknownSortOrder(other.to_string())),
        }
    }
}

/// Stable sort on one column. Numeric when every non-empty cell is a number,
/// textual otherwise. Empty cells go last in either order.
pub fn sort_rows(table: &mut Table, column: &str, order: SortOrder) -> Result<()> {
    table.require_column(column)?;
    let numeric = table
        .column_values(column)
        .filter(|v| !is_blank(v))
        .all(|v| value_number(v).is_some());

    table.rows_mut().sort_by(|a, b| {
        let va = a.get(column).unwrap_or(&Value::Null);
        let vb = b.get(column).unwrap_or(&Value::Null);
        match (is_blank(va), is_blank(vb)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => {
                let ord = if numeric {
                    let na = value_number(va).unwrap_or(f64::INFINITY);
                    let nb = value_number(vb).unwrap_or(f64::INFINITY);
                    na.total_cmp(&nb)
                } else {
                    value_text(va).cmp(&value_text(vb))
                };
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            }
        }
    });
    debug!(column, ?order, numeric, "rows sorted");
    Ok(())
}

pub fn rename_column(table: &mut Table, from: &str, to: &str) -> Result<()> {
    let idx = table.require_column(from)?;
    if from == to {
        return Ok(());
    }
    if table.has_column(to) {
        return Err(ViewerError::ColumnExists(to.to_string()));
    }

    table.columns_mut()[idx] = to.to_string();
    for row in table.rows_mut() {
        if row.contains_key(from) {
            *row = std::mem::take(row)
                .into_iter()
                .map(|(k, v)| if k == from { (to.to_string(), v) } else { (k, v) })
                .collect();
        }
    }
    debug!(from, to, "column renamed");
    Ok(())
}

pub fn remove_column(table: &mut Table, name: &str) -> Result<()> {
    let idx = table.require_column(name)?;
    table.columns_mut().remove(idx);
    for row in table.rows_mut() {
        row.shift_remove(name);
    }
    debug!(name, "column removed");
    Ok(())
}

/// Settings for the derived month column.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthYearOptions {
    pub column: String,
    pub format: String,
    pub date_formats: Vec<String>,
}

impl Default for MonthYearOptions {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

impl From<&ViewerConfig> for MonthYearOptions {
    fn from(cfg: &ViewerConfig) -> Self {
        Self {
            column: cfg.month_year_column.clone(),
            format: cfg.month_year_format.clone(),
            date_formats: cfg.date_formats.clone(),
        }
    }
}

/// Parses a date cell. Unrecognised text yields `None`.
pub fn parse_date(text: &str, formats: &[String]) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    formats
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
}

fn render_date(date: NaiveDate, format: &str) -> Result<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(format))
        .map_err(|_| ViewerError::InvalidDateFormat(format.to_string()))?;
    Ok(out)
}

/// Derives a month column from `date_column`, placed right after it. Cells
/// that do not parse as a date become empty strings.
pub fn add_month_year(table: &mut Table, date_column: &str, opts: &MonthYearOptions) -> Result<usize> {
    let date_idx = table.require_column(date_column)?;
    if opts.column == date_column {
        return Err(ViewerError::ColumnExists(opts.column.clone()));
    }
    render_date(NaiveDate::default(), &opts.format)?;

    let mut derived = Vec::with_capacity(table.len());
    let mut parsed = 0usize;
    for v in table.column_values(date_column) {
        match parse_date(&value_text(v), &opts.date_formats) {
            Some(d) => {
                parsed += 1;
                derived.push(render_date(d, &opts.format)?);
            }
            None => derived.push(String::new()),
        }
    }

    if !table.has_column(&opts.column) {
        table.columns_mut().insert(date_idx + 1, opts.column.clone());
    }
    for (row, text) in table.rows_mut().iter_mut().zip(derived) {
        insert_after(row, date_column, &opts.column, Value::String(text));
    }
    debug!(date_column, column = %opts.column, parsed, "month column derived");
    Ok(parsed)
}

fn insert_after(row: &mut Record, after: &str, key: &str, value: Value) {
    if let Some(slot) = row.get_mut(key) {
        *slot = value;
        return;
    }
    if !row.contains_key(after) {
        row.insert(key.to_string(), value);
        return;
    }
    let mut value = Some(value);
    let mut rebuilt = Record::new();
    for (k, v) in std::mem::take(row) {
        let hit = k == after;
        rebuilt.insert(k, v);
        if hit {
            if let Some(v) = value.take() {
                rebuilt.insert(key.to_string(), v);
            }
        }
    }
    *row = rebuilt;
}

pub fn set_cell(table: &mut Table, row: usize, column: &str, value: Value) -> Result<()> {
    table.require_column(column)?;
    table.require_row(row)?;
    if let Some(r) = table.rows_mut().get_mut(row) {
        r.insert(column.to_string(), value);
    }
    Ok(())
}

pub fn delete_row(table: &mut Table, row: usize) -> Result<Record> {
    table.require_row(row)?;
    Ok(table.rows_mut().remove(row))
}
