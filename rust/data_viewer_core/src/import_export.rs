//! CSV/JSON import and CSV/JSON/HTML/Markdown export.

use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Result, ViewerError};
use crate::table::{value_text, Record, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
}

impl Format {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(ViewerError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Decodes file bytes as UTF-8, falling back to ISO-8859-1.
pub fn decode_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            warn!("input is not valid UTF-8, decoding as ISO-8859-1");
            bytes.iter().map(|&b| b as char).collect()
        }
    }
}

pub fn read_file(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    let text = decode_bytes(&std::fs::read(path)?);
    let table = match format {
        Format::Csv => from_csv(&text)?,
        Format::Json => from_json(&text)?,
    };
    info!(path = %path.display(), rows = table.len(), columns = table.columns().len(), "table loaded");
    Ok(table)
}

pub fn write_file(path: impl AsRef<Path>, table: &Table) -> Result<()> {
    let path = path.as_ref();
    let out = match Format::from_path(path)? {
        Format::Csv => to_csv(table),
        Format::Json => to_json(table)?,
    };
    std::fs::write(path, out)?;
    info!(path = %path.display(), rows = table.len(), "table saved");
    Ok(())
}

/// Splits CSV text into records. Handles quoted fields, doubled quotes and
/// LF, CRLF or bare CR line endings.
fn parse_csv_records(text: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1usize;
    let mut record_line = 1usize;
    let mut chars = text.trim_start_matches('\u{feff}').chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => record.push(std::mem::take(&mut field)),
            '\n' if !in_quotes => {
                record.push(std::mem::take(&mut field));
                records.push((record_line, std::mem::take(&mut record)));
                line += 1;
                record_line = line;
            }
            '\r' if !in_quotes => {
                if chars.peek() != Some(&'\n') {
                    record.push(std::mem::take(&mut field));
                    records.push((record_line, std::mem::take(&mut record)));
                    line += 1;
                    record_line = line;
                }
            }
            '\n' => {
                field.push('\n');
                line += 1;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ViewerError::Csv { line: record_line, message: "unterminated quoted field".into() });
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push((record_line, record));
    }
    Ok(records)
}

pub fn from_csv(text: &str) -> Result<Table> {
    let mut records = parse_csv_records(text)?
        .into_iter()
        .filter(|(_, r)| !(r.len() == 1 && r[0].trim().is_empty()));

    let Some((_, header)) = records.next() else {
        return Ok(Table::new());
    };
    let columns: Vec<String> = header.into_iter().map(|h| h.trim().to_string()).collect();
    for (i, c) in columns.iter().enumerate() {
        if columns[..i].contains(c) {
            return Err(ViewerError::Csv { line: 1, message: format!("duplicate column {c:?}") });
        }
    }

    let mut rows = Vec::new();
    for (line, fields) in records {
        if fields.len() > columns.len() {
            return Err(ViewerError::Csv {
                line,
                message: format!("expected {} fields, found {}", columns.len(), fields.len()),
            });
        }
        let mut fields = fields.into_iter();
        let row: Record = columns
            .iter()
            .map(|c| (c.clone(), Value::String(fields.next().unwrap_or_default())))
            .collect();
        rows.push(row);
    }
    Ok(Table::with_columns(columns, rows))
}

/// An object becomes a one-row table; an array must hold only objects.
pub fn from_json(json: &str) -> Result<Table> {
    let value: Value = serde_json::from_str(json)?;
    let records = match value {
        Value::Object(obj) => vec![obj],
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(obj) => Ok(obj),
                other => Err(ViewerError::InvalidJson(format!("element {i} is not an object: {other}"))),
            })
            .collect::<Result<Vec<_>>>()?,
        other => return Err(ViewerError::InvalidJson(format!("expected object or array, found {other}"))),
    };
    Ok(Table::from_records(records))
}

pub fn to_json(table: &Table) -> Result<String> {
    Ok(serde_json::to_string_pretty(table.rows())?)
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn to_csv(table: &Table) -> String {
    let mut out = String::new();
    let header: Vec<String> = table.columns().iter().map(|c| csv_field(c)).collect();
    out.push_str(&header.join(","));
    out.push('\n');
    for row in table.rows() {
        let line: Vec<String> = table
            .columns()
            .iter()
            .map(|c| csv_field(&row.get(c).map(value_text).unwrap_or_default()))
            .collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

pub fn to_html(table: &Table) -> String {
    let mut out = String::new();
    out.push_str("<table class=\"data\">\n");
    out.push_str("  <thead>\n    <tr>\n");
    for c in table.columns() {
        out.push_str(&format!("      <th>{}</th>\n", html_escape::encode_text(c)));
    }
    out.push_str("    </tr>\n  </thead>\n");
    out.push_str("  <tbody>\n");
    for row in table.rows() {
        out.push_str("    <tr>\n");
        for c in table.columns() {
            let text = row.get(c).map(value_text).unwrap_or_default();
            out.push_str(&format!("      <td>{}</td>\n", html_escape::encode_text(&text)));
        }
        out.push_str("    </tr>\n");
    }
    out.push_str("  </tbody>\n</table>\n");
    out
}

pub fn to_markdown(table: &Table) -> String {
    let mut out = String::new();
    if table.columns().is_empty() {
        return out;
    }
    out.push_str(&gfm_row(table.columns().iter().map(String::as_str)));
    out.push_str(&gfm_separator_row(table.columns().len()));
    for row in table.rows() {
        let cells: Vec<String> = table
            .columns()
            .iter()
            .map(|c| row.get(c).map(value_text).unwrap_or_default())
            .collect();
        out.push_str(&gfm_row(cells.iter().map(String::as_str)));
    }
    out
}

fn gfm_row<'a>(cells: impl Iterator<Item = &'a str>) -> String {
    let mut line = String::new();
    line.push('|');
    for cell in cells {
        line.push(' ');
        line.push_str(&escape_md_cell_text(cell.trim()));
        line.push(' ');
        line.push('|');
    }
    line.push('\n');
    line
}

fn gfm_separator_row(n: usize) -> String {
    let mut line = String::new();
    line.push('|');
    for _ in 0..n {
        line.push_str(" --- |");
    }
    line.push('\n');
    line
}

fn escape_md_cell_text(s: &str) -> String {
    let mut out = String::new();
    for ch in s.chars() {
        match ch {
            '|' => out.push_str("\\|"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("<br>"),
            _ => out.push(ch),
        }
    }
    out
}
