//! Line-oriented front end for the data viewer.
//!
//! Each input line is one command. Commands that change the table go through
//! [`ViewerCore`], so they can be undone and redone.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::Parser;
use data_viewer_core::{
    Aggregate, Filter, FilterOp, Result, SortOrder, ViewerConfig, ViewerCore, ViewerError,
};
use tracing::{debug, warn};

#[derive(Debug, Parser)]
#[command(name = "data-viewer", about = "Load a CSV/JSON table, edit it, undo and redo", version)]
pub struct Cli {
    /// File to open on start.
    pub file: Option<PathBuf>,

    /// JSON settings file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the number of retained undo steps.
    #[arg(long)]
    pub max_undo: Option<usize>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

impl Cli {
    pub fn viewer_config(&self) -> Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(n) = self.max_undo {
            config.max_undo_levels = n;
        }
        Ok(config)
    }
}

pub const HELP: &str = "\
commands:
  open <path>                    load a .csv or .json file (clears history)
  save <path>                    write the table as .csv or .json
  show                           print the table
  sum|mean|min|max|count <col>   add a <col>_<agg> result column
  filter <col> <op> <value>      keep matching rows (== != > >= < <= contains)
  sort <col> [asc|desc]          sort rows by a column
  rename <old> <new>             rename a column
  remove [<col>]                 remove a column (default: the last result column)
  monthyear <date-col>           add a MonthYear column derived from a date column
  set <row> <col> <value>        edit one cell (rows start at 1)
  delrow <row>                   delete a row (rows start at 1)
  undo | redo                    step through edit history
  help | quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open(PathBuf),
    Save(PathBuf),
    Show,
    Aggregate(Aggregate, String),
    Filter(Filter),
    Sort(String, SortOrder),
    Rename(String, String),
    Remove(String),
    RemoveResult,
    MonthYear(String),
    Set(usize, String, String),
    DeleteRow(usize),
    Undo,
    Redo,
    Help,
    Quit,
}

fn arg<'a>(parts: &mut impl Iterator<Item = &'a str>, what: &str) -> std::result::Result<&'a str, String> {
    parts.next().filter(|s| !s.is_empty()).ok_or_else(|| format!("missing {what}"))
}

fn required<'a>(s: &'a str, what: &str) -> std::result::Result<&'a str, String> {
    if s.is_empty() {
        Err(format!("missing {what}"))
    } else {
        Ok(s)
    }
}

fn row_number(s: &str) -> std::result::Result<usize, String> {
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("invalid row number: {s}")),
    }
}

impl Command {
    pub fn parse(line: &str) -> std::result::Result<Command, String> {
        let line = line.trim();
        let (name, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let mut parts = rest.split_whitespace();

        let cmd = match name.to_ascii_lowercase().as_str() {
            "open" | "load" => Command::Open(PathBuf::from(required(rest, "path")?)),
            "save" => Command::Save(PathBuf::from(required(rest, "path")?)),
            "show" => Command::Show,
            "sum" | "mean" | "min" | "max" | "count" => {
                let agg: Aggregate = name.parse().map_err(|e: ViewerError| e.to_string())?;
                Command::Aggregate(agg, required(rest, "column")?.to_string())
            }
            "filter" => {
                let mut split = rest.splitn(3, char::is_whitespace);
                let column = arg(&mut split, "column")?;
                let op: FilterOp = arg(&mut split, "operator")?
                    .parse()
                    .map_err(|e: ViewerError| e.to_string())?;
                let value = split.next().unwrap_or("").trim();
                Command::Filter(Filter::new(column, op, value))
            }
            "sort" => {
                let column = arg(&mut parts, "column")?.to_string();
                let order = match parts.next() {
                    Some(o) => o.parse().map_err(|e: ViewerError| e.to_string())?,
                    None => SortOrder::Ascending,
                };
                Command::Sort(column, order)
            }
            "rename" => {
                let from = arg(&mut parts, "old column name")?.to_string();
                let to = arg(&mut parts, "new column name")?.to_string();
                Command::Rename(from, to)
            }
            "remove" if rest.is_empty() => Command::RemoveResult,
            "remove" => Command::Remove(rest.to_string()),
            "monthyear" => Command::MonthYear(required(rest, "date column")?.to_string()),
            "set" => {
                let mut split = rest.splitn(3, char::is_whitespace);
                let row = row_number(arg(&mut split, "row")?)?;
                let column = arg(&mut split, "column")?.to_string();
                let value = split.next().unwrap_or("").trim().to_string();
                Command::Set(row, column, value)
            }
            "delrow" => Command::DeleteRow(row_number(arg(&mut parts, "row")?)?),
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(format!("unrecognized command: {other}")),
        };
        Ok(cmd)
    }
}

/// Runs one command and returns the status text to show.
pub fn execute(core: &mut ViewerCore, cmd: Command) -> Result<String> {
    debug!(?cmd, "execute");
    let status = match cmd {
        Command::Open(path) => {
            core.load_file(&path)?;
            let t = core.table();
            format!("Loaded {} rows, {} columns from {}", t.len(), t.columns().len(), path.display())
        }
        Command::Save(path) => {
            core.save_file(&path)?;
            format!("Saved {}", path.display())
        }
        Command::Show => core.to_markdown().trim_end().to_string(),
        Command::Aggregate(agg, column) => {
            let res = core.append_aggregate(&column, agg)?;
            format!("{} = {}", res.column, res.value)
        }
        Command::Filter(filter) => {
            let removed = core.filter_rows(&filter)?;
            format!("Filtered on {}: removed {removed} rows, {} left", filter.column, core.table().len())
        }
        Command::Sort(column, order) => {
            core.sort_rows(&column, order)?;
            format!("Sorted by {column} ({order:?})")
        }
        Command::Rename(from, to) => {
            core.rename_column(&from, &to)?;
            format!("Renamed {from} -> {to}")
        }
        Command::Remove(column) => {
            core.remove_column(&column)?;
            format!("Removed column {column}")
        }
        Command::RemoveResult => {
            let column = core.remove_result_column()?;
            format!("Removed column {column}")
        }
        Command::MonthYear(column) => {
            let parsed = core.add_month_year(&column)?;
            format!("Added {} ({parsed} dates parsed)", core.config().month_year_column)
        }
        Command::Set(row, column, value) => {
            core.set_cell(row, &column, value.into())?;
            format!("Updated row {} {column}", row + 1)
        }
        Command::DeleteRow(row) => {
            core.delete_row(row)?;
            format!("Deleted row {}", row + 1)
        }
        Command::Undo => {
            if core.can_undo() && core.undo() {
                "Undone".to_string()
            } else {
                "Nothing to undo".to_string()
            }
        }
        Command::Redo => {
            if core.can_redo() && core.redo() {
                "Redone".to_string()
            } else {
                "Nothing to redo".to_string()
            }
        }
        Command::Help => HELP.to_string(),
        Command::Quit => String::new(),
    };
    Ok(status)
}

/// Reads commands until `quit` or end of input. Command failures are reported
/// and the session continues.
pub fn run_session<R: BufRead, W: Write>(core: &mut ViewerCore, input: R, mut out: W) -> std::io::Result<()> {
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let cmd = match Command::parse(&line) {
            Ok(cmd) => cmd,
            Err(e) => {
                writeln!(out, "Error: {e}")?;
                continue;
            }
        };
        if cmd == Command::Quit {
            break;
        }
        match execute(core, cmd) {
            Ok(status) => writeln!(out, "{status}")?,
            Err(e) => {
                warn!(error = %e, "command failed");
                writeln!(out, "Error: {e}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(core: &mut ViewerCore, script: &str) -> String {
        let mut out = Vec::new();
        run_session(core, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parse_commands() {
        assert_eq!(Command::parse("undo").unwrap(), Command::Undo);
        assert_eq!(
            Command::parse("filter Region contains th").unwrap(),
            Command::Filter(Filter::new("Region", FilterOp::Contains, "th"))
        );
        assert_eq!(
            Command::parse("set 2 Note hello world").unwrap(),
            Command::Set(1, "Note".into(), "hello world".into())
        );
        assert_eq!(
            Command::parse("sort Amount desc").unwrap(),
            Command::Sort("Amount".into(), SortOrder::Descending)
        );
        assert_eq!(
            Command::parse("mean Unit Price").unwrap(),
            Command::Aggregate(Aggregate::Mean, "Unit Price".into())
        );
        assert_eq!(Command::parse("remove").unwrap(), Command::RemoveResult);
        assert_eq!(Command::parse("remove Unit Price").unwrap(), Command::Remove("Unit Price".into()));
        assert!(Command::parse("set 0 a b").is_err());
        assert!(Command::parse("rename only").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn session_undo_redo() {
        let mut core = ViewerCore::new_empty();
        core.load_csv("a,b\n3,x\n1,y\n").unwrap();
        let out = run(&mut core, "undo\nsort a\nremove b\nundo\nundo\nundo\nredo\nquit\nremove a\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            [
                "Nothing to undo",
                "Sorted by a (Ascending)",
                "Removed column b",
                "Undone",
                "Undone",
                "Nothing to undo",
                "Redone",
            ]
        );
        assert_eq!(core.table().cell_text(0, "a"), "1");
        assert!(core.table().has_column("b"));
    }

    #[test]
    fn session_reports_errors_and_continues() {
        let mut core = ViewerCore::new_empty();
        core.load_csv("a\nx\n").unwrap();
        let out = run(&mut core, "sum a\ncount a\n");
        assert!(out.starts_with("Error: column a: value \"x\" in row 0 is not numeric"));
        assert!(out.contains("a_count = 1"));
    }

    #[test]
    fn failed_command_keeps_redo_and_remove_defaults_to_result() {
        let mut core = ViewerCore::new_empty();
        core.load_csv("a,b\n3,x\n1,y\n").unwrap();
        let out = run(&mut core, "remove\nsum a\nundo\nremove zz\nredo\nremove\nundo\n");
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines,
            [
                "Error: no result column to remove",
                "a_sum = 4",
                "Undone",
                "Error: column not found: zz",
                "Redone",
                "Removed column a_sum",
                "Undone",
            ]
        );
        assert!(core.table().has_column("a_sum"));
    }

    #[test]
    fn max_undo_override() {
        let cli = Cli::parse_from(["data-viewer", "--max-undo", "3"]);
        assert_eq!(cli.viewer_config().unwrap().max_undo_levels, 3);
    }
}
