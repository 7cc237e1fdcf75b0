pub mod config;
pub mod error;
pub mod history;
pub mod import_export;
pub mod ops;
pub mod table;

use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

pub use config::ViewerConfig;
pub use error::{Result, ViewerError};
pub use history::{Snapshot, SnapshotHistory, DEFAULT_MAX_LEVELS};
pub use ops::{Aggregate, AggregateResult, Filter, FilterOp, MonthYearOptions, SortOrder};
pub use table::{Record, Table};

/// A loaded table together with its undo/redo history.
#[derive(Debug)]
pub struct ViewerCore {
    table: Table,
    history: SnapshotHistory<Table>,
    config: ViewerConfig,
    result_column: Option<String>,
}

impl Default for ViewerCore {
    fn default() -> Self {
        Self::new_empty()
    }
}

impl ViewerCore {
    pub fn new_empty() -> Self {
        Self::with_config(ViewerConfig::default())
    }

    pub fn with_config(config: ViewerConfig) -> Self {
        Self {
            table: Table::new(),
            history: SnapshotHistory::new(config.max_undo_levels),
            config,
            result_column: None,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn history(&self) -> &SnapshotHistory<Table> {
        &self.history
    }

    // Loading replaces the document, so history from the previous one is dropped.
    pub fn load_table(&mut self, table: Table) {
        info!(rows = table.len(), columns = table.columns().len(), "document replaced");
        self.table = table;
        self.result_column = None;
        self.history.clear();
    }

    pub fn load_csv(&mut self, text: &str) -> Result<()> {
        let table = import_export::from_csv(text)?;
        self.load_table(table);
        Ok(())
    }

    pub fn load_json(&mut self, text: &str) -> Result<()> {
        let table = import_export::from_json(text)?;
        self.load_table(table);
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let table = import_export::read_file(path)?;
        self.load_table(table);
        Ok(())
    }

    pub fn save_file(&self, path: impl AsRef<Path>) -> Result<()> {
        import_export::write_file(path, &self.table)
    }

    pub fn to_json(&self) -> Result<String> {
        import_export::to_json(&self.table)
    }

    pub fn to_csv(&self) -> String {
        import_export::to_csv(&self.table)
    }

    pub fn to_html(&self) -> String {
        import_export::to_html(&self.table)
    }

    pub fn to_markdown(&self) -> String {
        import_export::to_markdown(&self.table)
    }

    pub fn aggregate(&self, column: &str, agg: Aggregate) -> Result<f64> {
        ops::aggregate(&self.table, column, agg)
    }

    /// Snapshots the current table and applies `edit`. The snapshot is recorded
    /// only when `edit` succeeds; on error both stacks are left as they were.
    fn edit<R>(&mut self, name: &str, edit: impl FnOnce(&mut Table) -> Result<R>) -> Result<R> {
        let before = self.table.snapshot();
        let out = edit(&mut self.table)?;
        self.history.record(&before);
        debug!(op = name, undo_depth = self.history.undo_depth(), "edit");
        Ok(out)
    }

    pub fn append_aggregate(&mut self, column: &str, agg: Aggregate) -> Result<AggregateResult> {
        let res = self.edit("aggregate", |t| ops::append_aggregate(t, column, agg))?;
        self.result_column = Some(res.column.clone());
        Ok(res)
    }

    /// Name of the column written by the latest [`append_aggregate`](Self::append_aggregate).
    pub fn result_column(&self) -> Option<&str> {
        self.result_column.as_deref()
    }

    /// Removes the latest aggregate result column and returns its name.
    pub fn remove_result_column(&mut self) -> Result<String> {
        let name = self.result_column.clone().ok_or(ViewerError::NoResultColumn)?;
        self.remove_column(&name)?;
        Ok(name)
    }

    pub fn filter_rows(&mut self, filter: &Filter) -> Result<usize> {
        self.edit("filter", |t| ops::filter_rows(t, filter))
    }

    pub fn sort_rows(&mut self, column: &str, order: SortOrder) -> Result<()> {
        self.edit("sort", |t| ops::sort_rows(t, column, order))
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        self.edit("rename", |t| ops::rename_column(t, from, to))
    }

    pub fn remove_column(&mut self, name: &str) -> Result<()> {
        self.edit("remove", |t| ops::remove_column(t, name))?;
        if self.result_column.as_deref() == Some(name) {
            self.result_column = None;
        }
        Ok(())
    }

    pub fn add_month_year(&mut self, date_column: &str) -> Result<usize> {
        let opts = MonthYearOptions::from(&self.config);
        self.edit("month_year", |t| ops::add_month_year(t, date_column, &opts))
    }

    pub fn set_cell(&mut self, row: usize, column: &str, value: Value) -> Result<()> {
        self.edit("set_cell", |t| ops::set_cell(t, row, column, value))
    }

    pub fn delete_row(&mut self, row: usize) -> Result<Record> {
        self.edit("delete_row", |t| ops::delete_row(t, row))
    }

    // History
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo_in_place(&mut self.table)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo_in_place(&mut self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Region,Date,Amount\nNorth,2024-01-15,10\nSouth,2024-02-03,5\n";

    fn loaded() -> ViewerCore {
        let mut core = ViewerCore::new_empty();
        core.load_csv(CSV).unwrap();
        core
    }

    #[test]
    fn edits_are_undoable_and_redoable() {
        let mut core = loaded();
        let original = core.table().clone();

        core.sort_rows("Amount", SortOrder::Ascending).unwrap();
        let sorted = core.table().clone();
        core.remove_column("Date").unwrap();
        assert_eq!(core.table().columns(), &["Region", "Amount"]);

        assert!(core.undo());
        assert_eq!(core.table(), &sorted);
        assert!(core.undo());
        assert_eq!(core.table(), &original);
        assert!(!core.undo());

        assert!(core.redo());
        assert_eq!(core.table(), &sorted);
        assert!(core.redo());
        assert!(!core.table().has_column("Date"));
        assert!(!core.redo());
    }

    #[test]
    fn loading_resets_history() {
        let mut core = loaded();
        core.rename_column("Region", "Area").unwrap();
        assert!(core.can_undo());

        core.load_json(r#"[{"x": 1}]"#).unwrap();
        assert!(!core.can_undo());
        assert!(!core.can_redo());
        assert!(!core.undo());
        assert_eq!(core.table().columns(), &["x"]);
    }

    #[test]
    fn failed_edit_is_not_recorded() {
        let mut core = loaded();
        let before = core.table().clone();
        assert!(core.remove_column("Missing").is_err());
        assert_eq!(core.table(), &before);
        assert!(!core.can_undo());
        assert!(!core.undo());
    }

    #[test]
    fn failed_edit_keeps_redo_branch() {
        let mut core = loaded();
        core.remove_column("Date").unwrap();
        assert!(core.undo());
        assert!(core.can_redo());

        assert!(core.remove_column("Missing").is_err());
        assert!(core.can_redo());
        assert!(core.redo());
        assert!(!core.table().has_column("Date"));
    }

    #[test]
    fn failed_edit_does_not_evict_real_history() {
        let cfg = ViewerConfig { max_undo_levels: 1, ..Default::default() };
        let mut core = ViewerCore::with_config(cfg);
        core.load_csv(CSV).unwrap();
        core.remove_column("Date").unwrap();

        assert!(core.append_aggregate("Nope", Aggregate::Sum).is_err());
        assert!(core.append_aggregate("Region", Aggregate::Sum).is_err());
        assert_eq!(core.history().undo_depth(), 1);
        assert!(core.undo());
        assert!(core.table().has_column("Date"));
    }

    #[test]
    fn result_column_can_be_removed_without_naming_it() {
        let mut core = loaded();
        assert!(matches!(core.remove_result_column(), Err(ViewerError::NoResultColumn)));

        core.append_aggregate("Amount", Aggregate::Sum).unwrap();
        assert_eq!(core.result_column(), Some("Amount_sum"));
        assert_eq!(core.remove_result_column().unwrap(), "Amount_sum");
        assert!(!core.table().has_column("Amount_sum"));
        assert_eq!(core.result_column(), None);

        assert!(core.undo());
        assert!(core.table().has_column("Amount_sum"));
    }

    #[test]
    fn new_edit_drops_redo_branch() {
        let mut core = loaded();
        core.append_aggregate("Amount", Aggregate::Sum).unwrap();
        assert!(core.undo());
        assert!(core.can_redo());
        core.add_month_year("Date").unwrap();
        assert!(!core.can_redo());
        assert_eq!(core.table().cell_text(1, "MonthYear"), "2024-02");
    }

    #[test]
    fn undo_depth_follows_config() {
        let cfg = ViewerConfig { max_undo_levels: 2, ..Default::default() };
        let mut core = ViewerCore::with_config(cfg);
        core.load_csv(CSV).unwrap();
        core.set_cell(0, "Amount", Value::from("1")).unwrap();
        core.set_cell(0, "Amount", Value::from("2")).unwrap();
        core.set_cell(0, "Amount", Value::from("3")).unwrap();
        assert_eq!(core.history().undo_depth(), 2);

        assert!(core.undo());
        assert!(core.undo());
        assert!(!core.undo());
        assert_eq!(core.table().cell_text(0, "Amount"), "1");
    }

    #[test]
    fn queries_do_not_record() {
        let core = loaded();
        assert_eq!(core.aggregate("Amount", Aggregate::Mean).unwrap(), 7.5);
        assert!(!core.can_undo());
        assert!(core.to_markdown().starts_with("| Region |"));
        assert!(core.to_csv().starts_with("Region,Date,Amount\n"));
    }
}
