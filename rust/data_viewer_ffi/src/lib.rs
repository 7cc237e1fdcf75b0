//! String-in/string-out facade over [`ViewerCore`] for foreign callers.
//!
//! Every call returns either plain data or an [`FfiResult`] whose error side is
//! the rendered message, so a bridge generator only sees owned primitives.

use data_viewer_core::{Aggregate, Filter, FilterOp, SortOrder, ViewerConfig, ViewerCore};
use serde::{Deserialize, Serialize};

#[cfg(feature = "frb")]
use flutter_rust_bridge::SyncReturn;

pub type FfiResult<T> = Result<T, String>;

/// Summary of the viewer, sent across the boundary after each call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerState {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Default)]
pub struct ViewerHandle {
    core: ViewerCore,
}

fn msg<E: std::fmt::Display>(e: E) -> String {
    e.to_string()
}

impl ViewerHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config_json(config_json: &str) -> FfiResult<Self> {
        let config = ViewerConfig::from_json(config_json).map_err(msg)?;
        Ok(Self { core: ViewerCore::with_config(config) })
    }

    pub fn state(&self) -> ViewerState {
        let table = self.core.table();
        ViewerState {
            columns: table.columns().to_vec(),
            row_count: table.len(),
            can_undo: self.core.can_undo(),
            can_redo: self.core.can_redo(),
        }
    }

    pub fn state_json(&self) -> String {
        serde_json::to_string(&self.state()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Blocking variant of [`state_json`](Self::state_json) for Dart callers
    /// that read the summary on the UI thread.
    #[cfg(feature = "frb")]
    pub fn state_sync(&self) -> SyncReturn<String> {
        SyncReturn(self.state_json())
    }

    pub fn open(&mut self, path: String) -> FfiResult<ViewerState> {
        self.core.load_file(&path).map_err(msg)?;
        Ok(self.state())
    }

    pub fn save(&self, path: String) -> FfiResult<()> {
        self.core.save_file(&path).map_err(msg)
    }

    pub fn rows_json(&self) -> FfiResult<String> {
        self.core.to_json().map_err(msg)
    }

    pub fn aggregate(&mut self, column: String, agg: String) -> FfiResult<f64> {
        let agg: Aggregate = agg.parse().map_err(msg)?;
        self.core.append_aggregate(&column, agg).map(|r| r.value).map_err(msg)
    }

    pub fn filter(&mut self, column: String, op: String, value: String) -> FfiResult<ViewerState> {
        let op: FilterOp = op.parse().map_err(msg)?;
        self.core.filter_rows(&Filter::new(column, op, value)).map_err(msg)?;
        Ok(self.state())
    }

    pub fn sort(&mut self, column: String, order: String) -> FfiResult<()> {
        let order: SortOrder = order.parse().map_err(msg)?;
        self.core.sort_rows(&column, order).map_err(msg)
    }

    pub fn rename(&mut self, from: String, to: String) -> FfiResult<ViewerState> {
        self.core.rename_column(&from, &to).map_err(msg)?;
        Ok(self.state())
    }

    pub fn remove(&mut self, column: String) -> FfiResult<ViewerState> {
        self.core.remove_column(&column).map_err(msg)?;
        Ok(self.state())
    }

    pub fn remove_result_column(&mut self) -> FfiResult<String> {
        self.core.remove_result_column().map_err(msg)
    }

    pub fn set_cell(&mut self, row: usize, column: String, text: String) -> FfiResult<()> {
        self.core.set_cell(row, &column, text.into()).map_err(msg)
    }

    pub fn delete_row(&mut self, row: usize) -> FfiResult<ViewerState> {
        self.core.delete_row(row).map_err(msg)?;
        Ok(self.state())
    }

    pub fn cell_text(&self, row: usize, column: String) -> String {
        self.core.table().cell_text(row, &column)
    }

    pub fn add_month_year(&mut self, date_column: String) -> FfiResult<ViewerState> {
        self.core.add_month_year(&date_column).map_err(msg)?;
        Ok(self.state())
    }

    pub fn undo(&mut self) -> bool {
        self.core.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.core.redo()
    }
}
