//! Viewer settings, loadable from a JSON file.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::history::DEFAULT_MAX_LEVELS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    #[serde(default = "default_max_undo_levels")]
    pub max_undo_levels: usize,

    #[serde(default = "default_month_year_column")]
    pub month_year_column: String,

    /// `chrono` format used to render the derived month column.
    #[serde(default = "default_month_year_format")]
    pub month_year_format: String,

    /// Date layouts tried, in order, when parsing a date column.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

fn default_max_undo_levels() -> usize {
    DEFAULT_MAX_LEVELS
}

fn default_month_year_column() -> String {
    "MonthYear".to_string()
}

fn default_month_year_format() -> String {
    "%Y-%m".to_string()
}

fn default_date_formats() -> Vec<String> {
    ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            max_undo_levels: default_max_undo_levels(),
            month_year_column: default_month_year_column(),
            month_year_format: default_month_year_format(),
            date_formats: default_date_formats(),
        }
    }
}

impl ViewerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let cfg = Self::from_json(&text)?;
        tracing::debug!(path = %path.as_ref().display(), ?cfg, "config loaded");
        Ok(cfg)
    }
}
