use wasm_bindgen::prelude::*;
use data_viewer_core::{Aggregate, Filter, FilterOp, SortOrder, ViewerConfig, ViewerCore, ViewerError};

fn js_err(e: ViewerError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct Viewer {
    core: ViewerCore,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Viewer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Viewer {
        Viewer { core: ViewerCore::new_empty() }
    }

    pub fn with_config(config_json: String) -> Result<Viewer, JsValue> {
        let config = ViewerConfig::from_json(&config_json).map_err(js_err)?;
        Ok(Viewer { core: ViewerCore::with_config(config) })
    }

    // Loading
    pub fn load_csv(&mut self, text: String) -> Result<(), JsValue> { self.core.load_csv(&text).map_err(js_err) }
    pub fn load_json(&mut self, text: String) -> Result<(), JsValue> { self.core.load_json(&text).map_err(js_err) }

    // Export
    pub fn to_json(&self) -> Result<String, JsValue> { self.core.to_json().map_err(js_err) }
    pub fn to_csv(&self) -> String { self.core.to_csv() }
    pub fn to_html(&self) -> String { self.core.to_html() }
    pub fn to_markdown(&self) -> String { self.core.to_markdown() }

    pub fn columns(&self) -> Vec<String> { self.core.table().columns().to_vec() }
    pub fn row_count(&self) -> u32 { self.core.table().len() as u32 }
    pub fn cell_text(&self, row: u32, column: String) -> String { self.core.table().cell_text(row as usize, &column) }

    // Column ops
    pub fn aggregate(&self, column: String, agg: String) -> Result<f64, JsValue> {
        let agg: Aggregate = agg.parse().map_err(js_err)?;
        self.core.aggregate(&column, agg).map_err(js_err)
    }
    pub fn append_aggregate(&mut self, column: String, agg: String) -> Result<String, JsValue> {
        let agg: Aggregate = agg.parse().map_err(js_err)?;
        self.core.append_aggregate(&column, agg).map(|r| r.column).map_err(js_err)
    }
    pub fn filter_rows(&mut self, column: String, op: String, value: String) -> Result<u32, JsValue> {
        let op: FilterOp = op.parse().map_err(js_err)?;
        self.core.filter_rows(&Filter::new(column, op, value)).map(|n| n as u32).map_err(js_err)
    }
    pub fn sort_rows(&mut self, column: String, ascending: bool) -> Result<(), JsValue> {
        let order = if ascending { SortOrder::Ascending } else { SortOrder::Descending };
        self.core.sort_rows(&column, order).map_err(js_err)
    }
    pub fn rename_column(&mut self, from: String, to: String) -> Result<(), JsValue> { self.core.rename_column(&from, &to).map_err(js_err) }
    pub fn remove_column(&mut self, name: String) -> Result<(), JsValue> { self.core.remove_column(&name).map_err(js_err) }
    pub fn remove_result_column(&mut self) -> Result<String, JsValue> { self.core.remove_result_column().map_err(js_err) }
    pub fn add_month_year(&mut self, date_column: String) -> Result<u32, JsValue> {
        self.core.add_month_year(&date_column).map(|n| n as u32).map_err(js_err)
    }
    pub fn set_cell(&mut self, row: u32, column: String, text: String) -> Result<(), JsValue> {
        self.core.set_cell(row as usize, &column, text.into()).map_err(js_err)
    }
    pub fn delete_row(&mut self, row: u32) -> Result<(), JsValue> { self.core.delete_row(row as usize).map(|_| ()).map_err(js_err) }

    // History
    pub fn undo(&mut self) -> bool { self.core.undo() }
    pub fn redo(&mut self) -> bool { self.core.redo() }
    pub fn can_undo(&self) -> bool { self.core.can_undo() }
    pub fn can_redo(&self) -> bool { self.core.can_redo() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn wasm_sanity() {
        let mut v = Viewer::new();
        v.load_csv("a,b\n1,x\n2,y\n".to_string()).unwrap();
        v.sort_rows("a".to_string(), false).unwrap();
        assert_eq!(v.cell_text(0, "a".to_string()), "2");
        assert!(v.undo());
        assert_eq!(v.cell_text(0, "a".to_string()), "1");
        assert!(!v.undo());
    }
}
