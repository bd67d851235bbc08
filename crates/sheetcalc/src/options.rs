//! Engine configuration

use serde::{Deserialize, Serialize};
use sheetcalc_core::{DEFAULT_COLS, DEFAULT_ROWS};
use sheetcalc_formula::DEFAULT_MAX_RANGE_CELLS;

/// Options for an [`crate::Engine`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Rows shown by the UI (default: 100)
    pub rows: u32,
    /// Columns shown by the UI (default: 26)
    pub cols: u16,
    /// Ranges larger than this evaluate to #REF! (default: 1 000 000)
    pub max_range_cells: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }
}

impl EngineOptions {
    /// Set the grid bounds
    pub fn with_bounds(mut self, rows: u32, cols: u16) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Set the range expansion limit
    pub fn with_max_range_cells(mut self, limit: u64) -> Self {
        self.max_range_cells = limit;
        self
    }
}
