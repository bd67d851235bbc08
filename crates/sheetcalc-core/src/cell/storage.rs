//! Cell storage implementation
//!
//! Sparse storage for grid cells. Only cells that hold input are stored,
//! using a row-based BTreeMap structure; absent cells read as empty.

use std::collections::BTreeMap;

use super::{CellAddress, CellValue};
use crate::style::CellStyle;

/// Complete data for a single cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellRecord {
    /// What the user typed; the source of truth for the cell
    pub raw_input: String,
    /// Cached result of evaluating `raw_input`
    pub computed_value: CellValue,
    /// Visual style
    pub style: CellStyle,
}

impl CellRecord {
    /// Create a record for raw input that has not been evaluated yet
    pub fn new<S: Into<String>>(raw_input: S) -> Self {
        Self {
            raw_input: raw_input.into(),
            computed_value: CellValue::Empty,
            style: CellStyle::default(),
        }
    }

    /// Create a record with a style
    pub fn with_style<S: Into<String>>(raw_input: S, style: CellStyle) -> Self {
        Self {
            raw_input: raw_input.into(),
            computed_value: CellValue::Empty,
            style,
        }
    }

    /// An empty record, as seen when reading an absent address
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if this record carries no input
    pub fn is_empty(&self) -> bool {
        self.raw_input.is_empty()
    }
}

/// Sparse row-based storage for the grid
///
/// Structure: `BTreeMap<row_index, BTreeMap<col_index, CellRecord>>`.
/// Row and column bounds size the UI only; addressing is not limited by them.
#[derive(Debug, Clone)]
pub struct Grid {
    /// Row index → column map
    rows: BTreeMap<u32, BTreeMap<u16, CellRecord>>,

    /// Number of rows shown by the UI
    row_count: u32,

    /// Number of columns shown by the UI
    col_count: u16,
}

static EMPTY_VALUE: CellValue = CellValue::Empty;

impl Grid {
    /// Create an empty grid with the given display bounds
    pub fn new(row_count: u32, col_count: u16) -> Self {
        Self {
            rows: BTreeMap::new(),
            row_count,
            col_count,
        }
    }

    /// Display bounds as (rows, columns)
    pub fn dimensions(&self) -> (u32, u16) {
        (self.row_count, self.col_count)
    }

    /// Change the display bounds; stored cells are unaffected
    pub fn resize(&mut self, row_count: u32, col_count: u16) {
        self.row_count = row_count;
        self.col_count = col_count;
    }

    /// Get a cell record
    pub fn get(&self, addr: CellAddress) -> Option<&CellRecord> {
        self.rows.get(&addr.row).and_then(|r| r.get(&addr.col))
    }

    /// Get a mutable cell record
    pub fn get_mut(&mut self, addr: CellAddress) -> Option<&mut CellRecord> {
        self.rows.get_mut(&addr.row).and_then(|r| r.get_mut(&addr.col))
    }

    /// Computed value at an address; absent cells are [`CellValue::Empty`]
    pub fn value(&self, addr: CellAddress) -> &CellValue {
        self.get(addr)
            .map(|record| &record.computed_value)
            .unwrap_or(&EMPTY_VALUE)
    }

    /// Raw input at an address; absent cells are ""
    pub fn raw_input(&self, addr: CellAddress) -> &str {
        self.get(addr)
            .map(|record| record.raw_input.as_str())
            .unwrap_or("")
    }

    /// Store a record, returning the previous one
    ///
    /// A record with empty raw input is not stored: the address is cleared.
    pub fn insert(&mut self, addr: CellAddress, record: CellRecord) -> Option<CellRecord> {
        if record.is_empty() {
            return self.remove(addr);
        }
        self.rows.entry(addr.row).or_default().insert(addr.col, record)
    }

    /// Replace the raw input of a cell, creating the record on first write
    ///
    /// The computed value is left untouched until the next evaluation.
    /// Empty input removes the record.
    pub fn set_raw_input(&mut self, addr: CellAddress, raw_input: &str) {
        if raw_input.is_empty() {
            self.remove(addr);
            return;
        }

        match self.get_mut(addr) {
            Some(record) => {
                if record.raw_input != raw_input {
                    record.raw_input = raw_input.to_string();
                }
            }
            None => {
                self.rows
                    .entry(addr.row)
                    .or_default()
                    .insert(addr.col, CellRecord::new(raw_input));
            }
        }
    }

    /// Write a computed value, returning whether it differs from the cached one
    ///
    /// Absent cells are left absent.
    pub fn set_computed(&mut self, addr: CellAddress, value: CellValue) -> bool {
        match self.get_mut(addr) {
            Some(record) if record.computed_value != value => {
                record.computed_value = value;
                true
            }
            _ => false,
        }
    }

    /// Remove a cell
    pub fn remove(&mut self, addr: CellAddress) -> Option<CellRecord> {
        let result = self.rows.get_mut(&addr.row).and_then(|r| r.remove(&addr.col));

        // Clean up empty rows
        if self.rows.get(&addr.row).map_or(false, |r| r.is_empty()) {
            self.rows.remove(&addr.row);
        }

        result
    }

    /// Clear all cells
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Get the number of stored cells
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }

    /// Check if no cells are stored
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get the bounds of used cells
    ///
    /// Returns (min_row, min_col, max_row, max_col) or None if empty
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let min_row = *self.rows.keys().next()?;
        let max_row = *self.rows.keys().next_back()?;

        let mut min_col = u16::MAX;
        let mut max_col = 0u16;

        for row_data in self.rows.values() {
            if let Some(&col) = row_data.keys().next() {
                min_col = min_col.min(col);
            }
            if let Some(&col) = row_data.keys().next_back() {
                max_col = max_col.max(col);
            }
        }

        Some((min_row, min_col, max_row, max_col))
    }

    /// Iterate over all cells in row order
    pub fn iter(&self) -> impl Iterator<Item = (CellAddress, &CellRecord)> {
        self.rows.iter().flat_map(|(&row, cols)| {
            cols.iter()
                .map(move |(&col, record)| (CellAddress::new(row, col), record))
        })
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(crate::DEFAULT_ROWS, crate::DEFAULT_COLS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(text: &str) -> CellAddress {
        CellAddress::parse(text).unwrap()
    }

    #[test]
    fn test_absent_cells_read_empty() {
        let grid = Grid::default();
        assert!(grid.get(a("C7")).is_none());
        assert_eq!(grid.value(a("C7")), &CellValue::Empty);
        assert_eq!(grid.raw_input(a("C7")), "");
    }

    #[test]
    fn test_set_raw_input_creates_lazily() {
        let mut grid = Grid::default();
        grid.set_raw_input(a("B2"), "hello");

        assert_eq!(grid.cell_count(), 1);
        assert_eq!(grid.raw_input(a("B2")), "hello");
        assert_eq!(grid.value(a("B2")), &CellValue::Empty);
    }

    #[test]
    fn test_empty_input_removes_record() {
        let mut grid = Grid::default();
        grid.set_raw_input(a("B2"), "hello");
        grid.set_raw_input(a("B2"), "");

        assert!(grid.is_empty());
        assert!(grid.get(a("B2")).is_none());

        grid.insert(a("C3"), CellRecord::new("x"));
        grid.insert(a("C3"), CellRecord::empty());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_set_raw_input_keeps_style() {
        let mut grid = Grid::default();
        grid.insert(a("A1"), CellRecord::with_style("1", CellStyle::new().bold(true)));
        grid.set_raw_input(a("A1"), "2");

        let record = grid.get(a("A1")).unwrap();
        assert_eq!(record.raw_input, "2");
        assert!(record.style.bold);
    }

    #[test]
    fn test_set_computed_reports_change() {
        let mut grid = Grid::default();
        grid.set_raw_input(a("A1"), "5");

        assert!(grid.set_computed(a("A1"), CellValue::Number(5.0)));
        assert!(!grid.set_computed(a("A1"), CellValue::Number(5.0)));
        assert_eq!(grid.value(a("A1")), &CellValue::Number(5.0));

        // Never creates records
        assert!(!grid.set_computed(a("Z9"), CellValue::Number(1.0)));
        assert!(grid.get(a("Z9")).is_none());
    }

    #[test]
    fn test_used_bounds_and_iteration_order() {
        let mut grid = Grid::new(10, 5);
        assert_eq!(grid.used_bounds(), None);

        grid.set_raw_input(a("C5"), "1");
        grid.set_raw_input(a("B2"), "2");
        grid.set_raw_input(a("D2"), "3");

        assert_eq!(grid.used_bounds(), Some((1, 1, 4, 3)));

        let order: Vec<String> = grid.iter().map(|(addr, _)| addr.to_string()).collect();
        assert_eq!(order, vec!["B2", "D2", "C5"]);
    }

    #[test]
    fn test_dimensions_do_not_bound_addressing() {
        let mut grid = Grid::new(2, 2);
        grid.set_raw_input(a("Z100"), "far away");

        assert_eq!(grid.dimensions(), (2, 2));
        assert_eq!(grid.raw_input(a("Z100")), "far away");

        grid.resize(200, 30);
        assert_eq!(grid.dimensions(), (200, 30));
        assert_eq!(grid.cell_count(), 1);
    }
}
