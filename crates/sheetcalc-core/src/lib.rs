//! # sheetcalc-core
//!
//! Core data structures for the sheetcalc formula engine.
//!
//! This crate provides the fundamental types used throughout sheetcalc:
//! - [`CellValue`] and [`CellError`] - Computed cell values and error tokens
//! - [`CellAddress`] and [`CellRange`] - A1 addressing and ranges
//! - [`CellStyle`] - Visual attributes stored next to the input
//! - [`Grid`] - Sparse map from address to [`CellRecord`]
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_core::{CellAddress, Grid};
//!
//! let mut grid = Grid::new(100, 26);
//! let addr = CellAddress::parse("B3").unwrap();
//! grid.set_raw_input(addr, "=A1+1");
//!
//! assert_eq!(CellAddress::encode(2, 1), "B3");
//! assert_eq!(grid.raw_input(addr), "=A1+1");
//! ```

pub mod cell;
pub mod error;
pub mod style;

// Re-exports for convenience
pub use cell::{
    format_number, CellAddress, CellError, CellRange, CellRangeIterator, CellRecord, CellValue,
    Grid,
};
pub use error::{Error, Result};
pub use style::{CellStyle, HorizontalAlignment};

/// Maximum number of addressable rows
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of addressable columns (column "XFD")
pub const MAX_COLS: u16 = 16_384;

/// Rows shown by a freshly created grid
pub const DEFAULT_ROWS: u32 = 100;

/// Columns shown by a freshly created grid
pub const DEFAULT_COLS: u16 = 26;
