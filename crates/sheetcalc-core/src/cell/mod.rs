//! Cell-related types and utilities
//!
//! This module contains:
//! - [`CellValue`] - The computed value of a cell
//! - [`CellAddress`] - A cell's location (e.g., "A1")
//! - [`CellRange`] - A rectangular block of cells (e.g., "A1:B10")
//! - [`CellRecord`] - Raw input, cached value and style of one cell
//! - [`Grid`] - Sparse storage for all records

mod address;
mod storage;
mod value;

pub use address::{CellAddress, CellRange, CellRangeIterator};
pub use storage::{CellRecord, Grid};
pub use value::{format_number, CellError, CellValue};
