//! # sheetcalc
//!
//! A spreadsheet formula engine: sparse grid storage, a formula parser and
//! evaluator, and dependency-ordered recalculation.
//!
//! ## Features
//!
//! - A1 addressing with bijective column letters
//! - Formulas with arithmetic, comparison, concatenation and ranges
//! - SUM, AVG/AVERAGE/MEDIA, MIN, MAX, COUNT, ABS, ROUND, IF, AND, OR, NOT, CONCAT
//! - Errors as cell values (`#VALOR!`, `#DIV/0!`, `#CICLO!`, `#REF!`, `#ERRO`)
//! - Minimal recomputation of dependents after each edit, with cycle detection
//! - JSON persistence of raw input, style and grid bounds
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc::prelude::*;
//!
//! let mut engine = Engine::new();
//! let addr = |s: &str| CellAddress::parse(s).unwrap();
//!
//! engine.set_cells([(addr("A1"), "10"), (addr("A2"), "0"), (addr("A3"), "=A1/A2")]);
//! assert_eq!(engine.display_value(addr("A3")), "#DIV/0!");
//!
//! engine.set_cell_input(addr("A2"), "4");
//! assert_eq!(engine.value(addr("A3")), &CellValue::Number(2.5));
//! ```

pub mod document;
pub mod engine;
pub mod error;
pub mod options;
pub mod prelude;

pub use document::{SheetDocument, StoredCell};
pub use engine::{Engine, Recalc};
pub use error::{Error, Result};
pub use options::EngineOptions;

// Re-export core types
pub use sheetcalc_core::{
    format_number, CellAddress, CellError, CellRange, CellRecord, CellStyle, CellValue, Grid,
    HorizontalAlignment, DEFAULT_COLS, DEFAULT_ROWS, MAX_COLS, MAX_ROWS,
};

// Re-export formula types
pub use sheetcalc_formula::{
    evaluate, evaluate_cell, parse_formula, parse_input, CellInput, EvaluationContext,
    FormulaError, FormulaExpr, FormulaResult, FormulaValue, References,
};
