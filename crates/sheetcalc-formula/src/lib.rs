//! # sheetcalc-formula
//!
//! Formula parser and evaluator for sheetcalc.
//!
//! This crate provides:
//! - Cell input parsing (raw text → literal or AST)
//! - Formula evaluation (AST → value)
//! - Built-in functions (SUM, AVG, IF, CONCAT, ...)
//! - Dependency tracking with cycle detection
//!
//! ## Example
//!
//! ```rust
//! use sheetcalc_formula::{evaluate, parse_formula, EvaluationContext, FormulaValue};
//!
//! let ast = parse_formula("=SUM(1, 2, 3) * 2").unwrap();
//! let result = evaluate(&ast, &EvaluationContext::simple()).unwrap();
//! assert_eq!(result, FormulaValue::Number(12.0));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, References, UnaryOperator};
pub use dependency::{DependencyGraph, RecalcPlan};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, evaluate_cell, EvaluationContext, FormulaValue, DEFAULT_MAX_RANGE_CELLS,
};
pub use functions::{registry, FunctionDef, FunctionRegistry};
pub use parser::{parse_formula, parse_input, parse_number, CellInput, MAX_DEPTH};
