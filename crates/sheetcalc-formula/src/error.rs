//! Formula error types

use sheetcalc_core::CellError;
use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
///
/// None of these escape the engine: each one is folded into the cell's
/// computed value through [`FormulaError::to_cell_error`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Formula evaluation error
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Unknown function
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Circular reference
    #[error("Circular reference detected")]
    CircularReference,

    /// Reference to invalid cell
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Range covers more cells than the evaluator is allowed to expand
    #[error("Range {range} covers {cells} cells, limit is {limit}")]
    RangeTooLarge { range: String, cells: u64, limit: u64 },

    /// Expression nesting exceeds the parser limit
    #[error("Formula nested deeper than {0} levels")]
    TooDeep(usize),
}

impl FormulaError {
    /// The error value a cell displays for this failure
    pub fn to_cell_error(&self) -> CellError {
        match self {
            FormulaError::Parse(_) | FormulaError::UnknownFunction(_) | FormulaError::TooDeep(_) => {
                CellError::Parse
            }
            FormulaError::ArgumentCount { .. } | FormulaError::Argument(_) => CellError::Value,
            FormulaError::InvalidReference(_) | FormulaError::RangeTooLarge { .. } => {
                CellError::Ref
            }
            FormulaError::CircularReference => CellError::Cycle,
            FormulaError::Evaluation(_) => CellError::Eval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_error_mapping() {
        assert_eq!(FormulaError::Parse("x".into()).to_cell_error(), CellError::Parse);
        assert_eq!(FormulaError::UnknownFunction("FOO".into()).to_cell_error(), CellError::Parse);
        assert_eq!(FormulaError::TooDeep(256).to_cell_error(), CellError::Parse);
        assert_eq!(
            FormulaError::ArgumentCount {
                function: "IF".into(),
                expected: "at least 2".into(),
                actual: 1,
            }
            .to_cell_error(),
            CellError::Value
        );
        assert_eq!(FormulaError::Argument("x".into()).to_cell_error(), CellError::Value);
        assert_eq!(
            FormulaError::RangeTooLarge {
                range: "A1:Z100".into(),
                cells: 2600,
                limit: 100,
            }
            .to_cell_error(),
            CellError::Ref
        );
        assert_eq!(FormulaError::CircularReference.to_cell_error(), CellError::Cycle);
        assert_eq!(FormulaError::Evaluation("x".into()).to_cell_error(), CellError::Eval);
    }

    #[test]
    fn test_messages() {
        let err = FormulaError::ArgumentCount {
            function: "ROUND".into(),
            expected: "at most 2".into(),
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Wrong number of arguments for ROUND: expected at most 2, got 3"
        );
    }
}
