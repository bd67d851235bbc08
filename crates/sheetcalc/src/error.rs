//! Error types for the sheetcalc engine API

use sheetcalc_formula::FormulaError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`crate::Engine`] methods
///
/// Bad formulas never show up here; they become error values in the
/// affected cells.
#[derive(Debug, Error)]
pub enum Error {
    /// Address, range or record lookup failure
    #[error(transparent)]
    Core(#[from] sheetcalc_core::Error),

    /// Formula-level failure surfaced through a read API
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Reading or writing a document failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted document could not be encoded or decoded
    #[error("Invalid document: {0}")]
    Document(#[from] serde_json::Error),
}
