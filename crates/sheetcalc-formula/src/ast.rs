//! Formula Abstract Syntax Tree types

use sheetcalc_core::{CellAddress, CellError, CellRange};
use std::collections::BTreeSet;

/// Formula expression AST
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaExpr {
    // === Literals ===
    /// Numeric literal
    Number(f64),
    /// String literal (quoted, or a bare word that is neither a call nor a reference)
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// Error literal
    Error(CellError),

    // === References ===
    /// Single cell reference
    CellRef(CellAddress),
    /// Range reference, kept unexpanded until evaluation
    RangeRef(CellRange),
    /// Address-shaped token outside the addressable space; evaluates to #REF!
    InvalidRef(String),

    // === Operators ===
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<FormulaExpr>,
        right: Box<FormulaExpr>,
    },
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<FormulaExpr>,
    },

    // === Function call ===
    Function {
        name: String,
        args: Vec<FormulaExpr>,
    },
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,

    // Text
    Concat,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
    Percent,
}

/// Cells and ranges a formula reads from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct References {
    pub cells: BTreeSet<CellAddress>,
    pub ranges: BTreeSet<CellRange>,
}

impl References {
    /// Check if nothing is referenced
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.ranges.is_empty()
    }

    /// Check if `addr` is read directly or through one of the ranges
    pub fn covers(&self, addr: &CellAddress) -> bool {
        self.cells.contains(addr) || self.ranges.iter().any(|range| range.contains(addr))
    }
}

impl FormulaExpr {
    /// Collect the precedent set of this expression
    ///
    /// Ranges are reported as ranges; they are never expanded here.
    pub fn references(&self) -> References {
        let mut refs = References::default();
        let mut stack = vec![self];

        while let Some(expr) = stack.pop() {
            match expr {
                FormulaExpr::CellRef(addr) => {
                    refs.cells.insert(*addr);
                }
                FormulaExpr::RangeRef(range) => {
                    refs.ranges.insert(*range);
                }
                FormulaExpr::BinaryOp { left, right, .. } => {
                    stack.push(left);
                    stack.push(right);
                }
                FormulaExpr::UnaryOp { operand, .. } => stack.push(operand),
                FormulaExpr::Function { args, .. } => stack.extend(args.iter()),
                FormulaExpr::Number(_)
                | FormulaExpr::String(_)
                | FormulaExpr::Boolean(_)
                | FormulaExpr::Error(_)
                | FormulaExpr::InvalidRef(_) => {}
            }
        }

        refs
    }
}

// Long operator chains make the tree deep along one spine; tear it down with
// an explicit stack instead of recursive drop glue.
impl Drop for FormulaExpr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        detach_children(self, &mut pending);
        while let Some(mut expr) = pending.pop() {
            detach_children(&mut expr, &mut pending);
        }
    }
}

fn detach_children(expr: &mut FormulaExpr, pending: &mut Vec<FormulaExpr>) {
    match expr {
        FormulaExpr::BinaryOp { left, right, .. } => {
            pending.push(std::mem::replace(&mut **left, FormulaExpr::Boolean(false)));
            pending.push(std::mem::replace(&mut **right, FormulaExpr::Boolean(false)));
        }
        FormulaExpr::UnaryOp { operand, .. } => {
            pending.push(std::mem::replace(&mut **operand, FormulaExpr::Boolean(false)));
        }
        FormulaExpr::Function { args, .. } => pending.append(args),
        _ => {}
    }
}
