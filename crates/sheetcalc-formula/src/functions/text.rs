//! Text functions

use super::flatten;
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};

/// CONCAT(text1, ...) - Joins the textual form of every operand, ranges included
pub fn fn_concat(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut out = String::new();
    for value in flatten(args) {
        if let FormulaValue::Error(e) = value {
            return Ok(FormulaValue::Error(*e));
        }
        out.push_str(&value.as_string());
    }
    Ok(FormulaValue::String(out))
}
