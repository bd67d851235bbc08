//! Logical functions

use super::{arg, flatten};
use crate::ast::FormulaExpr;
use crate::error::FormulaResult;
use crate::evaluator::{evaluate, EvaluationContext, FormulaValue};
use sheetcalc_core::CellError;

/// IF(condition, value_if_true, [value_if_false])
///
/// Only the branch selected by the condition is evaluated. A missing
/// `value_if_false` yields FALSE.
pub fn fn_if(args: &[FormulaExpr], ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let condition = evaluate(arg(args, 0, "IF")?, ctx)?;

    let condition_bool = match condition.truthiness() {
        Ok(b) => b,
        Err(e) => return Ok(FormulaValue::Error(e)),
    };

    if condition_bool {
        evaluate(arg(args, 1, "IF")?, ctx)
    } else {
        match args.get(2) {
            Some(if_false) => evaluate(if_false, ctx),
            None => Ok(FormulaValue::Boolean(false)),
        }
    }
}

/// AND function
pub fn fn_and(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    fold_logical(args, true, |acc, b| acc && b)
}

/// OR function
pub fn fn_or(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    fold_logical(args, false, |acc, b| acc || b)
}

/// Combine every logical operand; empty cells and non-logical text are skipped,
/// and having nothing logical at all is #VALOR!
fn fold_logical(
    args: &[FormulaValue],
    init: bool,
    combine: fn(bool, bool) -> bool,
) -> FormulaResult<FormulaValue> {
    let mut result = init;
    let mut seen = false;

    for value in flatten(args) {
        if let FormulaValue::Error(e) = value {
            return Ok(FormulaValue::Error(*e));
        }
        if let Some(b) = value.as_bool() {
            result = combine(result, b);
            seen = true;
        }
    }

    if seen {
        Ok(FormulaValue::Boolean(result))
    } else {
        Ok(FormulaValue::Error(CellError::Value))
    }
}

/// NOT function
pub fn fn_not(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match arg(args, 0, "NOT")?.truthiness() {
        Ok(b) => Ok(FormulaValue::Boolean(!b)),
        Err(e) => Ok(FormulaValue::Error(e)),
    }
}
