//! Math functions
//!
//! Coercion differs per function: SUM and the mean functions count anything
//! that is not a number as 0, MIN/MAX/COUNT only look at real numbers.

use super::{arg, flatten};
use crate::error::FormulaResult;
use crate::evaluator::{EvaluationContext, FormulaValue};

/// SUM function
pub fn fn_sum(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut sum = 0.0;

    for value in flatten(args) {
        match value {
            FormulaValue::Error(e) => return Ok(FormulaValue::Error(*e)),
            other => sum += other.as_number().unwrap_or(0.0),
        }
    }

    Ok(FormulaValue::number(sum))
}

/// AVG / AVERAGE / MEDIA function
///
/// Every operand counts, empty and textual ones as 0. No operands at all
/// gives 0 rather than a division error.
pub fn fn_average(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let mut sum = 0.0;
    let mut count = 0usize;

    for value in flatten(args) {
        match value {
            FormulaValue::Error(e) => return Ok(FormulaValue::Error(*e)),
            other => {
                sum += other.as_number().unwrap_or(0.0);
                count += 1;
            }
        }
    }

    if count == 0 {
        Ok(FormulaValue::Number(0.0))
    } else {
        Ok(FormulaValue::number(sum / count as f64))
    }
}

/// MIN function
pub fn fn_min(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    extremum(args, f64::min)
}

/// MAX function
pub fn fn_max(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    extremum(args, f64::max)
}

fn extremum(args: &[FormulaValue], pick: fn(f64, f64) -> f64) -> FormulaResult<FormulaValue> {
    let mut best: Option<f64> = None;

    for value in flatten(args) {
        match value {
            FormulaValue::Number(n) => best = Some(best.map_or(*n, |b| pick(b, *n))),
            FormulaValue::Error(e) => return Ok(FormulaValue::Error(*e)),
            _ => {} // Ignore non-numeric
        }
    }

    Ok(FormulaValue::Number(best.unwrap_or(0.0)))
}

/// COUNT function
pub fn fn_count(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let count = flatten(args)
        .filter(|value| matches!(value, FormulaValue::Number(_)))
        .count();

    Ok(FormulaValue::Number(count as f64))
}

/// ABS function
pub fn fn_abs(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match arg(args, 0, "ABS")?.coerce_number() {
        Ok(n) => Ok(FormulaValue::Number(n.abs())),
        Err(e) => Ok(FormulaValue::Error(e)),
    }
}

/// ROUND(number, [num_digits])
///
/// Rounds half away from zero; negative digits round left of the decimal point.
pub fn fn_round(args: &[FormulaValue], _ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    let number = match arg(args, 0, "ROUND")?.coerce_number() {
        Ok(n) => n,
        Err(e) => return Ok(FormulaValue::Error(e)),
    };

    let num_digits = match args.get(1).map(FormulaValue::coerce_number) {
        Some(Ok(n)) => n.trunc().clamp(-308.0, 308.0) as i32,
        Some(Err(e)) => return Ok(FormulaValue::Error(e)),
        None => 0,
    };

    let result = if num_digits >= 0 {
        let multiplier = 10_f64.powi(num_digits);
        let scaled = number * multiplier;
        // Past 2^52 an f64 has no fractional part left to round
        if !scaled.is_finite() || scaled.abs() >= 4_503_599_627_370_496.0 {
            number
        } else {
            scaled.round() / multiplier
        }
    } else {
        let divisor = 10_f64.powi(-num_digits);
        (number / divisor).round() * divisor
    };

    if result.is_finite() {
        Ok(FormulaValue::Number(result))
    } else {
        Ok(FormulaValue::Number(number))
    }
}
