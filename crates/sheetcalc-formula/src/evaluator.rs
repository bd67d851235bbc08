//! Formula evaluator
//!
//! Evaluates formula ASTs against a [`Grid`] to produce values. Cell-level
//! failures (#VALOR!, #DIV/0!, ...) travel as [`FormulaValue::Error`] values;
//! `Err` is reserved for faults that replace the whole result, such as an
//! arity mismatch or an oversized range.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{self, Implementation};
use crate::parser::parse_number;
use sheetcalc_core::{format_number, CellAddress, CellError, CellRange, CellValue, Grid};
use std::cmp::Ordering;

/// Largest range the evaluator expands unless configured otherwise
pub const DEFAULT_MAX_RANGE_CELLS: u64 = 1_000_000;

/// Value types during formula evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    Number(f64),
    String(String),
    Boolean(bool),
    Error(CellError),
    /// Members of a range, rows outer and columns inner
    Range(Vec<FormulaValue>),
    Empty,
}

impl FormulaValue {
    /// Numeric result; non-finite values become #DIV/0!
    pub fn number(n: f64) -> Self {
        if n.is_finite() {
            FormulaValue::Number(n)
        } else {
            FormulaValue::Error(CellError::Div0)
        }
    }

    /// Convert to number, if possible
    ///
    /// Empty is 0 and booleans are 1/0; text converts only when it is
    /// entirely numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            FormulaValue::Boolean(true) => Some(1.0),
            FormulaValue::Boolean(false) => Some(0.0),
            FormulaValue::String(s) => parse_number(s),
            FormulaValue::Empty => Some(0.0),
            _ => None,
        }
    }

    /// Coerce for arithmetic: errors pass through, anything else that has
    /// no numeric reading is #VALOR!
    pub fn coerce_number(&self) -> Result<f64, CellError> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            other => other.as_number().ok_or(CellError::Value),
        }
    }

    /// Convert to boolean, if the value has a logical reading
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FormulaValue::Boolean(b) => Some(*b),
            FormulaValue::Number(n) => Some(*n != 0.0),
            FormulaValue::String(s) => {
                let upper = s.trim().to_uppercase();
                if upper == "TRUE" {
                    Some(true)
                } else if upper == "FALSE" {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Condition value as used by IF and NOT
    ///
    /// Empty and "" are false, numeric text follows its number, and any
    /// other text is #VALOR!.
    pub fn truthiness(&self) -> Result<bool, CellError> {
        match self {
            FormulaValue::Error(e) => Err(*e),
            FormulaValue::Empty => Ok(false),
            FormulaValue::Range(_) => Err(CellError::Value),
            FormulaValue::String(s) if s.trim().is_empty() => Ok(false),
            FormulaValue::String(s) => self
                .as_bool()
                .or_else(|| parse_number(s).map(|n| n != 0.0))
                .ok_or(CellError::Value),
            other => other.as_bool().ok_or(CellError::Value),
        }
    }

    /// Convert to string
    pub fn as_string(&self) -> String {
        match self {
            FormulaValue::Number(n) => format_number(*n),
            FormulaValue::String(s) => s.clone(),
            FormulaValue::Boolean(true) => "TRUE".to_string(),
            FormulaValue::Boolean(false) => "FALSE".to_string(),
            FormulaValue::Error(e) => e.to_string(),
            FormulaValue::Empty => String::new(),
            FormulaValue::Range(_) => CellError::Value.to_string(),
        }
    }

    /// Check if this is an error
    pub fn is_error(&self) -> bool {
        matches!(self, FormulaValue::Error(_))
    }

    /// Get the error if this is one
    pub fn get_error(&self) -> Option<CellError> {
        match self {
            FormulaValue::Error(e) => Some(*e),
            _ => None,
        }
    }

    /// Final value stored in a cell
    ///
    /// A bare reference to an empty cell shows 0 and a range can't be
    /// shown in a single cell.
    pub fn into_cell_value(self) -> CellValue {
        match self {
            FormulaValue::Number(n) if n.is_finite() => CellValue::Number(n),
            FormulaValue::Number(_) => CellValue::Error(CellError::Div0),
            FormulaValue::String(s) => CellValue::Text(s),
            FormulaValue::Boolean(b) => CellValue::Boolean(b),
            FormulaValue::Error(e) => CellValue::Error(e),
            FormulaValue::Empty => CellValue::Number(0.0),
            FormulaValue::Range(_) => CellValue::Error(CellError::Value),
        }
    }
}

impl From<&CellValue> for FormulaValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => FormulaValue::Empty,
            CellValue::Number(n) => FormulaValue::Number(*n),
            CellValue::Text(s) => FormulaValue::String(s.clone()),
            CellValue::Boolean(b) => FormulaValue::Boolean(*b),
            CellValue::Error(e) => FormulaValue::Error(*e),
        }
    }
}

/// Context for formula evaluation
pub struct EvaluationContext<'a> {
    /// Grid that references resolve against
    pub grid: Option<&'a Grid>,
    /// Ranges with more cells than this evaluate to #REF!
    pub max_range_cells: u64,
}

impl<'a> EvaluationContext<'a> {
    /// Create a new evaluation context
    pub fn new(grid: &'a Grid) -> Self {
        Self {
            grid: Some(grid),
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }

    /// Create a simple context without a grid (for testing)
    pub fn simple() -> Self {
        Self {
            grid: None,
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }

    /// Set the range expansion limit
    pub fn with_max_range_cells(mut self, limit: u64) -> Self {
        self.max_range_cells = limit;
        self
    }

    /// Current value of a cell; absent cells are empty
    pub fn cell_value(&self, addr: CellAddress) -> FormulaValue {
        match self.grid {
            Some(grid) => grid.value(addr).into(),
            None => FormulaValue::Empty,
        }
    }

    /// Current values of every cell in a range, read in one pass
    pub fn range_values(&self, range: CellRange) -> FormulaResult<FormulaValue> {
        let cells = range.cell_count();
        if cells > self.max_range_cells {
            return Err(FormulaError::RangeTooLarge {
                range: range.to_string(),
                cells,
                limit: self.max_range_cells,
            });
        }

        Ok(FormulaValue::Range(
            range.cells().map(|addr| self.cell_value(addr)).collect(),
        ))
    }
}

/// Evaluate a formula expression
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FormulaValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FormulaValue::number(*n)),
        FormulaExpr::String(s) => Ok(FormulaValue::String(s.clone())),
        FormulaExpr::Boolean(b) => Ok(FormulaValue::Boolean(*b)),
        FormulaExpr::Error(e) => Ok(FormulaValue::Error(*e)),

        // === References ===
        FormulaExpr::CellRef(addr) => Ok(ctx.cell_value(*addr)),
        FormulaExpr::RangeRef(range) => ctx.range_values(*range),
        FormulaExpr::InvalidRef(_) => Ok(FormulaValue::Error(CellError::Ref)),

        // === Operators ===
        FormulaExpr::BinaryOp { .. } => evaluate_operator_chain(expr, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Evaluate an expression all the way to the value a cell stores
///
/// Faults become the matching error value, so this never fails.
pub fn evaluate_cell(expr: &FormulaExpr, ctx: &EvaluationContext) -> CellValue {
    match evaluate(expr, ctx) {
        Ok(value) => value.into_cell_value(),
        Err(err) => CellValue::Error(err.to_cell_error()),
    }
}

/// Evaluate a left-nested run of binary operations
///
/// `A1+A2+A3` nests to the left, so the spine is walked in a loop and only
/// the right-hand operands recurse.
fn evaluate_operator_chain(
    expr: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let mut spine = Vec::new();
    let mut leftmost = expr;
    while let FormulaExpr::BinaryOp { op, left, right } = leftmost {
        spine.push((*op, &**right));
        leftmost = &**left;
    }

    let mut acc = evaluate(leftmost, ctx)?;
    for (op, right) in spine.into_iter().rev() {
        let right_val = evaluate(right, ctx)?;
        acc = evaluate_binary_op(op, acc, right_val)?;
    }
    Ok(acc)
}

/// Apply a binary operator to evaluated operands
fn evaluate_binary_op(
    op: BinaryOperator,
    left_val: FormulaValue,
    right_val: FormulaValue,
) -> FormulaResult<FormulaValue> {
    // Propagate errors
    if let Some(e) = left_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }
    if let Some(e) = right_val.get_error() {
        return Ok(FormulaValue::Error(e));
    }

    match op {
        // Arithmetic operators
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide
        | BinaryOperator::Power => {
            let (l, r) = match (left_val.coerce_number(), right_val.coerce_number()) {
                (Ok(l), Ok(r)) => (l, r),
                (Err(e), _) | (_, Err(e)) => return Ok(FormulaValue::Error(e)),
            };

            Ok(match op {
                BinaryOperator::Add => FormulaValue::number(l + r),
                BinaryOperator::Subtract => FormulaValue::number(l - r),
                BinaryOperator::Multiply => FormulaValue::number(l * r),
                BinaryOperator::Divide if r == 0.0 => FormulaValue::Error(CellError::Div0),
                BinaryOperator::Divide => FormulaValue::number(l / r),
                _ => FormulaValue::number(l.powf(r)),
            })
        }

        // Comparison operators
        BinaryOperator::Equal
        | BinaryOperator::NotEqual
        | BinaryOperator::LessThan
        | BinaryOperator::LessEqual
        | BinaryOperator::GreaterThan
        | BinaryOperator::GreaterEqual => {
            if matches!(left_val, FormulaValue::Range(_)) || matches!(right_val, FormulaValue::Range(_))
            {
                return Ok(FormulaValue::Error(CellError::Value));
            }

            let ordering = compare_values(&left_val, &right_val);
            let result = match op {
                BinaryOperator::Equal => ordering == Ordering::Equal,
                BinaryOperator::NotEqual => ordering != Ordering::Equal,
                BinaryOperator::LessThan => ordering == Ordering::Less,
                BinaryOperator::LessEqual => ordering != Ordering::Greater,
                BinaryOperator::GreaterThan => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(FormulaValue::Boolean(result))
        }

        // Concatenation
        BinaryOperator::Concat => {
            if matches!(left_val, FormulaValue::Range(_)) || matches!(right_val, FormulaValue::Range(_))
            {
                return Ok(FormulaValue::Error(CellError::Value));
            }
            let l = left_val.as_string();
            let r = right_val.as_string();
            Ok(FormulaValue::String(l + &r))
        }
    }
}

/// Compare two values for ordering
///
/// Empty takes the type of the other side (0, "" or FALSE). Text compares
/// case-insensitively; across types numbers sort before text before booleans.
fn compare_values(left: &FormulaValue, right: &FormulaValue) -> Ordering {
    fn blank_like(other: &FormulaValue) -> FormulaValue {
        match other {
            FormulaValue::String(_) => FormulaValue::String(String::new()),
            FormulaValue::Boolean(_) => FormulaValue::Boolean(false),
            _ => FormulaValue::Number(0.0),
        }
    }

    fn type_rank(value: &FormulaValue) -> u8 {
        match value {
            FormulaValue::Number(_) => 0,
            FormulaValue::String(_) => 1,
            FormulaValue::Boolean(_) => 2,
            _ => 3,
        }
    }

    let left_owned;
    let right_owned;
    let (left, right) = match (left, right) {
        (FormulaValue::Empty, FormulaValue::Empty) => return Ordering::Equal,
        (FormulaValue::Empty, r) => {
            left_owned = blank_like(r);
            (&left_owned, r)
        }
        (l, FormulaValue::Empty) => {
            right_owned = blank_like(l);
            (l, &right_owned)
        }
        pair => pair,
    };

    match (left, right) {
        (FormulaValue::Number(l), FormulaValue::Number(r)) => {
            l.partial_cmp(r).unwrap_or(Ordering::Equal)
        }
        (FormulaValue::String(l), FormulaValue::String(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase())
        }
        (FormulaValue::Boolean(l), FormulaValue::Boolean(r)) => l.cmp(r),
        (l, r) => type_rank(l).cmp(&type_rank(r)),
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let n = match evaluate(operand, ctx)?.coerce_number() {
        Ok(n) => n,
        Err(e) => return Ok(FormulaValue::Error(e)),
    };

    match op {
        UnaryOperator::Negate => Ok(FormulaValue::number(-n)),
        UnaryOperator::Percent => Ok(FormulaValue::number(n / 100.0)),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FormulaValue> {
    let func = functions::registry()
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    func.check_arity(args.len())?;

    match func.implementation {
        Implementation::Eager(implementation) => {
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate(arg, ctx)?);
            }
            implementation(&evaluated_args, ctx)
        }
        Implementation::Lazy(implementation) => implementation(args, ctx),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;
    use pretty_assertions::assert_eq;

    fn eval(formula: &str) -> FormulaResult<FormulaValue> {
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::simple();
        evaluate(&ast, &ctx)
    }

    fn eval_cell(formula: &str, grid: &Grid) -> CellValue {
        let ast = parse_formula(formula).unwrap();
        evaluate_cell(&ast, &EvaluationContext::new(grid))
    }

    /// Grid with computed values already in place, as the engine would leave it
    fn grid_with(cells: &[(&str, CellValue)]) -> Grid {
        let mut grid = Grid::default();
        for (text, value) in cells {
            let addr = CellAddress::parse(text).unwrap();
            grid.set_raw_input(addr, &value.to_string());
            grid.set_computed(addr, value.clone());
        }
        grid
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("=42").unwrap(), FormulaValue::Number(42.0));
        assert_eq!(eval("=\"Hello\"").unwrap(), FormulaValue::String("Hello".into()));
        assert_eq!(eval("=TRUE").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=#REF!").unwrap(), FormulaValue::Error(CellError::Ref));
        assert_eq!(eval("=done").unwrap(), FormulaValue::String("done".into()));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("=1+2").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=10-3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("=4*5").unwrap(), FormulaValue::Number(20.0));
        assert_eq!(eval("=20/4").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("=2^10").unwrap(), FormulaValue::Number(1024.0));
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval("=1+2*3").unwrap(), FormulaValue::Number(7.0));
        assert_eq!(eval("=(1+2)*3").unwrap(), FormulaValue::Number(9.0));
        assert_eq!(eval("=2+3*4-5").unwrap(), FormulaValue::Number(9.0));
        assert_eq!(eval("=-2^2").unwrap(), FormulaValue::Number(4.0));
    }

    #[test]
    fn test_evaluate_unary() {
        assert_eq!(eval("=-5").unwrap(), FormulaValue::Number(-5.0));
        assert_eq!(eval("=50%").unwrap(), FormulaValue::Number(0.5));
        assert_eq!(eval("=--5").unwrap(), FormulaValue::Number(5.0));
        assert_eq!(eval("=-\"x\"").unwrap(), FormulaValue::Error(CellError::Value));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval("=1/0").unwrap(), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=0/0").unwrap(), FormulaValue::Error(CellError::Div0));
    }

    #[test]
    fn test_non_finite_results_are_div0() {
        assert_eq!(eval("=10^400").unwrap(), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=0^-1").unwrap(), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=(-8)^0.5").unwrap(), FormulaValue::Error(CellError::Div0));
        assert_eq!(eval("=1e308*10").unwrap(), FormulaValue::Error(CellError::Div0));
    }

    #[test]
    fn test_text_in_arithmetic() {
        assert_eq!(eval("=\"hello\"/2").unwrap(), FormulaValue::Error(CellError::Value));
        assert_eq!(eval("=\"4\"/2").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("=TRUE+1").unwrap(), FormulaValue::Number(2.0));
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("=1<2").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=1>2").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("=5=5").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=5<>5").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("=\"abc\"=\"ABC\"").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=\"b\">=\"a\"").unwrap(), FormulaValue::Boolean(true));
        // Numbers sort before text
        assert_eq!(eval("=100<\"a\"").unwrap(), FormulaValue::Boolean(true));
    }

    #[test]
    fn test_comparison_with_empty_cells() {
        let grid = Grid::default();
        assert_eq!(eval_cell("=A1=0", &grid), CellValue::Boolean(true));
        assert_eq!(eval_cell("=A1=\"\"", &grid), CellValue::Boolean(true));
        assert_eq!(eval_cell("=A1=FALSE", &grid), CellValue::Boolean(true));
        assert_eq!(eval_cell("=A1<1", &grid), CellValue::Boolean(true));
    }

    #[test]
    fn test_evaluate_concat_operator() {
        assert_eq!(
            eval("=\"a\"&1&TRUE").unwrap(),
            FormulaValue::String("a1TRUE".into())
        );
        assert_eq!(eval("=2.5&\"\"").unwrap(), FormulaValue::String("2.5".into()));
    }

    #[test]
    fn test_references_resolve_against_grid() {
        let grid = grid_with(&[
            ("A1", CellValue::Number(5.0)),
            ("A2", CellValue::Number(3.0)),
            ("B1", CellValue::text("hello")),
        ]);

        assert_eq!(eval_cell("=SUM(A1:A2)", &grid), CellValue::Number(8.0));
        assert_eq!(eval_cell("=A1*A2", &grid), CellValue::Number(15.0));
        assert_eq!(eval_cell("=SUM(B1)", &grid), CellValue::Number(0.0));
        assert_eq!(eval_cell("=B1/2", &grid), CellValue::Error(CellError::Value));
        assert_eq!(eval_cell("=B1", &grid), CellValue::text("hello"));
    }

    #[test]
    fn test_empty_references() {
        let grid = Grid::default();
        // Arithmetic sees 0, text sees ""
        assert_eq!(eval_cell("=Z9+1", &grid), CellValue::Number(1.0));
        assert_eq!(eval_cell("=\"x\"&Z9&\"y\"", &grid), CellValue::text("xy"));
        assert_eq!(eval_cell("=CONCAT(Z9,\"!\")", &grid), CellValue::text("!"));
        assert_eq!(eval_cell("=Z9", &grid), CellValue::Number(0.0));
        assert_eq!(eval_cell("=SUM(A1:A5)", &grid), CellValue::Number(0.0));
    }

    #[test]
    fn test_errors_propagate_unchanged() {
        let grid = grid_with(&[
            ("A1", CellValue::Error(CellError::Div0)),
            ("A2", CellValue::Error(CellError::Cycle)),
        ]);

        assert_eq!(eval_cell("=SUM(A1:A1)", &grid), CellValue::Error(CellError::Div0));
        assert_eq!(eval_cell("=A1+1", &grid), CellValue::Error(CellError::Div0));
        assert_eq!(eval_cell("=A2&\"x\"", &grid), CellValue::Error(CellError::Cycle));
        assert_eq!(eval_cell("=MAX(A2,5)", &grid), CellValue::Error(CellError::Cycle));
        assert_eq!(eval_cell("=CONCAT(A1)", &grid), CellValue::Error(CellError::Div0));
        // Left operand wins when both sides fail
        assert_eq!(eval_cell("=A2/A1", &grid), CellValue::Error(CellError::Cycle));
    }

    #[test]
    fn test_long_operator_chains() {
        let cells: Vec<(String, CellValue)> = (1..=1000)
            .map(|row| (format!("A{}", row), CellValue::Number(f64::from(row))))
            .collect();
        let refs: Vec<(&str, CellValue)> =
            cells.iter().map(|(a, v)| (a.as_str(), v.clone())).collect();
        let grid = grid_with(&refs);

        let terms: Vec<String> = (1..=1000).map(|row| format!("A{}", row)).collect();
        let sum = format!("={}", terms.join("+"));
        assert_eq!(eval_cell(&sum, &grid), CellValue::Number(500_500.0));

        let diff = format!("=1000{}", "-1".repeat(1000));
        assert_eq!(eval(&diff).unwrap(), FormulaValue::Number(0.0));

        let text = format!("=\"\"{}", "&\"ab\"".repeat(2000));
        assert_eq!(eval(&text).unwrap(), FormulaValue::String("ab".repeat(2000)));

        // Left to right, and an error anywhere in the chain wins
        assert_eq!(eval("=2*3/4-1").unwrap(), FormulaValue::Number(0.5));
        let failing = format!("=1{}+#REF!{}", "+1".repeat(500), "+1".repeat(500));
        assert_eq!(eval(&failing).unwrap(), FormulaValue::Error(CellError::Ref));
    }

    #[test]
    fn test_invalid_reference() {
        let grid = Grid::default();
        assert_eq!(eval_cell("=A0", &grid), CellValue::Error(CellError::Ref));
        assert_eq!(eval_cell("=SUM(A1:XFE1)", &grid), CellValue::Error(CellError::Ref));
        assert_eq!(eval_cell("=XFE1+1", &grid), CellValue::Error(CellError::Ref));
    }

    #[test]
    fn test_range_limit() {
        let grid = Grid::default();
        let ast = parse_formula("=SUM(A1:J10)").unwrap();

        let ctx = EvaluationContext::new(&grid).with_max_range_cells(99);
        assert!(matches!(
            evaluate(&ast, &ctx),
            Err(FormulaError::RangeTooLarge { cells: 100, limit: 99, .. })
        ));
        assert_eq!(evaluate_cell(&ast, &ctx), CellValue::Error(CellError::Ref));

        let ctx = EvaluationContext::new(&grid).with_max_range_cells(100);
        assert_eq!(evaluate_cell(&ast, &ctx), CellValue::Number(0.0));
    }

    #[test]
    fn test_range_outside_function() {
        let grid = Grid::default();
        assert_eq!(eval_cell("=A1:A3", &grid), CellValue::Error(CellError::Value));
        assert_eq!(eval_cell("=A1:A3+1", &grid), CellValue::Error(CellError::Value));
        assert_eq!(eval_cell("=A1:A3=0", &grid), CellValue::Error(CellError::Value));
    }

    #[test]
    fn test_evaluate_functions() {
        assert_eq!(eval("=SUM(1,2,3)").unwrap(), FormulaValue::Number(6.0));
        assert_eq!(eval("=AVG(1,2,3)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("=MEDIA(2,4)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=AVERAGE()").unwrap(), FormulaValue::Number(0.0));
        assert_eq!(eval("=MIN(3,1,2)").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("=MAX(3,1,2)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=COUNT(1,\"a\",2)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("=ABS(-3)").unwrap(), FormulaValue::Number(3.0));
        assert_eq!(eval("=ROUND(2.567,1)").unwrap(), FormulaValue::Number(2.6));
        assert_eq!(
            eval("=CONCAT(\"a\",1,\"-\",TRUE)").unwrap(),
            FormulaValue::String("a1-TRUE".into())
        );
    }

    #[test]
    fn test_arity_mismatch_is_value_error() {
        assert!(matches!(
            eval("=IF(TRUE)"),
            Err(FormulaError::ArgumentCount { .. })
        ));
        let grid = Grid::default();
        assert_eq!(eval_cell("=ABS(1,2)", &grid), CellValue::Error(CellError::Value));
        assert_eq!(eval_cell("=SUM()", &grid), CellValue::Error(CellError::Value));
    }

    #[test]
    fn test_evaluate_if() {
        assert_eq!(
            eval("=IF(1>0,\"Yes\",\"No\")").unwrap(),
            FormulaValue::String("Yes".into())
        );
        assert_eq!(
            eval("=IF(0,\"Yes\",\"No\")").unwrap(),
            FormulaValue::String("No".into())
        );
        assert_eq!(eval("=IF(FALSE,1)").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("=IF(\"true\",1,2)").unwrap(), FormulaValue::Number(1.0));
        assert_eq!(eval("=IF(\"0\",1,2)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(eval("=IF(\"\",1,2)").unwrap(), FormulaValue::Number(2.0));
        assert_eq!(
            eval("=IF(\"maybe\",1,2)").unwrap(),
            FormulaValue::Error(CellError::Value)
        );
        assert_eq!(
            eval("=IF(1/0,1,2)").unwrap(),
            FormulaValue::Error(CellError::Div0)
        );
    }

    #[test]
    fn test_if_only_evaluates_taken_branch() {
        let grid = Grid::default();
        // The untaken branch would fail with #DIV/0! or an arity error
        assert_eq!(eval_cell("=IF(TRUE,1,1/0)", &grid), CellValue::Number(1.0));
        assert_eq!(eval_cell("=IF(FALSE,ABS(1,2),7)", &grid), CellValue::Number(7.0));
        // Empty condition is false
        assert_eq!(eval_cell("=IF(A1,\"set\",\"blank\")", &grid), CellValue::text("blank"));
    }

    #[test]
    fn test_evaluate_and_or_not() {
        assert_eq!(eval("=AND(TRUE,1)").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=AND(TRUE,0)").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("=OR(FALSE,0)").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("=OR(FALSE,\"TRUE\")").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=AND(\"x\")").unwrap(), FormulaValue::Error(CellError::Value));
        assert_eq!(eval("=NOT(FALSE)").unwrap(), FormulaValue::Boolean(true));
        assert_eq!(eval("=NOT(2)").unwrap(), FormulaValue::Boolean(false));
        assert_eq!(eval("=NOT(\"x\")").unwrap(), FormulaValue::Error(CellError::Value));
    }

    #[test]
    fn test_logical_over_ranges_skip_empty() {
        let grid = grid_with(&[
            ("A1", CellValue::Boolean(true)),
            ("A3", CellValue::Number(5.0)),
        ]);
        assert_eq!(eval_cell("=AND(A1:A3)", &grid), CellValue::Boolean(true));
        assert_eq!(eval_cell("=OR(B1:B3)", &grid), CellValue::Error(CellError::Value));
    }

    #[test]
    fn test_evaluate_nested_functions() {
        assert_eq!(
            eval("=SUM(1,MAX(2,3),MIN(4,5))").unwrap(),
            FormulaValue::Number(10.0)
        );
        assert_eq!(
            eval("=IF(AND(2>0,3<100),2*3/100,0)").unwrap(),
            FormulaValue::Number(0.06)
        );
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(FormulaValue::Number(-1.0).truthiness(), Ok(true));
        assert_eq!(FormulaValue::Empty.truthiness(), Ok(false));
        assert_eq!(FormulaValue::String(" False ".into()).truthiness(), Ok(false));
        assert_eq!(FormulaValue::String("2".into()).truthiness(), Ok(true));
        assert_eq!(
            FormulaValue::Range(vec![]).truthiness(),
            Err(CellError::Value)
        );
        assert_eq!(
            FormulaValue::Error(CellError::Ref).truthiness(),
            Err(CellError::Ref)
        );
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn sum_chain_matches_sum_function(terms in prop::collection::vec(-1000i32..1000, 1..200)) {
                let text: Vec<String> = terms.iter().map(|t| format!("({})", t)).collect();
                let chained = eval(&format!("={}", text.join("+"))).unwrap();
                let called = eval(&format!("=SUM({})", text.join(","))).unwrap();
                let expected: i64 = terms.iter().map(|&t| i64::from(t)).sum();

                prop_assert_eq!(&chained, &called);
                prop_assert_eq!(chained, FormulaValue::Number(expected as f64));
            }

            #[test]
            fn precedence_matches_integer_arithmetic(a in -50i64..50, b in -50i64..50, c in -50i64..50) {
                let value = eval(&format!("=({})+({})*({})-({})", a, b, c, a)).unwrap();
                prop_assert_eq!(value, FormulaValue::Number((a + b * c - a) as f64));
            }
        }
    }
}
