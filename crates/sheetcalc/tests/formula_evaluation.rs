//! Tests for formula evaluation with cell references

use sheetcalc::prelude::*;
use sheetcalc::{evaluate, parse_formula, EvaluationContext, FormulaValue};

fn a(text: &str) -> CellAddress {
    CellAddress::parse(text).unwrap()
}

fn engine_with(cells: &[(&str, &str)]) -> Engine {
    let mut engine = Engine::new();
    engine.set_cells(cells.iter().map(|(addr, raw)| (a(addr), *raw)));
    engine
}

/// Test basic formula evaluation without cell references
#[test]
fn test_evaluate_simple_formulas() {
    let ctx = EvaluationContext::simple();

    let ast = parse_formula("=1+2*3").unwrap();
    assert_eq!(evaluate(&ast, &ctx).unwrap(), FormulaValue::Number(7.0));

    let ast = parse_formula("=\"Hello \"&\"World\"").unwrap();
    assert_eq!(
        evaluate(&ast, &ctx).unwrap(),
        FormulaValue::String("Hello World".into())
    );

    let ast = parse_formula("=5>3").unwrap();
    assert_eq!(evaluate(&ast, &ctx).unwrap(), FormulaValue::Boolean(true));
}

/// Test formula evaluation with cell references
#[test]
fn test_evaluate_with_cell_references() {
    let mut engine = engine_with(&[("A1", "10"), ("A2", "20"), ("A3", "30"), ("B1", "5")]);

    engine.set_cell_input(a("C1"), "=A1");
    engine.set_cell_input(a("C2"), "=A1+B1");
    engine.set_cell_input(a("C3"), "=A1>B1");

    assert_eq!(engine.value(a("C1")), &CellValue::Number(10.0));
    assert_eq!(engine.value(a("C2")), &CellValue::Number(15.0));
    assert_eq!(engine.value(a("C3")), &CellValue::Boolean(true));
}

/// Test formula evaluation with range references
#[test]
fn test_evaluate_with_range_references() {
    let engine = engine_with(&[
        ("A1", "10"),
        ("A2", "20"),
        ("A3", "30"),
        ("B1", "=SUM(A1:A3)"),
        ("B2", "=AVERAGE(A1:A3)"),
        ("B3", "=MIN(A1:A3)"),
        ("B4", "=MAX(A3:A1)"),
        ("B5", "=media(a1:a3)"),
    ]);

    assert_eq!(engine.value(a("B1")), &CellValue::Number(60.0));
    assert_eq!(engine.value(a("B2")), &CellValue::Number(20.0));
    assert_eq!(engine.value(a("B3")), &CellValue::Number(10.0));
    assert_eq!(engine.value(a("B4")), &CellValue::Number(30.0));
    assert_eq!(engine.value(a("B5")), &CellValue::Number(20.0));
}

/// Test complex nested formulas
#[test]
fn test_evaluate_complex_formulas() {
    let engine = engine_with(&[
        ("A1", "100"),
        ("A2", "50"),
        ("B1", "0.5"),
        ("C1", "=IF(A1>A2,A1*B1,A2*B1)"),
        ("C2", "=SUM(A1,A2)*B1"),
        ("C3", "=ROUND(A1/3,2)"),
    ]);

    assert_eq!(engine.value(a("C1")), &CellValue::Number(50.0));
    assert_eq!(engine.value(a("C2")), &CellValue::Number(75.0));
    assert_eq!(engine.value(a("C3")), &CellValue::Number(33.33));
}

/// Test empty cell handling
#[test]
fn test_empty_cell_handling() {
    let engine = engine_with(&[
        ("A1", "10"),
        ("A3", "30"),
        ("B1", "=A1+A2"),
        ("B2", "=SUM(A1:A3)"),
        ("B3", "=AVG(A1:A3)"),
        ("B4", "=A2"),
        ("B5", "=\"[\"&A2&\"]\""),
    ]);

    assert_eq!(engine.value(a("B1")), &CellValue::Number(10.0));
    assert_eq!(engine.value(a("B2")), &CellValue::Number(40.0));
    // The empty member counts as a zero operand
    assert_eq!(engine.value(a("B3")), &CellValue::Number(40.0 / 3.0));
    assert_eq!(engine.value(a("B4")), &CellValue::Number(0.0));
    assert_eq!(engine.value(a("B5")), &CellValue::text("[]"));
}

/// Test string operations
#[test]
fn test_string_operations() {
    let engine = engine_with(&[
        ("A1", "Hello"),
        ("B1", "World"),
        ("C1", "=A1&\" \"&B1"),
        ("C2", "=CONCAT(A1,\", \",B1,\"!\")"),
        ("C3", "=CONCAT(A1:B1)"),
    ]);

    assert_eq!(engine.value(a("C1")), &CellValue::text("Hello World"));
    assert_eq!(engine.value(a("C2")), &CellValue::text("Hello, World!"));
    assert_eq!(engine.value(a("C3")), &CellValue::text("HelloWorld"));
}

/// Test boolean functions
#[test]
fn test_boolean_functions() {
    let engine = engine_with(&[
        ("A1", "=AND(TRUE,TRUE,TRUE)"),
        ("A2", "=AND(TRUE,FALSE,TRUE)"),
        ("A3", "=OR(FALSE,FALSE,TRUE)"),
        ("A4", "=NOT(FALSE)"),
        ("A5", "=AND(NOT(FALSE),OR(TRUE,FALSE))"),
    ]);

    assert_eq!(engine.value(a("A1")), &CellValue::Boolean(true));
    assert_eq!(engine.value(a("A2")), &CellValue::Boolean(false));
    assert_eq!(engine.value(a("A3")), &CellValue::Boolean(true));
    assert_eq!(engine.value(a("A4")), &CellValue::Boolean(true));
    assert_eq!(engine.value(a("A5")), &CellValue::Boolean(true));
}

/// Test the fixed error tokens
#[test]
fn test_error_tokens() {
    let engine = engine_with(&[
        ("A1", "=1/0"),
        ("A2", "=\"x\"*2"),
        ("A3", "=A0"),
        ("A4", "=(1+2"),
        ("A5", "=NOPE(1)"),
        ("A6", "=B6"),
        ("B6", "=A6"),
    ]);

    assert_eq!(engine.display_value(a("A1")), "#DIV/0!");
    assert_eq!(engine.display_value(a("A2")), "#VALOR!");
    assert_eq!(engine.display_value(a("A3")), "#REF!");
    assert_eq!(engine.display_value(a("A4")), "#ERRO");
    assert_eq!(engine.display_value(a("A5")), "#ERRO");
    assert_eq!(engine.display_value(a("A6")), "#CICLO!");
    assert_eq!(engine.display_value(a("B6")), "#CICLO!");
}

/// Literal input is never evaluated
#[test]
fn test_literals_are_not_formulas() {
    let engine = engine_with(&[("A1", "1+1"), ("A2", " 42 "), ("A3", "SUM(A1)"), ("A4", "1e3")]);

    assert_eq!(engine.value(a("A1")), &CellValue::text("1+1"));
    assert_eq!(engine.value(a("A2")), &CellValue::Number(42.0));
    assert_eq!(engine.value(a("A3")), &CellValue::text("SUM(A1)"));
    assert_eq!(engine.value(a("A4")), &CellValue::Number(1000.0));
}
