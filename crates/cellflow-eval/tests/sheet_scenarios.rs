//! End-to-end engine scenarios: write, read, invalidate, reject.

use cellflow_eval::{CellValue, EngineError, FormulaError, Position, Sheet, Size};

fn pos(s: &str) -> Position {
    Position::from_a1(s)
}

fn value(sheet: &Sheet, s: &str) -> CellValue {
    sheet
        .value(pos(s))
        .expect("valid position")
        .expect("cell present")
}

fn text(sheet: &Sheet, s: &str) -> String {
    sheet
        .cell(pos(s))
        .expect("valid position")
        .expect("cell present")
        .text()
}

#[test]
fn division_by_zero_is_an_arithmetic_error_value() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=1/0").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Error(FormulaError::Arithmetic));

    sheet.set_cell(pos("B1"), "=1e308*10").unwrap();
    assert_eq!(value(&sheet, "B1"), CellValue::Error(FormulaError::Arithmetic));
}

#[test]
fn dependents_track_every_rewrite() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=B2").unwrap();
    sheet.set_cell(pos("B2"), "3").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Number(3.0));

    sheet.set_cell(pos("B2"), "text").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Error(FormulaError::Value));

    sheet.set_cell(pos("B2"), "4").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Number(4.0));
}

#[test]
fn invalidation_reaches_transitive_dependents() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "1").unwrap();
    sheet.set_cell(pos("B1"), "=A1+1").unwrap();
    sheet.set_cell(pos("C1"), "=B1+1").unwrap();
    sheet.set_cell(pos("D1"), "=C1+1").unwrap();
    assert_eq!(value(&sheet, "D1"), CellValue::Number(4.0));

    sheet.set_cell(pos("A1"), "10").unwrap();
    assert_eq!(value(&sheet, "D1"), CellValue::Number(13.0));
    assert_eq!(value(&sheet, "C1"), CellValue::Number(12.0));
    assert_eq!(value(&sheet, "B1"), CellValue::Number(11.0));
}

#[test]
fn cycle_rejection_preserves_the_cell() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=B1").unwrap();
    let err = sheet.set_cell(pos("B1"), "=A1").unwrap_err();
    assert!(matches!(err, EngineError::CircularDependency));

    assert_eq!(text(&sheet, "B1"), "");
    assert_eq!(value(&sheet, "B1"), CellValue::Number(0.0));
    assert_eq!(value(&sheet, "A1"), CellValue::Number(0.0));
}

#[test]
fn formula_text_is_canonical() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=(1+2)*3").unwrap();
    assert_eq!(text(&sheet, "A1"), "=(1+2)*3");
    assert_eq!(value(&sheet, "A1"), CellValue::Number(9.0));

    sheet.set_cell(pos("A1"), "= 1 + 2 * 3 ").unwrap();
    assert_eq!(text(&sheet, "A1"), "=1+2*3");
    assert_eq!(value(&sheet, "A1"), CellValue::Number(7.0));
}

#[test]
fn escaped_text_reads_as_number_through_a_reference() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "'123").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Text("123".to_string()));
    assert_eq!(text(&sheet, "A1"), "'123");

    sheet.set_cell(pos("B1"), "=A1").unwrap();
    assert_eq!(value(&sheet, "B1"), CellValue::Number(123.0));
}

#[test]
fn clear_disposes_unreferenced_cells_only() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("C3"), "x").unwrap();
    sheet.clear_cell(pos("C3")).unwrap();
    assert!(sheet.cell(pos("C3")).unwrap().is_none());
    assert_eq!(sheet.printable_size(), Size { rows: 0, cols: 0 });

    sheet.set_cell(pos("C3"), "x").unwrap();
    sheet.set_cell(pos("A1"), "=C3").unwrap();
    sheet.clear_cell(pos("C3")).unwrap();
    let c3 = sheet.cell(pos("C3")).unwrap().expect("kept as a target");
    assert_eq!(c3.text(), "");
    assert_eq!(sheet.printable_size(), Size { rows: 3, cols: 3 });
}

#[test]
fn clearing_a_dependency_is_observed_on_next_read() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("B1"), "7").unwrap();
    sheet.set_cell(pos("A1"), "=B1").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Number(7.0));

    sheet.clear_cell(pos("B1")).unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Number(0.0));
}

#[test]
fn clearing_an_absent_cell_is_fine() {
    let mut sheet = Sheet::new();
    sheet.clear_cell(pos("Z9")).unwrap();
    assert_eq!(sheet.printable_size(), Size { rows: 0, cols: 0 });
}

#[test]
fn rejected_writes_leave_prior_state_observable() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=B1+1").unwrap();
    sheet.set_cell(pos("B1"), "2").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Number(3.0));

    let err = sheet.set_cell(pos("A1"), "=1+").unwrap_err();
    assert!(matches!(err, EngineError::Formula(_)));
    assert_eq!(text(&sheet, "A1"), "=B1+1");
    assert_eq!(value(&sheet, "A1"), CellValue::Number(3.0));
    let a1 = sheet.cell(pos("A1")).unwrap().unwrap();
    assert_eq!(a1.dependencies(), vec![pos("B1")]);
}

#[test]
fn malformed_formula_on_a_fresh_position_creates_nothing() {
    let mut sheet = Sheet::new();
    assert!(sheet.set_cell(pos("A1"), "=)(").is_err());
    assert!(sheet.cell(pos("A1")).unwrap().is_none());
    assert_eq!(sheet.printable_size(), Size { rows: 0, cols: 0 });
}

#[test]
fn sentinel_reference_evaluates_to_ref_error() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=XFE1").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Error(FormulaError::Ref));
    assert_eq!(text(&sheet, "A1"), "=XFE1");

    // errors propagate by category through referencing formulas
    sheet.set_cell(pos("B1"), "=A1+1").unwrap();
    assert_eq!(value(&sheet, "B1"), CellValue::Error(FormulaError::Ref));
}

#[test]
fn error_category_propagates_first_in_post_order() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "words").unwrap();
    sheet.set_cell(pos("B1"), "=A1+XFE1").unwrap();
    // A1 is read first, so the Value error wins over the Ref sentinel
    assert_eq!(value(&sheet, "B1"), CellValue::Error(FormulaError::Value));

    sheet.set_cell(pos("C1"), "=XFE1+A1").unwrap();
    assert_eq!(value(&sheet, "C1"), CellValue::Error(FormulaError::Ref));
}

#[test]
fn identical_formula_rewrite_keeps_values_fresh() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "=B2+C3").unwrap();
    sheet.set_cell(pos("B2"), "1").unwrap();
    sheet.set_cell(pos("C3"), "2").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Number(3.0));

    // same canonical form, different spelling: must stay correct
    sheet.set_cell(pos("A1"), "= B2 + C3").unwrap();
    assert_eq!(text(&sheet, "A1"), "=B2+C3");
    assert_eq!(value(&sheet, "A1"), CellValue::Number(3.0));

    sheet.set_cell(pos("B2"), "10").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Number(12.0));
}

#[test]
fn empty_marker_cells_read_as_blank_text() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "'").unwrap();
    assert_eq!(value(&sheet, "A1"), CellValue::Text(String::new()));
    assert_eq!(text(&sheet, "A1"), "'");

    sheet.set_cell(pos("B1"), "=").unwrap();
    assert_eq!(value(&sheet, "B1"), CellValue::Text(String::new()));
    assert_eq!(text(&sheet, "B1"), "=");
}

#[test]
fn whitespace_text_is_a_value_error_as_operand() {
    let mut sheet = Sheet::new();
    sheet.set_cell(pos("A1"), "' 42").unwrap();
    sheet.set_cell(pos("B1"), "=A1").unwrap();
    assert_eq!(value(&sheet, "B1"), CellValue::Error(FormulaError::Value));
}
