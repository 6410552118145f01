//! Post-order evaluation of a formula AST against a sheet.
//!
//! The first `FormulaError` met wins and becomes the formula's result.
//! Evaluation reads other cells (through their caches) but never mutates
//! bodies or adjacency.

use cellflow_common::{FormulaError, Position};
use cellflow_parse::{Expr, UnaryOp};

use crate::sheet::Sheet;

pub(crate) fn evaluate(expr: &Expr, sheet: &Sheet) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Reference { pos, .. } => reference_value(*pos, sheet),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, sheet)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let lhs = evaluate(lhs, sheet)?;
            let rhs = evaluate(rhs, sheet)?;
            let value = op.apply(lhs, rhs);
            // division by zero, overflow, and NaN all surface here
            if value.is_finite() {
                Ok(value)
            } else {
                Err(FormulaError::Arithmetic)
            }
        }
        Expr::Paren(inner) => evaluate(inner, sheet),
    }
}

fn reference_value(pos: Position, sheet: &Sheet) -> Result<f64, FormulaError> {
    if !pos.is_valid() {
        return Err(FormulaError::Ref);
    }
    match sheet.cell_at(pos) {
        None => Ok(0.0),
        Some(cell) => cell.numeric_value(sheet),
    }
}
