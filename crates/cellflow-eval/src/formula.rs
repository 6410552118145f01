//! The standalone formula handle.

use cellflow_common::{FormulaError, Position};
use cellflow_parse::{Expr, parse, print_formula};

use crate::error::EngineError;
use crate::interpreter;
use crate::sheet::Sheet;

/// A parsed formula: the AST plus its canonical text, computed once.
#[derive(Debug, Clone)]
pub struct Formula {
    expr: Expr,
    expression: String,
}

/// Parse a formula body (without the leading `=`).
pub fn parse_formula(expression: &str) -> Result<Formula, EngineError> {
    let expr = parse(expression)?;
    let expression = print_formula(&expr);
    Ok(Formula { expr, expression })
}

impl Formula {
    /// Evaluate against a sheet. Failures come back as values, never
    /// panics or engine errors.
    pub fn evaluate(&self, sheet: &Sheet) -> Result<f64, FormulaError> {
        interpreter::evaluate(&self.expr, sheet)
    }

    /// Canonical text form, without the leading `=`.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Referenced positions in first-occurrence order, invalid sentinels
    /// removed and *adjacent* duplicates collapsed. Callers rely on
    /// non-adjacent duplicates surviving.
    pub fn referenced_cells(&self) -> Vec<Position> {
        let mut cells: Vec<Position> = self
            .expr
            .collect_refs()
            .into_iter()
            .filter(|pos| pos.is_valid())
            .collect();
        cells.dedup();
        cells
    }
}
