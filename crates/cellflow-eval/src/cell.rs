//! A single cell: one body plus its two adjacency sets.

use std::cell::RefCell;

use rustc_hash::FxHashSet;

use cellflow_common::{CellValue, FormulaError, Position};

use crate::error::EngineError;
use crate::formula::{Formula, parse_formula};
use crate::sheet::Sheet;

/// First character of formula input.
pub const FORMULA_SIGN: char = '=';
/// First character that forces the rest of the input to be plain text.
pub const ESCAPE_SIGN: char = '\'';

type EvalCache = RefCell<Option<Result<f64, FormulaError>>>;

/// The value-bearing part of a cell.
///
/// Only `""`, `"'"`, and `"="` classify as Empty; they are kept verbatim
/// so `text()` can echo them back.
#[derive(Debug)]
pub(crate) enum CellBody {
    Empty { raw: String },
    Text { raw: String },
    Formula { formula: Formula, cache: EvalCache },
}

impl CellBody {
    /// Classify raw input into a body. The only fallible case is formula
    /// input that does not parse; nothing is mutated on failure.
    pub(crate) fn classify(text: &str) -> Result<CellBody, EngineError> {
        if text.is_empty() || text == "'" || text == "=" {
            return Ok(CellBody::Empty {
                raw: text.to_string(),
            });
        }
        if let Some(body) = text.strip_prefix(FORMULA_SIGN) {
            let formula = parse_formula(body)?;
            return Ok(CellBody::Formula {
                formula,
                cache: RefCell::new(None),
            });
        }
        Ok(CellBody::Text {
            raw: text.to_string(),
        })
    }

    pub(crate) fn text(&self) -> String {
        match self {
            CellBody::Empty { raw } | CellBody::Text { raw } => raw.clone(),
            CellBody::Formula { formula, .. } => format!("{FORMULA_SIGN}{}", formula.expression()),
        }
    }

    pub(crate) fn referenced_cells(&self) -> Vec<Position> {
        match self {
            CellBody::Empty { .. } | CellBody::Text { .. } => Vec::new(),
            CellBody::Formula { formula, .. } => formula.referenced_cells(),
        }
    }
}

/// Strip the escape sign that shields text from formula interpretation.
fn escaped_value(raw: &str) -> &str {
    raw.strip_prefix(ESCAPE_SIGN).unwrap_or(raw)
}

/// One spreadsheet cell. Edges are positions resolved through the owning
/// sheet on every traversal step; the cell holds no pointers.
#[derive(Debug)]
pub struct Cell {
    pub(crate) body: CellBody,
    /// Cells whose formulas reference this one.
    pub(crate) incoming: FxHashSet<Position>,
    /// Cells this cell's formula references.
    pub(crate) outgoing: FxHashSet<Position>,
}

impl Cell {
    pub(crate) fn new_empty() -> Self {
        Cell {
            body: CellBody::Empty { raw: String::new() },
            incoming: FxHashSet::default(),
            outgoing: FxHashSet::default(),
        }
    }

    /// The text form: raw input for empty and text bodies, `=` plus the
    /// canonical expression for formulas.
    pub fn text(&self) -> String {
        self.body.text()
    }

    /// The observable value. For a formula body this reads through the
    /// cache, evaluating at most once until the next invalidation.
    pub fn value(&self, sheet: &Sheet) -> CellValue {
        match &self.body {
            CellBody::Empty { raw } => {
                if raw.is_empty() {
                    CellValue::Number(0.0)
                } else {
                    CellValue::Text(String::new())
                }
            }
            CellBody::Text { raw } => CellValue::Text(escaped_value(raw).to_string()),
            CellBody::Formula { .. } => self.cached_eval(sheet).into(),
        }
    }

    /// Referenced positions per the formula contract; empty for other
    /// bodies.
    pub fn referenced_cells(&self) -> Vec<Position> {
        self.body.referenced_cells()
    }

    /// Whether any formula elsewhere references this cell. A cell with
    /// dependents must stay in the sheet even when cleared.
    pub fn has_dependents(&self) -> bool {
        !self.incoming.is_empty()
    }

    /// Cells whose formulas reference this one, sorted row-major.
    pub fn dependents(&self) -> Vec<Position> {
        let mut cells: Vec<Position> = self.incoming.iter().copied().collect();
        cells.sort();
        cells
    }

    /// Distinct cells this cell's formula references, sorted row-major.
    pub fn dependencies(&self) -> Vec<Position> {
        let mut cells: Vec<Position> = self.outgoing.iter().copied().collect();
        cells.sort();
        cells
    }

    pub(crate) fn clear(&mut self) {
        self.body = CellBody::Empty { raw: String::new() };
    }

    /// How this cell reads when referenced from a formula.
    pub(crate) fn numeric_value(&self, sheet: &Sheet) -> Result<f64, FormulaError> {
        match &self.body {
            CellBody::Empty { .. } => Ok(0.0),
            CellBody::Formula { .. } => self.cached_eval(sheet),
            CellBody::Text { raw } => {
                let value = escaped_value(raw);
                value.parse::<f64>().map_err(|_| FormulaError::Value)
            }
        }
    }

    fn cached_eval(&self, sheet: &Sheet) -> Result<f64, FormulaError> {
        let CellBody::Formula { formula, cache } = &self.body else {
            unreachable!("cached_eval on a non-formula body");
        };
        if let Some(result) = *cache.borrow() {
            return result;
        }
        let result = formula.evaluate(sheet);
        *cache.borrow_mut() = Some(result);
        result
    }

    /// Drop the cached result. Returns whether a populated cache was
    /// dropped, which is what bounds the invalidation sweep.
    pub(crate) fn invalidate_cache(&self) -> bool {
        match &self.body {
            CellBody::Formula { cache, .. } => cache.borrow_mut().take().is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_empties() {
        for raw in ["", "'", "="] {
            let body = CellBody::classify(raw).unwrap();
            assert!(matches!(body, CellBody::Empty { .. }), "{raw:?}");
            assert_eq!(body.text(), raw);
        }
    }

    #[test]
    fn classify_text_and_formula() {
        assert!(matches!(
            CellBody::classify("hello").unwrap(),
            CellBody::Text { .. }
        ));
        assert!(matches!(
            CellBody::classify("'=1+2").unwrap(),
            CellBody::Text { .. }
        ));
        assert!(matches!(
            CellBody::classify("=1+2").unwrap(),
            CellBody::Formula { .. }
        ));
        assert!(matches!(
            CellBody::classify("=1+").unwrap_err(),
            EngineError::Formula(_)
        ));
    }

    #[test]
    fn empty_body_values() {
        let sheet = Sheet::new();
        let mut cell = Cell::new_empty();
        assert_eq!(cell.value(&sheet), CellValue::Number(0.0));

        cell.body = CellBody::classify("'").unwrap();
        assert_eq!(cell.value(&sheet), CellValue::Text(String::new()));
    }

    #[test]
    fn escape_sign_is_stripped_from_value_only() {
        let sheet = Sheet::new();
        let mut cell = Cell::new_empty();
        cell.body = CellBody::classify("'123").unwrap();
        assert_eq!(cell.text(), "'123");
        assert_eq!(cell.value(&sheet), CellValue::Text("123".to_string()));
    }
}
