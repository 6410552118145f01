//! Meta crate that re-exports the cellflow building blocks: shared value
//! types, the formula language, and the live engine. Depend on this crate
//! for the whole surface, or on the underlying crates when deeper
//! integration is required.
//!
//! ```
//! use cellflow::{CellValue, Position, Sheet};
//!
//! let mut sheet = Sheet::new();
//! sheet.set_cell(Position::from_a1("A1"), "=B1*2").unwrap();
//! sheet.set_cell(Position::from_a1("B1"), "21").unwrap();
//!
//! let value = sheet.value(Position::from_a1("A1")).unwrap();
//! assert_eq!(value, Some(CellValue::Number(42.0)));
//! ```

pub use cellflow_common as common;
pub use cellflow_eval as eval;
pub use cellflow_parse as parse;

pub use cellflow_common::{CellValue, FormulaError, Position, PositionError, Size};
pub use cellflow_eval::{
    Cell, ESCAPE_SIGN, EngineError, FORMULA_SIGN, Formula, Sheet, parse_formula,
};
pub use cellflow_parse::{BinaryOp, Expr, ParserError, UnaryOp, print_formula};
