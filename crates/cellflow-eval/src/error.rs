//! Typed errors for rejected sheet operations.
//!
//! These cover the write path only. Evaluation failures are not errors in
//! this sense: they are [`cellflow_common::FormulaError`] values carried
//! inside [`cellflow_common::CellValue`].

use thiserror::Error;

use cellflow_parse::ParserError;

/// Why a sheet operation was rejected. The target cell is left exactly as
/// it was in every case.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("position is not a valid cell coordinate")]
    InvalidPosition,

    #[error("malformed formula: {0}")]
    Formula(#[from] ParserError),

    #[error("formula would close a dependency cycle")]
    CircularDependency,
}
