//! Evaluation errors are *values*, not control flow: a failed formula
//! evaluation yields a `FormulaError` that is cached, printed, compared,
//! and propagated by referencing formulas exactly like a number would be.

use std::{error::Error, fmt};

/// The three categories of formula evaluation failure.
///
/// `Display` renders the grid tokens (`#REF!`, …); equality is by
/// category.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FormulaError {
    /// A formula refers to a syntactically invalid position.
    Ref,
    /// A referenced cell contains non-empty, non-numeric text.
    Value,
    /// Evaluation produced a non-finite number.
    Arithmetic,
}

impl fmt::Display for FormulaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ref => "#REF!",
            Self::Value => "#VALUE!",
            Self::Arithmetic => "#ARITHM!",
        })
    }
}

impl Error for FormulaError {}
