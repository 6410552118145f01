//! Compact cell coordinates shared across the parser and the engine.
//!
//! `Position` encodes an absolute cell coordinate (row, column) in 32 bits
//! with a 16,384 × 16,384 grid limit. The row lives in the high bits so the
//! derived ordering is row-major. `Position::NONE` is the invalid sentinel:
//! it renders as the empty string and is what unparseable A1 input decodes
//! to.

use core::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const ROW_BITS: u32 = 14;
const COL_BITS: u32 = 14;
const ROW_MAX: u32 = (1 << ROW_BITS) - 1;
const COL_MAX: u32 = (1 << COL_BITS) - 1;

const ROW_SHIFT: u32 = COL_BITS;
const COL_MASK: u32 = COL_MAX;

/// Errors returned when constructing positions from unchecked inputs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PositionError {
    RowOverflow(u32),
    ColOverflow(u32),
    Malformed(String),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionError::RowOverflow(row) => write!(f, "row {row} exceeds {ROW_MAX}"),
            PositionError::ColOverflow(col) => write!(f, "col {col} exceeds {COL_MAX}"),
            PositionError::Malformed(s) => write!(f, "not a cell position: {s:?}"),
        }
    }
}

impl std::error::Error for PositionError {}

/// Absolute grid coordinate (row, column), zero-based on both axes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Position(u32);

impl Position {
    /// The invalid sentinel. Not equal to any valid coordinate.
    pub const NONE: Self = Self(u32::MAX);

    pub const MAX_ROWS: u32 = ROW_MAX + 1;
    pub const MAX_COLS: u32 = COL_MAX + 1;

    /// Construct a position, panicking if either axis exceeds the grid.
    pub fn new(row: u32, col: u32) -> Self {
        assert!(row <= ROW_MAX, "Row {row} exceeds 14 bits");
        assert!(col <= COL_MAX, "Col {col} exceeds 14 bits");
        Self((row << ROW_SHIFT) | col)
    }

    /// Fallible constructor that reports overflow rather than panicking.
    pub fn try_new(row: u32, col: u32) -> Result<Self, PositionError> {
        if row > ROW_MAX {
            return Err(PositionError::RowOverflow(row));
        }
        if col > COL_MAX {
            return Err(PositionError::ColOverflow(col));
        }
        Ok(Self::new(row, col))
    }

    /// Decode an A1-style reference, yielding `NONE` when the input is not
    /// a valid position. The strict counterpart is the `FromStr` impl.
    pub fn from_a1(s: &str) -> Self {
        s.parse().unwrap_or(Self::NONE)
    }

    #[inline(always)]
    pub fn row(self) -> u32 {
        self.0 >> ROW_SHIFT
    }

    #[inline(always)]
    pub fn col(self) -> u32 {
        self.0 & COL_MASK
    }

    #[inline(always)]
    pub fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return Ok(());
        }
        write!(f, "{}{}", column_to_letters(self.col()), self.row() + 1)
    }
}

impl FromStr for Position {
    type Err = PositionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PositionError::Malformed(s.to_string());

        let bytes = s.as_bytes();
        let letters_len = bytes
            .iter()
            .take_while(|b| b.is_ascii_uppercase())
            .count();
        if letters_len == 0 || letters_len == bytes.len() {
            return Err(malformed());
        }

        let col = letters_to_column(&s[..letters_len]).ok_or_else(malformed)?;

        let digits = &s[letters_len..];
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let row_1based: u32 = digits.parse().map_err(|_| malformed())?;
        if row_1based == 0 {
            return Err(malformed());
        }

        Self::try_new(row_1based - 1, col)
    }
}

impl From<Position> for (u32, u32) {
    fn from(pos: Position) -> Self {
        (pos.row(), pos.col())
    }
}

impl TryFrom<(u32, u32)> for Position {
    type Error = PositionError;

    fn try_from(value: (u32, u32)) -> Result<Self, Self::Error> {
        Self::try_new(value.0, value.1)
    }
}

/// Printable bounding box of a sheet: the smallest `(rows, cols)` covering
/// every live cell, or zeros for an empty sheet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Size {
    pub rows: u32,
    pub cols: u32,
}

// Precomputed names for the common columns (A-ZZ = 702 columns).
static COLUMN_LOOKUP: Lazy<Vec<String>> = Lazy::new(|| {
    let mut cols = Vec::with_capacity(702);
    for c in b'A'..=b'Z' {
        cols.push(String::from(c as char));
    }
    for c1 in b'A'..=b'Z' {
        for c2 in b'A'..=b'Z' {
            cols.push(format!("{}{}", c1 as char, c2 as char));
        }
    }
    cols
});

/// Encode a zero-based column index in bijective base-26 letters.
pub fn column_to_letters(col: u32) -> String {
    if col < 702 {
        return COLUMN_LOOKUP[col as usize].clone();
    }

    let mut col = col;
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(b'A' + rem);
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.reverse();
    String::from_utf8(buf).expect("only ASCII A-Z")
}

/// Decode bijective base-26 letters into a zero-based column index.
/// Rejects the empty string, non-uppercase bytes, and indices past the grid.
pub fn letters_to_column(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for b in s.bytes() {
        if !b.is_ascii_uppercase() {
            return None;
        }
        let digit = (b - b'A' + 1) as u32;
        col = col.checked_mul(26)?.checked_add(digit)?;
        if col > COL_MAX + 1 {
            return None;
        }
    }
    Some(col - 1)
}
