//! Byte-based tokenizer for formula source.
//!
//! The input is the formula body, already stripped of the leading `=`.
//! Whitespace separates tokens and is never emitted.

use std::convert::TryFrom;
use std::error::Error;
use std::fmt::{self, Display};

/// A custom error type for the tokenizer.
#[derive(Debug)]
pub struct TokenizerError {
    pub message: String,
    pub pos: usize,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenizerError at position {}: {}", self.pos, self.message)
    }
}

impl Error for TokenizerError {}

/// The type of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A C-style floating literal: `1`, `1.`, `.5`, `1.5e-3`.
    Number,
    /// A letters-then-digits cell reference: `A1`, `XFD16384`, also the
    /// out-of-range shapes (`XFE1`) the parser turns into sentinels.
    CellRef,
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A token in a formula body.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: usize,
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {:?}>", self.kind, self.text)
    }
}

/// A tokenizer for formula bodies.
#[derive(Debug)]
pub struct Tokenizer {
    source: String,
    pub items: Vec<Token>,
    offset: usize,
}

impl Tokenizer {
    /// Create a new tokenizer and immediately scan the source.
    pub fn new(source: &str) -> Result<Self, TokenizerError> {
        let mut tokenizer = Tokenizer {
            source: source.to_string(),
            items: Vec::with_capacity(source.len() / 2),
            offset: 0,
        };
        tokenizer.scan()?;
        Ok(tokenizer)
    }

    #[inline]
    fn current_byte(&self) -> Option<u8> {
        self.source.as_bytes().get(self.offset).copied()
    }

    fn scan(&mut self) -> Result<(), TokenizerError> {
        while let Some(b) = self.current_byte() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => self.offset += 1,
                b'0'..=b'9' | b'.' => self.scan_number()?,
                b'A'..=b'Z' => self.scan_cell_ref()?,
                b'+' => self.push_single(TokenKind::Plus),
                b'-' => self.push_single(TokenKind::Minus),
                b'*' => self.push_single(TokenKind::Star),
                b'/' => self.push_single(TokenKind::Slash),
                b'(' => self.push_single(TokenKind::LParen),
                b')' => self.push_single(TokenKind::RParen),
                other => {
                    return Err(TokenizerError {
                        message: format!("unexpected character {:?}", other as char),
                        pos: self.offset,
                    });
                }
            }
        }
        Ok(())
    }

    fn push_single(&mut self, kind: TokenKind) {
        let start = self.offset;
        self.offset += 1;
        self.items.push(Token {
            kind,
            text: self.source[start..self.offset].to_string(),
            start,
        });
    }

    /// Scan a numeric literal: integer digits, optional fraction, optional
    /// exponent. A bare `.` with no digit on either side is rejected.
    fn scan_number(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;
        let bytes = self.source.as_bytes();

        while self.current_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.offset += 1;
        }
        if self.current_byte() == Some(b'.') {
            self.offset += 1;
            while self.current_byte().is_some_and(|b| b.is_ascii_digit()) {
                self.offset += 1;
            }
        }
        // "." alone or "." followed by a non-digit never forms a number
        if self.offset == start + 1 && bytes[start] == b'.' {
            return Err(TokenizerError {
                message: "unexpected character '.'".to_string(),
                pos: start,
            });
        }

        if let Some(e) = self.current_byte() {
            if e == b'e' || e == b'E' {
                let mut lookahead = self.offset + 1;
                if bytes.get(lookahead) == Some(&b'+') || bytes.get(lookahead) == Some(&b'-') {
                    lookahead += 1;
                }
                if bytes.get(lookahead).is_some_and(|b| b.is_ascii_digit()) {
                    self.offset = lookahead;
                    while self.current_byte().is_some_and(|b| b.is_ascii_digit()) {
                        self.offset += 1;
                    }
                } else {
                    return Err(TokenizerError {
                        message: "malformed exponent".to_string(),
                        pos: self.offset,
                    });
                }
            }
        }

        self.items.push(Token {
            kind: TokenKind::Number,
            text: self.source[start..self.offset].to_string(),
            start,
        });
        Ok(())
    }

    /// Scan a cell reference: an uppercase letter run followed by a digit
    /// run. A letter run with no trailing digits has no meaning in this
    /// grammar.
    fn scan_cell_ref(&mut self) -> Result<(), TokenizerError> {
        let start = self.offset;

        while self.current_byte().is_some_and(|b| b.is_ascii_uppercase()) {
            self.offset += 1;
        }
        let digits_start = self.offset;
        while self.current_byte().is_some_and(|b| b.is_ascii_digit()) {
            self.offset += 1;
        }
        if self.offset == digits_start {
            return Err(TokenizerError {
                message: format!(
                    "expected a row number after {:?}",
                    &self.source[start..digits_start]
                ),
                pos: digits_start,
            });
        }

        self.items.push(Token {
            kind: TokenKind::CellRef,
            text: self.source[start..self.offset].to_string(),
            start,
        });
        Ok(())
    }

    /// Reconstruct the source from the scanned tokens.
    pub fn render(&self) -> String {
        self.items.iter().map(|t| t.text.as_str()).collect()
    }
}

impl TryFrom<&str> for Tokenizer {
    type Error = TokenizerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Tokenizer::new(value)
    }
}
