//! Recursive-descent parser producing the formula AST.
//!
//! Grammar, over a source already stripped of the leading `=`:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := '+' factor | '-' factor | '(' expr ')' | number | cell
//! ```
//!
//! A cell-shaped token whose coordinates fall outside the grid still
//! parses: it becomes a [`Expr::Reference`] with `Position::NONE`, the
//! sentinel that evaluates to a `#REF!` error. Every other syntactic
//! violation is a [`ParserError`].

use std::error::Error;
use std::fmt::{self, Display};

use smallvec::SmallVec;

use cellflow_common::Position;

use crate::tokenizer::{Token, TokenKind, Tokenizer, TokenizerError};

/// A custom error type for the parser.
#[derive(Debug)]
pub struct ParserError {
    pub message: String,
    pub position: Option<usize>,
}

impl Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(pos) = self.position {
            write!(f, "ParserError at position {}: {}", pos, self.message)
        } else {
            write!(f, "ParserError: {}", self.message)
        }
    }
}

impl Error for ParserError {}

impl From<TokenizerError> for ParserError {
    fn from(err: TokenizerError) -> Self {
        ParserError {
            message: err.message,
            position: Some(err.pos),
        }
    }
}

/// Binary operators, in the only two precedence levels the grammar has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            BinaryOp::Add => lhs + rhs,
            BinaryOp::Sub => lhs - rhs,
            BinaryOp::Mul => lhs * rhs,
            BinaryOp::Div => lhs / rhs,
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        })
    }
}

/// Unary sign operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Plus => "+",
            UnaryOp::Minus => "-",
        })
    }
}

/// A parsed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// A cell reference. `original` is the token text as written;
    /// `pos` is `Position::NONE` for the out-of-range sentinel.
    Reference {
        original: String,
        pos: Position,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Explicit grouping as written in the source. Transparent to
    /// evaluation; the canonical printer re-derives grouping from
    /// structure instead of echoing these.
    Paren(Box<Expr>),
}

impl Expr {
    /// Collect every referenced position in left-to-right occurrence
    /// order, sentinels included.
    pub fn collect_refs(&self) -> SmallVec<[Position; 4]> {
        let mut out = SmallVec::new();
        self.push_refs(&mut out);
        out
    }

    fn push_refs(&self, out: &mut SmallVec<[Position; 4]>) {
        match self {
            Expr::Number(_) => {}
            Expr::Reference { pos, .. } => out.push(*pos),
            Expr::Unary { operand, .. } => operand.push_refs(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.push_refs(out);
                rhs.push_refs(out);
            }
            Expr::Paren(inner) => inner.push_refs(out),
        }
    }
}

/// Parse a formula body into an AST.
pub fn parse(source: &str) -> Result<Expr, ParserError> {
    let tokens = Tokenizer::new(source)?.items;
    Parser::new(tokens).parse()
}

/// A parser for converting tokens into an AST.
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            position: 0,
        }
    }

    pub fn parse(mut self) -> Result<Expr, ParserError> {
        let expr = self.parse_expr()?;
        match self.peek() {
            None => Ok(expr),
            Some(token) => Err(ParserError {
                message: format!("unexpected {} after expression", token),
                position: Some(token.start),
            }),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.position);
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    /// Consume an additive-level operator if one is next.
    fn take_additive(&mut self) -> Option<BinaryOp> {
        let op = match self.peek()?.kind {
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            _ => return None,
        };
        self.position += 1;
        Some(op)
    }

    fn take_multiplicative(&mut self) -> Option<BinaryOp> {
        let op = match self.peek()?.kind {
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            _ => return None,
        };
        self.position += 1;
        Some(op)
    }

    fn parse_expr(&mut self) -> Result<Expr, ParserError> {
        let mut lhs = self.parse_term()?;
        while let Some(op) = self.take_additive() {
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, ParserError> {
        let mut lhs = self.parse_factor()?;
        while let Some(op) = self.take_multiplicative() {
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, ParserError> {
        let Some(token) = self.advance() else {
            return Err(ParserError {
                message: "unexpected end of formula".to_string(),
                position: None,
            });
        };
        let token = token.clone();

        match token.kind {
            TokenKind::Plus => Ok(Expr::Unary {
                op: UnaryOp::Plus,
                operand: Box::new(self.parse_factor()?),
            }),
            TokenKind::Minus => Ok(Expr::Unary {
                op: UnaryOp::Minus,
                operand: Box::new(self.parse_factor()?),
            }),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                match self.advance() {
                    Some(t) if t.kind == TokenKind::RParen => Ok(Expr::Paren(Box::new(inner))),
                    Some(t) => Err(ParserError {
                        message: format!("expected ')', found {}", t),
                        position: Some(t.start),
                    }),
                    None => Err(ParserError {
                        message: "unclosed '('".to_string(),
                        position: Some(token.start),
                    }),
                }
            }
            TokenKind::Number => {
                let value: f64 = token.text.parse().map_err(|_| ParserError {
                    message: format!("malformed number {:?}", token.text),
                    position: Some(token.start),
                })?;
                Ok(Expr::Number(value))
            }
            TokenKind::CellRef => Ok(Expr::Reference {
                pos: Position::from_a1(&token.text),
                original: token.text,
            }),
            TokenKind::RParen | TokenKind::Star | TokenKind::Slash => Err(ParserError {
                message: format!("unexpected {}", token),
                position: Some(token.start),
            }),
        }
    }
}

impl TryFrom<&str> for Parser {
    type Error = TokenizerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(Parser::new(Tokenizer::new(value)?.items))
    }
}
