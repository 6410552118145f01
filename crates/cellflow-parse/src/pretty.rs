//! Canonical formula printing.
//!
//! The printed form is the minimal-parenthesis rendering that re-parses to
//! an equivalent tree: whitespace is gone, grouping written in the source
//! is dropped, and parentheses appear exactly where precedence or
//! left-associativity demands them. Numbers print in the shortest decimal
//! form that round-trips.

use std::fmt::Write;

use crate::parser::{BinaryOp, Expr};

/// Precedence class of a printed subexpression. Subtraction and division
/// get their own classes because their right operands re-associate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prec {
    Add,
    Sub,
    Mul,
    Div,
    Unary,
    Atom,
}

/// Which side of the parent the child sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Classify a node for the parenthesization table. Grouping markers are
/// transparent: `(((x)))` classifies as `x`.
fn prec(expr: &Expr) -> Prec {
    match expr {
        Expr::Number(_) | Expr::Reference { .. } => Prec::Atom,
        Expr::Unary { .. } => Prec::Unary,
        Expr::Binary { op: BinaryOp::Add, .. } => Prec::Add,
        Expr::Binary { op: BinaryOp::Sub, .. } => Prec::Sub,
        Expr::Binary { op: BinaryOp::Mul, .. } => Prec::Mul,
        Expr::Binary { op: BinaryOp::Div, .. } => Prec::Div,
        Expr::Paren(inner) => prec(inner),
    }
}

/// Whether a child of the given class needs parentheses under a binary
/// parent of the given class, on the given side.
///
/// `a+b-c` and `(a-b)-c` print bare; `a-(b-c)`, `a-(b+c)`, `a/(b*c)`, and
/// `(a+b)*c` keep their parentheses.
fn binary_child_needs_parens(parent: Prec, side: Side, child: Prec) -> bool {
    match parent {
        Prec::Add => false,
        Prec::Sub => side == Side::Right && matches!(child, Prec::Add | Prec::Sub),
        Prec::Mul => matches!(child, Prec::Add | Prec::Sub),
        Prec::Div => {
            matches!(child, Prec::Add | Prec::Sub)
                || (side == Side::Right && matches!(child, Prec::Mul | Prec::Div))
        }
        Prec::Unary | Prec::Atom => unreachable!("not binary parents"),
    }
}

/// A unary sign binds tighter than the additive level, so an additive
/// operand must be parenthesized: `-(a+b)`.
fn unary_child_needs_parens(child: Prec) -> bool {
    matches!(child, Prec::Add | Prec::Sub)
}

/// Render an expression in canonical form, without the leading `=`.
pub fn print_formula(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_expr(out: &mut String, expr: &Expr) {
    match expr {
        Expr::Number(n) => {
            let _ = write!(out, "{n}");
        }
        Expr::Reference { original, pos } => {
            if pos.is_valid() {
                let _ = write!(out, "{pos}");
            } else {
                out.push_str(original);
            }
        }
        Expr::Unary { op, operand } => {
            let _ = write!(out, "{op}");
            write_child(out, operand, unary_child_needs_parens(prec(operand)));
        }
        Expr::Binary { op, lhs, rhs } => {
            let parent = prec(expr);
            write_child(
                out,
                lhs,
                binary_child_needs_parens(parent, Side::Left, prec(lhs)),
            );
            let _ = write!(out, "{op}");
            write_child(
                out,
                rhs,
                binary_child_needs_parens(parent, Side::Right, prec(rhs)),
            );
        }
        Expr::Paren(inner) => write_expr(out, inner),
    }
}

fn write_child(out: &mut String, child: &Expr, parens: bool) {
    if parens {
        out.push('(');
        write_expr(out, child);
        out.push(')');
    } else {
        write_expr(out, child);
    }
}
