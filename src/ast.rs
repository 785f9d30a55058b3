// ABOUTME: Expression tagged sum produced by the parser

use crate::token::Position;
use crate::value::Value;

/// An expression node. Tree-shaped, no cycles; immutable after construction
/// (spec §3 "Lifecycle"). Every variant carries the position of its first
/// token.
#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Position, Value),
    Identifier(Position, String),
    AttributeAccess(Position, String, Vec<String>),
    List(Position, Vec<Expr>),
    /// A parenthesized application: `operation` is an arbitrary
    /// subexpression (not necessarily an identifier), `arguments` is
    /// evaluated (or not) according to what `operation` resolves to.
    Symbolic(Position, Box<Expr>, Vec<Expr>),
}

impl Expr {
    pub fn position(&self) -> Position {
        match self {
            Expr::Literal(p, _)
            | Expr::Identifier(p, _)
            | Expr::AttributeAccess(p, _, _)
            | Expr::List(p, _)
            | Expr::Symbolic(p, _, _) => *p,
        }
    }

    /// The identifier name, if this expression is a bare `Identifier`.
    /// Used by the evaluator to recognize special-form heads.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier(_, name) => Some(name),
            _ => None,
        }
    }
}
