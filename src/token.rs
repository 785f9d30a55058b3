// ABOUTME: Token tagged sum produced by the tokenizer, with source positions

use crate::value::Value;

pub type Position = usize;

/// A lexical token. `EOS` is emitted exactly once per stream, at the
/// stream-end offset; further advances keep returning it (spec §4.1).
#[derive(Debug, Clone)]
pub enum Token {
    LParen(Position),
    RParen(Position),
    LBrack(Position),
    RBrack(Position),
    Eos(Position),
    Literal(Position, Value),
    Ident(Position, String),
    /// `head` is the identifier's leading component; `tail` is one or more
    /// attribute-path components, both non-empty (spec §3).
    Attr(Position, String, Vec<String>),
}

impl Token {
    pub fn position(&self) -> Position {
        match self {
            Token::LParen(p)
            | Token::RParen(p)
            | Token::LBrack(p)
            | Token::RBrack(p)
            | Token::Eos(p)
            | Token::Literal(p, _)
            | Token::Ident(p, _)
            | Token::Attr(p, _, _) => *p,
        }
    }

    pub fn is_eos(&self) -> bool {
        matches!(self, Token::Eos(_))
    }

    /// A short label used in "expected closer, got X" syntax errors.
    pub fn describe(&self) -> String {
        match self {
            Token::LParen(_) => "'('".to_string(),
            Token::RParen(_) => "')'".to_string(),
            Token::LBrack(_) => "'['".to_string(),
            Token::RBrack(_) => "']'".to_string(),
            Token::Eos(_) => "end of input".to_string(),
            Token::Literal(_, v) => format!("{v:?}"),
            Token::Ident(_, n) => n.clone(),
            Token::Attr(_, h, t) => format!("{h}::{}", t.join("::")),
        }
    }
}
