// ABOUTME: Recursive-descent parser: token stream to a lazy sequence of expressions

use crate::ast::Expr;
use crate::error::EvalError;
use crate::token::{Position, Token};
use crate::tokenizer::Tokenizer;

/// Pulls expressions one at a time from a source string, by balanced
/// delimiter recursion over the underlying token stream (spec §4.2).
/// Iterating past the last expression yields `None`; a malformed program
/// yields `Some(Err(..))` and the iterator should not be polled further.
pub struct Parser {
    tokenizer: Tokenizer,
    done: bool,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        Parser {
            tokenizer: Tokenizer::new(source),
            done: false,
        }
    }

    fn next_token(&mut self) -> Result<Token, EvalError> {
        self.tokenizer.next_token()
    }

    /// Parses one top-level expression, or `None` at end-of-stream.
    pub fn parse_next(&mut self) -> Result<Option<Expr>, EvalError> {
        if self.done {
            return Ok(None);
        }
        let tok = self.next_token()?;
        if tok.is_eos() {
            self.done = true;
            return Ok(None);
        }
        self.parse_expr(tok).map(Some)
    }

    /// Parses every remaining top-level expression eagerly.
    pub fn parse_all(&mut self) -> Result<Vec<Expr>, EvalError> {
        let mut out = Vec::new();
        while let Some(expr) = self.parse_next()? {
            out.push(expr);
        }
        Ok(out)
    }

    fn parse_expr(&mut self, tok: Token) -> Result<Expr, EvalError> {
        match tok {
            Token::Literal(p, v) => Ok(Expr::Literal(p, v)),
            Token::Ident(p, name) => Ok(Expr::Identifier(p, name)),
            Token::Attr(p, head, tail) => Ok(Expr::AttributeAccess(p, head, tail)),
            Token::LBrack(p) => self.parse_list(p),
            Token::LParen(p) => self.parse_symbolic(p),
            Token::RParen(p) | Token::RBrack(p) => Err(EvalError::syntax(
                p,
                format!("unexpected '{}' where an expression was expected", tok.describe()),
            )),
            Token::Eos(p) => Err(EvalError::syntax(p, "unexpected end of input")),
        }
    }

    fn parse_list(&mut self, start: Position) -> Result<Expr, EvalError> {
        let mut items = Vec::new();
        let mut last: Option<Token> = None;
        loop {
            let tok = self.next_token()?;
            match tok {
                Token::RBrack(_) => return Ok(Expr::List(start, items)),
                Token::Eos(p) => {
                    return Err(EvalError::syntax(
                        p,
                        format!(
                            "expected ']' to close list opened at {start}, got end of input{}",
                            describe_last(&last)
                        ),
                    ))
                }
                other => {
                    last = Some(other.clone());
                    items.push(self.parse_expr(other)?);
                }
            }
        }
    }

    fn parse_symbolic(&mut self, start: Position) -> Result<Expr, EvalError> {
        let op_tok = self.next_token()?;
        if let Token::RParen(p) = op_tok {
            return Err(EvalError::syntax(
                p,
                "empty application: '(' must be followed by an operation expression",
            ));
        }
        if op_tok.is_eos() {
            return Err(EvalError::syntax(
                op_tok.position(),
                format!("expected ')' to close application opened at {start}, got end of input"),
            ));
        }
        let operation = self.parse_expr(op_tok)?;

        let mut arguments = Vec::new();
        let mut last: Option<Token> = None;
        loop {
            let tok = self.next_token()?;
            match tok {
                Token::RParen(_) => {
                    return Ok(Expr::Symbolic(start, Box::new(operation), arguments))
                }
                Token::Eos(p) => {
                    return Err(EvalError::syntax(
                        p,
                        format!(
                            "expected ')' to close application opened at {start}, got end of input{}",
                            describe_last(&last)
                        ),
                    ))
                }
                other => {
                    last = Some(other.clone());
                    arguments.push(self.parse_expr(other)?);
                }
            }
        }
    }
}

fn describe_last(last: &Option<Token>) -> String {
    match last {
        Some(tok) => format!(" (last token was {})", tok.describe()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn parses_flat_symbolic_application() {
        let mut p = Parser::new("(+ 1 2)");
        let expr = p.parse_next().unwrap().unwrap();
        match expr {
            Expr::Symbolic(_, op, args) => {
                assert_eq!(op.as_identifier(), Some("+"));
                assert_eq!(args.len(), 2);
            }
            other => panic!("expected Symbolic, got {other:?}"),
        }
    }

    #[test]
    fn parses_list_literal() {
        let mut p = Parser::new("[1 2 3]");
        let expr = p.parse_next().unwrap().unwrap();
        match expr {
            Expr::List(_, items) => assert_eq!(items.len(), 3),
            other => panic!("expected List, got {other:?}"),
        }
    }

    #[test]
    fn parses_multiple_top_level_expressions() {
        let mut p = Parser::new("1 2 3");
        let all = p.parse_all().unwrap();
        assert_eq!(all.len(), 3);
        assert!(matches!(all[0], Expr::Literal(_, Value::Int(1))));
    }

    #[test]
    fn unbalanced_list_is_a_syntax_error() {
        let mut p = Parser::new("[1 2");
        assert!(p.parse_next().is_err());
    }

    #[test]
    fn closing_paren_with_no_operation_is_an_error() {
        let mut p = Parser::new("()");
        assert!(p.parse_next().is_err());
    }

    #[test]
    fn stray_closing_delimiter_is_an_error() {
        let mut p = Parser::new(")");
        assert!(p.parse_next().is_err());
    }

    #[test]
    fn nested_symbolic_and_list_expressions() {
        let mut p = Parser::new("(let [x y] [1 2])");
        let expr = p.parse_next().unwrap().unwrap();
        match expr {
            Expr::Symbolic(_, op, args) => {
                assert_eq!(op.as_identifier(), Some("let"));
                assert!(matches!(args[0], Expr::List(_, _)));
                assert!(matches!(args[1], Expr::List(_, _)));
            }
            other => panic!("expected Symbolic, got {other:?}"),
        }
    }
}
