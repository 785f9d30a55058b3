// ABOUTME: Streaming tokenizer: char stream with one-char pushback to positioned tokens

use crate::error::EvalError;
use crate::keywords::{
    can_appear_in_symbol, is_whitespace, DOUBLE_QUOTE, FALSE_LITERAL, LEFT_BRACKET, LEFT_PAREN,
    NONE_LITERAL, RIGHT_BRACKET, RIGHT_PAREN, SEMICOLON, SINGLE_QUOTE, TRUE_LITERAL,
};
use crate::token::{Position, Token};
use crate::value::Value;

enum RunClass {
    True,
    False,
    Null,
    Int(i64),
    Float(f64),
    InvalidNumeric,
    Identifier,
}

fn looks_numeric_start(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('+') | Some('-') => matches!(chars.next(), Some(c) if c.is_ascii_digit()),
        _ => false,
    }
}

fn matches_integer_grammar(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;
    let n = b.len();
    if i < n && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    if i == n {
        return false;
    }
    while i < n {
        if !b[i].is_ascii_digit() {
            return false;
        }
        i += 1;
    }
    true
}

/// `[-+]?(\d*\.\d+|\d+\.?)([Ee][+-]?\d+)?` — spec §4.1 rule 3, by way of
/// `tokenizer.py`'s `NUMERIC_LITERAL_REGEX`.
fn matches_float_grammar(s: &str) -> bool {
    let b = s.as_bytes();
    let n = b.len();
    let mut i = 0;
    if i < n && (b[i] == b'+' || b[i] == b'-') {
        i += 1;
    }
    let digits_before_start = i;
    while i < n && b[i].is_ascii_digit() {
        i += 1;
    }
    let digits_before = i - digits_before_start;

    let mut has_dot = false;
    let mut digits_after = 0;
    if i < n && b[i] == b'.' {
        has_dot = true;
        i += 1;
        let start = i;
        while i < n && b[i].is_ascii_digit() {
            i += 1;
        }
        digits_after = i - start;
    }

    let mantissa_ok = if has_dot {
        digits_after > 0 || digits_before > 0
    } else {
        digits_before > 0
    };
    if !mantissa_ok || (digits_before == 0 && digits_after == 0) {
        return false;
    }

    if i < n && (b[i] == b'e' || b[i] == b'E') {
        i += 1;
        if i < n && (b[i] == b'+' || b[i] == b'-') {
            i += 1;
        }
        let start = i;
        while i < n && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            return false;
        }
    }

    i == n
}

fn classify_run(s: &str) -> RunClass {
    if s == TRUE_LITERAL {
        return RunClass::True;
    }
    if s == FALSE_LITERAL {
        return RunClass::False;
    }
    if s == NONE_LITERAL {
        return RunClass::Null;
    }
    if matches_integer_grammar(s) {
        return match s.parse::<i64>() {
            Ok(n) => RunClass::Int(n),
            Err(_) => RunClass::InvalidNumeric,
        };
    }
    if matches_float_grammar(s) {
        return match s.parse::<f64>() {
            Ok(f) => RunClass::Float(f),
            Err(_) => RunClass::InvalidNumeric,
        };
    }
    if looks_numeric_start(s) {
        return RunClass::InvalidNumeric;
    }
    RunClass::Identifier
}

/// Splits a run on the qualifier separator `::`, returning each component
/// with the stream position at which it begins.
fn split_qualified(run: &str, run_start: Position) -> Vec<(Position, String)> {
    let chars: Vec<char> = run.chars().collect();
    let mut components = Vec::new();
    let mut i = 0;
    let mut comp_start = run_start;
    let mut current = String::new();
    while i < chars.len() {
        if chars[i] == ':' && i + 1 < chars.len() && chars[i + 1] == ':' {
            components.push((comp_start, std::mem::take(&mut current)));
            i += 2;
            comp_start = run_start + i;
        } else {
            current.push(chars[i]);
            i += 1;
        }
    }
    components.push((comp_start, current));
    components
}

pub struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
    pushback: Option<char>,
}

impl Tokenizer {
    pub fn new(source: &str) -> Self {
        Tokenizer {
            chars: source.chars().collect(),
            pos: 0,
            pushback: None,
        }
    }

    fn stream_end(&self) -> Position {
        self.chars.len()
    }

    fn next_char(&mut self) -> Option<(Position, char)> {
        if let Some(c) = self.pushback.take() {
            let p = self.pos;
            self.pos += 1;
            return Some((p, c));
        }
        if self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            let p = self.pos;
            self.pos += 1;
            Some((p, c))
        } else {
            None
        }
    }

    fn unread(&mut self, c: char) {
        self.pos -= 1;
        self.pushback = Some(c);
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.next_char() {
                Some((_, c)) if is_whitespace(c) => continue,
                Some((_, c)) if c == SEMICOLON => {
                    loop {
                        match self.next_char() {
                            None => return,
                            Some((_, '\n')) => break,
                            Some(_) => continue,
                        }
                    }
                }
                Some((_, c)) => {
                    self.unread(c);
                    return;
                }
                None => return,
            }
        }
    }

    /// Produces the next token. Past end-of-stream, keeps returning fresh
    /// `Eos` tokens at the stream-end position (spec §4.1).
    pub fn next_token(&mut self) -> Result<Token, EvalError> {
        self.skip_whitespace_and_comments();

        let (start, c) = match self.next_char() {
            Some(pair) => pair,
            None => return Ok(Token::Eos(self.stream_end())),
        };

        match c {
            _ if c == LEFT_PAREN => Ok(Token::LParen(start)),
            _ if c == RIGHT_PAREN => Ok(Token::RParen(start)),
            _ if c == LEFT_BRACKET => Ok(Token::LBrack(start)),
            _ if c == RIGHT_BRACKET => Ok(Token::RBrack(start)),
            _ if c == DOUBLE_QUOTE || c == SINGLE_QUOTE => self.read_string(c, start),
            _ => self.read_symbol(start, c),
        }
    }

    fn read_string(&mut self, quote: char, start: Position) -> Result<Token, EvalError> {
        let mut s = String::new();
        loop {
            match self.next_char() {
                None => {
                    return Err(EvalError::syntax(
                        self.stream_end(),
                        "unterminated string literal",
                    ))
                }
                Some((_, c)) if c == quote => {
                    return Ok(Token::Literal(start, Value::Str(s.into())))
                }
                Some((_, '\\')) => match self.next_char() {
                    None => {
                        return Err(EvalError::syntax(
                            self.stream_end(),
                            "unterminated string literal",
                        ))
                    }
                    Some((escape_pos, esc)) => {
                        let resolved = match esc {
                            'a' => '\u{07}',
                            'b' => '\u{08}',
                            't' => '\t',
                            'n' => '\n',
                            'v' => '\u{0B}',
                            'f' => '\u{0C}',
                            'r' => '\r',
                            '0' => '\0',
                            '\\' => '\\',
                            other if other == DOUBLE_QUOTE || other == SINGLE_QUOTE => other,
                            other => {
                                return Err(EvalError::syntax(
                                    escape_pos - 1,
                                    format!("invalid escape sequence '\\{other}'"),
                                ))
                            }
                        };
                        s.push(resolved);
                    }
                },
                Some((p, c)) if c.is_control() => {
                    return Err(EvalError::syntax(
                        p,
                        "non-printable character in string literal",
                    ))
                }
                Some((_, c)) => s.push(c),
            }
        }
    }

    fn read_symbol(&mut self, start: Position, first: char) -> Result<Token, EvalError> {
        let mut run = String::new();
        run.push(first);
        loop {
            match self.next_char() {
                Some((_, c)) if can_appear_in_symbol(c) => run.push(c),
                Some((_, c)) => {
                    self.unread(c);
                    break;
                }
                None => break,
            }
        }
        self.classify_and_build(start, run)
    }

    fn classify_and_build(&self, start: Position, run: String) -> Result<Token, EvalError> {
        match classify_run(&run) {
            RunClass::True => Ok(Token::Literal(start, Value::Bool(true))),
            RunClass::False => Ok(Token::Literal(start, Value::Bool(false))),
            RunClass::Null => Ok(Token::Literal(start, Value::Null)),
            RunClass::Int(n) => Ok(Token::Literal(start, Value::Int(n))),
            RunClass::Float(f) => Ok(Token::Literal(start, Value::Float(f))),
            RunClass::InvalidNumeric => {
                Err(EvalError::syntax(start, "invalid numeric literal"))
            }
            RunClass::Identifier => {
                let components = split_qualified(&run, start);
                for (pos, name) in &components {
                    if name.is_empty() {
                        return Err(EvalError::syntax(*pos, "empty identifier component"));
                    }
                    if name.contains(':') {
                        return Err(EvalError::syntax(
                            *pos,
                            "identifier component contains a lone ':'",
                        ));
                    }
                    if !matches!(classify_run(name), RunClass::Identifier) {
                        return Err(EvalError::syntax(
                            *pos,
                            format!("'{name}' is reserved and cannot appear in a qualified name"),
                        ));
                    }
                }
                let mut iter = components.into_iter();
                let (_, head) = iter.next().expect("at least one component");
                let tail: Vec<String> = iter.map(|(_, name)| name).collect();
                if tail.is_empty() {
                    Ok(Token::Ident(start, head))
                } else {
                    Ok(Token::Attr(start, head, tail))
                }
            }
        }
    }
}
