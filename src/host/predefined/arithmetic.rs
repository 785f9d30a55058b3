//! Arithmetic operators: +, -, *, /, %
//!
//! Numeric operations over `Int`/`Float`, mirroring the host's numeric
//! tower: mixing an `Int` and a `Float` promotes to `Float`.

use super::builtin;
use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;

fn as_f64(v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(n) => Ok(*n),
        other => Err(EvalError::ValueError(format!(
            "expected a number, got {}",
            other.type_name()
        ))),
    }
}

fn is_float(v: &Value) -> bool {
    matches!(v, Value::Float(_))
}

fn numeric(total: f64, any_float: bool) -> Value {
    if any_float {
        Value::Float(total)
    } else {
        Value::Int(total as i64)
    }
}

/// `(+ a b …)`: sum of all arguments; `0` with none.
fn add(args: &[Value]) -> Result<Value, EvalError> {
    let mut total = 0.0;
    let mut any_float = false;
    for a in args {
        any_float |= is_float(a);
        total += as_f64(a)?;
    }
    Ok(numeric(total, any_float))
}

/// `(- a b …)`: subtracts the rest from the first; negates a lone argument.
fn sub(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("-", "at least 1", 0));
    }
    if args.len() == 1 {
        return Ok(numeric(-as_f64(&args[0])?, is_float(&args[0])));
    }
    let mut any_float = is_float(&args[0]);
    let mut total = as_f64(&args[0])?;
    for a in &args[1..] {
        any_float |= is_float(a);
        total -= as_f64(a)?;
    }
    Ok(numeric(total, any_float))
}

/// `(* a b …)`: product of all arguments; `1` with none.
fn mul(args: &[Value]) -> Result<Value, EvalError> {
    let mut total = 1.0;
    let mut any_float = false;
    for a in args {
        any_float |= is_float(a);
        total *= as_f64(a)?;
    }
    Ok(numeric(total, any_float))
}

/// `(/ a b …)`: divides the first by the rest; reciprocal of a lone
/// argument. Division by zero is a `ValueError`, not a panic.
fn div(args: &[Value]) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::arity("/", "at least 1", 0));
    }
    if args.len() == 1 {
        let d = as_f64(&args[0])?;
        if d == 0.0 {
            return Err(EvalError::ValueError("division by zero".to_string()));
        }
        return Ok(Value::Float(1.0 / d));
    }
    let mut total = as_f64(&args[0])?;
    for a in &args[1..] {
        let d = as_f64(a)?;
        if d == 0.0 {
            return Err(EvalError::ValueError("division by zero".to_string()));
        }
        total /= d;
    }
    Ok(Value::Float(total))
}

/// `(% a b)`: remainder of `a / b`, exactly two arguments.
fn rem(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("%", "2", args.len()));
    }
    let (a, b) = (&args[0], &args[1]);
    if let (Value::Int(a), Value::Int(b)) = (a, b) {
        if *b == 0 {
            return Err(EvalError::ValueError("division by zero".to_string()));
        }
        return Ok(Value::Int(a % b));
    }
    let b = as_f64(b)?;
    if b == 0.0 {
        return Err(EvalError::ValueError("division by zero".to_string()));
    }
    Ok(Value::Float(as_f64(a)? % b))
}

pub fn register(table: &mut HashMap<String, Value>) {
    table.insert("+".to_string(), builtin("+", "sum of all arguments", add));
    table.insert(
        "-".to_string(),
        builtin("-", "subtracts the rest from the first", sub),
    );
    table.insert(
        "*".to_string(),
        builtin("*", "product of all arguments", mul),
    );
    table.insert(
        "/".to_string(),
        builtin("/", "divides the first by the rest", div),
    );
    table.insert("%".to_string(), builtin("%", "remainder of a / b", rem));
}
