//! Comparison operators: =, !=, <, >, <=, >=

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

fn eq(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("=", "2", args.len()));
    }
    Ok(Value::Bool(args[0].equals(&args[1])))
}

fn neq(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("!=", "2", args.len()));
    }
    Ok(Value::Bool(!args[0].equals(&args[1])))
}

macro_rules! ordering_builtin {
    ($name:ident, $op:tt) => {
        fn $name(args: &[Value]) -> Result<Value, EvalError> {
            if args.len() != 2 {
                return Err(EvalError::arity(stringify!($op), "2", args.len()));
            }
            Ok(Value::Bool(as_f64(&args[0])? $op as_f64(&args[1])?))
        }
    };
}

ordering_builtin!(lt, <);
ordering_builtin!(gt, >);
ordering_builtin!(le, <=);
ordering_builtin!(ge, >=);

pub fn register(table: &mut HashMap<String, Value>) {
    table.insert("=".to_string(), builtin("=", "value equality", eq));
    table.insert("!=".to_string(), builtin("!=", "value inequality", neq));
    table.insert("<".to_string(), builtin("<", "strictly less than", lt));
    table.insert(">".to_string(), builtin(">", "strictly greater than", gt));
    table.insert("<=".to_string(), builtin("<=", "less than or equal", le));
    table.insert(">=".to_string(), builtin(">=", "greater than or equal", ge));
}
