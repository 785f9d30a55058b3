//! Sequence operations: first, rest, get, set
//!
//! Spec §6 collaborator 3 lists these among the "typical but not mandated"
//! predefined members. Operate on `Value::Seq`, the representation the
//! evaluator already uses for `List` expressions and variadic captures.

use super::builtin;
use crate::error::EvalError;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

fn expect_seq(v: &Value) -> Result<&Rc<Vec<Value>>, EvalError> {
    match v {
        Value::Seq(items) => Ok(items),
        other => Err(EvalError::ValueError(format!(
            "expected a list, got {}",
            other.type_name()
        ))),
    }
}

fn expect_index(v: &Value) -> Result<usize, EvalError> {
    match v {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::Int(n) => Err(EvalError::ValueError(format!("negative index: {n}"))),
        other => Err(EvalError::ValueError(format!(
            "expected an integer index, got {}",
            other.type_name()
        ))),
    }
}

/// `(first list)`: the first element; a `ValueError` on an empty list.
fn first(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("first", "1", args.len()));
    }
    let items = expect_seq(&args[0])?;
    items
        .first()
        .cloned()
        .ok_or_else(|| EvalError::ValueError("first of an empty list".to_string()))
}

/// `(rest list)`: all but the first element, as a new list. Empty input
/// yields an empty list, not an error.
fn rest(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("rest", "1", args.len()));
    }
    let items = expect_seq(&args[0])?;
    let tail = if items.is_empty() {
        Vec::new()
    } else {
        items[1..].to_vec()
    };
    Ok(Value::Seq(Rc::new(tail)))
}

/// `(get list index)`: the element at `index`; out-of-range is a
/// `ValueError`, not a panic.
fn get(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("get", "2", args.len()));
    }
    let items = expect_seq(&args[0])?;
    let index = expect_index(&args[1])?;
    items
        .get(index)
        .cloned()
        .ok_or_else(|| EvalError::ValueError(format!("index {index} out of range")))
}

/// `(set list index value)`: a new list with `index` replaced. Sequences
/// are immutable once constructed, so this returns a fresh `Value::Seq`
/// rather than mutating in place.
fn set(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 3 {
        return Err(EvalError::arity("set", "3", args.len()));
    }
    let items = expect_seq(&args[0])?;
    let index = expect_index(&args[1])?;
    if index >= items.len() {
        return Err(EvalError::ValueError(format!("index {index} out of range")));
    }
    let mut updated = (**items).clone();
    updated[index] = args[2].clone();
    Ok(Value::Seq(Rc::new(updated)))
}

pub fn register(table: &mut HashMap<String, Value>) {
    table.insert(
        "first".to_string(),
        builtin("first", "the first element of a list", first),
    );
    table.insert(
        "rest".to_string(),
        builtin("rest", "all but the first element of a list", rest),
    );
    table.insert(
        "get".to_string(),
        builtin("get", "the element at an index", get),
    );
    table.insert(
        "set".to_string(),
        builtin("set", "a copy of a list with one element replaced", set),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(items: Vec<Value>) -> Value {
        Value::Seq(Rc::new(items))
    }

    #[test]
    fn first_and_rest_split_a_list() {
        let l = seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(first(&[l.clone()]).unwrap().equals(&Value::Int(1)));
        match rest(&[l]).unwrap() {
            Value::Seq(items) => assert_eq!(items.len(), 2),
            other => panic!("expected Seq, got {other:?}"),
        }
    }

    #[test]
    fn first_of_empty_list_is_an_error() {
        assert!(first(&[seq(vec![])]).is_err());
    }

    #[test]
    fn get_and_set_index_into_a_list() {
        let l = seq(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        assert!(get(&[l.clone(), Value::Int(1)])
            .unwrap()
            .equals(&Value::Int(2)));
        let updated = set(&[l, Value::Int(1), Value::Int(99)]).unwrap();
        match updated {
            Value::Seq(items) => assert!(items[1].equals(&Value::Int(99))),
            other => panic!("expected Seq, got {other:?}"),
        }
    }

    #[test]
    fn out_of_range_index_is_a_value_error() {
        let l = seq(vec![Value::Int(1)]);
        assert!(get(&[l.clone(), Value::Int(5)]).is_err());
        assert!(set(&[l, Value::Int(5), Value::Int(0)]).is_err());
    }
}
