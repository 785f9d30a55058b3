// ABOUTME: Structural binding targets: nested, optionally-variadic destructuring shapes

use crate::ast::Expr;
use crate::error::EvalError;
use crate::keywords::VARIADIC_MARKER;
use crate::scope::Scope;
use crate::token::Position;
use crate::value::{self, Value};

/// One slot of a `BindingTarget`'s fixed prefix (spec §3 "Binding target
/// (structural)").
#[derive(Debug, Clone)]
pub enum TargetSlot {
    Identifier(Position, String),
    Attribute(Position, String, Vec<String>),
    Nested(BindingTarget),
}

/// A parsed destructuring shape: a fixed prefix of slots, plus an optional
/// variadic capture identifier for the trailing `& rest` pair.
#[derive(Debug, Clone)]
pub struct BindingTarget {
    pub prefix: Vec<TargetSlot>,
    pub rest: Option<(Position, String)>,
}

impl BindingTarget {
    /// Whether this target accepts `n` positional values (spec §4.4
    /// "Overload selection").
    pub fn accepts(&self, n: usize) -> bool {
        if self.rest.is_some() {
            self.prefix.len() <= n
        } else {
            self.prefix.len() == n
        }
    }
}

fn is_marker(slot: &TargetSlot) -> bool {
    matches!(slot, TargetSlot::Identifier(_, name) if name == VARIADIC_MARKER)
}

/// Parses a `List` expression into a `BindingTarget`, splitting off a
/// variadic tail when present (spec §4.4 "Structural binding algorithm",
/// step 1).
pub fn parse_target(
    list_expr: &Expr,
    allow_nested: bool,
    allow_attributes: bool,
) -> Result<BindingTarget, EvalError> {
    let items = match list_expr {
        Expr::List(_, items) => items,
        other => {
            return Err(EvalError::invalid_binding_target_expr(
                format!("{other:?}"),
                "expected a list as a binding target, got",
            ))
        }
    };

    let mut slots = Vec::with_capacity(items.len());
    for item in items {
        slots.push(parse_slot(item, allow_nested, allow_attributes)?);
    }
    split_variadic(slots)
}

fn parse_slot(
    item: &Expr,
    allow_nested: bool,
    allow_attributes: bool,
) -> Result<TargetSlot, EvalError> {
    match item {
        Expr::Identifier(p, name) => Ok(TargetSlot::Identifier(*p, name.clone())),
        Expr::List(..) => {
            if !allow_nested {
                return Err(EvalError::invalid_binding_target_expr(
                    format!("{item:?}"),
                    "nested structural binding not allowed here",
                ));
            }
            Ok(TargetSlot::Nested(parse_target(
                item,
                allow_nested,
                allow_attributes,
            )?))
        }
        Expr::AttributeAccess(p, head, tail) => {
            if !allow_attributes {
                return Err(EvalError::invalid_binding_target_expr(
                    format!("{item:?}"),
                    "attribute targets not allowed here",
                ));
            }
            Ok(TargetSlot::Attribute(*p, head.clone(), tail.clone()))
        }
        other => Err(EvalError::invalid_binding_target_expr(
            format!("{other:?}"),
            "cannot bind to",
        )),
    }
}

fn split_variadic(mut slots: Vec<TargetSlot>) -> Result<BindingTarget, EvalError> {
    if slots.len() <= 1 {
        return Ok(BindingTarget {
            prefix: slots,
            rest: None,
        });
    }

    let last = slots.len() - 1;
    let marker_misplaced = slots[..last - 1].iter().any(is_marker) || is_marker(&slots[last]);
    if marker_misplaced {
        return Err(EvalError::ValueError(format!(
            "invalid \"{VARIADIC_MARKER}\" usage in binding target"
        )));
    }

    if !is_marker(&slots[last - 1]) {
        return Ok(BindingTarget {
            prefix: slots,
            rest: None,
        });
    }

    let capture = slots.pop().expect("length checked above");
    slots.pop(); // drop the marker itself
    let rest = match capture {
        TargetSlot::Identifier(p, name) => (p, name),
        other => {
            return Err(EvalError::invalid_binding_target_expr(
                format!("{other:?}"),
                "cannot bind varargs to",
            ))
        }
    };
    Ok(BindingTarget {
        prefix: slots,
        rest: Some(rest),
    })
}

fn expect_sequence(value: &Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Seq(items) => Ok((**items).clone()),
        other => Err(EvalError::InvalidBindingError(format!(
            "expected a sequence to destructure, got {}",
            other.type_name()
        ))),
    }
}

fn set_attribute_path(base: &Value, tail: &[String], new_value: Value) -> Result<(), EvalError> {
    let (last, init) = tail.split_last().expect("attribute tail is non-empty");
    let target = value::get_attr_path(base, init)?;
    value::set_attr(&target, last, new_value)
}

/// Binds `values` against `target` in `scope` (spec §4.4 steps 3-5), used by
/// `let` of a list target and by Function/Macro parameter binding.
pub fn bind_structural(
    target: &BindingTarget,
    values: &[Value],
    mutable: bool,
    scope: &Scope,
) -> Result<(), EvalError> {
    check_arity(target, values)?;

    for (slot, value) in target.prefix.iter().zip(values.iter()) {
        bind_slot(slot, value.clone(), mutable, scope)?;
    }

    if let Some((_, name)) = &target.rest {
        let rest = values[target.prefix.len()..].to_vec();
        scope.bind(name, Value::Seq(std::rc::Rc::new(rest)), mutable)?;
    }

    Ok(())
}

fn bind_slot(
    slot: &TargetSlot,
    new_value: Value,
    mutable: bool,
    scope: &Scope,
) -> Result<(), EvalError> {
    match slot {
        TargetSlot::Identifier(_, name) => scope.bind(name, new_value, mutable),
        TargetSlot::Attribute(_, head, tail) => {
            let base = scope.value(head)?;
            set_attribute_path(&base, tail, new_value)
        }
        TargetSlot::Nested(inner) => {
            let nested = expect_sequence(&new_value)?;
            bind_structural(inner, &nested, mutable, scope)
        }
    }
}

/// Rebinds `values` against `target` in `scope`; unlike `bind_structural`
/// this never writes a fresh binding -- every slot must already exist
/// somewhere on the scope chain (spec §4.4 `rebind` row).
pub fn rebind_structural(
    target: &BindingTarget,
    values: &[Value],
    mutable: bool,
    scope: &Scope,
) -> Result<(), EvalError> {
    if target.rest.is_some() {
        return Err(EvalError::InvalidBindingError(
            "variadic rebinding not allowed".to_string(),
        ));
    }
    check_arity(target, values)?;

    for (slot, value) in target.prefix.iter().zip(values.iter()) {
        rebind_slot(slot, value.clone(), mutable, scope)?;
    }
    Ok(())
}

fn rebind_slot(
    slot: &TargetSlot,
    new_value: Value,
    mutable: bool,
    scope: &Scope,
) -> Result<(), EvalError> {
    match slot {
        TargetSlot::Identifier(_, name) => scope.rebind(name, new_value, mutable),
        TargetSlot::Attribute(p, head, tail) => {
            let _ = p;
            let base = scope.value(head)?;
            set_attribute_path(&base, tail, new_value)
        }
        TargetSlot::Nested(inner) => {
            let nested = expect_sequence(&new_value)?;
            rebind_structural(inner, &nested, mutable, scope)
        }
    }
}

fn check_arity(target: &BindingTarget, values: &[Value]) -> Result<(), EvalError> {
    if target.prefix.len() > values.len() {
        return Err(EvalError::InvalidBindingError(format!(
            "not enough values to unpack: expected {}, got {}",
            target.prefix.len(),
            values.len()
        )));
    }
    if target.rest.is_none() && target.prefix.len() < values.len() {
        return Err(EvalError::InvalidBindingError(format!(
            "too many values to unpack: expected {}, got {}",
            target.prefix.len(),
            values.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn parse_one(src: &str) -> Expr {
        Parser::new(src).parse_next().unwrap().unwrap()
    }

    #[test]
    fn flat_target_accepts_exact_arity() {
        let expr = parse_one("[x y z]");
        let target = parse_target(&expr, true, true).unwrap();
        assert_eq!(target.prefix.len(), 3);
        assert!(target.rest.is_none());
        assert!(target.accepts(3));
        assert!(!target.accepts(2));
    }

    #[test]
    fn variadic_target_splits_prefix_and_rest() {
        let expr = parse_one("[x y & zs]");
        let target = parse_target(&expr, true, true).unwrap();
        assert_eq!(target.prefix.len(), 2);
        assert_eq!(target.rest.as_ref().unwrap().1, "zs");
        assert!(target.accepts(2));
        assert!(target.accepts(5));
    }

    #[test]
    fn marker_outside_penultimate_position_is_an_error() {
        let expr = parse_one("[x & y z]");
        assert!(parse_target(&expr, true, true).is_err());
    }

    #[test]
    fn nested_target_disallowed_when_flagged() {
        let expr = parse_one("[x [y z]]");
        assert!(parse_target(&expr, false, true).is_err());
        assert!(parse_target(&expr, true, true).is_ok());
    }

    #[test]
    fn bind_structural_destructures_nested_and_variadic() {
        let scope = Scope::for_testing();
        let expr = parse_one("[x [y z] & rest]");
        let target = parse_target(&expr, true, true).unwrap();
        let values = vec![
            Value::Int(1),
            Value::Seq(std::rc::Rc::new(vec![Value::Int(2), Value::Int(3)])),
            Value::Int(4),
            Value::Int(5),
        ];
        bind_structural(&target, &values, true, &scope).unwrap();
        assert!(scope.value("x").unwrap().equals(&Value::Int(1)));
        assert!(scope.value("y").unwrap().equals(&Value::Int(2)));
        assert!(scope.value("z").unwrap().equals(&Value::Int(3)));
        match scope.value("rest").unwrap() {
            Value::Seq(items) => assert_eq!(items.len(), 2),
            other => panic!("expected Seq, got {other:?}"),
        }
    }

    #[test]
    fn rebind_structural_rejects_variadic_targets() {
        let scope = Scope::for_testing();
        let expr = parse_one("[x & rest]");
        let target = parse_target(&expr, false, false).unwrap();
        let values = vec![Value::Int(1), Value::Int(2)];
        assert!(rebind_structural(&target, &values, true, &scope).is_err());
    }
}
