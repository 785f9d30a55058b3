// ABOUTME: Tree-walking evaluator: expression dispatch, special forms, overload selection

use crate::ast::Expr;
use crate::error::EvalError;
use crate::scope::Scope;
use crate::structural::{self, BindingTarget};
use crate::token::Position;
use crate::value::{self, FunctionDef, MacroDef, Overload, Value};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::OnceLock;

/// Evaluates `expr` in `scope`. Any non-`EvaluationError` raised underneath
/// is wrapped as `EvaluationError{cause, position: expr.position()}`; an
/// already-tagged `EvaluationError` bubbles unchanged (spec §4.4, last
/// paragraph before "Overload selection").
pub fn evaluate(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    dispatch(expr, scope).map_err(|e| e.at_position(expr.position()))
}

/// `evaluate` followed by forcing the result if it is `Lazy` (spec §4.4
/// "Lazy forcing"). A forcing failure is tagged with this same expression's
/// position, matching the reference implementation's single try/except
/// scope around both steps.
pub fn evaluate_forced(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    dispatch(expr, scope)
        .and_then(Value::force)
        .map_err(|e| e.at_position(expr.position()))
}

/// Evaluates a sequence of top-level expressions in order, returning the
/// last result (or `Null` if empty) -- the semantics `do` and a host
/// program entry point share.
pub fn evaluate_all(exprs: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    let mut result = Value::Null;
    for expr in exprs {
        result = evaluate(expr, scope)?;
    }
    Ok(result)
}

fn dispatch(expr: &Expr, scope: &Scope) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(_, v) => Ok(v.clone()),
        Expr::Identifier(_, name) => scope.value(name),
        Expr::AttributeAccess(_, head, tail) => {
            let base = scope.value(head)?;
            value::get_attr_path(&base, tail)
        }
        Expr::List(_, items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(evaluate(item, scope)?);
            }
            Ok(Value::Seq(Rc::new(out)))
        }
        Expr::Symbolic(pos, op, args) => eval_symbolic(*pos, op, args, scope),
    }
}

fn eval_symbolic(pos: Position, op: &Expr, args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    if let Some(name) = op.as_identifier() {
        if let Some(form) = special_form(name) {
            return form(args, scope);
        }
    }

    let operation = evaluate_forced(op, scope)?;

    match &operation {
        Value::Macro(m) => {
            let result = (|| -> Result<Value, EvalError> {
                let generated = call_macro(m, args)?;
                let generated_expr = expect_expr(generated)?;
                evaluate(&generated_expr, scope)
            })();
            result.map_err(|e| e.rethrow_at_call_site(pos))
        }
        Value::Function(f) => {
            let result = (|| -> Result<Value, EvalError> {
                let mut values = Vec::with_capacity(args.len());
                for a in args {
                    values.push(evaluate(a, scope)?);
                }
                call_function(f, &values)
            })();
            result.map_err(|e| e.rethrow_at_call_site(pos))
        }
        _ => {
            let mut values = Vec::with_capacity(args.len());
            for a in args {
                values.push(evaluate_forced(a, scope)?);
            }
            call_host(&operation, &values)
        }
    }
}

/// Applies an already-evaluated callable to already-evaluated arguments,
/// outside of any `Symbolic` application. Used by host callables (`call`,
/// `make-lazy`, `run-catching`) that need to invoke a `Function` value
/// they were merely handed, not one they're dispatching through source
/// syntax. Macros are not applicable this way: they require the
/// unevaluated argument expressions a generic `apply` cannot supply.
pub fn apply(operation: &Value, values: &[Value]) -> Result<Value, EvalError> {
    match operation {
        Value::Function(f) => call_function(f, values),
        Value::Native(obj) if obj.is_callable() => obj.call(values),
        other => Err(EvalError::ValueError(format!(
            "{} is not callable",
            other.type_name()
        ))),
    }
}

fn call_host(operation: &Value, values: &[Value]) -> Result<Value, EvalError> {
    match operation {
        Value::Native(obj) if obj.is_callable() => obj.call(values),
        other => Err(EvalError::ValueError(format!(
            "{} is not callable",
            other.type_name()
        ))),
    }
}

fn select_overload(overloads: &[Overload], n: usize) -> Result<&Overload, EvalError> {
    overloads
        .iter()
        .find(|o| o.accepts(n))
        .ok_or_else(|| EvalError::InvalidBindingError(format!("no suitable overload for {n} argument(s)")))
}

fn call_function(f: &Rc<FunctionDef>, values: &[Value]) -> Result<Value, EvalError> {
    let overload = select_overload(&f.overloads, values.len())?;
    let call_scope = f.closure.derive();
    structural::bind_structural(&overload.params, values, false, &call_scope)?;
    evaluate(&overload.body, &call_scope)
}

/// Parameters are bound to the *unevaluated* argument expressions, each
/// wrapped as a `Value::Expr` (spec §4.4 "Macro call semantics").
fn call_macro(m: &Rc<MacroDef>, args: &[Expr]) -> Result<Value, EvalError> {
    let overload = select_overload(&m.overloads, args.len())?;
    let call_scope = m.closure.derive();
    let arg_values: Vec<Value> = args
        .iter()
        .map(|e| Value::Expr(Rc::new(e.clone())))
        .collect();
    structural::bind_structural(&overload.params, &arg_values, false, &call_scope)?;
    evaluate(&overload.body, &call_scope)
}

fn expect_expr(value: Value) -> Result<Expr, EvalError> {
    match value {
        Value::Expr(e) => Ok((*e).clone()),
        other => Err(EvalError::ValueError(format!(
            "expected an expression, got {}",
            other.type_name()
        ))),
    }
}

fn expect_sequence(value: Value) -> Result<Vec<Value>, EvalError> {
    match value {
        Value::Seq(items) => Ok((*items).clone()),
        other => Err(EvalError::ValueError(format!(
            "expected a sequence, got {}",
            other.type_name()
        ))),
    }
}

fn check_arity(what: &str, expected: usize, actual: usize) -> Result<(), EvalError> {
    if expected == actual {
        Ok(())
    } else {
        Err(EvalError::arity(what, expected.to_string(), actual))
    }
}

fn set_attribute_path(base: &Value, tail: &[String], new_value: Value) -> Result<(), EvalError> {
    let (last, init) = tail.split_last().expect("attribute tail is non-empty");
    let target = value::get_attr_path(base, init)?;
    value::set_attr(&target, last, new_value)
}

fn delete_attribute_path(base: &Value, tail: &[String]) -> Result<(), EvalError> {
    let (last, init) = tail.split_last().expect("attribute tail is non-empty");
    let target = value::get_attr_path(base, init)?;
    value::delete_attr(&target, last)
}

type SpecialFormFn = fn(&[Expr], &Scope) -> Result<Value, EvalError>;

/// The special-form registry, built once on first use (spec §4.4 "Special
/// forms"; mirrors the reference implementation's `special_forms` dict
/// populated by decorator at import time). `const` and `import-module` are
/// reserved keywords but are not special forms: `const` has no surface
/// syntax in this language and `import-module` is an ordinary predefined
/// callable (see DESIGN.md).
fn special_forms() -> &'static HashMap<&'static str, SpecialFormFn> {
    static FORMS: OnceLock<HashMap<&'static str, SpecialFormFn>> = OnceLock::new();
    FORMS.get_or_init(|| {
        let mut m: HashMap<&'static str, SpecialFormFn> = HashMap::new();
        m.insert("if", sf_if as SpecialFormFn);
        m.insert("let", sf_let as SpecialFormFn);
        m.insert("rebind", sf_rebind as SpecialFormFn);
        m.insert("del", sf_del as SpecialFormFn);
        m.insert("lambda", sf_lambda as SpecialFormFn);
        m.insert("macro", sf_macro as SpecialFormFn);
        m.insert("do", sf_do as SpecialFormFn);
        m.insert("expr!", sf_quote as SpecialFormFn);
        m.insert("eval!", sf_eval as SpecialFormFn);
        m.insert("symbolic!", sf_symbolic as SpecialFormFn);
        m
    })
}

fn special_form(name: &str) -> Option<SpecialFormFn> {
    special_forms().get(name).copied()
}

fn sf_if(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    check_arity("if", 3, args.len())?;
    let cond = evaluate_forced(&args[0], scope)?;
    if cond.truthy() {
        evaluate(&args[1], scope)
    } else {
        evaluate(&args[2], scope)
    }
}

fn sf_let(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    check_arity("let", 2, args.len())?;
    let (target, value_expr) = (&args[0], &args[1]);
    match target {
        Expr::Identifier(_, name) => {
            let v = evaluate(value_expr, scope)?;
            scope.let_(name, v.clone())?;
            Ok(v)
        }
        Expr::AttributeAccess(_, head, tail) => {
            let v = evaluate(value_expr, scope)?;
            let base = scope.value(head)?;
            set_attribute_path(&base, tail, v.clone())?;
            Ok(v)
        }
        Expr::List(..) => {
            let v = evaluate(value_expr, scope)?;
            let shape: BindingTarget = structural::parse_target(target, true, true)?;
            let values = expect_sequence(v.clone())?;
            structural::bind_structural(&shape, &values, true, scope)?;
            Ok(v)
        }
        other => Err(EvalError::invalid_binding_target_expr(
            format!("{other:?}"),
            "cannot bind to",
        )),
    }
}

fn sf_rebind(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    check_arity("rebind", 2, args.len())?;
    let (target, value_expr) = (&args[0], &args[1]);
    match target {
        Expr::Identifier(_, name) => {
            let v = evaluate(value_expr, scope)?;
            scope.rebind(name, v.clone(), true)?;
            Ok(v)
        }
        Expr::AttributeAccess(..) => Err(EvalError::invalid_binding_target_expr(
            format!("{target:?}"),
            "use \"let\" to change attribute values",
        )),
        Expr::List(..) => {
            let v = evaluate(value_expr, scope)?;
            let shape = structural::parse_target(target, true, false)?;
            let values = expect_sequence(v.clone())?;
            structural::rebind_structural(&shape, &values, true, scope)?;
            Ok(v)
        }
        other => Err(EvalError::invalid_binding_target_expr(
            format!("{other:?}"),
            "cannot bind to",
        )),
    }
}

fn sf_del(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    check_arity("del", 1, args.len())?;
    match &args[0] {
        Expr::Identifier(_, name) => {
            scope.delete(name)?;
            Ok(Value::Null)
        }
        Expr::AttributeAccess(_, head, tail) => {
            let base = scope.value(head)?;
            delete_attribute_path(&base, tail)?;
            Ok(Value::Null)
        }
        other => Err(EvalError::invalid_binding_target_expr(
            format!("{other:?}"),
            "cannot bind to",
        )),
    }
}

/// Shared by `lambda` and `macro`: either `(form <args> <body>)` (one
/// overload) or `(form (<args1> <body1>) (<args2> <body2>) …)`.
fn parse_overloads(args: &[Expr], allow_nested: bool) -> Result<Vec<Overload>, EvalError> {
    if args.len() == 2 && matches!(&args[0], Expr::List(..)) {
        let target = structural::parse_target(&args[0], allow_nested, false)?;
        return Ok(vec![Overload {
            params: target,
            body: Rc::new(args[1].clone()),
        }]);
    }
    args.iter()
        .map(|signature| parse_one_overload(signature, allow_nested))
        .collect()
}

fn parse_one_overload(signature: &Expr, allow_nested: bool) -> Result<Overload, EvalError> {
    match signature {
        Expr::Symbolic(_, op, sig_args) if matches!(op.as_ref(), Expr::List(..)) && sig_args.len() == 1 => {
            let target = structural::parse_target(op, allow_nested, false)?;
            Ok(Overload {
                params: target,
                body: Rc::new(sig_args[0].clone()),
            })
        }
        other => Err(EvalError::ValueError(format!(
            "expected (<args-list> <body>) as an overload, got {other:?}"
        ))),
    }
}

fn sf_lambda(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    let overloads = parse_overloads(args, true)?;
    Ok(Value::Function(Rc::new(FunctionDef {
        overloads,
        closure: scope.derive(),
    })))
}

fn sf_macro(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    let overloads = parse_overloads(args, false)?;
    Ok(Value::Macro(Rc::new(MacroDef {
        overloads,
        closure: scope.derive(),
    })))
}

fn sf_do(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    let local = scope.derive();
    evaluate_all(args, &local)
}

fn sf_quote(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    check_arity("expr!", 1, args.len())?;
    let rewritten = preprocess_quote(&args[0], scope)?;
    Ok(Value::Expr(Rc::new(rewritten)))
}

/// Recursively rewrites a quoted expression, splicing in `(inline! E)` and
/// `(inline-value! E)` subexpressions (spec §4.4 `expr!` row).
fn preprocess_quote(expr: &Expr, scope: &Scope) -> Result<Expr, EvalError> {
    if let Expr::Symbolic(pos, op, sub_args) = expr {
        if let Some(name @ ("inline!" | "inline-value!")) = op.as_identifier() {
            check_arity(name, 1, sub_args.len())?;
            let evaluated = evaluate(&sub_args[0], scope)?;
            return if name == "inline!" {
                expect_expr(evaluated)
            } else {
                Ok(Expr::Literal(*pos, evaluated))
            };
        }
        let new_op = preprocess_quote(op, scope)?;
        let new_args = sub_args
            .iter()
            .map(|a| preprocess_quote(a, scope))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Expr::Symbolic(*pos, Box::new(new_op), new_args));
    }

    if let Expr::List(pos, items) = expr {
        let new_items = items
            .iter()
            .map(|i| preprocess_quote(i, scope))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Expr::List(*pos, new_items));
    }

    Ok(expr.clone())
}

fn sf_eval(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    check_arity("eval!", 1, args.len())?;
    let inner_value = evaluate(&args[0], scope)?;
    let inner_expr = expect_expr(inner_value)?;
    evaluate(&inner_expr, scope)
}

fn sf_symbolic(args: &[Expr], scope: &Scope) -> Result<Value, EvalError> {
    check_arity("symbolic!", 1, args.len())?;
    let seq = expect_sequence(evaluate(&args[0], scope)?)?;
    let (op_value, rest) = seq
        .split_first()
        .ok_or_else(|| EvalError::ValueError("symbolic!: expected a non-empty sequence".to_string()))?;
    let op_expr = expect_expr(op_value.clone())?;
    let rest_exprs = rest
        .iter()
        .cloned()
        .map(expect_expr)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::Expr(Rc::new(Expr::Symbolic(
        args[0].position(),
        Box::new(op_expr),
        rest_exprs,
    ))))
}
