// ABOUTME: Value types threading through the evaluator: literals, closures, lazies and host objects

use crate::ast::Expr;
use crate::error::EvalError;
use crate::scope::Scope;
use crate::structural::BindingTarget;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// A host-native opaque value: a sequence, record, predefined callable, or
/// anything else the embedding host wants to expose. Spec §6 collaborator
/// 1 ("value system"). Attribute operations default to "not attributable";
/// `call` defaults to "not callable"; implementors override what applies.
pub trait NativeObject: fmt::Debug {
    fn type_name(&self) -> &'static str;

    fn get_attribute(&self, _name: &str) -> Option<Value> {
        None
    }

    fn set_attribute(&self, name: &str, _value: Value) -> Result<(), EvalError> {
        Err(EvalError::AttributeError {
            object: self.type_name().to_string(),
            attribute: name.to_string(),
        })
    }

    fn delete_attribute(&self, name: &str) -> Result<(), EvalError> {
        Err(EvalError::AttributeError {
            object: self.type_name().to_string(),
            attribute: name.to_string(),
        })
    }

    fn is_callable(&self) -> bool {
        false
    }

    fn call(&self, _args: &[Value]) -> Result<Value, EvalError> {
        Err(EvalError::ValueError("value is not callable".to_string()))
    }

    fn truthy(&self) -> bool {
        true
    }

    fn equals(&self, _other: &Value) -> bool {
        false
    }

    fn display(&self) -> String {
        format!("#<{}>", self.type_name())
    }
}

/// One (parameter-target, body) pair belonging to a `Function` or `Macro`.
#[derive(Debug, Clone)]
pub struct Overload {
    pub params: BindingTarget,
    pub body: Rc<Expr>,
}

impl Overload {
    /// Whether this overload can be invoked with `n` positional values
    /// (spec §4.4 "Overload selection").
    pub fn accepts(&self, n: usize) -> bool {
        self.params.accepts(n)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    pub overloads: Vec<Overload>,
    pub closure: Scope,
}

#[derive(Debug, Clone)]
pub struct MacroDef {
    pub overloads: Vec<Overload>,
    pub closure: Scope,
}

/// A one-shot memoized thunk. Forcing is idempotent and transparent: if the
/// computed value is itself `Lazy`, forcing recurses until a non-`Lazy`
/// value is reached (spec §3 "Lazy").
pub struct LazyCell {
    thunk: RefCell<Option<Box<dyn FnOnce() -> Result<Value, EvalError>>>>,
    value: RefCell<Option<Value>>,
}

impl fmt::Debug for LazyCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lazy(..)")
    }
}

impl LazyCell {
    pub fn new(thunk: impl FnOnce() -> Result<Value, EvalError> + 'static) -> Self {
        LazyCell {
            thunk: RefCell::new(Some(Box::new(thunk))),
            value: RefCell::new(None),
        }
    }

    /// Forces this cell (and recursively, any `Lazy` it evaluates to),
    /// computing the thunk at most once.
    pub fn force(&self) -> Result<Value, EvalError> {
        if let Some(v) = self.value.borrow().as_ref() {
            return Ok(v.clone());
        }

        let thunk = self
            .thunk
            .borrow_mut()
            .take()
            .expect("Lazy forced re-entrantly before its own thunk returned");
        let computed = thunk()?;
        let resolved = match &computed {
            Value::Lazy(inner) => inner.force()?,
            _ => computed,
        };
        *self.value.borrow_mut() = Some(resolved.clone());
        Ok(resolved)
    }
}

#[derive(Clone)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Rc<str>),
    Null,
    /// A `List(items…)` expression's result: an ordered host sequence, and
    /// also the representation the evaluator uses for variadic captures
    /// (spec §3 "structural binding algorithm", step 5: "host-tuple").
    Seq(Rc<Vec<Value>>),
    Function(Rc<FunctionDef>),
    Macro(Rc<MacroDef>),
    Lazy(Rc<LazyCell>),
    /// A quoted expression, produced by `expr!`/`symbolic!` and consumed by
    /// `eval!`.
    Expr(Rc<Expr>),
    Native(Rc<dyn NativeObject>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Null => write!(f, "None"),
            Value::Seq(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Function(_) => write!(f, "#<function>"),
            Value::Macro(_) => write!(f, "#<macro>"),
            Value::Lazy(_) => write!(f, "#<lazy>"),
            Value::Expr(e) => write!(f, "#<expr {e:?}>"),
            Value::Native(obj) => write!(f, "{}", obj.display()),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Null => "none",
            Value::Seq(_) => "list",
            Value::Function(_) => "function",
            Value::Macro(_) => "macro",
            Value::Lazy(_) => "lazy",
            Value::Expr(_) => "expr",
            Value::Native(obj) => obj.type_name(),
        }
    }

    /// Truthiness test (spec §6 collaborator 1(e)). `False` and `None` are
    /// falsy; everything else -- including `0` -- is truthy, matching the
    /// interpreter's Lisp-like "everything but the false sentinels" rule.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Native(obj) => obj.truthy(),
            _ => true,
        }
    }

    /// Equality test (spec §6 collaborator 1(f)).
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Seq(a), Value::Seq(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Native(obj), other) => obj.equals(other),
            (other, Value::Native(obj)) => obj.equals(other),
            _ => false,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::Macro(_))
            || matches!(self, Value::Native(obj) if obj.is_callable())
    }

    /// Forces a value if it's `Lazy` (recursively); otherwise returns it
    /// unchanged. Spec §4.4 "Lazy forcing".
    pub fn force(self) -> Result<Value, EvalError> {
        match self {
            Value::Lazy(cell) => cell.force(),
            other => Ok(other),
        }
    }
}

fn attribute_error(value: &Value, name: &str) -> EvalError {
    EvalError::AttributeError {
        object: value.type_name().to_string(),
        attribute: name.to_string(),
    }
}

/// Read-only reflection over a quoted expression: the fields a macro body
/// inspects through `it::name`-style attribute access on values produced by
/// `expr!`/`symbolic!` (spec §3 "Expression", collaborator 1(a)).
fn expr_attribute(expr: &Expr, name: &str) -> Option<Value> {
    match (expr, name) {
        (_, "position") => Some(Value::Int(expr.position() as i64)),
        (Expr::Identifier(_, n), "name") => Some(Value::Str(n.as_str().into())),
        (Expr::AttributeAccess(_, head, _), "name" | "head") => Some(Value::Str(head.as_str().into())),
        (Expr::AttributeAccess(_, _, tail), "tail") => Some(Value::Seq(Rc::new(
            tail.iter().map(|s| Value::Str(s.as_str().into())).collect(),
        ))),
        (Expr::Literal(_, v), "value") => Some(v.clone()),
        (Expr::List(_, items), "items") => Some(Value::Seq(Rc::new(
            items.iter().map(|e| Value::Expr(Rc::new(e.clone()))).collect(),
        ))),
        (Expr::Symbolic(_, op, _), "operation") => Some(Value::Expr(op.clone())),
        (Expr::Symbolic(_, _, args), "arguments") => Some(Value::Seq(Rc::new(
            args.iter().map(|e| Value::Expr(Rc::new(e.clone()))).collect(),
        ))),
        _ => None,
    }
}

/// Attribute read (spec §6 collaborator 1(a)): dispatches to `NativeObject`,
/// or to the read-only expression reflection above, or fails.
pub fn get_attr(value: &Value, name: &str) -> Result<Value, EvalError> {
    match value {
        Value::Native(obj) => obj.get_attribute(name).ok_or_else(|| attribute_error(value, name)),
        Value::Expr(expr) => expr_attribute(expr, name).ok_or_else(|| attribute_error(value, name)),
        _ => Err(attribute_error(value, name)),
    }
}

/// Attribute write (spec §6 collaborator 1(b)); only `NativeObject` values
/// support it.
pub fn set_attr(value: &Value, name: &str, new_value: Value) -> Result<(), EvalError> {
    match value {
        Value::Native(obj) => obj.set_attribute(name, new_value),
        _ => Err(attribute_error(value, name)),
    }
}

/// Attribute delete (spec §6 collaborator 1(c)); only `NativeObject` values
/// support it.
pub fn delete_attr(value: &Value, name: &str) -> Result<(), EvalError> {
    match value {
        Value::Native(obj) => obj.delete_attribute(name),
        _ => Err(attribute_error(value, name)),
    }
}

/// Walks an attribute path, failing on the first missing segment (spec
/// §4.4 `AttributeAccess` evaluation rule).
pub fn get_attr_path(value: &Value, path: &[String]) -> Result<Value, EvalError> {
    let mut current = value.clone();
    for name in path {
        current = get_attr(&current, name)?;
    }
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falsy_values_are_bool_false_and_null() {
        assert!(!Value::Bool(false).truthy());
        assert!(!Value::Null.truthy());
        assert!(Value::Int(0).truthy());
        assert!(Value::Str("".into()).truthy());
    }

    #[test]
    fn lazy_idempotence_evaluates_thunk_once() {
        let calls = Rc::new(RefCell::new(0));
        let calls2 = calls.clone();
        let cell = LazyCell::new(move || {
            *calls2.borrow_mut() += 1;
            Ok(Value::Int(42))
        });
        let first = cell.force().unwrap();
        let second = cell.force().unwrap();
        assert!(first.equals(&second));
        assert_eq!(*calls.borrow(), 1);
    }

    #[test]
    fn lazy_forcing_recurses_through_nested_lazy() {
        let inner = Rc::new(LazyCell::new(|| Ok(Value::Int(7))));
        let inner_value = Value::Lazy(inner);
        let outer = LazyCell::new(move || Ok(inner_value.clone()));
        let forced = outer.force().unwrap();
        assert!(matches!(forced, Value::Int(7)));
    }

    #[test]
    fn sequence_equality_is_elementwise() {
        let a = Value::Seq(Rc::new(vec![Value::Int(1), Value::Int(2)]));
        let b = Value::Seq(Rc::new(vec![Value::Int(1), Value::Int(2)]));
        let c = Value::Seq(Rc::new(vec![Value::Int(1), Value::Int(3)]));
        assert!(a.equals(&b));
        assert!(!a.equals(&c));
    }
}
