//! The reference predefined table: the required members from spec §6.1
//! collaborator 3 (`import-module`, `raise`, `run-catching`, `make-lazy`,
//! `call`, `doc`, `predefined`), plus the "typical but not mandated"
//! arithmetic/comparison/list builtins, grounded on the teacher's
//! per-category-file `builtins/` layout (`arithmetic.rs`, `comparison.rs`)
//! composed by one `register`-calling entry point.

pub mod arithmetic;
pub mod comparison;
pub mod lists;

use super::value::{Builtin, RaisedError};
use crate::error::EvalError;
use crate::evaluator::apply;
use crate::scope::ModuleImporter;
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;

/// Wraps a closure as a predefined `Value` (a callable `Builtin` native
/// object). Shared by every category module's `register` function.
pub fn builtin(
    name: &'static str,
    doc: &'static str,
    func: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
) -> Value {
    Value::Native(Rc::new(Builtin::new(name, doc, func)))
}

fn expect_seq(v: &Value) -> Result<Vec<Value>, EvalError> {
    match v {
        Value::Seq(items) => Ok((**items).clone()),
        other => Err(EvalError::ValueError(format!(
            "expected a list, got {}",
            other.type_name()
        ))),
    }
}

fn expect_str(v: &Value) -> Result<String, EvalError> {
    match v {
        Value::Str(s) => Ok(s.to_string()),
        other => Err(EvalError::ValueError(format!(
            "expected a string, got {}",
            other.type_name()
        ))),
    }
}

/// `(raise value)`: fails with `EvalError::Raised(value)`, carrying the
/// value itself so a `run-catching` handler gets it back unmodified (spec
/// §7 "Recoverable vs fatal").
fn raise(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("raise", "1", args.len()));
    }
    Err(EvalError::Raised(args[0].clone()))
}

/// `(run-catching body handler finalizer)`: `body`, `handler` and
/// `finalizer` are conventionally zero/one-argument `Function` values
/// (spec §11 "`raise`/`run-catching`/`make-lazy` are ordinary predefined
/// callables"). `body` is invoked with no arguments; a failure's unwrapped
/// cause (the raw raised value for `raise`, or a host-native error wrapper
/// otherwise) is forwarded to `handler`. `finalizer` always runs; an error
/// from `finalizer` takes precedence over whatever `body`/`handler`
/// produced, matching ordinary try/finally semantics.
fn run_catching(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 3 {
        return Err(EvalError::arity("run-catching", "3", args.len()));
    }
    let (body, handler, finalizer) = (&args[0], &args[1], &args[2]);

    let result = match apply(body, &[]) {
        Ok(v) => Ok(v),
        Err(e) => {
            let (cause, position) = e.unwrap_evaluation();
            let caught = match cause {
                EvalError::Raised(v) => v,
                other => Value::Native(Rc::new(RaisedError::new(other.to_string(), Some(position)))),
            };
            apply(handler, &[caught])
        }
    };

    apply(finalizer, &[])?;
    result
}

/// `(make-lazy thunk)`: wraps a zero-argument callable as a `Lazy` value
/// that invokes it at most once on first force (spec §3 "Lazy").
fn make_lazy(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("make-lazy", "1", args.len()));
    }
    let thunk = args[0].clone();
    Ok(Value::Lazy(Rc::new(crate::value::LazyCell::new(
        move || apply(&thunk, &[]),
    ))))
}

/// `(call fn args)`: applies `fn` to the elements of `args` (spec §11,
/// grounded on `original_source/spsp/predefined.py`'s
/// `define('call', lambda fn, args: fn(*args))`).
fn call(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 2 {
        return Err(EvalError::arity("call", "2", args.len()));
    }
    let call_args = expect_seq(&args[1])?;
    apply(&args[0], &call_args)
}

/// `(doc obj)`: the value's `__doc__` attribute, or `None` if it has none
/// (grounded on `predefined.py`'s `define('doc', lambda obj: obj.__doc__)`
/// -- Python's `__doc__` defaults to `None` rather than failing, so a
/// missing attribute here is not an error either).
fn doc(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() != 1 {
        return Err(EvalError::arity("doc", "1", args.len()));
    }
    Ok(crate::value::get_attr(&args[0], "__doc__").unwrap_or(Value::Null))
}

/// Builds the `import-module` predefined callable. Grounded on
/// `predefined.py`'s `define(Keyword.ImportModule, importlib.import_module)`:
/// it calls the importer directly, uncached -- `Scope::import_module`'s
/// per-chain memoization is a separate internal mechanism, not this
/// language-level entry point (see DESIGN.md).
fn import_module_builtin(importer: Rc<dyn ModuleImporter>) -> Value {
    builtin("import-module", "resolve a module by name", move |args| {
        if args.len() != 1 {
            return Err(EvalError::arity("import-module", "1", args.len()));
        }
        let name = expect_str(&args[0])?;
        importer.import(&name)
    })
}

/// Assembles the full predefined table installed as Constant bindings at
/// root-scope construction (spec §3 "Scope").
pub fn build_predefined_table(importer: Rc<dyn ModuleImporter>) -> HashMap<String, Value> {
    let mut table = HashMap::new();

    arithmetic::register(&mut table);
    comparison::register(&mut table);
    lists::register(&mut table);

    table.insert("import-module".to_string(), import_module_builtin(importer));
    table.insert("raise".to_string(), builtin("raise", "raise a value as an error", raise));
    table.insert(
        "run-catching".to_string(),
        builtin(
            "run-catching",
            "run a zero-argument body, forwarding any error to a handler, always running a finalizer",
            run_catching,
        ),
    );
    table.insert(
        "make-lazy".to_string(),
        builtin("make-lazy", "wrap a zero-argument callable as a memoized lazy value", make_lazy),
    );
    table.insert("call".to_string(), builtin("call", "apply a function to a list of arguments", call));
    table.insert("doc".to_string(), builtin("doc", "the documentation string of a value", doc));

    let mut names: Vec<String> = table.keys().cloned().collect();
    names.push("predefined".to_string());
    names.sort();
    table.insert(
        "predefined".to_string(),
        builtin("predefined", "the names of all predefined bindings", move |args| {
            if !args.is_empty() {
                return Err(EvalError::arity("predefined", "0", args.len()));
            }
            Ok(Value::Seq(Rc::new(
                names.iter().map(|n| Value::Str(n.as_str().into())).collect(),
            )))
        }),
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::importer::FixedModuleImporter;
    use crate::value::FunctionDef;
    use crate::scope::Scope;
    use crate::structural::{parse_target, BindingTarget};

    fn table() -> HashMap<String, Value> {
        build_predefined_table(Rc::new(FixedModuleImporter::with_standard_modules()))
    }

    #[test]
    fn required_members_are_present() {
        let t = table();
        for name in [
            "import-module",
            "raise",
            "run-catching",
            "make-lazy",
            "call",
            "doc",
            "predefined",
        ] {
            assert!(t.contains_key(name), "missing predefined member {name}");
        }
    }

    #[test]
    fn raise_carries_the_value_through() {
        let err = raise(&[Value::Str("boom".into())]).unwrap_err();
        match err {
            EvalError::Raised(v) => assert!(v.equals(&Value::Str("boom".into()))),
            other => panic!("expected Raised, got {other:?}"),
        }
    }

    fn zero_arg_function(scope: &Scope, body_src: &str) -> Value {
        use crate::parser::Parser;
        let body = Parser::new(body_src).parse_next().unwrap().unwrap();
        let empty_target: BindingTarget = parse_target(
            &Parser::new("[]").parse_next().unwrap().unwrap(),
            true,
            true,
        )
        .unwrap();
        Value::Function(Rc::new(FunctionDef {
            overloads: vec![crate::value::Overload {
                params: empty_target,
                body: Rc::new(body),
            }],
            closure: scope.clone(),
        }))
    }

    #[test]
    fn run_catching_forwards_raised_value_to_handler_and_always_runs_finalizer() {
        let scope = Scope::for_testing();
        scope.let_("flag", Value::Bool(false)).unwrap();

        let body = raise_thunk();
        let handler = identity_handler();
        let finalizer = zero_arg_function(&scope, "(rebind flag True)");

        let result = run_catching(&[body, handler, finalizer]).unwrap();
        assert!(result.equals(&Value::Str("caught".into())));
        assert!(scope.value("flag").unwrap().equals(&Value::Bool(true)));
    }

    fn raise_thunk() -> Value {
        Value::Native(Rc::new(Builtin::new("raising-thunk", "", |_args| {
            Err(EvalError::Raised(Value::Str("caught".into())))
        })))
    }

    fn identity_handler() -> Value {
        Value::Native(Rc::new(Builtin::new("identity-handler", "", |args| {
            Ok(args[0].clone())
        })))
    }

    #[test]
    fn make_lazy_defers_and_memoizes_the_thunk() {
        use std::cell::RefCell;
        let calls = Rc::new(RefCell::new(0));
        let calls2 = calls.clone();
        let thunk = Value::Native(Rc::new(Builtin::new("counting-thunk", "", move |_args| {
            *calls2.borrow_mut() += 1;
            Ok(Value::Int(7))
        })));
        let lazy = make_lazy(&[thunk]).unwrap();
        match lazy {
            Value::Lazy(cell) => {
                assert!(cell.force().unwrap().equals(&Value::Int(7)));
                assert!(cell.force().unwrap().equals(&Value::Int(7)));
                assert_eq!(*calls.borrow(), 1);
            }
            other => panic!("expected Lazy, got {other:?}"),
        }
    }

    #[test]
    fn doc_falls_back_to_null_when_absent() {
        assert!(doc(&[Value::Int(1)]).unwrap().equals(&Value::Null));
        let b = Value::Native(Rc::new(Builtin::new("f", "does a thing", |_| Ok(Value::Null))));
        assert!(doc(&[b]).unwrap().equals(&Value::Str("does a thing".into())));
    }
}
