// ABOUTME: End-to-end tests for `rebind`, including its variadic-target restriction

use sigil_core::evaluator::evaluate_all;
use sigil_core::host;
use sigil_core::parser::Parser;
use sigil_core::scope::Scope;
use sigil_core::value::Value;

fn run(scope: &Scope, source: &str) -> Result<Value, sigil_core::error::EvalError> {
    let exprs = Parser::new(source).parse_all()?;
    evaluate_all(&exprs, scope)
}

#[test]
fn rebind_writes_through_to_the_defining_scope() {
    let scope = host::build_root_scope().derive();
    run(&scope, "(let x 1)").unwrap();
    let inner = scope.derive();
    run(&inner, "(rebind x 2)").unwrap();
    assert!(scope.value("x").unwrap().equals(&Value::Int(2)));
}

#[test]
fn rebind_nested_structural_targets_rewrites_multiple_bindings_at_once() {
    let scope = host::build_root_scope().derive();
    run(&scope, "(let [x [y z] t] [1 [2 3] 4])").unwrap();
    let inner = scope.derive();
    run(&inner, "(rebind [x [y z] t] [10 [20 30] 40])").unwrap();
    assert!(scope.value("x").unwrap().equals(&Value::Int(10)));
    assert!(scope.value("y").unwrap().equals(&Value::Int(20)));
    assert!(scope.value("z").unwrap().equals(&Value::Int(30)));
    assert!(scope.value("t").unwrap().equals(&Value::Int(40)));
}

#[test]
fn rebind_rejects_a_variadic_target() {
    let scope = host::build_root_scope().derive();
    run(&scope, "(let [x y z t rest1 rest2] [1 2 3 4 5 6])").unwrap();
    let inner = scope.derive();
    let err = run(
        &inner,
        "(rebind [x [y z & rest2] t & rest1] [1 [2 3 4 5] 6 7 8])",
    )
    .unwrap_err();
    let (cause, _) = err.unwrap_evaluation();
    assert!(cause.to_string().to_lowercase().contains("variadic"));
}

#[test]
fn rebind_of_an_unbound_name_is_a_name_error() {
    let scope = host::build_root_scope().derive();
    assert!(run(&scope, "(rebind nope 1)").is_err());
}

#[test]
fn rebind_of_a_predefined_name_is_rejected_as_a_constant() {
    let scope = host::build_root_scope().derive();
    let err = run(&scope, "(rebind + 1)").unwrap_err();
    let (cause, _) = err.unwrap_evaluation();
    assert!(cause.to_string().to_lowercase().contains("constant"));
}
