// ABOUTME: End-to-end tests for multi-overload Function dispatch

use sigil_core::evaluator::evaluate_all;
use sigil_core::host;
use sigil_core::parser::Parser;
use sigil_core::scope::Scope;
use sigil_core::value::Value;

fn run(scope: &Scope, source: &str) -> Value {
    let exprs = Parser::new(source).parse_all().unwrap();
    evaluate_all(&exprs, scope).unwrap()
}

#[test]
fn single_signature_shorthand_and_parenthesized_form_are_equivalent() {
    for code in ["(let f (lambda ([x] (+ x 1))))", "(let f (lambda [x] (+ x 1)))"] {
        let scope = host::build_root_scope().derive();
        run(&scope, code);
        assert!(run(&scope, "(f 1)").equals(&Value::Int(2)));
    }
}

#[test]
fn multiple_signatures_dispatch_on_argument_count() {
    let scope = host::build_root_scope().derive();
    run(
        &scope,
        "(let f (lambda ([x] (+ x 1)) ([x y] (+ (+ x y) 1))))",
    );
    assert!(run(&scope, "(f 1)").equals(&Value::Int(2)));
    assert!(run(&scope, "(f 5 6)").equals(&Value::Int(12)));
}

#[test]
fn a_variadic_overload_joins_the_dispatch_set() {
    let scope = host::build_root_scope().derive();
    run(
        &scope,
        "(let f (lambda \
             ([x] (+ x 1)) \
             ([x y] (+ (+ x y) 1)) \
             ([x y & rest] rest)))",
    );
    assert!(run(&scope, "(f 1)").equals(&Value::Int(2)));
    assert!(run(&scope, "(f 5 6)").equals(&Value::Int(12)));
    match run(&scope, "(f 5 6 7 8)") {
        Value::Seq(items) => {
            assert_eq!(items.len(), 2);
            assert!(items[0].equals(&Value::Int(7)));
            assert!(items[1].equals(&Value::Int(8)));
        }
        other => panic!("expected a list, got {other:?}"),
    }
}

#[test]
fn no_matching_overload_is_an_evaluation_error() {
    let scope = host::build_root_scope().derive();
    run(&scope, "(let f (lambda [x] x))");
    let exprs = Parser::new("(f 1 2)").parse_all().unwrap();
    assert!(evaluate_all(&exprs, &scope).is_err());
}
