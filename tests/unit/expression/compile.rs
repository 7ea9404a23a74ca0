use super::*;
use crate::runtime::context::{EvaluationContext, Feature};
use serde_json::json;

fn ok(input: serde_json::Value, expected: Option<&Type>) -> CompiledExpression {
    match compile(&input, expected) {
        CompileResult::Success(c) => c,
        CompileResult::Failure(errors) => panic!("{input} failed: {errors:?}"),
    }
}

#[test]
fn literal_evaluates_to_itself_everywhere() {
    let f = Feature::default();
    for input in [json!(1.5), json!("x"), json!(true), json!(null), json!(["literal", [1, "a"]])] {
        let c = ok(input.clone(), None);
        assert!(c.is_zoom_constant() && c.is_feature_constant());
        let want = Value::from(match &input {
            serde_json::Value::Array(items) => &items[1],
            other => other,
        });
        for z in [0.0, 12.0] {
            assert_eq!(c.evaluate(&EvaluationContext::new(z, &f)), Ok(want.clone()));
        }
    }
}

#[test]
fn default_options_fold_constants() {
    let opts = CompileOptions::default();
    assert!(opts.fold_constants);
    assert!(opts.expected.is_none());

    let c = ok(json!(["+", 1, 2]), None);
    assert_eq!(c.expression().as_literal(), Some(&Value::Number(3.0)));

    let unfolded = compile_with(
        &json!(["+", 1, 2]),
        &CompileOptions {
            fold_constants: false,
            ..CompileOptions::default()
        },
    );
    let CompileResult::Success(c) = unfolded else {
        panic!("expected success");
    };
    assert!(c.expression().as_literal().is_none());
    assert_eq!(
        c.evaluate(&EvaluationContext::default()),
        Ok(Value::Number(3.0))
    );
}

#[test]
fn options_deserialize_with_defaults() {
    let opts: CompileOptions = serde_json::from_value(json!({"expected": "color"})).unwrap();
    assert_eq!(opts.expected, Some(Type::Color));
    assert!(opts.fold_constants);
}

#[test]
fn failure_carries_every_error() {
    let r = compile(&json!(["+", ["foo"], ["bar"]]), None);
    assert!(!r.is_success());
    assert_eq!(r.errors().len(), 2);
    let err = r.into_result().unwrap_err();
    assert_eq!(err.errors.len(), 2);
    assert!(err.to_string().contains('\n'));
}

#[test]
fn failed_subtrees_are_not_folded_into_a_second_error() {
    let r = compile(&json!(["case", "nope", 1, 2]), None);
    let errors: Vec<_> = r
        .errors()
        .iter()
        .map(|e| (e.location.to_string(), e.message.as_str()))
        .collect();
    assert_eq!(
        errors,
        [("$[1]".to_owned(), "Expected boolean but found string instead.")]
    );

    let r = compile(&json!(["+", ["-", "a"], 1]), None);
    assert_eq!(r.errors().len(), 1);
    assert_eq!(r.errors()[0].location.to_string(), "$[1][1]");
}

#[test]
fn expected_type_is_enforced_at_the_root() {
    let r = compile(&json!("x"), Some(&Type::Number));
    assert_eq!(r.errors()[0].message, "Expected number but found string instead.");

    let c = ok(json!(["get", "n"]), Some(&Type::Number));
    assert_eq!(c.ty(), &Type::Number);
}

#[test]
fn evaluate_or_substitutes_the_fallback() {
    let c = ok(json!(["get", "height"]), None);
    let f = Feature::default();
    assert_eq!(
        c.evaluate_or(&EvaluationContext::new(1.0, &f), Value::Number(-1.0)),
        Value::Number(-1.0)
    );
}

#[test]
fn shared_stack_matches_fresh_evaluation() {
    let c = ok(json!(["*", ["zoom"], 2]), None);
    let mut stack = EvalStack::new();
    for z in [1.0, 4.0] {
        let ctx = EvaluationContext::at_zoom(z);
        assert_eq!(c.evaluate_with_stack(&ctx, &mut stack), c.evaluate(&ctx));
    }
}

#[test]
fn compile_str_reports_json_syntax_errors() {
    let err = compile_str("[\"+\", 1", None).unwrap_err();
    assert!(matches!(err, StyleExprError::Serde(_)));

    let err = compile_str("[\"nope\"]", None).unwrap_err();
    assert!(matches!(err, StyleExprError::Parse(_)));

    let c = compile_str("[\"zoom\"]", None).unwrap();
    assert!(!c.is_zoom_constant());
}

#[test]
fn compiled_expressions_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<CompiledExpression>();
}
