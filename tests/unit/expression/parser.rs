use super::*;
use crate::expression::ast::MatchKey;
use serde_json::json;

fn parse_with(input: serde_json::Value, expected: Option<Type>, fold: bool) -> (Expression, Vec<ParsingError>) {
    let mut ctx = ParsingContext::new(fold);
    let expr = ctx.parse(&input, &Location::root(), expected.as_ref());
    (expr, ctx.into_errors())
}

fn parse(input: serde_json::Value) -> (Expression, Vec<ParsingError>) {
    parse_with(input, None, false)
}

fn messages(errors: &[ParsingError]) -> Vec<(String, String)> {
    errors
        .iter()
        .map(|e| (e.location.to_string(), e.message.clone()))
        .collect()
}

fn root() -> Location {
    Location::root()
}

#[test]
fn scalars_are_literals() {
    let (e, errors) = parse(json!(3));
    assert!(errors.is_empty());
    assert_eq!(e.ty, Type::Number);
    assert_eq!(e.as_literal(), Some(&Value::Number(3.0)));

    let (e, _) = parse(json!(null));
    assert_eq!(e.ty, Type::Null);
}

#[test]
fn bare_objects_are_rejected() {
    let (e, errors) = parse(json!({"a": 1}));
    assert!(e.is_poison());
    assert_eq!(
        messages(&errors),
        vec![(
            "$".to_owned(),
            "Bare objects invalid. Use [\"literal\", {...}] instead.".to_owned()
        )]
    );
}

#[test]
fn unknown_operator_points_at_the_name() {
    let (_, errors) = parse(json!(["nope", 1]));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, root().child(0));
    assert!(errors[0].message.starts_with("Unknown expression \"nope\"."));
}

#[test]
fn empty_and_nameless_arrays_are_structural_errors() {
    let (_, errors) = parse(json!([]));
    assert_eq!(errors[0].location, root());
    assert!(errors[0].message.starts_with("Expected an array with at least one element."));

    let (_, errors) = parse(json!([1, 2]));
    assert_eq!(errors[0].location, root().child(0));
    assert!(errors[0].message.contains("found number instead"));
}

#[test]
fn arity_errors_name_the_operator_and_range() {
    let (_, errors) = parse(json!(["+", 1]));
    assert_eq!(
        messages(&errors),
        vec![(
            "$".to_owned(),
            "\"+\" expects at least 2 arguments, but found 1 instead.".to_owned()
        )]
    );

    let (_, errors) = parse(json!(["-", 1, 2, 3]));
    assert_eq!(
        errors[0].message,
        "\"-\" expects 1 to 2 arguments, but found 3 instead."
    );
}

#[test]
fn sibling_errors_are_all_reported() {
    let (_, errors) = parse(json!(["+", ["foo"], ["bar"]]));
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0].location, root().child(1).child(0));
    assert_eq!(errors[1].location, root().child(2).child(0));
}

#[test]
fn single_overload_reports_each_bad_argument() {
    let (_, errors) = parse(json!(["+", "a", 1, true]));
    assert_eq!(
        messages(&errors),
        vec![
            (
                "$[1]".to_owned(),
                "Expected number but found string instead.".to_owned()
            ),
            (
                "$[3]".to_owned(),
                "Expected number but found boolean instead.".to_owned()
            ),
        ]
    );
}

#[test]
fn several_overloads_report_one_combined_error() {
    let (_, errors) = parse(json!(["length", 1]));
    assert_eq!(
        messages(&errors),
        vec![(
            "$[1]".to_owned(),
            "Expected arguments of type (string) | (array), but found (number) instead.".to_owned()
        )]
    );
}

#[test]
fn overloads_resolve_in_declaration_order() {
    let (e, errors) = parse(json!(["-", 3]));
    assert!(errors.is_empty());
    assert!(matches!(
        e.kind,
        ExprKind::Call {
            op: CallOp::Builtin(crate::definitions::builtin::Builtin::Neg),
            ..
        }
    ));

    let (e, _) = parse(json!(["get", "k", ["literal", {"k": 1}]]));
    assert!(matches!(
        e.kind,
        ExprKind::Call {
            op: CallOp::Builtin(crate::definitions::builtin::Builtin::GetFrom),
            ..
        }
    ));
}

#[test]
fn value_arguments_get_runtime_assertions() {
    let (e, errors) = parse(json!(["+", ["get", "x"], 1]));
    assert!(errors.is_empty());
    let ExprKind::Call { args, .. } = &e.kind else {
        panic!("expected a call");
    };
    assert!(matches!(
        &args[0].kind,
        ExprKind::Call {
            name: "number",
            op: CallOp::Assert,
            ..
        }
    ));
    assert_eq!(args[0].ty, Type::Number);
}

#[test]
fn strings_in_color_position_are_coerced() {
    let (e, errors) = parse_with(json!("red"), Some(Type::Color), false);
    assert!(errors.is_empty());
    assert!(matches!(
        e.kind,
        ExprKind::Call {
            name: "to-color",
            op: CallOp::Coerce(CoerceTarget::Color),
            ..
        }
    ));

    let (e, _) = parse_with(json!("red"), Some(Type::Color), true);
    assert!(matches!(e.as_literal(), Some(Value::Color(_))));
}

#[test]
fn expected_type_mismatch_is_reported_at_the_node() {
    let (_, errors) = parse_with(json!("x"), Some(Type::Number), false);
    assert_eq!(
        messages(&errors),
        vec![(
            "$".to_owned(),
            "Expected number but found string instead.".to_owned()
        )]
    );
}

#[test]
fn let_bindings_are_scoped_to_the_body() {
    let (e, errors) = parse(json!(["let", "a", 1, ["+", ["var", "a"], 1]]));
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(e.ty, Type::Number);

    let (_, errors) = parse(json!(["+", ["let", "a", 1, ["var", "a"]], ["var", "a"]]));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, root().child(2).child(1));
    assert!(errors[0].message.starts_with("Unknown variable \"a\"."));
}

#[test]
fn let_values_cannot_see_their_siblings() {
    let (_, errors) = parse(json!(["let", "a", 1, "b", ["var", "a"], ["var", "b"]]));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, root().child(4).child(1));
}

#[test]
fn multi_binding_let_is_one_node() {
    let (e, errors) = parse(json!(["let", "a", 1, "b", 2, ["var", "b"]]));
    assert!(errors.is_empty());
    let ExprKind::Let { bindings, body } = &e.kind else {
        panic!("expected let");
    };
    let names: Vec<&str> = bindings.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert!(matches!(body.kind, ExprKind::Var { .. }));
}

#[test]
fn let_rejects_bad_names() {
    let (_, errors) = parse(json!(["let", "a-b", 1, 2]));
    assert_eq!(errors[0].location, root().child(1));
    assert_eq!(
        errors[0].message,
        "Variable names must contain only alphanumeric characters or '_'."
    );
}

#[test]
fn case_branches_must_share_a_type() {
    let (_, errors) = parse(json!(["case", true, 1, "x"]));
    assert_eq!(
        messages(&errors),
        vec![(
            "$[3]".to_owned(),
            "Expected number but found string instead.".to_owned()
        )]
    );
}

#[test]
fn case_conditions_must_be_boolean() {
    let (_, errors) = parse(json!(["case", 1, 1, 2]));
    assert_eq!(errors[0].location, root().child(1));
}

#[test]
fn match_labels_are_validated() {
    let (_, errors) = parse(json!(["match", ["get", "k"], "a", 1, "a", 2, 0]));
    assert_eq!(
        messages(&errors),
        vec![("$[4]".to_owned(), "Branch labels must be unique.".to_owned())]
    );

    let (_, errors) = parse(json!(["match", ["get", "k"], "a", 1, 2, 2, 0]));
    assert_eq!(errors[0].message, "Expected string but found number instead.");

    let (_, errors) = parse(json!(["match", ["get", "k"], 1.5, 1, 0]));
    assert_eq!(errors[0].message, "Numeric branch labels must be integer values.");

    let (_, errors) = parse(json!(["match", "x", 1, 1, 0]));
    assert_eq!(errors[0].location, root().child(1));
}

#[test]
fn match_records_labels_per_branch() {
    let (e, errors) = parse(json!(["match", ["get", "k"], "a", 1, ["b", "c"], 2, 0]));
    assert!(errors.is_empty());
    let ExprKind::Call {
        op: CallOp::Match(spec),
        ..
    } = &e.kind
    else {
        panic!("expected match");
    };
    assert_eq!(spec.labels.len(), 2);
    assert_eq!(spec.index.get(&MatchKey::Str("c".into())), Some(&1));
}

#[test]
fn stops_must_be_ascending_literals() {
    let (_, errors) = parse(json!(["step", ["zoom"], 0, 5, 1, 3, 2]));
    assert_eq!(errors[0].location, root().child(5));
    assert!(errors[0].message.contains("strictly ascending order"));

    let (_, errors) = parse(json!(["interpolate", ["linear"], ["zoom"], ["zoom"], 1, 5, 2]));
    assert_eq!(errors[0].location, root().child(3));
    assert!(errors[0].message.contains("literal numeric values"));
}

#[test]
fn interpolate_checks_curve_and_output_type() {
    let (_, errors) = parse(json!(["interpolate", ["quadratic"], ["zoom"], 0, 1, 5, 2]));
    assert_eq!(errors[0].location, root().child(1).child(0));
    assert_eq!(errors[0].message, "Unknown interpolation type quadratic");

    let (_, errors) = parse(json!(["interpolate", ["linear"], ["zoom"], 0, "a", 10, "b"]));
    assert_eq!(errors[0].message, "Type string is not interpolatable.");

    let (e, errors) = parse(json!([
        "interpolate", ["exponential", 2], ["zoom"], 0, ["rgb", 0, 0, 0], 10, ["rgb", 255, 255, 255]
    ]));
    assert!(errors.is_empty());
    assert_eq!(e.ty, Type::Color);
}

#[test]
fn comparisons_check_operand_types() {
    let (_, errors) = parse(json!(["<", true, false]));
    assert_eq!(errors.len(), 2);
    assert_eq!(
        errors[0].message,
        "\"<\" comparisons are not supported for type 'boolean'."
    );

    let (_, errors) = parse(json!(["==", 1, "a"]));
    assert_eq!(
        messages(&errors),
        vec![(
            "$".to_owned(),
            "Cannot compare types 'number' and 'string'.".to_owned()
        )]
    );

    let (e, errors) = parse(json!(["==", ["get", "x"], "a"]));
    assert!(errors.is_empty());
    assert_eq!(e.ty, Type::Boolean);
}

#[test]
fn empty_literal_array_adopts_expected_item_type() {
    let (e, errors) = parse_with(json!(["literal", []]), Some(Type::array(Type::Number)), false);
    assert!(errors.is_empty());
    assert_eq!(e.ty, Type::array(Type::Number));
}

#[test]
fn literal_needs_exactly_one_argument() {
    let (_, errors) = parse(json!(["literal", 1, 2]));
    assert_eq!(
        errors[0].message,
        "'literal' expression requires exactly one argument, but found 2 instead."
    );
}

#[test]
fn array_assertion_parses_item_type_and_length() {
    let (e, errors) = parse(json!(["array", "number", 3, ["get", "v"]]));
    assert!(errors.is_empty());
    assert_eq!(e.ty, Type::array_of_len(Type::Number, 3));

    let (_, errors) = parse(json!(["array", "color", ["get", "v"]]));
    assert_eq!(errors[0].location, root().child(1));
}

#[test]
fn at_yields_the_item_type() {
    let (e, errors) = parse(json!(["at", 1, ["literal", [1, 2, 3]]]));
    assert!(errors.is_empty());
    assert_eq!(e.ty, Type::Number);
}

#[test]
fn constant_calls_fold_to_literals() {
    let (e, errors) = parse_with(json!(["+", 1, ["*", 2, 3]]), None, true);
    assert!(errors.is_empty());
    assert_eq!(e.as_literal(), Some(&Value::Number(7.0)));
    assert_eq!(e.ty, Type::Number);

    let (e, _) = parse_with(json!(["get", "x"]), None, true);
    assert!(e.as_literal().is_none());
}

#[test]
fn folding_failure_is_a_parse_error() {
    let (_, errors) = parse_with(json!(["+", 1, ["/", 1, 0]]), None, true);
    assert_eq!(
        messages(&errors),
        vec![("$[2]".to_owned(), "Division by zero: 1 / 0.".to_owned())]
    );
}

#[test]
fn json_kind_names() {
    assert_eq!(json_kind(&json!(null)), "null");
    assert_eq!(json_kind(&json!([1])), "array");
    assert_eq!(json_kind(&json!({})), "object");
}
