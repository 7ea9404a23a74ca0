use crate::expression::parser::ParsingContext;
use crate::foundation::location::Location;
use serde_json::json;

fn round_trip(input: serde_json::Value, fold: bool) -> serde_json::Value {
    let mut ctx = ParsingContext::new(fold);
    let e = ctx.parse(&input, &Location::root(), None);
    assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
    e.to_json()
}

#[test]
fn plain_calls_keep_their_shape() {
    let input = json!(["concat", "a", ["get", "name"]]);
    assert_eq!(round_trip(input.clone(), false), input);
}

#[test]
fn implicit_annotations_are_spelled_out() {
    assert_eq!(
        round_trip(json!(["+", ["get", "x"], 1]), false),
        json!(["+", ["number", ["get", "x"]], 1])
    );
}

#[test]
fn compound_literals_are_escaped() {
    assert_eq!(
        round_trip(json!(["literal", [1, 2]]), false),
        json!(["literal", [1, 2]])
    );
    assert_eq!(
        round_trip(json!(["literal", {"a": true}]), false),
        json!(["literal", {"a": true}])
    );
}

#[test]
fn folded_colors_become_rgba_calls() {
    assert_eq!(
        round_trip(json!(["rgb", 255, 0, 0]), true),
        json!(["rgba", 255.0, 0.0, 0.0, 1.0])
    );
}

#[test]
fn multi_binding_let_keeps_its_group() {
    let input = json!(["let", "a", 1, "b", 2, ["+", ["var", "a"], ["var", "b"]]]);
    assert_eq!(round_trip(input.clone(), false), input);

    // `b` reads the outer `a`; nesting would make it see its sibling instead.
    let input = json!(["let", "a", 1, ["let", "a", 2, "b", ["var", "a"], ["var", "b"]]]);
    assert_eq!(round_trip(input.clone(), false), input);
}

#[test]
fn match_keeps_label_groups() {
    let input = json!(["match", ["get", "k"], "a", 1, ["b", "c"], 2, 0]);
    assert_eq!(round_trip(input.clone(), false), input);
}

#[test]
fn step_and_interpolate_list_their_stops() {
    assert_eq!(
        round_trip(json!(["step", ["zoom"], 0, 5, 1]), false),
        json!(["step", ["zoom"], 0, 5.0, 1])
    );
    assert_eq!(
        round_trip(
            json!(["interpolate", ["exponential", 2], ["zoom"], 0, 0, 10, 100]),
            false
        ),
        json!(["interpolate", ["exponential", 2.0], ["zoom"], 0.0, 0, 10.0, 100])
    );
}

#[test]
fn array_assertion_keeps_item_type_and_length() {
    let input = json!(["array", "number", 2, ["get", "v"]]);
    assert_eq!(round_trip(input.clone(), false), input);
    let input = json!(["array", ["get", "v"]]);
    assert_eq!(round_trip(input.clone(), false), input);
}
