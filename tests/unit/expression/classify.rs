use super::*;
use crate::expression::parser::ParsingContext;
use crate::foundation::location::Location;
use serde_json::json;

fn parsed(input: serde_json::Value) -> Expression {
    let mut ctx = ParsingContext::new(false);
    let e = ctx.parse(&input, &Location::root(), None);
    assert!(ctx.errors.is_empty(), "{:?}", ctx.errors);
    e
}

#[test]
fn literals_and_pure_math_are_constant() {
    for input in [json!(1), json!(["+", 1, 2]), json!(["concat", "a", ["pi"]])] {
        let e = parsed(input);
        assert!(is_zoom_constant(&e));
        assert!(is_feature_constant(&e));
    }
}

#[test]
fn zoom_reference_is_zoom_dependent_only() {
    let e = parsed(json!(["*", ["zoom"], 2]));
    assert!(!is_zoom_constant(&e));
    assert!(is_feature_constant(&e));
}

#[test]
fn feature_accessors_are_feature_dependent() {
    for input in [
        json!(["get", "height"]),
        json!(["has", "height"]),
        json!(["properties"]),
        json!(["geometry-type"]),
        json!(["id"]),
        json!(["feature-state", "hover"]),
    ] {
        let e = parsed(input.clone());
        assert!(!is_feature_constant(&e), "{input}");
        assert!(is_zoom_constant(&e), "{input}");
    }
}

#[test]
fn object_lookups_do_not_read_the_feature() {
    let e = parsed(json!(["get", "k", ["literal", {"k": 1}]]));
    assert!(is_feature_constant(&e));
}

#[test]
fn dependence_flows_through_bindings_and_control_flow() {
    let e = parsed(json!(["let", "z", ["zoom"], ["+", ["var", "z"], 1]]));
    assert!(!is_zoom_constant(&e));

    let e = parsed(json!(["case", ["has", "x"], 1, 2]));
    assert!(!is_feature_constant(&e));

    let e = parsed(json!([
        "interpolate", ["linear"], ["zoom"], 0, ["get", "a"], 10, 1
    ]));
    assert!(!is_zoom_constant(&e));
    assert!(!is_feature_constant(&e));
}

#[test]
fn unread_and_shadowed_bindings_do_not_count() {
    let e = parsed(json!(["let", "z", ["zoom"], 1]));
    assert!(is_zoom_constant(&e));

    let e = parsed(json!(["let", "a", ["zoom"], ["let", "a", 2, ["var", "a"]]]));
    assert!(is_zoom_constant(&e));

    let e = parsed(json!([
        "let", "f", ["get", "x"],
        ["let", "g", ["var", "f"], ["let", "g", 0, ["var", "g"]]]
    ]));
    assert!(is_feature_constant(&e));
}
