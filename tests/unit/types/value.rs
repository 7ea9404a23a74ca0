use super::*;
use serde_json::json;

#[test]
fn type_of_scalars() {
    assert_eq!(Value::Null.type_of(), Type::Null);
    assert_eq!(Value::from(1.5).type_of(), Type::Number);
    assert_eq!(Value::from("x").type_of(), Type::String);
    assert_eq!(Value::from(true).type_of(), Type::Boolean);
    assert_eq!(Value::Color(Color::BLACK).type_of(), Type::Color);
}

#[test]
fn type_of_arrays_uses_common_item_type() {
    let nums = Value::from(json!([1, 2, 3]));
    assert_eq!(nums.type_of(), Type::array_of_len(Type::Number, 3));

    let mixed = Value::from(json!([1, "a"]));
    assert_eq!(mixed.type_of(), Type::array_of_len(Type::Value, 2));

    let empty = Value::from(json!([]));
    assert_eq!(empty.type_of(), Type::array_of_len(Type::Value, 0));
}

#[test]
fn json_conversion_keeps_structure() {
    let v = Value::from(json!({"a": [1, null, true], "b": "x"}));
    let obj = v.as_object().unwrap();
    assert_eq!(obj["b"], Value::from("x"));
    assert_eq!(v.to_json(), json!({"a": [1, null, true], "b": "x"}));
}

#[test]
fn display_strings() {
    assert_eq!(Value::Null.to_display_string(), "");
    assert_eq!(Value::from(3.0).to_display_string(), "3");
    assert_eq!(Value::from(0.5).to_display_string(), "0.5");
    assert_eq!(Value::from(f64::INFINITY).to_display_string(), "Infinity");
    assert_eq!(Value::from(json!([1, "a"])).to_display_string(), "[1,\"a\"]");
    assert_eq!(
        Value::Color(Color::rgba(1.0, 0.0, 0.0, 1.0)).to_display_string(),
        "rgba(255,0,0,1)"
    );
}

#[test]
fn truthiness() {
    assert!(!Value::Null.is_truthy());
    assert!(!Value::from(0.0).is_truthy());
    assert!(!Value::from(f64::NAN).is_truthy());
    assert!(!Value::from("").is_truthy());
    assert!(Value::from("0").is_truthy());
    assert!(Value::from(json!([])).is_truthy());
}

#[test]
fn deserializes_from_json() {
    let v: Value = serde_json::from_str(r#"{"height": 12}"#).unwrap();
    assert_eq!(v.as_object().unwrap()["height"], Value::Number(12.0));
}
