use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn linear_factor_is_proportional() {
    assert!(close(Curve::Linear.factor(5.0, 0.0, 10.0), 0.5));
    assert!(close(Curve::Linear.factor(12.0, 10.0, 20.0), 0.2));
}

#[test]
fn degenerate_segment_has_zero_factor() {
    assert_eq!(Curve::Linear.factor(3.0, 3.0, 3.0), 0.0);
}

#[test]
fn exponential_base_one_matches_linear() {
    let curve = Curve::Exponential { base: 1.0 };
    assert!(close(curve.factor(2.5, 0.0, 10.0), 0.25));
}

#[test]
fn exponential_base_bends_toward_upper_stop() {
    let curve = Curve::Exponential { base: 2.0 };
    // (2^1 - 1) / (2^2 - 1)
    assert!(close(curve.factor(1.0, 0.0, 2.0), 1.0 / 3.0));
}

#[test]
fn cubic_bezier_endpoints_are_fixed() {
    let curve = Curve::CubicBezier {
        x1: 0.42,
        y1: 0.0,
        x2: 0.58,
        y2: 1.0,
    };
    assert!(curve.factor(0.0, 0.0, 1.0).abs() < 1e-5);
    assert!((curve.factor(1.0, 0.0, 1.0) - 1.0).abs() < 1e-5);
    // ease-in-out is symmetric around the midpoint
    assert!((curve.factor(0.5, 0.0, 1.0) - 0.5).abs() < 1e-5);
}

#[test]
fn cubic_bezier_with_linear_controls_is_identity() {
    let bezier = UnitBezier::new(0.0, 0.0, 1.0, 1.0);
    for x in [0.1, 0.3, 0.7, 0.9] {
        assert!((bezier.solve(x) - x).abs() < 1e-5, "x = {x}");
    }
}

#[test]
fn stop_index_picks_last_stop_not_above_input() {
    let stops = [0.0, 5.0, 10.0];
    assert_eq!(stop_index(&stops, -1.0), 0);
    assert_eq!(stop_index(&stops, 0.0), 0);
    assert_eq!(stop_index(&stops, 4.9), 0);
    assert_eq!(stop_index(&stops, 5.0), 1);
    assert_eq!(stop_index(&stops, 100.0), 2);
}

#[test]
fn blend_numbers_colors_and_arrays() {
    assert_eq!(
        blend(&Value::Number(0.0), &Value::Number(10.0), 0.3).unwrap(),
        Value::Number(3.0)
    );

    let mixed = blend(
        &Value::Color(Color::rgba(0.0, 0.0, 0.0, 1.0)),
        &Value::Color(Color::rgba(1.0, 1.0, 1.0, 1.0)),
        0.5,
    )
    .unwrap();
    let c = mixed.as_color().unwrap();
    assert!(close(c.r, 0.5) && close(c.a, 1.0));

    let arr = blend(
        &Value::Array(vec![Value::Number(0.0), Value::Number(2.0)]),
        &Value::Array(vec![Value::Number(10.0), Value::Number(4.0)]),
        0.5,
    )
    .unwrap();
    assert_eq!(
        arr,
        Value::Array(vec![Value::Number(5.0), Value::Number(3.0)])
    );
}

#[test]
fn blend_rejects_mismatched_shapes() {
    let err = blend(
        &Value::Array(vec![Value::Number(0.0)]),
        &Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]),
        0.5,
    )
    .unwrap_err();
    assert!(err.contains("different lengths"), "{err}");

    let err = blend(&Value::Number(1.0), &Value::String("x".into()), 0.5).unwrap_err();
    assert_eq!(err, "Cannot interpolate between number and string.");
}

#[test]
fn curve_json_names_the_interpolation_type() {
    assert_eq!(Curve::Linear.to_json(), serde_json::json!(["linear"]));
    assert_eq!(
        Curve::Exponential { base: 1.5 }.to_json(),
        serde_json::json!(["exponential", 1.5])
    );
}
