use super::*;

fn feature() -> Feature {
    serde_json::from_value(serde_json::json!({
        "id": 7,
        "geometry_type": "Polygon",
        "properties": {"height": 12, "name": "hall"}
    }))
    .unwrap()
}

#[test]
fn feature_deserializes_from_json() {
    let f = feature();
    assert_eq!(f.id, Some(Value::Number(7.0)));
    assert_eq!(f.geometry_type, Some(GeometryType::Polygon));
    assert_eq!(f.properties.get("name"), Some(&Value::String("hall".into())));
}

#[test]
fn feature_fields_are_optional_but_unknown_ones_rejected() {
    let empty: Feature = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, Feature::default());

    let bad = serde_json::from_str::<Feature>(r#"{"geometry": "Point"}"#);
    assert!(bad.is_err());
}

#[test]
fn evaluation_context_exposes_feature_data() {
    let f = feature();
    let ctx = EvaluationContext::new(5.0, &f);
    assert_eq!(ctx.zoom(), 5.0);
    assert_eq!(ctx.geometry_type(), Some(GeometryType::Polygon));
    assert_eq!(ctx.id(), Some(&Value::Number(7.0)));
    assert!(ctx.properties().is_some_and(|p| p.contains_key("height")));
    assert!(ctx.feature_state().is_none());
}

#[test]
fn zoom_only_context_has_no_feature() {
    let ctx = EvaluationContext::at_zoom(3.5);
    assert_eq!(ctx.zoom(), 3.5);
    assert!(ctx.properties().is_none());
    assert!(ctx.geometry_type().is_none());
    assert!(ctx.id().is_none());
}

#[test]
fn state_is_attached_separately() {
    let f = Feature::default();
    let mut state = BTreeMap::new();
    state.insert("hover".to_owned(), Value::Boolean(true));
    let ctx = EvaluationContext::new(1.0, &f).with_state(&state);
    assert_eq!(
        ctx.feature_state().and_then(|s| s.get("hover")),
        Some(&Value::Boolean(true))
    );
}

#[test]
fn geometry_type_names() {
    assert_eq!(GeometryType::LineString.to_string(), "LineString");
    assert_eq!(GeometryType::Point.as_str(), "Point");
}
