use super::*;
use crate::foundation::location::Location;
use crate::expression::error::ParsingError;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StyleExprError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        StyleExprError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
    let parse = StyleExprError::from(ParseErrors {
        errors: vec![ParsingError::new(Location::root().child(0), "boom")],
    });
    assert!(parse.to_string().starts_with("parse error: $[0]: boom"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StyleExprError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let e = serde_json::from_str::<serde_json::Value>("[1,").unwrap_err();
    let err = StyleExprError::from(e);
    assert!(matches!(err, StyleExprError::Serde(_)));
}
