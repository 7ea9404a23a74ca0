use super::*;
use crate::definitions::builtin::Dependence;

fn overloads(name: &str) -> &'static [Signature] {
    match &lookup(name).expect("registered").form {
        Form::Compound(sigs) => sigs,
        Form::Special(_) => panic!("{name} is a special form"),
    }
}

#[test]
fn lookup_finds_compound_and_special_forms() {
    assert!(matches!(lookup("+").unwrap().form, Form::Compound(_)));
    assert_eq!(
        lookup("case").unwrap().form,
        Form::Special(SpecialForm::Case)
    );
    assert_eq!(
        lookup(">=").unwrap().form,
        Form::Special(SpecialForm::Compare(CompareOp::Ge))
    );
    assert!(lookup("nope").is_none());
}

#[test]
fn registry_is_shared_and_sorted_by_name() {
    let a = registry() as *const Registry;
    let b = registry() as *const Registry;
    assert_eq!(a, b);
    let names = registry().names();
    assert!(names.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(names.len(), registry().len());
    assert!(!registry().is_empty());
}

#[test]
fn params_display_and_arity() {
    let p = Params::variadic(&[Type::Number, Type::Number], Type::Number);
    assert_eq!(p.to_string(), "(number, number, ...number)");
    assert!(!p.accepts_arity(1));
    assert!(p.accepts_arity(2));
    assert!(p.accepts_arity(7));
    assert_eq!(p.type_at(5), Some(&Type::Number));

    let fixed = Params::fixed(&[Type::String]);
    assert_eq!(fixed.to_string(), "(string)");
    assert_eq!(fixed.type_at(1), None);
    assert_eq!(Params::fixed(&[]).to_string(), "()");
    assert_eq!(Params::variadic(&[], Type::Boolean).to_string(), "(...boolean)");
}

#[test]
fn resolve_picks_first_compatible_overload() {
    let minus = overloads("-");
    match resolve(minus, &[Type::Number]) {
        Resolution::Matched(sig) => assert_eq!(sig.builtin, Builtin::Neg),
        other => panic!("unexpected {other:?}"),
    }
    match resolve(minus, &[Type::Number, Type::Number]) {
        Resolution::Matched(sig) => assert_eq!(sig.builtin, Builtin::Sub),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn resolve_distinguishes_arity_from_type_mismatch() {
    let plus = overloads("+");
    assert_eq!(resolve(plus, &[Type::Number]), Resolution::ArityMismatch);
    match resolve(plus, &[Type::Number, Type::String]) {
        Resolution::TypeMismatch(c) => assert_eq!(c.len(), 1),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn error_typed_arguments_match_anything() {
    let slice = overloads("slice");
    match resolve(slice, &[Type::Error, Type::Number]) {
        Resolution::Matched(sig) => assert_eq!(sig.builtin, Builtin::Slice),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn resolve_with_uses_the_callers_acceptance_test() {
    let length = overloads("length");
    let args = [Type::Value];
    assert!(matches!(
        resolve(length, &args),
        Resolution::TypeMismatch(_)
    ));

    let assertable = |actual: &Type, param: &Type| actual == &Type::Value || actual.is_compatible_with(param);
    match resolve_with(length, &args, assertable) {
        Resolution::Matched(sig) => assert_eq!(sig.params.leading, [Type::String]),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn arity_messages_name_the_range() {
    assert_eq!(
        arity_message("+", overloads("+"), 1),
        "\"+\" expects at least 2 arguments, but found 1 instead."
    );
    assert_eq!(
        arity_message("-", overloads("-"), 3),
        "\"-\" expects 1 to 2 arguments, but found 3 instead."
    );
    assert_eq!(
        arity_message("abs", overloads("abs"), 0),
        "\"abs\" expects 1 argument, but found 0 instead."
    );
    assert_eq!(
        arity_message("pi", overloads("pi"), 2),
        "\"pi\" expects 0 arguments, but found 2 instead."
    );
}

#[test]
fn context_accessors_carry_dependence() {
    assert!(overloads("zoom")[0].builtin.dependence().zoom);
    assert!(overloads("get")[0].builtin.dependence().feature);
    assert!(!overloads("get")[1].builtin.dependence().feature);
    assert_eq!(overloads("+")[0].builtin.dependence(), Dependence::default());
}
