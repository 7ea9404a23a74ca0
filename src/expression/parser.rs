//! Recursive-descent transform from JSON input to a typed [`Expression`].
//!
//! Parsing never stops at the first problem: a failing subtree records a
//! [`ParsingError`] and yields a poison node typed `error`, which every
//! expected type accepts, so siblings are still checked. Special forms live in
//! `forms.rs`; this file holds dispatch, overload resolution, implicit
//! annotation and constant folding.

use crate::definitions::builtin::{CoerceTarget, Dependence};
use crate::definitions::registry::{
    Form, Resolution, Signature, arity_message, candidates_for_arity, lookup, resolve_with,
};
use crate::expression::ast::{BindingId, CallOp, ExprKind, Expression};
use crate::expression::error::ParsingError;
use crate::expression::vm::evaluate_constant;
use crate::foundation::location::Location;
use crate::types::ty::Type;
use crate::types::value::Value;

/// Whether a `value`-typed result may be wrapped to satisfy the expected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Annotation {
    /// Insert a runtime assertion or color coercion.
    Wrap,
    /// Leave the node as is; the caller decides.
    Omit,
}

#[derive(Debug, Clone)]
pub(crate) struct Binding {
    pub(crate) name: String,
    pub(crate) id: BindingId,
    pub(crate) ty: Type,
}

/// Single-use parse state: the append-only diagnostics list and the lexical scope.
#[derive(Debug)]
pub(crate) struct ParsingContext {
    pub(crate) errors: Vec<ParsingError>,
    pub(crate) scope: Vec<Binding>,
    next_binding: BindingId,
    fold_constants: bool,
}

impl ParsingContext {
    pub(crate) fn new(fold_constants: bool) -> Self {
        Self {
            errors: Vec::new(),
            scope: Vec::new(),
            next_binding: 0,
            fold_constants,
        }
    }

    pub(crate) fn into_errors(self) -> Vec<ParsingError> {
        self.errors
    }

    pub(crate) fn error(&mut self, location: Location, message: impl Into<String>) {
        self.errors.push(ParsingError::new(location, message));
    }

    /// Record an error and return the poison node for `location`.
    pub(crate) fn fail(&mut self, location: &Location, message: impl Into<String>) -> Expression {
        self.error(location.clone(), message);
        Expression::poison(location.clone())
    }

    pub(crate) fn fresh_binding(&mut self) -> BindingId {
        let id = self.next_binding;
        self.next_binding += 1;
        id
    }

    /// Innermost binding named `name`.
    pub(crate) fn resolve_var(&self, name: &str) -> Option<&Binding> {
        self.scope.iter().rev().find(|b| b.name == name)
    }

    pub(crate) fn parse(
        &mut self,
        node: &serde_json::Value,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        self.parse_annotated(node, location, expected, Annotation::Wrap)
    }

    pub(crate) fn parse_annotated(
        &mut self,
        node: &serde_json::Value,
        location: &Location,
        expected: Option<&Type>,
        annotation: Annotation,
    ) -> Expression {
        let mark = self.errors.len();
        let parsed = match node {
            serde_json::Value::Array(items) => self.parse_call(items, location, expected),
            serde_json::Value::Object(_) => {
                return self.fail(
                    location,
                    "Bare objects invalid. Use [\"literal\", {...}] instead.",
                );
            }
            scalar => {
                let value = Value::from(scalar);
                let ty = value.type_of();
                Expression::new(ExprKind::Literal(value), ty, location.clone())
            }
        };
        if parsed.is_poison() {
            return parsed;
        }
        let parsed = match expected {
            Some(expected) => self.annotate(parsed, expected, annotation),
            None => parsed,
        };
        // Subtrees that already failed are reported once, where they failed.
        if self.errors.len() > mark {
            return parsed;
        }
        self.fold(parsed)
    }

    fn parse_call(
        &mut self,
        items: &[serde_json::Value],
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        let Some(first) = items.first() else {
            return self.fail(
                location,
                "Expected an array with at least one element. If you wanted a literal array, use [\"literal\", []].",
            );
        };
        let Some(name) = first.as_str() else {
            return self.fail(
                &location.child(0),
                format!(
                    "Expression name must be a string, but found {} instead. If you wanted a literal array, use [\"literal\", [...]].",
                    json_kind(first)
                ),
            );
        };
        let Some(def) = lookup(name) else {
            return self.fail(
                &location.child(0),
                format!(
                    "Unknown expression \"{name}\". If you wanted a literal array, use [\"literal\", [...]]."
                ),
            );
        };
        match &def.form {
            Form::Compound(overloads) => self.parse_compound(def.name, overloads, items, location),
            Form::Special(form) => self.parse_special(def.name, form, items, location, expected),
        }
    }

    /// Parse every argument exactly once, then pick the first arity-matching
    /// overload whose parameters accept the argument types.
    ///
    /// A lone candidate parses its arguments against its own parameter types so
    /// each mismatch is reported where it occurs. With several candidates an
    /// argument is parsed against a parameter type only where all of them agree,
    /// and the chosen signature's annotations are applied afterwards.
    fn parse_compound(
        &mut self,
        name: &'static str,
        overloads: &'static [Signature],
        items: &[serde_json::Value],
        location: &Location,
    ) -> Expression {
        let args = &items[1..];
        let candidates = candidates_for_arity(overloads, args.len());
        let mark = self.errors.len();

        if let [sig] = candidates.as_slice() {
            let parsed: Vec<Expression> = args
                .iter()
                .enumerate()
                .map(|(i, a)| self.parse(a, &location.child(i + 1), sig.params.type_at(i)))
                .collect();
            if self.errors.len() > mark {
                return Expression::poison(location.clone());
            }
            return builtin_call(name, sig, parsed, location);
        }
        if candidates.is_empty() {
            return self.fail(location, arity_message(name, overloads, args.len()));
        }

        let parsed: Vec<Expression> = args
            .iter()
            .enumerate()
            .map(|(i, a)| {
                let shared = shared_param(&candidates, i);
                self.parse_annotated(a, &location.child(i + 1), shared, Annotation::Omit)
            })
            .collect();
        if self.errors.len() > mark {
            return Expression::poison(location.clone());
        }

        let actual: Vec<Type> = parsed.iter().map(|a| a.ty.clone()).collect();
        match resolve_with(overloads, &actual, annotatable) {
            Resolution::Matched(sig) => {
                let args = parsed
                    .into_iter()
                    .enumerate()
                    .map(|(i, a)| match sig.params.type_at(i) {
                        Some(param) => {
                            let a = self.annotate(a, param, Annotation::Wrap);
                            self.fold(a)
                        }
                        None => a,
                    })
                    .collect();
                builtin_call(name, sig, args, location)
            }
            Resolution::ArityMismatch | Resolution::TypeMismatch(_) => {
                self.overload_mismatch(&candidates, &actual, location)
            }
        }
    }

    fn overload_mismatch(
        &mut self,
        candidates: &[&Signature],
        actual: &[Type],
        location: &Location,
    ) -> Expression {
        let expected = candidates
            .iter()
            .map(|s| s.params.to_string())
            .collect::<Vec<_>>()
            .join(" | ");
        let found = actual
            .iter()
            .map(Type::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        let at = (0..actual.len())
            .find(|&i| {
                candidates.iter().all(|s| {
                    s.params
                        .type_at(i)
                        .is_none_or(|t| !annotatable(&actual[i], t))
                })
            })
            .map_or_else(|| location.clone(), |i| location.child(i + 1));
        self.fail(
            &at,
            format!("Expected arguments of type {expected}, but found ({found}) instead."),
        )
    }

    /// Reconcile a parsed node with the type its parent expects.
    fn annotate(&mut self, parsed: Expression, expected: &Type, annotation: Annotation) -> Expression {
        let actual = parsed.ty.clone();
        if asserts(&actual, expected) {
            if annotation == Annotation::Omit {
                return parsed;
            }
            let location = parsed.location.clone();
            return Expression::new(
                ExprKind::Call {
                    name: expected.kind_name(),
                    op: CallOp::Assert,
                    args: vec![parsed],
                },
                expected.clone(),
                location,
            );
        }
        if coerces_to_color(&actual, expected) {
            if annotation == Annotation::Omit {
                return parsed;
            }
            let location = parsed.location.clone();
            return Expression::new(
                ExprKind::Call {
                    name: "to-color",
                    op: CallOp::Coerce(CoerceTarget::Color),
                    args: vec![parsed],
                },
                Type::Color,
                location,
            );
        }
        if !actual.is_compatible_with(expected) {
            self.error(
                parsed.location.clone(),
                format!("Expected {expected} but found {actual} instead."),
            );
        }
        parsed
    }

    /// Replace a context-independent call over literal arguments by its value.
    fn fold(&mut self, expr: Expression) -> Expression {
        if !self.fold_constants {
            return expr;
        }
        let ExprKind::Call { op, args, .. } = &expr.kind else {
            return expr;
        };
        if let CallOp::Builtin(b) = op
            && b.dependence() != Dependence::default()
        {
            return expr;
        }
        if !args.iter().all(|a| matches!(a.kind, ExprKind::Literal(_))) {
            return expr;
        }
        match evaluate_constant(&expr) {
            Ok(value) => Expression::new(ExprKind::Literal(value), expr.ty, expr.location),
            Err(e) => {
                tracing::debug!(location = %expr.location, error = %e.message, "constant folding failed");
                self.fail(&expr.location, e.message)
            }
        }
    }
}

/// A `value` node in a slot that a runtime assertion can check.
fn asserts(actual: &Type, expected: &Type) -> bool {
    *actual == Type::Value
        && matches!(
            expected,
            Type::String | Type::Number | Type::Boolean | Type::Object | Type::Array { .. }
        )
}

fn coerces_to_color(actual: &Type, expected: &Type) -> bool {
    *expected == Type::Color && matches!(actual, Type::Value | Type::String)
}

/// Whether `annotate` can make a node of type `actual` fit `expected`.
fn annotatable(actual: &Type, expected: &Type) -> bool {
    actual.is_compatible_with(expected)
        || asserts(actual, expected)
        || coerces_to_color(actual, expected)
}

/// The parameter type every candidate declares at position `i`, if they agree.
fn shared_param<'a>(candidates: &[&'a Signature], i: usize) -> Option<&'a Type> {
    let (&first, rest) = candidates.split_first()?;
    let ty = first.params.type_at(i)?;
    rest.iter()
        .all(|s| s.params.type_at(i) == Some(ty))
        .then_some(ty)
}

fn builtin_call(
    name: &'static str,
    sig: &Signature,
    args: Vec<Expression>,
    location: &Location,
) -> Expression {
    Expression::new(
        ExprKind::Call {
            name,
            op: CallOp::Builtin(sig.builtin),
            args,
        },
        sig.result.clone(),
        location.clone(),
    )
}

/// JSON kind name used in structural diagnostics.
pub(crate) fn json_kind(v: &serde_json::Value) -> &'static str {
    match v {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/parser.rs"]
mod tests;
