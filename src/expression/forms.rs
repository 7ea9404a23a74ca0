//! Parse routines for operators whose arguments are not a plain signature.

use crate::definitions::builtin::{Builtin, CoerceTarget, CompareOp};
use crate::definitions::registry::SpecialForm;
use crate::expression::ast::{
    CallOp, ExprKind, Expression, LetBinding, MAX_SAFE_INTEGER, MatchKey, MatchSpec,
};
use crate::expression::parser::{Annotation, Binding, ParsingContext, json_kind};
use crate::foundation::location::Location;
use crate::runtime::interpolate::Curve;
use crate::types::ty::Type;
use crate::types::value::Value;
use std::collections::HashMap;

type Items = [serde_json::Value];

impl ParsingContext {
    pub(crate) fn parse_special(
        &mut self,
        name: &'static str,
        form: &SpecialForm,
        items: &Items,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        match form {
            SpecialForm::Literal => self.parse_literal(items, location, expected),
            SpecialForm::Let => self.parse_let(items, location, expected),
            SpecialForm::Var => self.parse_var(items, location),
            SpecialForm::Case => self.parse_case(name, items, location, expected),
            SpecialForm::Match => self.parse_match(name, items, location, expected),
            SpecialForm::Coalesce => self.parse_coalesce(name, items, location, expected),
            SpecialForm::Step => self.parse_step(name, items, location, expected),
            SpecialForm::Interpolate => self.parse_interpolate(name, items, location, expected),
            SpecialForm::Compare(op) => self.parse_compare(*op, items, location),
            SpecialForm::Assert(ty) => self.parse_assert(name, ty.clone(), items, location),
            SpecialForm::ArrayAssert => self.parse_array_assert(name, items, location),
            SpecialForm::Coerce(target) => self.parse_coerce(name, *target, items, location),
            SpecialForm::At => self.parse_at(name, items, location, expected),
        }
    }

    fn parse_literal(
        &mut self,
        items: &Items,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        if items.len() != 2 {
            return self.fail(
                location,
                format!(
                    "'literal' expression requires exactly one argument, but found {} instead.",
                    items.len() - 1
                ),
            );
        }
        let value = Value::from(&items[1]);
        let mut ty = value.type_of();
        // An empty array takes the item type its consumer asks for.
        let empty = matches!(ty, Type::Array { len: Some(0), .. });
        if empty && let Some(want @ Type::Array { len: None | Some(0), .. }) = expected {
            ty = want.clone();
        }
        Expression::new(ExprKind::Literal(value), ty, location.clone())
    }

    fn parse_var(&mut self, items: &Items, location: &Location) -> Expression {
        let name = match items {
            [_, serde_json::Value::String(name)] => name,
            _ => {
                return self.fail(
                    location,
                    "'var' expression requires exactly one string literal argument.",
                );
            }
        };
        match self.resolve_var(name) {
            Some(b) => Expression::new(
                ExprKind::Var {
                    name: name.clone(),
                    binding: b.id,
                },
                b.ty.clone(),
                location.clone(),
            ),
            None => self.fail(
                &location.child(1),
                format!(
                    "Unknown variable \"{name}\". Make sure \"{name}\" has been bound in an enclosing \"let\" expression before using it."
                ),
            ),
        }
    }

    /// `["let", n1, v1, ..., body]`: values see the enclosing scope, the body
    /// sees every binding.
    fn parse_let(&mut self, items: &Items, location: &Location, expected: Option<&Type>) -> Expression {
        let argc = items.len() - 1;
        if argc < 3 {
            return self.fail(
                location,
                format!("Expected at least 3 arguments, but found {argc} instead."),
            );
        }
        if argc % 2 == 0 {
            return self.fail(location, "Expected an odd number of arguments.");
        }

        let last = items.len() - 1;
        let mut bindings = Vec::with_capacity(argc / 2);
        for i in (1..last).step_by(2) {
            let name_loc = location.child(i);
            let Some(name) = items[i].as_str() else {
                return self.fail(
                    &name_loc,
                    format!("Expected string, but found {} instead.", json_kind(&items[i])),
                );
            };
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return self.fail(
                    &name_loc,
                    "Variable names must contain only alphanumeric characters or '_'.",
                );
            }
            let value = self.parse(&items[i + 1], &location.child(i + 1), None);
            bindings.push(LetBinding {
                name: name.to_owned(),
                binding: self.fresh_binding(),
                value,
            });
        }

        let mark = self.scope.len();
        for b in &bindings {
            self.scope.push(Binding {
                name: b.name.clone(),
                id: b.binding,
                ty: b.value.ty.clone(),
            });
        }
        let body = self.parse(&items[last], &location.child(last), expected);
        self.scope.truncate(mark);

        let ty = body.ty.clone();
        Expression::new(
            ExprKind::Let {
                bindings,
                body: Box::new(body),
            },
            ty,
            location.clone(),
        )
    }

    fn parse_case(
        &mut self,
        name: &'static str,
        items: &Items,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        let argc = items.len() - 1;
        if argc < 3 {
            return self.fail(
                location,
                format!("Expected at least 3 arguments, but found only {argc}."),
            );
        }
        if argc % 2 == 0 {
            return self.fail(location, "Expected an odd number of arguments.");
        }

        let mut output = output_type(expected);
        let last = items.len() - 1;
        let mut args = Vec::with_capacity(argc);
        for i in (1..last).step_by(2) {
            args.push(self.parse(&items[i], &location.child(i), Some(&Type::Boolean)));
            let out = self.parse(&items[i + 1], &location.child(i + 1), output.as_ref());
            output.get_or_insert_with(|| out.ty.clone());
            args.push(out);
        }
        let fallback = self.parse(&items[last], &location.child(last), output.as_ref());
        let ty = output.unwrap_or_else(|| fallback.ty.clone());
        args.push(fallback);
        call(name, CallOp::Case, args, ty, location)
    }

    fn parse_match(
        &mut self,
        name: &'static str,
        items: &Items,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        let argc = items.len() - 1;
        if argc < 4 {
            return self.fail(
                location,
                format!("Expected at least 4 arguments, but found only {argc}."),
            );
        }
        if argc % 2 != 0 {
            return self.fail(location, "Expected an even number of arguments.");
        }

        let mut input_type: Option<Type> = None;
        let mut output = output_type(expected);
        let mut labels = Vec::new();
        let mut index = HashMap::new();
        let mut outputs = Vec::new();
        let last = items.len() - 1;

        for i in (2..last).step_by(2) {
            let label_loc = location.child(i);
            let raw: Vec<&serde_json::Value> = match &items[i] {
                serde_json::Value::Array(list) => list.iter().collect(),
                single => vec![single],
            };
            if raw.is_empty() {
                return self.fail(&label_loc, "Expected at least one branch label.");
            }
            let mut keys = Vec::with_capacity(raw.len());
            for label in raw {
                let key = match label {
                    serde_json::Value::Number(n) => {
                        let n = n.as_f64().unwrap_or(f64::NAN);
                        if n.abs() > MAX_SAFE_INTEGER {
                            return self.fail(
                                &label_loc,
                                "Branch labels must be integers no larger than 9007199254740991.",
                            );
                        }
                        if n.fract() != 0.0 {
                            return self.fail(
                                &label_loc,
                                "Numeric branch labels must be integer values.",
                            );
                        }
                        MatchKey::Int(n as i64)
                    }
                    serde_json::Value::String(s) => MatchKey::Str(s.clone()),
                    _ => {
                        return self.fail(&label_loc, "Branch labels must be numbers or strings.");
                    }
                };
                let label_type = match key {
                    MatchKey::Int(_) => Type::Number,
                    MatchKey::Str(_) => Type::String,
                };
                match &input_type {
                    None => input_type = Some(label_type),
                    Some(t) if *t != label_type => {
                        return self.fail(
                            &label_loc,
                            format!("Expected {t} but found {label_type} instead."),
                        );
                    }
                    Some(_) => {}
                }
                if index.contains_key(&key) {
                    return self.fail(&label_loc, "Branch labels must be unique.");
                }
                index.insert(key.clone(), labels.len());
                keys.push(key);
            }
            let out = self.parse(&items[i + 1], &location.child(i + 1), output.as_ref());
            output.get_or_insert_with(|| out.ty.clone());
            labels.push(keys);
            outputs.push(out);
        }

        let input_loc = location.child(1);
        let input = self.parse(&items[1], &input_loc, Some(&Type::Value));
        let fallback = self.parse(&items[last], &location.child(last), output.as_ref());
        if let Some(t) = &input_type
            && input.ty != Type::Value
            && !input.ty.is_compatible_with(t)
        {
            self.error(
                input_loc,
                format!("Expected {t} but found {} instead.", input.ty),
            );
        }

        let ty = output.unwrap_or_else(|| fallback.ty.clone());
        let mut args = Vec::with_capacity(outputs.len() + 2);
        args.push(input);
        args.extend(outputs);
        args.push(fallback);
        call(
            name,
            CallOp::Match(MatchSpec { labels, index }),
            args,
            ty,
            location,
        )
    }

    fn parse_coalesce(
        &mut self,
        name: &'static str,
        items: &Items,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        if items.len() < 2 {
            return self.fail(location, "Expected at least one argument.");
        }
        let mut output = output_type(expected);
        let mut args = Vec::with_capacity(items.len() - 1);
        for (i, item) in items.iter().enumerate().skip(1) {
            let parsed =
                self.parse_annotated(item, &location.child(i), output.as_ref(), Annotation::Omit);
            output.get_or_insert_with(|| parsed.ty.clone());
            args.push(parsed);
        }
        // Mixed argument types leave the check to an annotation on the whole node.
        let needs_annotation =
            expected.is_some_and(|want| args.iter().any(|a| !a.ty.is_compatible_with(want)));
        let ty = if needs_annotation {
            Type::Value
        } else {
            output.unwrap_or(Type::Value)
        };
        call(name, CallOp::Coalesce, args, ty, location)
    }

    fn parse_step(
        &mut self,
        name: &'static str,
        items: &Items,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        let argc = items.len() - 1;
        if argc < 4 {
            return self.fail(
                location,
                format!("Expected at least 4 arguments, but found only {argc}."),
            );
        }
        if argc % 2 != 0 {
            return self.fail(location, "Expected an even number of arguments.");
        }

        let input = self.parse(&items[1], &location.child(1), Some(&Type::Number));
        let mut output = output_type(expected);
        let mut stops = vec![f64::NEG_INFINITY];
        let mut args = vec![input];

        let first = self.parse(&items[2], &location.child(2), output.as_ref());
        output.get_or_insert_with(|| first.ty.clone());
        args.push(first);

        for i in (3..items.len()).step_by(2) {
            let label = match self.stop_label(name, &stops, &items[i], &location.child(i)) {
                Ok(label) => label,
                Err(poison) => return poison,
            };
            stops.push(label);
            let out = self.parse(&items[i + 1], &location.child(i + 1), output.as_ref());
            output.get_or_insert_with(|| out.ty.clone());
            args.push(out);
        }

        let ty = output.unwrap_or(Type::Value);
        call(name, CallOp::Step { stops }, args, ty, location)
    }

    fn parse_interpolate(
        &mut self,
        name: &'static str,
        items: &Items,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        let curve = match self.parse_curve(items.get(1), &location.child(1)) {
            Ok(curve) => curve,
            Err(poison) => return poison,
        };
        let argc = items.len() - 1;
        if argc < 4 {
            return self.fail(
                location,
                format!("Expected at least 4 arguments, but found only {argc}."),
            );
        }
        if argc % 2 != 0 {
            return self.fail(location, "Expected an even number of arguments.");
        }

        let input = self.parse(&items[2], &location.child(2), Some(&Type::Number));
        let mut output = output_type(expected);
        let mut stops = Vec::with_capacity(argc / 2 - 1);
        let mut args = vec![input];

        for i in (3..items.len()).step_by(2) {
            let label = match self.stop_label(name, &stops, &items[i], &location.child(i)) {
                Ok(label) => label,
                Err(poison) => return poison,
            };
            stops.push(label);
            let out = self.parse(&items[i + 1], &location.child(i + 1), output.as_ref());
            output.get_or_insert_with(|| out.ty.clone());
            args.push(out);
        }

        let ty = output.unwrap_or(Type::Value);
        let interpolatable = match &ty {
            Type::Number | Type::Color | Type::Error => true,
            Type::Array { item, len } => **item == Type::Number && len.is_some(),
            _ => false,
        };
        if !interpolatable {
            return self.fail(location, format!("Type {ty} is not interpolatable."));
        }
        call(name, CallOp::Interpolate { curve, stops }, args, ty, location)
    }

    fn parse_curve(
        &mut self,
        spec: Option<&serde_json::Value>,
        location: &Location,
    ) -> Result<Curve, Expression> {
        let spec = match spec {
            Some(serde_json::Value::Array(spec)) if !spec.is_empty() => spec,
            _ => return Err(self.fail(location, "Expected an interpolation type expression.")),
        };
        match spec[0].as_str() {
            Some("linear") => Ok(Curve::Linear),
            Some("exponential") => match spec.get(1).and_then(serde_json::Value::as_f64) {
                Some(base) => Ok(Curve::Exponential { base }),
                None => Err(self.fail(
                    &location.child(1),
                    "Exponential interpolation requires a numeric base.",
                )),
            },
            Some("cubic-bezier") => {
                let points: Option<Vec<f64>> = spec[1..]
                    .iter()
                    .map(|p| p.as_f64().filter(|t| (0.0..=1.0).contains(t)))
                    .collect();
                match points.as_deref() {
                    Some(&[x1, y1, x2, y2]) => Ok(Curve::CubicBezier { x1, y1, x2, y2 }),
                    _ => Err(self.fail(
                        location,
                        "Cubic bezier interpolation requires four numeric arguments with values between 0 and 1.",
                    )),
                }
            }
            _ => {
                let shown = match &spec[0] {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                Err(self.fail(
                    &location.child(0),
                    format!("Unknown interpolation type {shown}"),
                ))
            }
        }
    }

    /// A literal stop input, strictly above the previous one.
    fn stop_label(
        &mut self,
        name: &str,
        stops: &[f64],
        raw: &serde_json::Value,
        location: &Location,
    ) -> Result<f64, Expression> {
        let Some(label) = raw.as_f64() else {
            return Err(self.fail(
                location,
                format!(
                    "Input/output pairs for \"{name}\" expressions must be defined using literal numeric values (not computed expressions) for the input values."
                ),
            ));
        };
        if stops.last().is_some_and(|prev| *prev >= label) {
            return Err(self.fail(
                location,
                format!(
                    "Input/output pairs for \"{name}\" expressions must be arranged with input values in strictly ascending order."
                ),
            ));
        }
        Ok(label)
    }

    fn parse_compare(&mut self, op: CompareOp, items: &Items, location: &Location) -> Expression {
        if items.len() != 3 {
            return self.fail(location, "Expected two arguments.");
        }
        let lhs = self.parse(&items[1], &location.child(1), Some(&Type::Value));
        let rhs = self.parse(&items[2], &location.child(2), Some(&Type::Value));
        for (i, side) in [(1, &lhs), (2, &rhs)] {
            if !comparable(op, &side.ty) {
                self.error(
                    location.child(i),
                    format!(
                        "\"{}\" comparisons are not supported for type '{}'.",
                        op.name(),
                        side.ty
                    ),
                );
            }
        }
        let loose = |t: &Type| matches!(t, Type::Value | Type::Error);
        if !loose(&lhs.ty) && !loose(&rhs.ty) && lhs.ty.kind_name() != rhs.ty.kind_name() {
            self.error(
                location.clone(),
                format!("Cannot compare types '{}' and '{}'.", lhs.ty, rhs.ty),
            );
        }
        call(
            op.name(),
            CallOp::Compare(op),
            vec![lhs, rhs],
            Type::Boolean,
            location,
        )
    }

    fn parse_assert(
        &mut self,
        name: &'static str,
        ty: Type,
        items: &Items,
        location: &Location,
    ) -> Expression {
        if items.len() < 2 {
            return self.fail(location, "Expected at least one argument.");
        }
        let args = self.parse_values(items, 1, location);
        call(name, CallOp::Assert, args, ty, location)
    }

    /// `["array", v]`, `["array", item, v]`, `["array", item, len, v]`.
    fn parse_array_assert(&mut self, name: &'static str, items: &Items, location: &Location) -> Expression {
        if items.len() < 2 {
            return self.fail(location, "Expected at least one argument.");
        }
        let mut first = 1;
        let mut item = Type::Value;
        let mut len = None;
        if items.len() > 2 {
            item = match items[1].as_str() {
                Some("string") => Type::String,
                Some("number") => Type::Number,
                Some("boolean") => Type::Boolean,
                Some("value") => Type::Value,
                _ => {
                    return self.fail(
                        &location.child(1),
                        "The item type argument of \"array\" must be one of string, number, boolean, value",
                    );
                }
            };
            first = 2;
        }
        if items.len() > 3 {
            len = match &items[2] {
                serde_json::Value::Null => None,
                raw => match raw.as_f64() {
                    Some(n) if n >= 0.0 && n.fract() == 0.0 => Some(n as usize),
                    _ => {
                        return self.fail(
                            &location.child(2),
                            "The length argument to \"array\" must be a positive integer literal",
                        );
                    }
                },
            };
            first = 3;
        }
        let ty = Type::Array {
            item: Box::new(item),
            len,
        };
        let args = self.parse_values(items, first, location);
        call(name, CallOp::Assert, args, ty, location)
    }

    fn parse_coerce(
        &mut self,
        name: &'static str,
        target: CoerceTarget,
        items: &Items,
        location: &Location,
    ) -> Expression {
        if items.len() < 2 {
            return self.fail(location, "Expected at least one argument.");
        }
        let args = self.parse_values(items, 1, location);
        let ty = match target {
            CoerceTarget::Number => Type::Number,
            CoerceTarget::Color => Type::Color,
        };
        call(name, CallOp::Coerce(target), args, ty, location)
    }

    fn parse_at(
        &mut self,
        name: &'static str,
        items: &Items,
        location: &Location,
        expected: Option<&Type>,
    ) -> Expression {
        if items.len() != 3 {
            return self.fail(
                location,
                format!("Expected 2 arguments, but found {} instead.", items.len() - 1),
            );
        }
        let index = self.parse(&items[1], &location.child(1), Some(&Type::Number));
        // Only item types an `array` assertion can name; the rest is checked
        // on the result by the caller's annotation.
        let item = match expected {
            Some(t @ (Type::String | Type::Number | Type::Boolean)) => t.clone(),
            _ => Type::Value,
        };
        let array_type = Type::array(item);
        let input = self.parse(&items[2], &location.child(2), Some(&array_type));
        let ty = match &input.ty {
            Type::Array { item, .. } => (**item).clone(),
            Type::Error => Type::Error,
            _ => Type::Value,
        };
        call(name, CallOp::Builtin(Builtin::At), vec![index, input], ty, location)
    }

    /// Parse `items[first..]` as unconstrained values.
    fn parse_values(&mut self, items: &Items, first: usize, location: &Location) -> Vec<Expression> {
        items
            .iter()
            .enumerate()
            .skip(first)
            .map(|(i, item)| self.parse(item, &location.child(i), Some(&Type::Value)))
            .collect()
    }
}

/// The expected type a branch output must meet, if any.
fn output_type(expected: Option<&Type>) -> Option<Type> {
    expected.filter(|t| **t != Type::Value).cloned()
}

fn comparable(op: CompareOp, ty: &Type) -> bool {
    match ty {
        Type::String | Type::Number | Type::Value | Type::Error => true,
        Type::Boolean | Type::Null => op.is_equality(),
        _ => false,
    }
}

fn call(
    name: &'static str,
    op: CallOp,
    args: Vec<Expression>,
    ty: Type,
    location: &Location,
) -> Expression {
    Expression::new(ExprKind::Call { name, op, args }, ty, location.clone())
}
