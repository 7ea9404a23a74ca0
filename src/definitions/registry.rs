//! Process-wide operator catalog.
//!
//! Every operator name maps to one [`Definition`]. Compound operators carry an
//! ordered overload list resolved by [`resolve`]; special forms have an
//! operator-specific argument structure and are parsed by dedicated routines in
//! the parser. The table is built once on first use and never mutated, so it
//! can be read from any number of threads without coordination.

use crate::definitions::builtin::{Builtin, CoerceTarget, CompareOp};
use crate::types::ty::Type;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Parameter list of one overload: fixed leading types plus an optional
/// variadic tail matching zero or more trailing arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    /// Required positional parameter types.
    pub leading: Vec<Type>,
    /// Type of every argument past `leading`, if the overload is variadic.
    pub rest: Option<Type>,
}

impl Params {
    /// Exactly `types`.
    pub fn fixed(types: &[Type]) -> Self {
        Self {
            leading: types.to_vec(),
            rest: None,
        }
    }

    /// `leading` followed by any number of `rest`.
    pub fn variadic(leading: &[Type], rest: Type) -> Self {
        Self {
            leading: leading.to_vec(),
            rest: Some(rest),
        }
    }

    /// Fewest arguments accepted.
    pub fn min_arity(&self) -> usize {
        self.leading.len()
    }

    /// Most arguments accepted; `None` when variadic.
    pub fn max_arity(&self) -> Option<usize> {
        match self.rest {
            Some(_) => None,
            None => Some(self.leading.len()),
        }
    }

    /// Return `true` when `n` arguments fit this parameter list.
    pub fn accepts_arity(&self, n: usize) -> bool {
        n >= self.min_arity() && self.max_arity().is_none_or(|max| n <= max)
    }

    /// Declared type of the `i`-th argument.
    pub fn type_at(&self, i: usize) -> Option<&Type> {
        self.leading.get(i).or(self.rest.as_ref())
    }
}

impl fmt::Display for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, t) in self.leading.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{t}")?;
        }
        if let Some(rest) = &self.rest {
            if !self.leading.is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "...{rest}")?;
        }
        f.write_str(")")
    }
}

/// One overload of a compound operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    /// Parameter types.
    pub params: Params,
    /// Result type.
    pub result: Type,
    /// Runtime implementation.
    pub builtin: Builtin,
}

impl Signature {
    /// Return `true` when the arity fits and every argument type is compatible.
    pub fn accepts(&self, arg_types: &[Type]) -> bool {
        self.params.accepts_arity(arg_types.len())
            && arg_types.iter().enumerate().all(|(i, t)| {
                self.params
                    .type_at(i)
                    .is_some_and(|expected| t.is_compatible_with(expected))
            })
    }
}

/// Operators whose argument structure the parser handles individually.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialForm {
    /// `["literal", v]`.
    Literal,
    /// `["let", name, value, ..., body]`.
    Let,
    /// `["var", name]`.
    Var,
    /// `["case", cond, out, ..., fallback]`.
    Case,
    /// `["match", input, labels, out, ..., fallback]`.
    Match,
    /// `["coalesce", a, ...]`.
    Coalesce,
    /// `["step", input, out0, stop, out, ...]`.
    Step,
    /// `["interpolate", curve, input, stop, out, ...]`.
    Interpolate,
    /// Polymorphic comparison.
    Compare(CompareOp),
    /// `boolean`, `number`, `string`, `object` runtime assertions.
    Assert(Type),
    /// `["array", [itemType, [len,]] v]`.
    ArrayAssert,
    /// `to-number`, `to-color`.
    Coerce(CoerceTarget),
    /// `["at", index, array]`; the result type follows the array's items.
    At,
}

/// How an operator is typed.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    /// Ordered overload list; first compatible signature wins.
    Compound(Vec<Signature>),
    /// Dedicated parse routine.
    Special(SpecialForm),
}

/// A named operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// Operator name as written in expressions.
    pub name: &'static str,
    /// Typing rule.
    pub form: Form,
}

/// Immutable name → definition table.
#[derive(Debug)]
pub struct Registry {
    defs: HashMap<&'static str, Definition>,
}

impl Registry {
    /// Look up an operator by name.
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.defs.get(name)
    }

    /// All operator names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.defs.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered operators.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Return `true` if no operator is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

/// The process-wide registry, built on first access.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(build_registry)
}

/// Look up an operator in the process-wide registry.
pub fn lookup(name: &str) -> Option<&'static Definition> {
    registry().get(name)
}

/// Outcome of overload resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<'a> {
    /// First signature (in declaration order) accepting the arguments.
    Matched(&'a Signature),
    /// No signature takes this many arguments.
    ArityMismatch,
    /// Some signatures take this many arguments but none accepts their types.
    TypeMismatch(Vec<&'a Signature>),
}

/// Overloads whose parameter list accepts `n` arguments, in declaration order.
pub fn candidates_for_arity(overloads: &[Signature], n: usize) -> Vec<&Signature> {
    overloads
        .iter()
        .filter(|s| s.params.accepts_arity(n))
        .collect()
}

/// Select the first overload compatible with `arg_types`.
pub fn resolve<'a>(overloads: &'a [Signature], arg_types: &[Type]) -> Resolution<'a> {
    resolve_with(overloads, arg_types, Type::is_compatible_with)
}

/// [`resolve`] with a caller-chosen `(actual, param)` acceptance test, for
/// callers that can bridge some mismatches (e.g. with runtime assertions).
pub fn resolve_with<'a>(
    overloads: &'a [Signature],
    arg_types: &[Type],
    accepts: impl Fn(&Type, &Type) -> bool,
) -> Resolution<'a> {
    let candidates = candidates_for_arity(overloads, arg_types.len());
    if candidates.is_empty() {
        return Resolution::ArityMismatch;
    }
    let fits = |s: &Signature| {
        arg_types
            .iter()
            .enumerate()
            .all(|(i, t)| s.params.type_at(i).is_some_and(|p| accepts(t, p)))
    };
    match candidates.iter().find(|s| fits(s)) {
        Some(sig) => Resolution::Matched(sig),
        None => Resolution::TypeMismatch(candidates),
    }
}

/// Smallest and largest (`None` = unbounded) argument count over all overloads.
pub fn arity_range(overloads: &[Signature]) -> (usize, Option<usize>) {
    let min = overloads
        .iter()
        .map(|s| s.params.min_arity())
        .min()
        .unwrap_or(0);
    let max = overloads
        .iter()
        .map(|s| s.params.max_arity())
        .try_fold(0usize, |acc, m| m.map(|m| acc.max(m)));
    (min, max)
}

/// `"-" expects 1 to 2 arguments, but found 3 instead.`
pub fn arity_message(name: &str, overloads: &[Signature], found: usize) -> String {
    let (min, max) = arity_range(overloads);
    let plural = |n: usize| if n == 1 { "argument" } else { "arguments" };
    let expected = match max {
        None => format!("at least {min} {}", plural(min)),
        Some(max) if max == min => format!("{min} {}", plural(min)),
        Some(max) => format!("{min} to {max} {}", plural(max)),
    };
    format!("\"{name}\" expects {expected}, but found {found} instead.")
}

fn sig(params: &[Type], result: Type, builtin: Builtin) -> Signature {
    Signature {
        params: Params::fixed(params),
        result,
        builtin,
    }
}

fn var_sig(leading: &[Type], rest: Type, result: Type, builtin: Builtin) -> Signature {
    Signature {
        params: Params::variadic(leading, rest),
        result,
        builtin,
    }
}

fn build_registry() -> Registry {
    use Type::{Boolean, Color, Number, Object, Value};
    let str_t = Type::String;
    let any_array = Type::any_array();

    let mut defs: HashMap<&'static str, Definition> = HashMap::new();
    let mut add = |name: &'static str, form: Form| {
        defs.insert(name, Definition { name, form });
    };

    // Special forms.
    add("literal", Form::Special(SpecialForm::Literal));
    add("let", Form::Special(SpecialForm::Let));
    add("var", Form::Special(SpecialForm::Var));
    add("case", Form::Special(SpecialForm::Case));
    add("match", Form::Special(SpecialForm::Match));
    add("coalesce", Form::Special(SpecialForm::Coalesce));
    add("step", Form::Special(SpecialForm::Step));
    add("interpolate", Form::Special(SpecialForm::Interpolate));
    add("at", Form::Special(SpecialForm::At));
    add("array", Form::Special(SpecialForm::ArrayAssert));
    for (name, t) in [
        ("boolean", Boolean),
        ("number", Number),
        ("string", str_t.clone()),
        ("object", Object),
    ] {
        add(name, Form::Special(SpecialForm::Assert(t)));
    }
    add("to-number", Form::Special(SpecialForm::Coerce(CoerceTarget::Number)));
    add("to-color", Form::Special(SpecialForm::Coerce(CoerceTarget::Color)));
    for op in [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Lt,
        CompareOp::Le,
        CompareOp::Gt,
        CompareOp::Ge,
    ] {
        add(op.name(), Form::Special(SpecialForm::Compare(op)));
    }

    // Logic.
    add("!", Form::Compound(vec![sig(&[Boolean], Boolean, Builtin::Not)]));
    add(
        "all",
        Form::Compound(vec![var_sig(&[], Boolean, Boolean, Builtin::All)]),
    );
    add(
        "any",
        Form::Compound(vec![var_sig(&[], Boolean, Boolean, Builtin::Any)]),
    );

    // Math.
    add(
        "+",
        Form::Compound(vec![var_sig(&[Number, Number], Number, Number, Builtin::Add)]),
    );
    add(
        "*",
        Form::Compound(vec![var_sig(&[Number, Number], Number, Number, Builtin::Mul)]),
    );
    add(
        "-",
        Form::Compound(vec![
            sig(&[Number, Number], Number, Builtin::Sub),
            sig(&[Number], Number, Builtin::Neg),
        ]),
    );
    add("/", Form::Compound(vec![sig(&[Number, Number], Number, Builtin::Div)]));
    add("%", Form::Compound(vec![sig(&[Number, Number], Number, Builtin::Rem)]));
    add("^", Form::Compound(vec![sig(&[Number, Number], Number, Builtin::Pow)]));
    for (name, b) in [
        ("abs", Builtin::Abs),
        ("ceil", Builtin::Ceil),
        ("floor", Builtin::Floor),
        ("round", Builtin::Round),
        ("sqrt", Builtin::Sqrt),
        ("ln", Builtin::Ln),
        ("log10", Builtin::Log10),
        ("log2", Builtin::Log2),
        ("sin", Builtin::Sin),
        ("cos", Builtin::Cos),
        ("tan", Builtin::Tan),
        ("asin", Builtin::Asin),
        ("acos", Builtin::Acos),
        ("atan", Builtin::Atan),
    ] {
        add(name, Form::Compound(vec![sig(&[Number], Number, b)]));
    }
    add(
        "min",
        Form::Compound(vec![var_sig(&[Number], Number, Number, Builtin::Min)]),
    );
    add(
        "max",
        Form::Compound(vec![var_sig(&[Number], Number, Number, Builtin::Max)]),
    );
    add("e", Form::Compound(vec![sig(&[], Number, Builtin::E)]));
    add("pi", Form::Compound(vec![sig(&[], Number, Builtin::Pi)]));
    add("ln2", Form::Compound(vec![sig(&[], Number, Builtin::Ln2)]));

    // Context accessors.
    add("zoom", Form::Compound(vec![sig(&[], Number, Builtin::Zoom)]));
    add(
        "get",
        Form::Compound(vec![
            sig(&[str_t.clone()], Value, Builtin::Get),
            sig(&[str_t.clone(), Object], Value, Builtin::GetFrom),
        ]),
    );
    add(
        "has",
        Form::Compound(vec![
            sig(&[str_t.clone()], Boolean, Builtin::Has),
            sig(&[str_t.clone(), Object], Boolean, Builtin::HasIn),
        ]),
    );
    add(
        "properties",
        Form::Compound(vec![sig(&[], Object, Builtin::Properties)]),
    );
    add(
        "geometry-type",
        Form::Compound(vec![sig(&[], str_t.clone(), Builtin::GeometryType)]),
    );
    add("id", Form::Compound(vec![sig(&[], Value, Builtin::Id)]));
    add(
        "feature-state",
        Form::Compound(vec![sig(&[str_t.clone()], Value, Builtin::FeatureState)]),
    );

    // Lookup.
    add(
        "length",
        Form::Compound(vec![
            sig(&[str_t.clone()], Number, Builtin::Length),
            sig(&[any_array.clone()], Number, Builtin::Length),
        ]),
    );
    add("in", Form::Compound(vec![sig(&[Value, Value], Boolean, Builtin::In)]));
    add(
        "index-of",
        Form::Compound(vec![
            sig(&[Value, Value], Number, Builtin::IndexOf),
            sig(&[Value, Value, Number], Number, Builtin::IndexOfFrom),
        ]),
    );
    add(
        "slice",
        Form::Compound(vec![
            sig(&[str_t.clone(), Number], str_t.clone(), Builtin::Slice),
            sig(
                &[str_t.clone(), Number, Number],
                str_t.clone(),
                Builtin::SliceRange,
            ),
            sig(&[any_array.clone(), Number], any_array.clone(), Builtin::Slice),
            sig(
                &[any_array.clone(), Number, Number],
                any_array.clone(),
                Builtin::SliceRange,
            ),
        ]),
    );

    // Strings.
    add(
        "concat",
        Form::Compound(vec![var_sig(&[Value], Value, str_t.clone(), Builtin::Concat)]),
    );
    add(
        "upcase",
        Form::Compound(vec![sig(&[str_t.clone()], str_t.clone(), Builtin::Upcase)]),
    );
    add(
        "downcase",
        Form::Compound(vec![sig(&[str_t.clone()], str_t.clone(), Builtin::Downcase)]),
    );

    // Type conversion.
    add(
        "to-boolean",
        Form::Compound(vec![sig(&[Value], Boolean, Builtin::ToBoolean)]),
    );
    add(
        "to-string",
        Form::Compound(vec![sig(&[Value], str_t.clone(), Builtin::ToString)]),
    );
    add(
        "typeof",
        Form::Compound(vec![sig(&[Value], str_t.clone(), Builtin::TypeOf)]),
    );

    // Color.
    add(
        "rgb",
        Form::Compound(vec![sig(&[Number, Number, Number], Color, Builtin::Rgb)]),
    );
    add(
        "rgba",
        Form::Compound(vec![sig(
            &[Number, Number, Number, Number],
            Color,
            Builtin::Rgba,
        )]),
    );
    add(
        "to-rgba",
        Form::Compound(vec![sig(
            &[Color],
            Type::array_of_len(Number, 4),
            Builtin::ToRgba,
        )]),
    );

    Registry { defs }
}

#[cfg(test)]
#[path = "../../tests/unit/definitions/registry.rs"]
mod tests;
