//! Runtime implementations of the compound operators and of the value checks
//! used by comparison, assertion and coercion nodes.
//!
//! Every function reports failure as a plain message; the VM attaches the
//! location of the node that raised it.

use crate::definitions::builtin::{Builtin, CoerceTarget, CompareOp};
use crate::runtime::context::RuntimeContext;
use crate::types::color::Color;
use crate::types::ty::Type;
use crate::types::value::{Value, format_number};
use std::cmp::Ordering;
use std::collections::BTreeMap;

pub(crate) fn call(
    builtin: Builtin,
    args: &[Value],
    ctx: &dyn RuntimeContext,
) -> Result<Value, String> {
    use std::f64::consts;

    let v = match builtin {
        Builtin::Not => Value::Boolean(!boolean(args, 0)?),
        Builtin::All => {
            let mut acc = true;
            for i in 0..args.len() {
                acc &= boolean(args, i)?;
            }
            Value::Boolean(acc)
        }
        Builtin::Any => {
            let mut acc = false;
            for i in 0..args.len() {
                acc |= boolean(args, i)?;
            }
            Value::Boolean(acc)
        }

        Builtin::Add => Value::Number(fold_numbers(args, 0.0, |a, b| a + b)?),
        Builtin::Mul => Value::Number(fold_numbers(args, 1.0, |a, b| a * b)?),
        Builtin::Sub => Value::Number(number(args, 0)? - number(args, 1)?),
        Builtin::Neg => Value::Number(-number(args, 0)?),
        Builtin::Div => {
            let (a, b) = (number(args, 0)?, number(args, 1)?);
            if b == 0.0 {
                return Err(format!("Division by zero: {} / 0.", format_number(a)));
            }
            Value::Number(a / b)
        }
        Builtin::Rem => {
            let (a, b) = (number(args, 0)?, number(args, 1)?);
            if b == 0.0 {
                return Err(format!("Remainder by zero: {} % 0.", format_number(a)));
            }
            Value::Number(a % b)
        }
        Builtin::Pow => Value::Number(number(args, 0)?.powf(number(args, 1)?)),
        Builtin::Abs => unary(args, f64::abs)?,
        Builtin::Ceil => unary(args, f64::ceil)?,
        Builtin::Floor => unary(args, f64::floor)?,
        Builtin::Round => unary(args, f64::round)?,
        Builtin::Sqrt => unary(args, f64::sqrt)?,
        Builtin::Ln => unary(args, f64::ln)?,
        Builtin::Log10 => unary(args, f64::log10)?,
        Builtin::Log2 => unary(args, f64::log2)?,
        Builtin::Sin => unary(args, f64::sin)?,
        Builtin::Cos => unary(args, f64::cos)?,
        Builtin::Tan => unary(args, f64::tan)?,
        Builtin::Asin => unary(args, f64::asin)?,
        Builtin::Acos => unary(args, f64::acos)?,
        Builtin::Atan => unary(args, f64::atan)?,
        Builtin::Min => Value::Number(fold_numbers(args, f64::INFINITY, f64::min)?),
        Builtin::Max => Value::Number(fold_numbers(args, f64::NEG_INFINITY, f64::max)?),
        Builtin::E => Value::Number(consts::E),
        Builtin::Pi => Value::Number(consts::PI),
        Builtin::Ln2 => Value::Number(consts::LN_2),

        Builtin::Zoom => Value::Number(ctx.zoom()),
        Builtin::Get => {
            let key = string(args, 0)?;
            ctx.properties()
                .and_then(|p| p.get(key))
                .cloned()
                .ok_or_else(|| format!("Property \"{key}\" is not defined on this feature."))?
        }
        Builtin::GetFrom => {
            let key = string(args, 0)?;
            object(args, 1)?
                .get(key)
                .cloned()
                .ok_or_else(|| format!("Key \"{key}\" is not defined on the object."))?
        }
        Builtin::Has => {
            let key = string(args, 0)?;
            Value::Boolean(ctx.properties().is_some_and(|p| p.contains_key(key)))
        }
        Builtin::HasIn => {
            let key = string(args, 0)?;
            Value::Boolean(object(args, 1)?.contains_key(key))
        }
        Builtin::Properties => Value::Object(ctx.properties().cloned().unwrap_or_default()),
        Builtin::GeometryType => match ctx.geometry_type() {
            Some(g) => Value::String(g.as_str().to_owned()),
            None => return Err("Feature geometry type is not available.".to_owned()),
        },
        Builtin::Id => ctx.id().cloned().unwrap_or(Value::Null),
        Builtin::FeatureState => {
            let key = string(args, 0)?;
            ctx.feature_state()
                .and_then(|s| s.get(key))
                .cloned()
                .unwrap_or(Value::Null)
        }

        Builtin::Length => match arg(args, 0)? {
            Value::String(s) => Value::Number(s.chars().count() as f64),
            Value::Array(items) => Value::Number(items.len() as f64),
            other => {
                return Err(format!(
                    "Expected value to be of type string or array, but found {} instead.",
                    other.type_of()
                ));
            }
        },
        Builtin::In => {
            let (needle, haystack) = (needle(args, 0)?, haystack(args, 1)?);
            Value::Boolean(position(needle, haystack, 0).is_some())
        }
        Builtin::IndexOf | Builtin::IndexOfFrom => {
            let (needle, haystack) = (needle(args, 0)?, haystack(args, 1)?);
            let from = if builtin == Builtin::IndexOfFrom {
                clamp_index(number(args, 2)?, length_of(haystack))
            } else {
                0
            };
            Value::Number(position(needle, haystack, from).map_or(-1.0, |i| i as f64))
        }
        Builtin::Slice | Builtin::SliceRange => {
            let input = arg(args, 0)?;
            let len = length_of(input);
            let begin = clamp_index(number(args, 1)?, len);
            let end = if builtin == Builtin::SliceRange {
                clamp_index(number(args, 2)?, len)
            } else {
                len
            };
            let end = end.max(begin);
            match input {
                Value::String(s) => Value::String(s.chars().skip(begin).take(end - begin).collect()),
                Value::Array(items) => Value::Array(items[begin..end].to_vec()),
                other => {
                    return Err(format!(
                        "Expected first argument to be of type array or string, but found {} instead.",
                        other.type_of()
                    ));
                }
            }
        }
        Builtin::At => {
            let index = number(args, 0)?;
            let items = match arg(args, 1)? {
                Value::Array(items) => items,
                other => {
                    return Err(format!(
                        "Expected value to be of type array, but found {} instead.",
                        other.type_of()
                    ));
                }
            };
            if index < 0.0 {
                return Err(format!(
                    "Array index out of bounds: {} < 0.",
                    format_number(index)
                ));
            }
            if index >= items.len() as f64 {
                return Err(format!(
                    "Array index out of bounds: {} > {}.",
                    format_number(index),
                    items.len() as i64 - 1
                ));
            }
            if index.fract() != 0.0 {
                return Err(format!(
                    "Array index must be an integer, but found {} instead.",
                    format_number(index)
                ));
            }
            items[index as usize].clone()
        }

        Builtin::Concat => Value::String(args.iter().map(Value::to_display_string).collect()),
        Builtin::Upcase => Value::String(string(args, 0)?.to_uppercase()),
        Builtin::Downcase => Value::String(string(args, 0)?.to_lowercase()),

        Builtin::ToBoolean => Value::Boolean(arg(args, 0)?.is_truthy()),
        Builtin::ToString => Value::String(arg(args, 0)?.to_display_string()),
        Builtin::TypeOf => Value::String(arg(args, 0)?.type_of().to_string()),

        Builtin::Rgb => Value::Color(Color::from_rgba8(
            number(args, 0)?,
            number(args, 1)?,
            number(args, 2)?,
            1.0,
        )?),
        Builtin::Rgba => Value::Color(Color::from_rgba8(
            number(args, 0)?,
            number(args, 1)?,
            number(args, 2)?,
            number(args, 3)?,
        )?),
        Builtin::ToRgba => match arg(args, 0)? {
            Value::Color(c) => Value::Array(c.to_rgba_array().into_iter().map(Value::Number).collect()),
            other => {
                return Err(format!(
                    "Expected value to be of type color, but found {} instead.",
                    other.type_of()
                ));
            }
        },
    };
    Ok(v)
}

/// `==`/`!=` never fail; orderings need two numbers or two strings.
pub(crate) fn compare(op: CompareOp, a: &Value, b: &Value) -> Result<bool, String> {
    match op {
        CompareOp::Eq => return Ok(a == b),
        CompareOp::Ne => return Ok(a != b),
        _ => {}
    }
    let ord = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        _ => {
            return Err(format!(
                "Expected arguments for \"{}\" to be (string, string) or (number, number), but found ({}, {}) instead.",
                op.name(),
                a.type_of(),
                b.type_of()
            ));
        }
    };
    // NaN compares false under every ordering.
    let Some(ord) = ord else {
        return Ok(false);
    };
    Ok(match op {
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Ne => ord != Ordering::Equal,
    })
}

/// Return `true` when `v` satisfies a runtime type assertion for `ty`.
pub(crate) fn has_type(v: &Value, ty: &Type) -> bool {
    v.type_of().is_compatible_with(ty)
}

pub(crate) fn assertion_error(ty: &Type, v: &Value) -> String {
    format!(
        "Expected value to be of type {ty}, but found {} instead.",
        v.type_of()
    )
}

/// Convert `v` for a `to-number`/`to-color` node.
pub(crate) fn coerce(target: CoerceTarget, v: &Value) -> Result<Value, String> {
    match target {
        CoerceTarget::Number => to_number(v).map(Value::Number).ok_or_else(|| {
            format!("Could not convert {} to number.", v.to_json())
        }),
        CoerceTarget::Color => to_color(v).map(Value::Color),
    }
}

fn to_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Null => 0.0,
        Value::Number(n) => *n,
        Value::Boolean(b) => f64::from(u8::from(*b)),
        Value::String(s) => parse_number(s)?,
        Value::Color(_) | Value::Array(_) | Value::Object(_) => return None,
    };
    (!n.is_nan()).then_some(n)
}

/// Style-sheet string to number: blank is 0, then decimal/exponent notation,
/// signed `Infinity`, or an unsigned `0x`/`0o`/`0b` integer.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            if digits.is_empty() {
                return None;
            }
            return digits.chars().try_fold(0.0, |acc: f64, c| {
                c.to_digit(radix)
                    .map(|d| acc * f64::from(radix) + f64::from(d))
            });
        }
    }
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned == "Infinity" {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    // `str::parse` also takes `inf` and `NaN`, which are not numbers here.
    let decimal = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !decimal {
        return None;
    }
    s.parse().ok()
}

fn to_color(v: &Value) -> Result<Color, String> {
    match v {
        Value::Color(c) => Ok(*c),
        Value::String(s) => {
            Color::parse(s).ok_or_else(|| format!("Could not parse color from value '{s}'"))
        }
        Value::Array(items) => {
            let channels: Option<Vec<f64>> = items.iter().map(Value::as_number).collect();
            match channels.as_deref() {
                Some([r, g, b]) => Color::from_rgba8(*r, *g, *b, 1.0),
                Some([r, g, b, a]) => Color::from_rgba8(*r, *g, *b, *a),
                _ => Err(format!(
                    "Invalid rgba value {}: expected an array containing either three or four numeric values.",
                    v.to_json()
                )),
            }
        }
        other => Err(format!(
            "Could not parse color from value '{}'",
            other.to_json()
        )),
    }
}

fn arg(args: &[Value], i: usize) -> Result<&Value, String> {
    args.get(i)
        .ok_or_else(|| format!("Missing argument {}.", i + 1))
}

fn number(args: &[Value], i: usize) -> Result<f64, String> {
    let v = arg(args, i)?;
    v.as_number().ok_or_else(|| mismatch("number", v))
}

fn boolean(args: &[Value], i: usize) -> Result<bool, String> {
    let v = arg(args, i)?;
    v.as_bool().ok_or_else(|| mismatch("boolean", v))
}

fn string(args: &[Value], i: usize) -> Result<&str, String> {
    let v = arg(args, i)?;
    v.as_str().ok_or_else(|| mismatch("string", v))
}

fn object(args: &[Value], i: usize) -> Result<&BTreeMap<String, Value>, String> {
    let v = arg(args, i)?;
    v.as_object().ok_or_else(|| mismatch("object", v))
}

fn mismatch(expected: &str, v: &Value) -> String {
    format!(
        "Expected value to be of type {expected}, but found {} instead.",
        v.type_of()
    )
}

fn unary(args: &[Value], f: impl FnOnce(f64) -> f64) -> Result<Value, String> {
    Ok(Value::Number(f(number(args, 0)?)))
}

fn fold_numbers(args: &[Value], init: f64, f: impl Fn(f64, f64) -> f64) -> Result<f64, String> {
    let mut acc = init;
    for i in 0..args.len() {
        acc = f(acc, number(args, i)?);
    }
    Ok(acc)
}

fn needle(args: &[Value], i: usize) -> Result<&Value, String> {
    let v = arg(args, i)?;
    match v {
        Value::Null | Value::Boolean(_) | Value::Number(_) | Value::String(_) => Ok(v),
        other => Err(format!(
            "Expected first argument to be of type boolean, string, number or null, but found {} instead.",
            other.type_of()
        )),
    }
}

fn haystack(args: &[Value], i: usize) -> Result<&Value, String> {
    let v = arg(args, i)?;
    match v {
        Value::String(_) | Value::Array(_) => Ok(v),
        other => Err(format!(
            "Expected second argument to be of type array or string, but found {} instead.",
            other.type_of()
        )),
    }
}

fn length_of(v: &Value) -> usize {
    match v {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        _ => 0,
    }
}

/// Resolve a possibly negative, possibly fractional index against `len`.
fn clamp_index(raw: f64, len: usize) -> usize {
    if raw.is_nan() {
        return 0;
    }
    let raw = raw.trunc();
    let len_f = len as f64;
    let idx = if raw < 0.0 { (len_f + raw).max(0.0) } else { raw.min(len_f) };
    idx as usize
}

/// Position of `needle` in `haystack` at or after `from`, in items or characters.
fn position(needle: &Value, haystack: &Value, from: usize) -> Option<usize> {
    match haystack {
        Value::Array(items) => items
            .iter()
            .skip(from)
            .position(|item| item == needle)
            .map(|p| p + from),
        Value::String(s) => {
            let needle = match needle {
                Value::Null => "null".to_owned(),
                other => other.to_display_string(),
            };
            let chars: Vec<char> = s.chars().collect();
            let pat: Vec<char> = needle.chars().collect();
            if pat.is_empty() {
                return Some(from.min(chars.len()));
            }
            (from..chars.len())
                .find(|&start| chars[start..].starts_with(&pat))
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/builtins.rs"]
mod tests;
