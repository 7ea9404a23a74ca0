use crate::foundation::error::StyleExprError;
use std::fmt;
use std::str::FromStr;

/// Static type of an expression node.
///
/// `Value` accepts every other type, `Error` is the poison type produced where
/// parsing failed and is compatible with everything in both directions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The JSON `null` value.
    Null,
    /// `true` / `false`.
    Boolean,
    /// 64-bit float.
    Number,
    /// UTF-8 string.
    String,
    /// RGBA color.
    Color,
    /// String-keyed map of values.
    Object,
    /// Array of `item`, optionally with a fixed length.
    Array {
        /// Element type.
        item: Box<Type>,
        /// Exact element count, when known statically.
        len: Option<usize>,
    },
    /// Unconstrained; checked at runtime where a concrete type is needed.
    Value,
    /// Poison type of a node that failed to parse.
    Error,
}

impl Type {
    /// `array<item>` without a fixed length.
    pub fn array(item: Type) -> Self {
        Self::Array {
            item: Box::new(item),
            len: None,
        }
    }

    /// `array<item, len>`.
    pub fn array_of_len(item: Type, len: usize) -> Self {
        Self::Array {
            item: Box::new(item),
            len: Some(len),
        }
    }

    /// `array` with `value` items and no fixed length.
    pub fn any_array() -> Self {
        Self::array(Type::Value)
    }

    /// Return `false` for `value` and `error`.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::Value | Self::Error)
    }

    /// Return `true` when a node of type `self` can be used where `expected` is required.
    pub fn is_compatible_with(&self, expected: &Type) -> bool {
        is_compatible(self, expected)
    }

    /// The bare kind name, ignoring array parameters.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::Color => "color",
            Self::Object => "object",
            Self::Array { .. } => "array",
            Self::Value => "value",
            Self::Error => "error",
        }
    }
}

/// Compatibility of an `actual` node type with an `expected` slot.
///
/// Reflexive; `Error` is absorbing on either side and `Value` accepts everything.
/// There is no implicit conversion between scalar kinds.
pub fn is_compatible(actual: &Type, expected: &Type) -> bool {
    match (actual, expected) {
        (Type::Error, _) | (_, Type::Error) => true,
        (_, Type::Value) => true,
        (
            Type::Array {
                item: actual_item,
                len: actual_len,
            },
            Type::Array {
                item: expected_item,
                len: expected_len,
            },
        ) => array_compatible(actual_item, *actual_len, expected_item, *expected_len),
        (a, e) => a == e,
    }
}

/// Item types must be compatible; lengths only matter when `expected` fixes one.
///
/// An empty array of unknown items (`array<value, 0>`) fits any item type.
pub fn array_compatible(
    actual_item: &Type,
    actual_len: Option<usize>,
    expected_item: &Type,
    expected_len: Option<usize>,
) -> bool {
    let empty_untyped = actual_len == Some(0) && *actual_item == Type::Value;
    if !empty_untyped && !is_compatible(actual_item, expected_item) {
        return false;
    }
    match expected_len {
        None => true,
        Some(n) => actual_len == Some(n),
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array { item, len } => match (item.as_ref(), len) {
                (Type::Value, None) => f.write_str("array"),
                (item, None) => write!(f, "array<{item}>"),
                (item, Some(n)) => write!(f, "array<{item}, {n}>"),
            },
            other => f.write_str(other.kind_name()),
        }
    }
}

impl FromStr for Type {
    type Err = StyleExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let simple = match s {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "color" => Some(Self::Color),
            "object" => Some(Self::Object),
            "value" => Some(Self::Value),
            "array" => Some(Self::any_array()),
            _ => None,
        };
        if let Some(t) = simple {
            return Ok(t);
        }

        let inner = s
            .strip_prefix("array<")
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(|| StyleExprError::validation(format!("unknown type \"{s}\"")))?;

        match split_top_level_comma(inner) {
            Some((item, len)) => match len.trim().parse::<usize>() {
                Ok(n) => Ok(Self::array_of_len(item.parse()?, n)),
                Err(_) => Err(StyleExprError::validation(format!(
                    "invalid array length \"{}\" in type \"{s}\"",
                    len.trim()
                ))),
            },
            None => Ok(Self::array(inner.parse()?)),
        }
    }
}

// Item types may themselves be parameterized arrays.
fn split_top_level_comma(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return Some((&s[..i], &s[i + 1..])),
            _ => {}
        }
    }
    None
}

impl serde::Serialize for Type {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Type {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/types/ty.rs"]
mod tests;
