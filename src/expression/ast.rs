use crate::definitions::builtin::{Builtin, CoerceTarget, CompareOp};
use crate::foundation::location::Location;
use crate::runtime::interpolate::Curve;
use crate::types::ty::Type;
use crate::types::value::Value;
use std::collections::HashMap;

/// Parser-assigned identity of one `let` binding; unique within a compile.
pub(crate) type BindingId = u32;

/// A typed expression node produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub(crate) kind: ExprKind,
    pub(crate) ty: Type,
    pub(crate) location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ExprKind {
    Literal(Value),
    Var {
        name: String,
        binding: BindingId,
    },
    /// Every value sees only the enclosing scope; the body sees all of them.
    Let {
        bindings: Vec<LetBinding>,
        body: Box<Expression>,
    },
    Call {
        name: &'static str,
        op: CallOp,
        args: Vec<Expression>,
    },
    /// Placeholder left where parsing failed.
    Poison,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LetBinding {
    pub(crate) name: String,
    pub(crate) binding: BindingId,
    pub(crate) value: Expression,
}

/// Operator-specific argument structure of a [`ExprKind::Call`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CallOp {
    /// `args` are the resolved overload's arguments.
    Builtin(Builtin),
    /// Runtime type check against the node type; `args` tried in order.
    Assert,
    /// `args` tried in order until one converts.
    Coerce(CoerceTarget),
    /// `args`: `cond, out, ..., fallback`.
    Case,
    /// `args`: `input, out_0, ..., out_n, fallback`.
    Match(MatchSpec),
    /// `args`: first non-null wins.
    Coalesce,
    /// `args`: `input, out_0, ..., out_n`; `stops[0]` is `-inf`.
    Step { stops: Vec<f64> },
    /// `args`: `input, out_0, ..., out_n`, one output per stop.
    Interpolate { curve: Curve, stops: Vec<f64> },
    /// `args`: `lhs, rhs`.
    Compare(CompareOp),
}

/// Integer or string label of a `match` branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum MatchKey {
    Int(i64),
    Str(String),
}

impl MatchKey {
    pub(crate) fn of(v: &Value) -> Option<Self> {
        match v {
            Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
                Some(Self::Int(*n as i64))
            }
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }

    pub(crate) fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Str(s) => serde_json::Value::String(s.clone()),
        }
    }
}

pub(crate) const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MatchSpec {
    /// Labels of each branch, in source order.
    pub(crate) labels: Vec<Vec<MatchKey>>,
    /// Label → branch index.
    pub(crate) index: HashMap<MatchKey, usize>,
}

impl Expression {
    pub(crate) fn new(kind: ExprKind, ty: Type, location: Location) -> Self {
        Self { kind, ty, location }
    }

    pub(crate) fn poison(location: Location) -> Self {
        Self::new(ExprKind::Poison, Type::Error, location)
    }

    /// Static result type.
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Position of this node in the original input.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The literal value, if this node is a constant.
    pub fn as_literal(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Literal(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn is_poison(&self) -> bool {
        matches!(self.kind, ExprKind::Poison)
    }

    /// Direct children in evaluation order.
    pub(crate) fn children(&self) -> Vec<&Expression> {
        match &self.kind {
            ExprKind::Literal(_) | ExprKind::Var { .. } | ExprKind::Poison => Vec::new(),
            ExprKind::Let { bindings, body } => bindings
                .iter()
                .map(|b| &b.value)
                .chain(std::iter::once(body.as_ref()))
                .collect(),
            ExprKind::Call { args, .. } => args.iter().collect(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/ast.rs"]
mod tests;
