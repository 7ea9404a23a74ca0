//! Typed compiler and evaluator for JSON-encoded map style expressions.
//!
//! An expression such as `["interpolate", ["linear"], ["zoom"], 0, 1, 10, ["get", "width"]]`
//! describes how a rendered property depends on zoom and per-feature data. The crate
//! turns it into a reusable evaluator:
//!
//! - [`compile`] parses the input, checks types against the operator catalog and
//!   reports every problem in one pass as [`ParsingError`]s
//! - a [`CompiledExpression`] carries its static [`Type`] and whether it varies with
//!   zoom or feature data
//! - [`CompiledExpression::evaluate`] runs it against any [`RuntimeContext`] and reports
//!   data-dependent failures as [`EvalError`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
// Some index newtypes and accessors are only reached from tests.
#![allow(dead_code)]

mod foundation;

pub(crate) mod definitions;
pub(crate) mod expression;
pub(crate) mod runtime;
pub(crate) mod types;

pub use crate::foundation::error::{StyleExprError, StyleExprResult};
pub use crate::foundation::location::{Location, PathElem};

pub use crate::expression::ast::Expression;
pub use crate::expression::compile::{
    CompileOptions, CompileResult, CompiledExpression, compile, compile_str, compile_with,
};
pub use crate::expression::error::{EvalError, ParseErrors, ParsingError};
pub use crate::expression::vm::EvalStack;
pub use crate::runtime::context::{EvaluationContext, Feature, GeometryType, RuntimeContext};
pub use crate::types::color::Color;
pub use crate::types::ty::Type;
pub use crate::types::value::{Value, format_number};
