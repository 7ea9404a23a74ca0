//! Public entry points: parse, classify and lower one expression.

use crate::expression::ast::Expression;
use crate::expression::bytecode::Program;
use crate::expression::classify::{is_feature_constant, is_zoom_constant};
use crate::expression::error::{EvalError, ParseErrors, ParsingError};
use crate::expression::lower::lower_program;
use crate::expression::parser::ParsingContext;
use crate::expression::vm::{EvalStack, run};
use crate::foundation::error::{StyleExprError, StyleExprResult};
use crate::foundation::location::Location;
use crate::runtime::context::RuntimeContext;
use crate::types::ty::Type;
use crate::types::value::Value;
use serde::{Deserialize, Serialize};

/// Knobs for [`compile_with`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Type the result must satisfy; `None` accepts whatever the input produces.
    pub expected: Option<Type>,
    /// Replace context-independent subtrees by their value at parse time.
    pub fold_constants: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            expected: None,
            fold_constants: true,
        }
    }
}

/// Outcome of one compile: an evaluator, or every diagnostic found.
#[derive(Debug, Clone)]
pub enum CompileResult {
    /// The input parsed and type-checked.
    Success(CompiledExpression),
    /// The input was rejected; never empty.
    Failure(Vec<ParsingError>),
}

impl CompileResult {
    /// Return `true` for [`CompileResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Diagnostics of a failed compile; empty on success.
    pub fn errors(&self) -> &[ParsingError] {
        match self {
            Self::Success(_) => &[],
            Self::Failure(errors) => errors,
        }
    }

    /// Convert into a `Result`, bundling the diagnostics.
    pub fn into_result(self) -> Result<CompiledExpression, ParseErrors> {
        match self {
            Self::Success(compiled) => Ok(compiled),
            Self::Failure(errors) => Err(ParseErrors { errors }),
        }
    }
}

/// A type-checked expression ready for evaluation.
///
/// Immutable and `Send + Sync`: one instance can serve any number of threads,
/// each with its own [`RuntimeContext`].
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    expression: Expression,
    program: Program,
    zoom_constant: bool,
    feature_constant: bool,
}

impl CompiledExpression {
    /// Static result type.
    pub fn ty(&self) -> &Type {
        self.expression.ty()
    }

    /// `true` when the result cannot change with zoom.
    pub fn is_zoom_constant(&self) -> bool {
        self.zoom_constant
    }

    /// `true` when the result cannot change from one feature to the next.
    pub fn is_feature_constant(&self) -> bool {
        self.feature_constant
    }

    /// The parsed (and possibly folded) tree.
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Evaluate against `ctx` with a fresh scratch stack.
    pub fn evaluate(&self, ctx: &dyn RuntimeContext) -> Result<Value, EvalError> {
        self.evaluate_with_stack(ctx, &mut EvalStack::new())
    }

    /// Evaluate against `ctx`, reusing `stack` across calls.
    pub fn evaluate_with_stack(
        &self,
        ctx: &dyn RuntimeContext,
        stack: &mut EvalStack,
    ) -> Result<Value, EvalError> {
        run(&self.program, stack, ctx)
    }

    /// Evaluate against `ctx`, substituting `fallback` when evaluation fails.
    pub fn evaluate_or(&self, ctx: &dyn RuntimeContext, fallback: Value) -> Value {
        match self.evaluate(ctx) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(location = %e.location, error = %e.message, "evaluation failed, using fallback");
                fallback
            }
        }
    }
}

/// Compile `input`, checking the result against `expected` when given.
pub fn compile(input: &serde_json::Value, expected: Option<&Type>) -> CompileResult {
    compile_with(
        input,
        &CompileOptions {
            expected: expected.cloned(),
            ..CompileOptions::default()
        },
    )
}

/// Compile `input` with explicit options.
#[tracing::instrument(skip_all, fields(expected = ?options.expected))]
pub fn compile_with(input: &serde_json::Value, options: &CompileOptions) -> CompileResult {
    let mut ctx = ParsingContext::new(options.fold_constants);
    let expression = ctx.parse(input, &Location::root(), options.expected.as_ref());
    let errors = ctx.into_errors();
    if !errors.is_empty() {
        tracing::debug!(count = errors.len(), "expression rejected");
        return CompileResult::Failure(errors);
    }

    let program = match lower_program(&expression) {
        Ok(program) => program,
        Err(e) => return CompileResult::Failure(vec![ParsingError::new(e.location, e.message)]),
    };
    let compiled = CompiledExpression {
        zoom_constant: is_zoom_constant(&expression),
        feature_constant: is_feature_constant(&expression),
        expression,
        program,
    };
    tracing::debug!(
        ty = %compiled.ty(),
        zoom_constant = compiled.zoom_constant,
        feature_constant = compiled.feature_constant,
        "expression compiled"
    );
    CompileResult::Success(compiled)
}

/// Parse `text` as JSON and compile it.
#[tracing::instrument(skip_all)]
pub fn compile_str(text: &str, expected: Option<&Type>) -> StyleExprResult<CompiledExpression> {
    let input: serde_json::Value = serde_json::from_str(text)?;
    compile(&input, expected)
        .into_result()
        .map_err(StyleExprError::from)
}

#[cfg(test)]
#[path = "../../tests/unit/expression/compile.rs"]
mod tests;
