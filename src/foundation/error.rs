use crate::expression::error::{EvalError, ParseErrors};

/// Convenience result type used across the crate.
pub type StyleExprResult<T> = Result<T, StyleExprError>;

/// Top-level error taxonomy used by the public entry points.
#[derive(thiserror::Error, Debug)]
pub enum StyleExprError {
    /// Invalid caller-provided configuration (for example an unknown type name).
    #[error("validation error: {0}")]
    Validation(String),

    /// The expression did not parse; carries every diagnostic found in one pass.
    #[error("parse error: {0}")]
    Parse(#[from] ParseErrors),

    /// A compiled expression failed for one particular runtime context.
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvalError),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StyleExprError {
    /// Build a [`StyleExprError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StyleExprError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for StyleExprError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
