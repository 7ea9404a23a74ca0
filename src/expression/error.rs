use crate::foundation::location::Location;
use serde::Serialize;
use std::fmt;

/// A parse-time diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsingError {
    /// Human-readable description.
    pub message: String,
    /// Position of the offending node in the input.
    pub location: Location,
}

impl ParsingError {
    /// Build a diagnostic at `location`.
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for ParsingError {}

/// Every diagnostic collected by one failed compile, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseErrors {
    /// The collected diagnostics; never empty when produced by the compiler.
    pub errors: Vec<ParsingError>,
}

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

/// A runtime fault raised while evaluating a compiled expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvalError {
    /// Human-readable description.
    pub message: String,
    /// Location of the node that failed, as recorded at parse time.
    pub location: Location,
}

impl EvalError {
    pub(crate) fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location,
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

impl std::error::Error for EvalError {}
