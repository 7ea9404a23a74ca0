use serde::{Deserialize, Serialize};
use std::fmt;

/// One step from a container into a child of the expression input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathElem {
    /// Position inside a JSON array.
    Index(usize),
    /// Member of a JSON object.
    Key(String),
}

/// Position of a node inside the original nested input, outermost step first.
///
/// Used for diagnostics only; it never influences parsing or evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(Vec<PathElem>);

impl Location {
    /// The location of the input root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Location of the `index`-th element below `self`.
    pub fn child(&self, index: usize) -> Self {
        let mut path = self.0.clone();
        path.push(PathElem::Index(index));
        Self(path)
    }

    /// Location of the member `key` below `self`.
    pub fn key(&self, key: impl Into<String>) -> Self {
        let mut path = self.0.clone();
        path.push(PathElem::Key(key.into()));
        Self(path)
    }

    /// Path steps, outermost first.
    pub fn elems(&self) -> &[PathElem] {
        &self.0
    }

    /// Return `true` for the input root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<PathElem>> for Location {
    fn from(path: Vec<PathElem>) -> Self {
        Self(path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for p in &self.0 {
            match p {
                PathElem::Index(i) => write!(f, "[{i}]")?,
                PathElem::Key(name) => write!(f, ".{name}")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/location.rs"]
mod tests;
