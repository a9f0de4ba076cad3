//! Failure trails produced by structure checks.
//!
//! A [`StructureFailure`] carries a coarse [`FailureKind`] and an ordered list
//! of [`Explanation`]s. Each explanation records where in the checked value it
//! originated as a list of [`PathSegment`]s. Combinators prepend their own
//! segment with [`StructureFailure::prefixed`] as the failure travels outward,
//! so the top-level caller sees a full path without re-walking the structure.
//!
//! # Examples
//!
//! ```
//! use command_syntax_structure::{FailureKind, PathSegment, StructureFailure};
//!
//! let failure = StructureFailure::new(FailureKind::IncorrectType, "expected a string, received number 1")
//!     .prefixed(PathSegment::Index(2))
//!     .prefixed(PathSegment::key("roles"));
//!
//! assert_eq!(failure.lines(), vec!["roles[2]: expected a string, received number 1"]);
//! ```

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Coarse classification of a structure failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FailureKind {
    /// The value had the wrong JSON type (e.g. a number where a string was expected).
    IncorrectType,
    /// The value had the right type but violated a refinement.
    InvalidValue,
    /// None of a union's members accepted the value.
    NoMatchingUnionMember,
    /// An object carried a key that is neither declared nor accepted by the catch-all.
    UnexpectedProperty,
    /// A tuple had the wrong number of elements.
    IncorrectArity,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::IncorrectType => "incorrect type",
            Self::InvalidValue => "invalid value",
            Self::NoMatchingUnionMember => "no matching union member",
            Self::UnexpectedProperty => "unexpected property",
            Self::IncorrectArity => "incorrect arity",
        };
        f.write_str(label)
    }
}

/// One step of the path from the checked root to a failing value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object property name.
    Key(String),
    /// Array or tuple position.
    Index(usize),
    /// Union or intersection member, by structure name.
    Member(String),
}

impl PathSegment {
    pub fn key(key: impl Into<String>) -> Self {
        Self::Key(key.into())
    }

    pub fn member(name: impl Into<String>) -> Self {
        Self::Member(name.into())
    }
}

/// A single human-readable, path-annotated failure line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Explanation {
    /// Path from the root, outermost segment first.
    pub path: Vec<PathSegment>,
    /// Message describing the failure at `path`.
    pub message: String,
}

impl Explanation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            message: message.into(),
        }
    }

    /// Renders only the path portion (`roles[2]<Snowflake>`).
    pub fn render_path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            match segment {
                PathSegment::Key(key) => {
                    if !out.is_empty() {
                        out.push('.');
                    }
                    out.push_str(key);
                }
                PathSegment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
                PathSegment::Member(name) => {
                    out.push('<');
                    out.push_str(name);
                    out.push('>');
                }
            }
        }
        out
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.render_path(), self.message)
        }
    }
}

/// Failure of a transform or validation step.
///
/// `information` is never empty for failures built through this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {}", summarize(.information))]
pub struct StructureFailure {
    pub kind: FailureKind,
    pub information: Vec<Explanation>,
}

fn summarize(information: &[Explanation]) -> String {
    match information {
        [] => "no further information".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}

impl StructureFailure {
    /// Creates a failure with a single unprefixed explanation.
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            information: vec![Explanation::new(message)],
        }
    }

    pub fn incorrect_type(expected: &str, input: Option<&Value>) -> Self {
        Self::new(
            FailureKind::IncorrectType,
            format!("expected {expected}, received {}", describe_input(input)),
        )
    }

    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::new(FailureKind::InvalidValue, message)
    }

    /// Prepends `segment` to the path of every explanation.
    pub fn prefixed(mut self, segment: PathSegment) -> Self {
        for explanation in &mut self.information {
            explanation.path.insert(0, segment.clone());
        }
        self
    }

    /// Combines several failures into one, keeping the first failure's kind.
    ///
    /// Returns `None` when `failures` is empty.
    pub fn aggregate(failures: Vec<StructureFailure>) -> Option<Self> {
        let kind = failures.first()?.kind;
        let information = failures
            .into_iter()
            .flat_map(|failure| failure.information)
            .collect();
        Some(Self { kind, information })
    }

    /// Renders every explanation as a path-prefixed string.
    pub fn lines(&self) -> Vec<String> {
        self.information.iter().map(ToString::to_string).collect()
    }

    /// First rendered explanation, suitable for showing to an end user.
    pub fn first_line(&self) -> Option<String> {
        self.information.first().map(ToString::to_string)
    }

    /// Returns `true` if any explanation's rendered path contains `fragment`.
    pub fn mentions(&self, fragment: &str) -> bool {
        self.information
            .iter()
            .any(|explanation| explanation.render_path().contains(fragment))
    }
}

/// Short description of an untyped input for failure messages.
pub fn describe_input(input: Option<&Value>) -> String {
    match input {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => format!("boolean {b}"),
        Some(Value::Number(n)) => format!("number {n}"),
        Some(Value::String(s)) => format!("string {s:?}"),
        Some(Value::Array(items)) => format!("array of length {}", items.len()),
        Some(Value::Object(_)) => "object".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_accumulate_outward() {
        let failure = StructureFailure::invalid_value("too long")
            .prefixed(PathSegment::member("String"))
            .prefixed(PathSegment::Index(0))
            .prefixed(PathSegment::key("tags"))
            .prefixed(PathSegment::key("meta"));

        assert_eq!(failure.lines(), vec!["meta.tags[0]<String>: too long"]);
        assert!(failure.mentions("tags"));
    }

    #[test]
    fn test_aggregate_keeps_first_kind_and_order() {
        let a = StructureFailure::incorrect_type("a string", None).prefixed(PathSegment::key("a"));
        let b = StructureFailure::invalid_value("bad").prefixed(PathSegment::key("b"));

        let merged = StructureFailure::aggregate(vec![a, b]).unwrap();
        assert_eq!(merged.kind, FailureKind::IncorrectType);
        assert_eq!(
            merged.lines(),
            vec!["a: expected a string, received undefined", "b: bad"]
        );
        assert!(StructureFailure::aggregate(Vec::new()).is_none());
    }

    #[test]
    fn test_display_summarizes() {
        let failure = StructureFailure::aggregate(vec![
            StructureFailure::invalid_value("one"),
            StructureFailure::invalid_value("two"),
        ])
        .unwrap();
        assert_eq!(failure.to_string(), "invalid value: one (and 1 more)");
    }
}
