//! Declared arguments and the intermediate syntax segment tree.
//!
//! A command declares an ordered list of [`DeclaredArgument`]s. Its syntax
//! string refers to them positionally (`$1`, `$2`, ...), and the parser turns
//! that string into a sequence of [`SyntaxSegment`]s.

use command_syntax_structure::Structure;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// An argument a command accepts.
///
/// The position in the command's argument list is significant: the first
/// argument is `$1` in the syntax string.
///
/// # Examples
///
/// ```
/// use command_syntax_core::DeclaredArgument;
/// use command_syntax_structure::leaves::SNOWFLAKE;
///
/// let channel = DeclaredArgument::optional("channel", "Channel")
///     .with_constraint(SNOWFLAKE.clone());
/// assert!(channel.optional);
/// assert_eq!(channel.constraint_name(), Some("Snowflake"));
///
/// let name = DeclaredArgument::required("name", "Role name");
/// assert!(!name.optional);
/// assert!(name.further_constraint.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct DeclaredArgument {
    /// Display text used in usage strings and user-facing errors.
    pub name: String,
    /// Identifier, unique within the command; key of the bound value.
    pub id: String,
    /// Optional arguments may only appear inside their own key-off block.
    pub optional: bool,
    /// Structure the extracted text is checked against (plain string when absent).
    pub further_constraint: Option<Structure<Value>>,
}

impl DeclaredArgument {
    pub fn required(id: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: id.to_string(),
            optional: false,
            further_constraint: None,
        }
    }

    pub fn optional(id: &str, name: &str) -> Self {
        Self {
            optional: true,
            ..Self::required(id, name)
        }
    }

    /// Attaches a further constraint, erasing its output type.
    pub fn with_constraint<T>(mut self, structure: Structure<T>) -> Self
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        self.further_constraint = Some(structure.erase());
        self
    }

    /// Attaches an already-erased constraint.
    pub fn with_erased_constraint(mut self, structure: Structure<Value>) -> Self {
        self.further_constraint = Some(structure);
        self
    }

    pub fn constraint_name(&self) -> Option<&str> {
        self.further_constraint.as_ref().map(Structure::name)
    }
}

/// One element of a parsed syntax string.
///
/// Argument ordinals are 1-based, matching `$N` in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SyntaxSegment {
    /// Text matched literally (case-insensitively).
    Literal(String),
    /// Placeholder for the active command prefix.
    PrefixTag,
    /// Capture of the `n`th declared argument.
    ArgumentIdentifier(usize),
    /// Content that appears only when optional argument `argument` is supplied.
    KeyOff {
        argument: usize,
        content: Vec<SyntaxSegment>,
    },
}

impl SyntaxSegment {
    /// Visits this segment and every nested segment, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a SyntaxSegment)) {
        visit(self);
        if let SyntaxSegment::KeyOff { content, .. } = self {
            for segment in content {
                segment.walk(visit);
            }
        }
    }
}

/// Ordinals referenced by `$N` anywhere in `segments`.
pub fn referenced_arguments(segments: &[SyntaxSegment]) -> Vec<usize> {
    let mut out = Vec::new();
    for segment in segments {
        segment.walk(&mut |s| {
            if let SyntaxSegment::ArgumentIdentifier(n) = s {
                out.push(*n);
            }
        });
    }
    out
}

/// Ordinals gated by at least one key-off block in `segments`.
pub fn keyed_off_arguments(segments: &[SyntaxSegment]) -> Vec<usize> {
    let mut out = Vec::new();
    for segment in segments {
        segment.walk(&mut |s| {
            if let SyntaxSegment::KeyOff { argument, .. } = s
                && !out.contains(argument)
            {
                out.push(*argument);
            }
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_visits_nested_key_offs() {
        let segments = vec![
            SyntaxSegment::PrefixTag,
            SyntaxSegment::Literal("role ".into()),
            SyntaxSegment::ArgumentIdentifier(1),
            SyntaxSegment::KeyOff {
                argument: 2,
                content: vec![
                    SyntaxSegment::Literal(" TIER ".into()),
                    SyntaxSegment::ArgumentIdentifier(2),
                    SyntaxSegment::KeyOff {
                        argument: 3,
                        content: vec![SyntaxSegment::ArgumentIdentifier(3)],
                    },
                ],
            },
        ];

        assert_eq!(referenced_arguments(&segments), vec![1, 2, 3]);
        assert_eq!(keyed_off_arguments(&segments), vec![2, 3]);
    }

    #[test]
    fn test_optional_constructor_keeps_identity() {
        let arg = DeclaredArgument::optional("tier", "Tier");
        assert_eq!(arg.id, "tier");
        assert_eq!(arg.name, "Tier");
        assert!(arg.optional);
    }
}
