//! Definition-time errors: malformed syntax strings and pattern build failures.
//!
//! These indicate a bug in a command's own declaration, not bad user input.

use thiserror::Error;

/// Why a syntax string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ParseFailureReason {
    /// The string does not start with the `<prefix>` tag.
    #[error("syntax string must start with <prefix>")]
    MalformedPrefixTag,
    /// `$N` or `{opt $N}` names an argument that was not declared.
    #[error("argument identifier references a non-existent argument")]
    NonexistentArgument,
    /// The same `$N` appears twice.
    #[error("argument referenced more than once")]
    ArgumentReferencedMoreThanOnce,
    /// `$N` of an optional argument outside a key-off block gated on it.
    #[error("optional argument used outside its own key-off block")]
    OptionalArgumentOutsideKeyOff,
    /// `{opt $N}` where argument `N` is required.
    #[error("key-off block references a required argument")]
    KeyOffOnRequiredArgument,
    /// `$N` of a required argument inside a key-off block.
    #[error("required argument used inside a key-off block")]
    RequiredArgumentInKeyOff,
    /// Two argument captures with no literal text between them.
    #[error("argument identifiers must be separated by literal text")]
    AdjacentArgumentIdentifiers,
    /// `$` not followed by a number.
    #[error("malformed argument identifier")]
    MalformedArgumentIdentifier,
    /// `{` not followed by `opt $N}[`.
    #[error("malformed key-off block, expected {{opt $N}}[...]")]
    MalformedKeyOff,
    /// End of input inside `[...]`.
    #[error("unterminated key-off block")]
    UnterminatedKeyOff,
    /// `]` with no open key-off block.
    #[error("closing bracket without an open key-off block")]
    UnexpectedClosingBracket,
}

/// A rejected syntax string, with the byte offset of the offending token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (at byte {index})")]
pub struct ParseError {
    pub reason: ParseFailureReason,
    pub index: usize,
}

impl ParseError {
    pub fn new(reason: ParseFailureReason, index: usize) -> Self {
        Self { reason, index }
    }
}

/// Failure to turn a syntax string into a matching pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The syntax string itself is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The generated pattern was rejected by the regex engine (e.g. size limits).
    #[error("generated pattern failed to build: {0}")]
    Pattern(String),
}

impl CompileError {
    /// Parse failure reason, if this is a parse error.
    pub fn reason(&self) -> Option<ParseFailureReason> {
        match self {
            Self::Parse(e) => Some(e.reason),
            Self::Pattern(_) => None,
        }
    }
}
