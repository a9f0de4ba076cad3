//! Segment sequence to anchored regular expression.

use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::CompileError;
use crate::parser::parse_syntax;
use crate::types::{DeclaredArgument, SyntaxSegment};

/// Upper bound on the compiled program size; generous for hand-written syntax.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Name of the capture group holding argument `n`.
pub fn argument_group(n: usize) -> String {
    format!("arg_{n}")
}

/// Name of the `k`th (1-based) key-off group gated on argument `n`.
pub fn key_off_group(n: usize, k: usize) -> String {
    format!("keyoff_{n}_{k}")
}

/// A syntax string compiled for one prefix.
///
/// Immutable once built; shared through [`crate::PatternCache`].
#[derive(Debug, Clone)]
pub struct CompiledCommand {
    pattern: Regex,
    keyoff_counts: BTreeMap<usize, usize>,
    segments: Vec<SyntaxSegment>,
}

impl CompiledCommand {
    /// The anchored, case-insensitive matcher.
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Number of key-off groups per optional argument ordinal.
    pub fn keyoff_counts(&self) -> &BTreeMap<usize, usize> {
        &self.keyoff_counts
    }

    /// Key-off occurrences for argument `n` (0 when it has none).
    pub fn keyoff_count(&self, n: usize) -> usize {
        self.keyoff_counts.get(&n).copied().unwrap_or(0)
    }

    /// The parsed segments the pattern was generated from.
    pub fn segments(&self) -> &[SyntaxSegment] {
        &self.segments
    }
}

/// Parses and compiles `syntax` for `prefix`, bypassing any cache.
///
/// # Examples
///
/// ```
/// use command_syntax_core::{DeclaredArgument, compile};
///
/// let args = [
///     DeclaredArgument::required("name", "Role name"),
///     DeclaredArgument::optional("tier", "Tier"),
/// ];
/// let compiled = compile("%", &args, "<prefix>role $1{opt $2}[ TIER $2]").unwrap();
///
/// let caps = compiled.pattern().captures("%ROLE Vault tier Expert").unwrap();
/// assert_eq!(&caps["arg_1"], "Vault");
/// assert_eq!(&caps["arg_2"], "Expert");
/// assert_eq!(compiled.keyoff_count(2), 1);
/// ```
pub fn compile(
    prefix: &str,
    arguments: &[DeclaredArgument],
    syntax: &str,
) -> Result<CompiledCommand, CompileError> {
    let segments = parse_syntax(arguments, syntax)?;
    compile_segments(prefix, segments)
}

/// Compiles an already-parsed segment sequence.
pub fn compile_segments(
    prefix: &str,
    segments: Vec<SyntaxSegment>,
) -> Result<CompiledCommand, CompileError> {
    let mut emitter = Emitter {
        prefix,
        source: String::from("^"),
        keyoff_counts: BTreeMap::new(),
    };
    emitter.emit_all(&segments);
    emitter.source.push('$');

    let pattern = RegexBuilder::new(&emitter.source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| CompileError::Pattern(e.to_string()))?;

    debug!(
        pattern = %pattern.as_str(),
        key_offs = emitter.keyoff_counts.len(),
        "Compiled syntax string"
    );

    Ok(CompiledCommand {
        pattern,
        keyoff_counts: emitter.keyoff_counts,
        segments,
    })
}

struct Emitter<'a> {
    prefix: &'a str,
    source: String,
    keyoff_counts: BTreeMap<usize, usize>,
}

impl Emitter<'_> {
    fn emit_all(&mut self, segments: &[SyntaxSegment]) {
        for segment in segments {
            self.emit(segment);
        }
    }

    fn emit(&mut self, segment: &SyntaxSegment) {
        match segment {
            SyntaxSegment::Literal(text) => self.source.push_str(&regex::escape(text)),
            SyntaxSegment::PrefixTag => self.source.push_str(&regex::escape(self.prefix)),
            SyntaxSegment::ArgumentIdentifier(n) => {
                self.source
                    .push_str(&format!("(?P<{}>.+?)", argument_group(*n)));
            }
            SyntaxSegment::KeyOff { argument, content } => {
                let occurrence = self.keyoff_counts.entry(*argument).or_insert(0);
                *occurrence += 1;
                let name = key_off_group(*argument, *occurrence);

                self.source.push_str(&format!("(?P<{name}>"));
                self.emit_all(content);
                self.source.push_str(")?");
            }
        }
    }
}
