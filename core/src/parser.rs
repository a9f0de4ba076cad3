//! Syntax string parser.
//!
//! Grammar:
//!
//! ```text
//! syntax    := "<prefix>" sequence
//! sequence  := ( literal | "$" digits | key-off )*
//! key-off   := "{" "opt" ws "$" digits "}" "[" sequence "]"
//! literal   := any char except '$', '{', ']' ; '\' escapes the next char
//! ```
//!
//! The parser walks the string once. Key-off content recurses into
//! [`SyntaxParser::parse_sequence`] with the gating argument pushed onto an
//! explicit scope stack, so a nested call never touches its caller's scope.
//! Only the cursor and the table of already-referenced arguments are shared
//! across the whole string.

use crate::error::{ParseError, ParseFailureReason};
use crate::types::{DeclaredArgument, SyntaxSegment};

/// Literal tag every syntax string starts with (case-insensitive).
pub const PREFIX_TAG: &str = "<prefix>";

type Result<T> = std::result::Result<T, ParseError>;

/// Parses `syntax` against the command's declared arguments.
///
/// # Errors
///
/// Returns a [`ParseError`] with the byte offset of the offending token. See
/// [`ParseFailureReason`] for the rules enforced.
///
/// # Examples
///
/// ```
/// use command_syntax_core::{DeclaredArgument, ParseFailureReason, SyntaxSegment, parse_syntax};
///
/// let args = [
///     DeclaredArgument::required("name", "Role name"),
///     DeclaredArgument::optional("tier", "Tier"),
/// ];
/// let segments = parse_syntax(&args, "<prefix>role $1{opt $2}[ tier $2]").unwrap();
/// assert_eq!(segments[0], SyntaxSegment::PrefixTag);
/// assert!(matches!(segments[3], SyntaxSegment::KeyOff { argument: 2, .. }));
///
/// let err = parse_syntax(&args, "<prefix>role $1 $1").unwrap_err();
/// assert_eq!(err.reason, ParseFailureReason::ArgumentReferencedMoreThanOnce);
/// assert_eq!(err.index, 16);
/// ```
pub fn parse_syntax(arguments: &[DeclaredArgument], syntax: &str) -> Result<Vec<SyntaxSegment>> {
    SyntaxParser::new(arguments, syntax).parse()
}

/// Output of one (possibly nested) sequence.
struct Sequence {
    segments: Vec<SyntaxSegment>,
    /// Whether an argument capture could directly precede whatever follows.
    ends_with_argument: bool,
}

struct SyntaxParser<'a> {
    arguments: &'a [DeclaredArgument],
    source: &'a str,
    position: usize,
    referenced: Vec<bool>,
}

impl<'a> SyntaxParser<'a> {
    fn new(arguments: &'a [DeclaredArgument], source: &'a str) -> Self {
        Self {
            arguments,
            source,
            position: 0,
            referenced: vec![false; arguments.len()],
        }
    }

    fn parse(mut self) -> Result<Vec<SyntaxSegment>> {
        let starts_with_tag = self
            .source
            .get(..PREFIX_TAG.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(PREFIX_TAG));
        if !starts_with_tag {
            return Err(ParseError::new(ParseFailureReason::MalformedPrefixTag, 0));
        }
        self.position = PREFIX_TAG.len();

        let mut segments = vec![SyntaxSegment::PrefixTag];
        let body = self.parse_sequence(&[], false, None)?;
        segments.extend(body.segments);
        Ok(segments)
    }

    /// Parses until end of input (top level) or the `]` closing the key-off
    /// opened at `opened_at`.
    fn parse_sequence(
        &mut self,
        scope: &[usize],
        mut previous_was_argument: bool,
        opened_at: Option<usize>,
    ) -> Result<Sequence> {
        let mut segments = Vec::new();
        let mut literal = String::new();

        loop {
            let Some(ch) = self.peek() else {
                return match opened_at {
                    Some(open) => Err(ParseError::new(ParseFailureReason::UnterminatedKeyOff, open)),
                    None => {
                        flush_literal(&mut literal, &mut segments);
                        Ok(Sequence {
                            segments,
                            ends_with_argument: previous_was_argument,
                        })
                    }
                };
            };

            match ch {
                '\\' => {
                    self.advance(ch);
                    match self.peek() {
                        Some(escaped) => {
                            self.advance(escaped);
                            literal.push(escaped);
                        }
                        None => literal.push('\\'),
                    }
                    previous_was_argument = false;
                }
                '$' => {
                    let start = self.position;
                    let ordinal = self.read_argument_identifier()?;
                    if previous_was_argument {
                        return Err(ParseError::new(
                            ParseFailureReason::AdjacentArgumentIdentifiers,
                            start,
                        ));
                    }
                    self.claim_reference(ordinal, scope, start)?;
                    flush_literal(&mut literal, &mut segments);
                    segments.push(SyntaxSegment::ArgumentIdentifier(ordinal));
                    previous_was_argument = true;
                }
                '{' => {
                    let start = self.position;
                    let ordinal = self.read_key_off_header(start)?;
                    flush_literal(&mut literal, &mut segments);

                    let mut nested_scope = scope.to_vec();
                    nested_scope.push(ordinal);
                    let content =
                        self.parse_sequence(&nested_scope, previous_was_argument, Some(start))?;

                    segments.push(SyntaxSegment::KeyOff {
                        argument: ordinal,
                        content: content.segments,
                    });
                    // When the block is absent, whatever preceded it is adjacent to what follows.
                    previous_was_argument = previous_was_argument || content.ends_with_argument;
                }
                ']' => {
                    if opened_at.is_none() {
                        return Err(ParseError::new(
                            ParseFailureReason::UnexpectedClosingBracket,
                            self.position,
                        ));
                    }
                    self.advance(ch);
                    flush_literal(&mut literal, &mut segments);
                    return Ok(Sequence {
                        segments,
                        ends_with_argument: previous_was_argument,
                    });
                }
                _ => {
                    self.advance(ch);
                    literal.push(ch);
                    previous_was_argument = false;
                }
            }
        }
    }

    /// Reads `$N` starting at the `$`; returns the validated ordinal.
    fn read_argument_identifier(&mut self) -> Result<usize> {
        let start = self.position;
        self.advance('$');
        let digits = self.take_digits();
        if digits.is_empty() {
            return Err(ParseError::new(
                ParseFailureReason::MalformedArgumentIdentifier,
                start,
            ));
        }
        match digits.parse::<usize>() {
            Ok(n) if (1..=self.arguments.len()).contains(&n) => Ok(n),
            _ => Err(ParseError::new(
                ParseFailureReason::NonexistentArgument,
                start,
            )),
        }
    }

    /// Reads `{opt $N}[` starting at the `{`; returns the gating ordinal.
    fn read_key_off_header(&mut self, start: usize) -> Result<usize> {
        let malformed = || ParseError::new(ParseFailureReason::MalformedKeyOff, start);

        self.advance('{');
        self.skip_whitespace();
        let keyword_matches = self
            .source
            .get(self.position..self.position + 3)
            .is_some_and(|word| word.eq_ignore_ascii_case("opt"));
        if !keyword_matches {
            return Err(malformed());
        }
        self.position += 3;
        if self.skip_whitespace() == 0 || self.peek() != Some('$') {
            return Err(malformed());
        }
        let ordinal = self.read_argument_identifier()?;
        self.skip_whitespace();
        if self.peek() != Some('}') {
            return Err(malformed());
        }
        self.advance('}');
        if self.peek() != Some('[') {
            return Err(malformed());
        }
        self.advance('[');

        if !self.arguments[ordinal - 1].optional {
            return Err(ParseError::new(
                ParseFailureReason::KeyOffOnRequiredArgument,
                start,
            ));
        }
        Ok(ordinal)
    }

    /// Records a `$N` reference, enforcing uniqueness and key-off scoping.
    fn claim_reference(&mut self, ordinal: usize, scope: &[usize], start: usize) -> Result<()> {
        let index = ordinal - 1;
        if self.referenced[index] {
            return Err(ParseError::new(
                ParseFailureReason::ArgumentReferencedMoreThanOnce,
                start,
            ));
        }

        let argument = &self.arguments[index];
        if argument.optional && !scope.contains(&ordinal) {
            return Err(ParseError::new(
                ParseFailureReason::OptionalArgumentOutsideKeyOff,
                start,
            ));
        }
        if !argument.optional && !scope.is_empty() {
            return Err(ParseError::new(
                ParseFailureReason::RequiredArgumentInKeyOff,
                start,
            ));
        }

        self.referenced[index] = true;
        Ok(())
    }

    fn peek(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn advance(&mut self, ch: char) {
        self.position += ch.len_utf8();
    }

    fn take_digits(&mut self) -> &'a str {
        let rest = &self.source[self.position..];
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        self.position += len;
        &rest[..len]
    }

    fn skip_whitespace(&mut self) -> usize {
        let rest = &self.source[self.position..];
        let len = rest.len() - rest.trim_start().len();
        self.position += len;
        len
    }
}

fn flush_literal(literal: &mut String, segments: &mut Vec<SyntaxSegment>) {
    if !literal.is_empty() {
        segments.push(SyntaxSegment::Literal(std::mem::take(literal)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SyntaxSegment::{ArgumentIdentifier, KeyOff, Literal, PrefixTag};

    fn role_arguments() -> Vec<DeclaredArgument> {
        vec![
            DeclaredArgument::required("name", "Role name"),
            DeclaredArgument::optional("tier", "Tier"),
            DeclaredArgument::required("info", "Description"),
        ]
    }

    fn reason(syntax: &str) -> ParseFailureReason {
        parse_syntax(&role_arguments(), syntax)
            .expect_err("syntax should be rejected")
            .reason
    }

    #[test]
    fn test_parses_role_syntax() {
        let segments = parse_syntax(
            &role_arguments(),
            "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3",
        )
        .unwrap();

        assert_eq!(
            segments,
            vec![
                PrefixTag,
                Literal("role set NAME ".into()),
                ArgumentIdentifier(1),
                KeyOff {
                    argument: 2,
                    content: vec![Literal(" TIER ".into()), ArgumentIdentifier(2)],
                },
                Literal(" INFO ".into()),
                ArgumentIdentifier(3),
            ]
        );
    }

    #[test]
    fn test_prefix_tag_is_case_insensitive_and_required() {
        assert!(parse_syntax(&[], "<PREFIX>ping").is_ok());
        assert_eq!(
            parse_syntax(&[], "ping").unwrap_err(),
            ParseError::new(ParseFailureReason::MalformedPrefixTag, 0)
        );
        assert_eq!(
            parse_syntax(&[], "<pre").unwrap_err().reason,
            ParseFailureReason::MalformedPrefixTag
        );
    }

    #[test]
    fn test_duplicate_reference_reports_second_index() {
        let syntax = "<prefix>role $1 and $1 INFO $3";
        let err = parse_syntax(&role_arguments(), syntax).unwrap_err();
        assert_eq!(err.reason, ParseFailureReason::ArgumentReferencedMoreThanOnce);
        assert_eq!(err.index, syntax.rfind("$1").unwrap());
    }

    #[test]
    fn test_scope_rules() {
        assert_eq!(
            reason("<prefix>role $1 $2 $3"),
            ParseFailureReason::OptionalArgumentOutsideKeyOff
        );
        assert_eq!(
            reason("<prefix>role $1{opt $1}[ x] $3"),
            ParseFailureReason::KeyOffOnRequiredArgument
        );
        assert_eq!(
            reason("<prefix>role $1{opt $2}[ $3] $2"),
            ParseFailureReason::RequiredArgumentInKeyOff
        );
        assert_eq!(reason("<prefix>role $4"), ParseFailureReason::NonexistentArgument);
        assert_eq!(reason("<prefix>role $0"), ParseFailureReason::NonexistentArgument);
    }

    #[test]
    fn test_adjacent_identifiers_rejected() {
        assert_eq!(
            reason("<prefix>role $1$3"),
            ParseFailureReason::AdjacentArgumentIdentifiers
        );
        // Adjacent when the block is present.
        assert_eq!(
            reason("<prefix>role $1{opt $2}[$2] x $3"),
            ParseFailureReason::AdjacentArgumentIdentifiers
        );
        // Adjacent when the block is absent.
        assert_eq!(
            reason("<prefix>role $1{opt $2}[ x]$3"),
            ParseFailureReason::AdjacentArgumentIdentifiers
        );
    }

    #[test]
    fn test_malformed_blocks() {
        assert_eq!(
            reason("<prefix>role $1 {opt 2}[x] $3"),
            ParseFailureReason::MalformedKeyOff
        );
        assert_eq!(
            reason("<prefix>role $1 {opt $2} x $3"),
            ParseFailureReason::MalformedKeyOff
        );
        assert_eq!(
            reason("<prefix>role $1 {opt $2}[ $2 x"),
            ParseFailureReason::UnterminatedKeyOff
        );
        assert_eq!(
            reason("<prefix>role $1] $3"),
            ParseFailureReason::UnexpectedClosingBracket
        );
        assert_eq!(
            reason("<prefix>role $x"),
            ParseFailureReason::MalformedArgumentIdentifier
        );
    }

    #[test]
    fn test_unterminated_reports_opening_brace() {
        let syntax = "<prefix>role $1 {opt $2}[ $2";
        let err = parse_syntax(&role_arguments(), syntax).unwrap_err();
        assert_eq!(err.index, syntax.find('{').unwrap());
    }

    #[test]
    fn test_escapes_produce_literals() {
        let segments = parse_syntax(&[], r"<prefix>cost \$5 \{x\}").unwrap();
        assert_eq!(segments, vec![PrefixTag, Literal("cost $5 {x}".into())]);
    }

    #[test]
    fn test_nested_cross_argument_key_offs() {
        let arguments = vec![
            DeclaredArgument::required("target", "Target"),
            DeclaredArgument::optional("reason", "Reason"),
            DeclaredArgument::optional("duration", "Duration"),
        ];

        let segments = parse_syntax(
            &arguments,
            "<prefix>mute $1{opt $2}[ because $2{opt $3}[ for $3 and $2]]",
        );
        // $2 was already referenced in the outer block.
        assert_eq!(
            segments.unwrap_err().reason,
            ParseFailureReason::ArgumentReferencedMoreThanOnce
        );

        let segments = parse_syntax(
            &arguments,
            "<prefix>mute $1{opt $2}[ {opt $3}[for $3 ]because $2]",
        )
        .unwrap();
        assert!(matches!(
            &segments[3],
            KeyOff { argument: 2, content } if matches!(content[1], KeyOff { argument: 3, .. })
        ));

        // $3 is not in scope inside a block gated only on $2.
        assert_eq!(
            parse_syntax(&arguments, "<prefix>mute $1{opt $2}[ $2 for $3]")
                .unwrap_err()
                .reason,
            ParseFailureReason::OptionalArgumentOutsideKeyOff
        );

        // $2 is in scope inside a block gated on $3 nested in a block gated on $2.
        assert!(
            parse_syntax(&arguments, "<prefix>mute $1{opt $2}[ {opt $3}[ for $3 because $2]]")
                .is_ok()
        );
    }
}
