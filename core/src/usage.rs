//! Human-readable usage text rendered from parsed segments.

use crate::types::{DeclaredArgument, SyntaxSegment};

/// Renders `segments` as usage text: arguments become `<name>` and key-off
/// blocks are wrapped in `[...]`.
///
/// # Examples
///
/// ```
/// use command_syntax_core::{DeclaredArgument, parse_syntax, render_usage};
///
/// let args = [
///     DeclaredArgument::required("name", "Role name"),
///     DeclaredArgument::optional("tier", "Tier"),
/// ];
/// let segments = parse_syntax(&args, "<prefix>role set $1{opt $2}[ TIER $2]").unwrap();
/// assert_eq!(
///     render_usage("%", &args, &segments),
///     "%role set <Role name>[ TIER <Tier>]"
/// );
/// ```
pub fn render_usage(
    prefix: &str,
    arguments: &[DeclaredArgument],
    segments: &[SyntaxSegment],
) -> String {
    let mut out = String::new();
    render_into(&mut out, prefix, arguments, segments);
    out
}

fn render_into(
    out: &mut String,
    prefix: &str,
    arguments: &[DeclaredArgument],
    segments: &[SyntaxSegment],
) {
    for segment in segments {
        match segment {
            SyntaxSegment::Literal(text) => out.push_str(text),
            SyntaxSegment::PrefixTag => out.push_str(prefix),
            SyntaxSegment::ArgumentIdentifier(n) => {
                let name = n
                    .checked_sub(1)
                    .and_then(|index| arguments.get(index))
                    .map_or("?", |argument| argument.name.as_str());
                out.push('<');
                out.push_str(name);
                out.push('>');
            }
            SyntaxSegment::KeyOff { content, .. } => {
                out.push('[');
                render_into(out, prefix, arguments, content);
                out.push(']');
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_syntax;

    #[test]
    fn test_nested_blocks_render_brackets() {
        let arguments = vec![
            DeclaredArgument::required("target", "Target"),
            DeclaredArgument::optional("reason", "Reason"),
            DeclaredArgument::optional("duration", "Duration"),
        ];
        let segments = parse_syntax(
            &arguments,
            "<prefix>mute $1{opt $2}[ {opt $3}[for $3 ]because $2]",
        )
        .unwrap();

        assert_eq!(
            render_usage("!", &arguments, &segments),
            "!mute <Target>[ [for <Duration> ]because <Reason>]"
        );
    }
}
