//! Matching message text against a compiled syntax string.

use std::collections::BTreeMap;

use regex::Captures;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::cache::PatternCache;
use crate::compiler::{CompiledCommand, argument_group, key_off_group};
use crate::error::CompileError;
use crate::types::{DeclaredArgument, referenced_arguments};

/// One key-off occurrence that disagrees with the first occurrence of the
/// same argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyOffInconsistency {
    pub argument_name: String,
    /// 1-based occurrence index of the disagreeing group.
    pub occurrence: usize,
    /// Whether the disagreeing group captured.
    ///
    /// Also set for a matched block whose `$N` sat in a nested block that did
    /// not match: the block is present but its value is not.
    pub was_present: bool,
}

/// Outcome of matching one message.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub succeeded: bool,
    /// False when the syntax string itself failed to compile.
    pub compiled: bool,
    /// Raw text per argument id; `None` for an absent optional argument.
    pub values: BTreeMap<String, Option<String>>,
    pub inconsistent_key_offs: Vec<KeyOffInconsistency>,
    pub compile_error: Option<CompileError>,
    /// Id of a required argument whose group did not capture despite a match.
    pub missing_capture: Option<String>,
}

impl ExtractionResult {
    fn compile_failure(error: CompileError) -> Self {
        Self {
            compile_error: Some(error),
            ..Self::default()
        }
    }

    fn unmatched() -> Self {
        Self {
            compiled: true,
            ..Self::default()
        }
    }

    /// True when the message was well-formed but did not fit the syntax.
    pub fn is_mismatch(&self) -> bool {
        self.compiled
            && !self.succeeded
            && self.inconsistent_key_offs.is_empty()
            && self.missing_capture.is_none()
    }

    /// Values as a JSON object, ready for binding.
    pub fn values_as_json(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values
            .iter()
            .map(|(id, value)| {
                let value = value
                    .as_ref()
                    .map_or(serde_json::Value::Null, |s| serde_json::Value::from(s.as_str()));
                (id.clone(), value)
            })
            .collect()
    }
}

/// Compiles `syntax` through `cache` and matches `message` against it.
///
/// # Examples
///
/// ```
/// use command_syntax_core::{DeclaredArgument, PatternCache, extract};
///
/// let cache = PatternCache::default();
/// let args = [
///     DeclaredArgument::required("name", "Role name"),
///     DeclaredArgument::optional("tier", "Tier"),
///     DeclaredArgument::required("info", "Description"),
/// ];
/// let syntax = "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3";
///
/// let result = extract(&cache, "%", &args, syntax, "%role set NAME Vault INFO a vault jump");
/// assert!(result.succeeded);
/// assert_eq!(result.values["name"].as_deref(), Some("Vault"));
/// assert_eq!(result.values["tier"], None);
/// assert_eq!(result.values["info"].as_deref(), Some("a vault jump"));
/// ```
pub fn extract(
    cache: &PatternCache,
    prefix: &str,
    arguments: &[DeclaredArgument],
    syntax: &str,
    message: &str,
) -> ExtractionResult {
    match cache.get_or_compile(prefix, arguments, syntax) {
        Ok(compiled) => extract_compiled(&compiled, arguments, message),
        Err(e) => {
            error!(syntax = %syntax, error = %e, "Syntax string failed to compile");
            ExtractionResult::compile_failure(e)
        }
    }
}

/// Matches `message` against an already-compiled command.
pub fn extract_compiled(
    compiled: &CompiledCommand,
    arguments: &[DeclaredArgument],
    message: &str,
) -> ExtractionResult {
    let Some(captures) = compiled.pattern().captures(message) else {
        debug!(message = %message, "Message does not match syntax");
        return ExtractionResult::unmatched();
    };

    let mut result = ExtractionResult::unmatched();
    let referenced = referenced_arguments(compiled.segments());

    for (index, argument) in arguments.iter().enumerate() {
        let ordinal = index + 1;
        let capture = captures
            .name(&argument_group(ordinal))
            .map(|m| m.as_str().to_string());

        let value = if argument.optional {
            let presence = key_off_presence(compiled, &captures, ordinal);
            record_inconsistencies(argument, &presence, &mut result.inconsistent_key_offs);
            match (presence.first(), capture) {
                (Some(Some(_)), Some(value)) => Some(value),
                // Flag-style block: present, with no `$N` anywhere to capture.
                (Some(Some(text)), None) if !referenced.contains(&ordinal) => Some(text.clone()),
                (Some(Some(_)), None) => {
                    result.inconsistent_key_offs.push(KeyOffInconsistency {
                        argument_name: argument.name.clone(),
                        occurrence: 1,
                        was_present: true,
                    });
                    None
                }
                (Some(None), _) => None,
                (None, capture) => capture,
            }
        } else {
            if capture.is_none() && result.missing_capture.is_none() {
                result.missing_capture = Some(argument.id.clone());
            }
            capture
        };

        result.values.insert(argument.id.clone(), value);
    }

    if !result.inconsistent_key_offs.is_empty() {
        warn!(
            count = result.inconsistent_key_offs.len(),
            "Inconsistent key-off groups in message"
        );
        result.values.clear();
        return result;
    }

    if let Some(id) = &result.missing_capture {
        error!(
            argument = %id,
            pattern = %compiled.pattern().as_str(),
            "Required argument did not capture despite a match"
        );
        result.values.clear();
        return result;
    }

    result.succeeded = true;
    result
}

/// Captured text of each key-off occurrence for `ordinal`, in order.
fn key_off_presence(
    compiled: &CompiledCommand,
    captures: &Captures<'_>,
    ordinal: usize,
) -> Vec<Option<String>> {
    (1..=compiled.keyoff_count(ordinal))
        .map(|k| {
            captures
                .name(&key_off_group(ordinal, k))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}

fn record_inconsistencies(
    argument: &DeclaredArgument,
    presence: &[Option<String>],
    out: &mut Vec<KeyOffInconsistency>,
) {
    let Some(first) = presence.first() else {
        return;
    };
    let expected = first.is_some();
    for (index, group) in presence.iter().enumerate().skip(1) {
        if group.is_some() != expected {
            out.push(KeyOffInconsistency {
                argument_name: argument.name.clone(),
                occurrence: index + 1,
                was_present: group.is_some(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role_arguments() -> Vec<DeclaredArgument> {
        vec![
            DeclaredArgument::required("name", "Role name"),
            DeclaredArgument::optional("tier", "Tier"),
            DeclaredArgument::required("info", "Description"),
        ]
    }

    const ROLE_SYNTAX: &str = "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3";

    #[test]
    fn test_role_set_with_tier() {
        let cache = PatternCache::new();
        let result = extract(
            &cache,
            "%",
            &role_arguments(),
            ROLE_SYNTAX,
            "%role set NAME Vault TIER Expert INFO a vault jump",
        );

        assert!(result.succeeded);
        assert_eq!(result.values["name"].as_deref(), Some("Vault"));
        assert_eq!(result.values["tier"].as_deref(), Some("Expert"));
        assert_eq!(result.values["info"].as_deref(), Some("a vault jump"));
    }

    #[test]
    fn test_no_match_is_not_a_compile_failure() {
        let cache = PatternCache::new();
        let result = extract(&cache, "%", &role_arguments(), ROLE_SYNTAX, "%role get Vault");
        assert!(!result.succeeded);
        assert!(result.compiled);
        assert!(result.is_mismatch());
        assert!(result.values.is_empty());
    }

    #[test]
    fn test_compile_failure_reported() {
        let cache = PatternCache::new();
        let result = extract(&cache, "%", &role_arguments(), "<prefix>role $1 $1", "%role x");
        assert!(!result.compiled);
        assert!(!result.is_mismatch());
        assert!(result.compile_error.is_some());
    }

    #[test]
    fn test_partial_key_offs_are_inconsistent() {
        let arguments = vec![
            DeclaredArgument::required("user", "User"),
            DeclaredArgument::optional("reason", "Reason"),
        ];
        let syntax = "<prefix>ban $1{opt $2}[ with reason]{opt $2}[: $2]";
        let cache = PatternCache::new();

        let both = extract(&cache, "%", &arguments, syntax, "%ban bob with reason: spam");
        assert!(both.succeeded);
        assert_eq!(both.values["reason"].as_deref(), Some("spam"));

        let neither = extract(&cache, "%", &arguments, syntax, "%ban bob");
        assert!(neither.succeeded);
        assert_eq!(neither.values["user"].as_deref(), Some("bob"));
        assert_eq!(neither.values["reason"], None);

        let value_only = extract(&cache, "%", &arguments, syntax, "%ban bob: spam");
        assert!(!value_only.succeeded);
        assert!(value_only.compiled);
        assert_eq!(
            value_only.inconsistent_key_offs,
            vec![KeyOffInconsistency {
                argument_name: "Reason".into(),
                occurrence: 2,
                was_present: true,
            }]
        );
        assert!(value_only.values.is_empty());
    }

    #[test]
    fn test_flag_style_key_off_yields_block_text() {
        let arguments = vec![
            DeclaredArgument::required("user", "User"),
            DeclaredArgument::optional("silent", "Silent"),
        ];
        let cache = PatternCache::new();
        let syntax = "<prefix>kick $1{opt $2}[ silently]";

        let present = extract(&cache, "%", &arguments, syntax, "%kick bob SILENTLY");
        assert_eq!(present.values["silent"].as_deref(), Some(" SILENTLY"));

        let absent = extract(&cache, "%", &arguments, syntax, "%kick bob");
        assert_eq!(absent.values["silent"], None);
    }

    #[test]
    fn test_value_in_unmatched_nested_block_is_not_invented() {
        let arguments = vec![
            DeclaredArgument::required("target", "Target"),
            DeclaredArgument::optional("reason", "Reason"),
            DeclaredArgument::optional("duration", "Duration"),
        ];
        let syntax = "<prefix>mute $1{opt $2}[ X{opt $3}[ D $3 because $2]]";
        let cache = PatternCache::new();

        let full = extract(&cache, "%", &arguments, syntax, "%mute bob X D 10m because spam");
        assert!(full.succeeded);
        assert_eq!(full.values["reason"].as_deref(), Some("spam"));
        assert_eq!(full.values["duration"].as_deref(), Some("10m"));

        let none = extract(&cache, "%", &arguments, syntax, "%mute bob");
        assert!(none.succeeded);
        assert_eq!(none.values["reason"], None);
        assert_eq!(none.values["duration"], None);

        let outer_only = extract(&cache, "%", &arguments, syntax, "%mute bob X");
        assert!(!outer_only.succeeded);
        assert!(outer_only.compiled);
        assert!(!outer_only.is_mismatch());
        assert_eq!(
            outer_only.inconsistent_key_offs,
            vec![KeyOffInconsistency {
                argument_name: "Reason".into(),
                occurrence: 1,
                was_present: true,
            }]
        );
        assert!(outer_only.values.is_empty());
    }

    #[test]
    fn test_values_as_json_maps_absent_to_null() {
        let cache = PatternCache::new();
        let result = extract(
            &cache,
            "%",
            &role_arguments(),
            ROLE_SYNTAX,
            "%role set NAME Vault INFO x",
        );
        let json = result.values_as_json();
        assert_eq!(json["tier"], serde_json::Value::Null);
        assert_eq!(json["name"], "Vault");
    }
}
