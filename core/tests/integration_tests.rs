use command_syntax_core::*;
use command_syntax_structure::leaves::{SNOWFLAKE, UINT4_LIKE};
use serde_json::json;

fn role_arguments() -> Vec<DeclaredArgument> {
    vec![
        DeclaredArgument::required("name", "Role name"),
        DeclaredArgument::optional("tier", "Tier"),
        DeclaredArgument::required("info", "Description"),
    ]
}

const ROLE_SYNTAX: &str = "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3";

#[test]
fn test_required_only_substitution_round_trips() {
    let arguments = vec![
        DeclaredArgument::required("from", "From"),
        DeclaredArgument::required("to", "To"),
        DeclaredArgument::required("amount", "Amount"),
    ];
    let syntax = "<prefix>pay $1 -> $2: $3 coins";
    let samples = [
        ("alice", "bob", "10"),
        ("Some Name", "other name", "1 000"),
        ("x", "y", "z"),
    ];

    let cache = PatternCache::new();
    for (from, to, amount) in samples {
        let message = syntax
            .replace("<prefix>", "!")
            .replace("$1", from)
            .replace("$2", to)
            .replace("$3", amount);
        let result = extract(&cache, "!", &arguments, syntax, &message);

        assert!(result.succeeded, "{message}");
        assert_eq!(result.values["from"].as_deref(), Some(from));
        assert_eq!(result.values["to"].as_deref(), Some(to));
        assert_eq!(result.values["amount"].as_deref(), Some(amount));
    }
    assert_eq!(cache.misses(), 1);
    assert_eq!(cache.hits(), 2);
}

#[test]
fn test_role_set_end_to_end() {
    let cache = PatternCache::new();
    let arguments = role_arguments();

    let with_tier = extract(
        &cache,
        "%",
        &arguments,
        ROLE_SYNTAX,
        "%role set NAME Vault TIER Expert INFO a vault jump",
    );
    let bound = bind(&arguments, &with_tier.values_as_json()).unwrap();
    assert_eq!(
        serde_json::to_value(&bound).unwrap(),
        json!({"name": "Vault", "tier": "Expert", "info": "a vault jump"})
    );

    let without_tier = extract(
        &cache,
        "%",
        &arguments,
        ROLE_SYNTAX,
        "%role set NAME Vault INFO a vault jump",
    );
    let bound = bind(&arguments, &without_tier.values_as_json()).unwrap();
    assert_eq!(
        serde_json::to_value(&bound).unwrap(),
        json!({"name": "Vault", "tier": null, "info": "a vault jump"})
    );
}

#[test]
fn test_matching_ignores_case() {
    let cache = PatternCache::new();
    let result = extract(
        &cache,
        "%",
        &role_arguments(),
        ROLE_SYNTAX,
        "%ROLE SET name Vault tier Expert info x",
    );
    assert!(result.succeeded);
    assert_eq!(result.values["tier"].as_deref(), Some("Expert"));
}

#[test]
fn test_duplicate_reference_fails_at_second_index() {
    let syntax = "<prefix>role set NAME $1 INFO $3 AGAIN $1";
    let err = compile("%", &role_arguments(), syntax).unwrap_err();
    assert_eq!(
        err,
        CompileError::Parse(ParseError::new(
            ParseFailureReason::ArgumentReferencedMoreThanOnce,
            syntax.rfind("$1").unwrap(),
        ))
    );
}

#[test]
fn test_constraints_apply_after_extraction() {
    let arguments = vec![
        DeclaredArgument::required("channel", "Channel").with_constraint(SNOWFLAKE.clone()),
        DeclaredArgument::optional("slowmode", "Slowmode")
            .with_constraint(UINT4_LIKE.clone()),
    ];
    let syntax = "<prefix>lock $1{opt $2}[ for $2 seconds]";
    let cache = PatternCache::new();

    let ok = extract(&cache, "%", &arguments, syntax, "%lock 123456789012345678 for 30 seconds");
    let bound = bind(&arguments, &ok.values_as_json()).unwrap();
    assert_eq!(bound.get("slowmode"), Some(&json!(30)));

    let bad = extract(&cache, "%", &arguments, syntax, "%lock general for 30 seconds");
    assert!(bad.succeeded);
    let failure = bind(&arguments, &bad.values_as_json()).unwrap_err();
    assert!(failure.first_line().unwrap().starts_with("channel"));
}

#[test]
fn test_nested_cross_argument_key_offs_extract() {
    let arguments = vec![
        DeclaredArgument::required("target", "Target"),
        DeclaredArgument::optional("reason", "Reason"),
        DeclaredArgument::optional("duration", "Duration"),
    ];
    let syntax = "<prefix>mute $1{opt $2}[ {opt $3}[for $3 ]because $2]";
    let cache = PatternCache::new();

    let full = extract(&cache, "%", &arguments, syntax, "%mute bob for 10m because spam");
    assert!(full.succeeded);
    assert_eq!(full.values["target"].as_deref(), Some("bob"));
    assert_eq!(full.values["duration"].as_deref(), Some("10m"));
    assert_eq!(full.values["reason"].as_deref(), Some("spam"));

    let reason_only = extract(&cache, "%", &arguments, syntax, "%mute bob because spam");
    assert!(reason_only.succeeded);
    assert_eq!(reason_only.values["duration"], None);
    assert_eq!(reason_only.values["reason"].as_deref(), Some("spam"));

    let bare = extract(&cache, "%", &arguments, syntax, "%mute bob");
    assert!(bare.succeeded);
    assert_eq!(bare.values["reason"], None);
    assert_eq!(bare.values["duration"], None);
}

#[test]
fn test_usage_from_compiled_segments() {
    let compiled = compile("%", &role_arguments(), ROLE_SYNTAX).unwrap();
    assert_eq!(
        render_usage("%", &role_arguments(), compiled.segments()),
        "%role set NAME <Role name>[ TIER <Tier>] INFO <Description>"
    );
}
