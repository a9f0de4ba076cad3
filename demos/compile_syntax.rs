//! Syntax string compilation example.
//!
//! Parses and compiles a syntax string, prints the generated pattern, then
//! extracts and binds a few messages against it without a registry.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-syntax-demos --example compile_syntax
//! ```

use command_syntax_core::{
    DeclaredArgument, PatternCache, Specification, extract, parse_syntax, render_usage,
};
use command_syntax_structure::leaves::SNOWFLAKE;

const SYNTAX: &str = "<prefix>lock $1{opt $2}[ for $2 seconds]{opt $3}[ because $3]";

fn main() {
    let arguments = vec![
        DeclaredArgument::required("channel", "Channel").with_constraint(SNOWFLAKE.clone()),
        DeclaredArgument::optional("seconds", "Duration"),
        DeclaredArgument::optional("reason", "Reason"),
    ];

    let segments = parse_syntax(&arguments, SYNTAX).unwrap();
    println!("Usage: {}", render_usage("!", &arguments, &segments));

    let cache = PatternCache::new();
    let specification = Specification::from_arguments(&arguments);

    let messages = [
        "!lock 123456789012345678",
        "!lock 123456789012345678 for 60 seconds",
        "!LOCK 123456789012345678 for 60 seconds because raid",
        "!lock general",
        "!unlock 123456789012345678",
    ];

    for message in messages {
        println!();
        println!("{message}");

        let result = extract(&cache, "!", &arguments, SYNTAX, message);
        if !result.succeeded {
            println!("  no match");
            continue;
        }
        for (id, value) in &result.values {
            println!("  {id}: {value:?}");
        }

        match specification.bind(&result.values_as_json()) {
            Ok(bound) => println!("  bound: {}", serde_json::to_string(&bound).unwrap()),
            Err(failure) => {
                for line in failure.lines() {
                    println!("  rejected: {line}");
                }
            }
        }
    }

    // Every message above reused one compiled pattern.
    println!();
    println!(
        "Cache: {} entries, {} hits, {} misses",
        cache.len(),
        cache.hits(),
        cache.misses()
    );
    if let Some(Ok(compiled)) = cache.get("!", SYNTAX) {
        println!("Pattern: {}", compiled.pattern().as_str());
    }
}
