//! Chat bot dispatch example.
//!
//! Registers a few commands in code, then routes messages from servers with
//! different prefixes through one registry and deserializes the bound
//! arguments into typed structs.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-syntax-demos --example role_bot
//! ```

use command_syntax_core::DeclaredArgument;
use command_syntax_registry::{CommandDefinition, CommandRegistry, ConstraintConfig, Invocation};
use command_syntax_structure::leaves::{SNOWFLAKE, UINT4_LIKE};
use command_syntax_structure::string;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RoleSet {
    name: String,
    tier: Option<String>,
    info: String,
}

#[derive(Debug, Deserialize)]
struct Slowmode {
    channel: String,
    seconds: u32,
}

fn main() {
    let tier = ConstraintConfig::Choice {
        values: vec!["Novice".into(), "Expert".into()],
    }
    .to_structure()
    .unwrap();

    let mut registry = CommandRegistry::new("!");

    registry
        .register(
            CommandDefinition::new("role", "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3")
                .with_description("Create or update a role")
                .with_argument(
                    DeclaredArgument::required("name", "Role name")
                        .with_constraint(string().length(1..=32)),
                )
                .with_argument(
                    DeclaredArgument::optional("tier", "Tier").with_erased_constraint(tier),
                )
                .with_argument(DeclaredArgument::required("info", "Description")),
        )
        .unwrap();

    registry
        .register(
            CommandDefinition::new("slowmode", "<prefix>slowmode $1 $2")
                .with_argument(
                    DeclaredArgument::required("channel", "Channel")
                        .with_constraint(SNOWFLAKE.clone()),
                )
                .with_argument(
                    DeclaredArgument::required("seconds", "Seconds")
                        .with_constraint(UINT4_LIKE.clone()),
                ),
        )
        .unwrap();

    let traffic = [
        ("!", "!role set NAME Vault TIER Expert INFO a vault jump"),
        ("!", "!role set NAME Vault INFO a vault jump"),
        ("%", "%ROLE set NAME Vault TIER Master INFO a vault jump"),
        ("%", "%role set Vault"),
        ("bot.", "bot.slowmode 123456789012345678 30"),
        ("bot.", "bot.slowmode 123456789012345678 forever"),
        ("!", "!dance"),
        ("!", "hello everyone"),
    ];

    for (prefix, message) in traffic {
        println!("[{prefix}] {message}");
        match registry.dispatch(prefix, message) {
            Ok(invocation) => handle(&invocation),
            Err(e) if e.is_user_error() => println!("  reply: {}", e.user_message()),
            Err(e) => println!("  internal error: {e}"),
        }
    }

    println!();
    println!(
        "{} commands, {} compiled patterns",
        registry.len(),
        registry.cache().len()
    );
}

fn handle(invocation: &Invocation) {
    match invocation.command.as_str() {
        "role" => {
            let args: RoleSet = invocation.arguments.deserialize().unwrap();
            println!(
                "  set role {:?} (tier {}) described as {:?}",
                args.name,
                args.tier.as_deref().unwrap_or("none"),
                args.info
            );
        }
        "slowmode" => {
            let args: Slowmode = invocation.arguments.deserialize().unwrap();
            println!("  slowmode {}s in channel {}", args.seconds, args.channel);
        }
        other => println!("  unhandled command {other}"),
    }
}
