//! Manifest loading example.
//!
//! Writes a YAML command manifest, loads it into a registry, prints lint
//! warnings and usage lines, then saves the configuration back out.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p command-syntax-demos --example manifest_registry
//! ```
//!
//! This example creates a temporary manifest to demonstrate the API.

use command_syntax_registry::{CommandRegistry, RegistryConfig, RegistryError};

const MANIFEST: &str = r#"
version: "1.0"
prefix: "%"
commands:
  - name: role
    syntax: "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3"
    description: Create or update a role
    arguments:
      - { id: name, name: Role name, constraint: { kind: string, max_length: 32 } }
      - id: tier
        name: Tier
        optional: true
        constraint: { kind: choice, values: [Novice, Expert] }
      - { id: info, name: Description }
  - name: verify
    syntax: "<prefix>verify $1{opt $2}[ quietly]"
    arguments:
      - { id: digest, name: Digest, constraint: { kind: hex_digest, length: 64 } }
      - { id: quiet, name: Quiet, optional: true }
  - name: mute
    syntax: "<prefix>silence $1"
    arguments:
      - { id: user, name: User, constraint: { kind: snowflake } }
"#;

fn main() {
    let dir = std::env::temp_dir().join("command_syntax_manifest_example");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("commands.yml");
    std::fs::write(&path, MANIFEST).unwrap();

    let registry = CommandRegistry::load(&path).unwrap();
    println!(
        "Loaded {} commands with prefix {:?}",
        registry.len(),
        registry.prefix()
    );

    for command in registry.commands() {
        println!("  {}", command.usage(registry.prefix()));
    }

    let warnings = registry.warnings();
    if !warnings.is_empty() {
        println!();
        println!("Lint warnings:");
        for warning in warnings {
            println!("  {warning}");
        }
    }

    println!();
    let digest = "a".repeat(64);
    for message in [
        format!("%verify {digest}"),
        format!("%verify {digest} QUIETLY"),
        "%verify abc123".to_string(),
    ] {
        match registry.dispatch_default(&message) {
            Ok(invocation) => println!(
                "{message}\n  -> {}",
                serde_json::to_string(&invocation.arguments).unwrap()
            ),
            Err(e) => println!("{message}\n  -> {}", e.user_message()),
        }
    }

    // A manifest with a broken syntax string is rejected as a whole.
    println!();
    let broken = MANIFEST.replace("role set NAME $1", "role set NAME $1 $1");
    match RegistryConfig::from_yaml_str(&broken).and_then(|c| CommandRegistry::from_config(&c)) {
        Err(RegistryError::Definition(e)) => println!("Rejected: {e}"),
        Err(e) => println!("Rejected: {e}"),
        Ok(_) => println!("Unexpectedly accepted the broken manifest"),
    }

    // Round-trip the configuration as JSON.
    let config = RegistryConfig::load(&path).unwrap();
    let json_path = dir.join("commands.json");
    std::fs::write(&json_path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    let reloaded = CommandRegistry::load(&json_path).unwrap();
    println!("Reloaded {} commands from {}", reloaded.len(), json_path.display());

    std::fs::remove_dir_all(&dir).ok();
}
