//! Command registration, manifest loading and message dispatch.
//!
//! A [`CommandRegistry`] holds validated [`CommandDefinition`]s. Definitions
//! are compiled when they are registered, so a broken syntax string is
//! reported at startup instead of on first use. [`CommandRegistry::dispatch`]
//! turns a message into an [`Invocation`] or an [`InvocationError`] whose
//! [`user_message`](InvocationError::user_message) can be sent back to the
//! author.
//!
//! # Quick start
//!
//! ```
//! use command_syntax_registry::{CommandRegistry, RegistryConfig};
//!
//! let config = RegistryConfig::from_yaml_str(r#"
//! version: "1.0"
//! prefix: "%"
//! commands:
//!   - name: role
//!     syntax: "<prefix>role set NAME $1{opt $2}[ TIER $2] INFO $3"
//!     arguments:
//!       - { id: name, name: Role name }
//!       - { id: tier, name: Tier, optional: true, constraint: { kind: choice, values: [Novice, Expert] } }
//!       - { id: info, name: Description }
//! "#).unwrap();
//!
//! let registry = CommandRegistry::from_config(&config).unwrap();
//! let invocation = registry
//!     .dispatch("%", "%role set NAME Vault TIER expert INFO a vault jump")
//!     .unwrap();
//! assert_eq!(invocation.arguments.get_str("tier"), Some("Expert"));
//!
//! let err = registry.dispatch("%", "%role set Vault").unwrap_err();
//! assert_eq!(
//!     err.user_message(),
//!     "Usage: %role set NAME <Role name>[ TIER <Tier>] INFO <Description>"
//! );
//! ```

mod config;
mod dispatch;
mod error;
mod registry;

pub use config::{ArgumentConfig, CommandConfig, ConstraintConfig, RegistryConfig};
pub use dispatch::{Invocation, InvocationError};
pub use error::{DefinitionError, RegistryError, Result};
pub use registry::{CommandDefinition, CommandRegistry, LintWarning, RegisteredCommand, lint};
