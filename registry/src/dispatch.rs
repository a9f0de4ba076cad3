//! Routing an incoming message to a registered command.

use command_syntax_core::{BoundArguments, extract};
use command_syntax_structure::StructureFailure;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::registry::CommandRegistry;

/// A message that matched a command and bound its arguments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invocation {
    /// Registered name of the command.
    pub command: String,
    pub arguments: BoundArguments,
}

/// Why a message could not be turned into an [`Invocation`].
///
/// Every variant except [`Internal`](Self::Internal) is caused by the
/// message, and should be reported back to its author.
#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    /// The message does not start with the prefix, or has nothing after it.
    #[error("message is not a command")]
    NotACommand,

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    /// The message does not fit the command's syntax.
    #[error("`{command}` does not match its syntax; usage: {usage}")]
    Malformed { command: String, usage: String },

    /// Repeated key-off blocks of one argument disagree on presence.
    #[error("`{command}`: argument {argument} is only partly supplied")]
    InconsistentKeyOffs { command: String, argument: String },

    /// Extracted text failed its argument constraints.
    #[error("`{command}`: {failure}")]
    InvalidArguments {
        command: String,
        failure: StructureFailure,
    },

    /// The command's definition and its compiled pattern disagree.
    #[error("`{command}` could not be processed: {detail}")]
    Internal { command: String, detail: String },
}

impl InvocationError {
    /// Text suitable for replying to the message author.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_syntax_registry::InvocationError;
    ///
    /// let err = InvocationError::Malformed {
    ///     command: "role".into(),
    ///     usage: "%role set <Role name>".into(),
    /// };
    /// assert_eq!(err.user_message(), "Usage: %role set <Role name>");
    /// ```
    pub fn user_message(&self) -> String {
        match self {
            Self::NotACommand => "That is not a command.".to_string(),
            Self::UnknownCommand(name) => format!("Unknown command `{name}`."),
            Self::Malformed { usage, .. } => format!("Usage: {usage}"),
            Self::InconsistentKeyOffs { argument, .. } => {
                format!("The {argument} argument was only partly supplied.")
            }
            Self::InvalidArguments { failure, .. } => failure
                .first_line()
                .unwrap_or_else(|| "Invalid arguments.".to_string()),
            Self::Internal { .. } => "Something went wrong while reading that command.".to_string(),
        }
    }

    /// Whether the message author, not the command definition, is at fault.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::Internal { .. })
    }
}

impl CommandRegistry {
    /// Matches `message` against the command its first word names.
    ///
    /// `prefix` is the prefix active where the message was sent; it may
    /// differ from the registry's default. Each prefix is compiled once and
    /// cached.
    ///
    /// # Examples
    ///
    /// ```
    /// use command_syntax_core::DeclaredArgument;
    /// use command_syntax_registry::{CommandDefinition, CommandRegistry, InvocationError};
    ///
    /// let mut registry = CommandRegistry::new("!");
    /// registry
    ///     .register(CommandDefinition::new("echo", "<prefix>echo $1")
    ///         .with_argument(DeclaredArgument::required("text", "Text")))
    ///     .unwrap();
    ///
    /// let invocation = registry.dispatch("?", "?ECHO hello there").unwrap();
    /// assert_eq!(invocation.arguments.get_str("text"), Some("hello there"));
    ///
    /// assert!(matches!(
    ///     registry.dispatch("?", "?shout hi"),
    ///     Err(InvocationError::UnknownCommand(name)) if name == "shout"
    /// ));
    /// ```
    pub fn dispatch(&self, prefix: &str, message: &str) -> Result<Invocation, InvocationError> {
        let message = message.trim();
        let body = strip_prefix_ignore_case(message, prefix).ok_or(InvocationError::NotACommand)?;
        let name = body
            .split_whitespace()
            .next()
            .ok_or(InvocationError::NotACommand)?;
        let command = self
            .get(name)
            .ok_or_else(|| InvocationError::UnknownCommand(name.to_string()))?;
        let definition = &command.definition;

        let extracted = extract(
            self.cache(),
            prefix,
            &definition.arguments,
            &definition.syntax,
            message,
        );

        if let Some(e) = &extracted.compile_error {
            return Err(InvocationError::Internal {
                command: definition.name.clone(),
                detail: e.to_string(),
            });
        }
        if let Some(inconsistency) = extracted.inconsistent_key_offs.first() {
            return Err(InvocationError::InconsistentKeyOffs {
                command: definition.name.clone(),
                argument: inconsistency.argument_name.clone(),
            });
        }
        if let Some(id) = &extracted.missing_capture {
            return Err(InvocationError::Internal {
                command: definition.name.clone(),
                detail: format!("required argument `{id}` was not captured"),
            });
        }
        if !extracted.succeeded {
            debug!(command = %definition.name, "Invocation does not match syntax");
            return Err(InvocationError::Malformed {
                command: definition.name.clone(),
                usage: command.usage(prefix),
            });
        }

        let arguments = command
            .specification
            .bind(&extracted.values_as_json())
            .map_err(|failure| {
                debug!(
                    command = %definition.name,
                    failure = ?failure.lines(),
                    "Arguments rejected by specification"
                );
                InvocationError::InvalidArguments {
                    command: definition.name.clone(),
                    failure,
                }
            })?;

        Ok(Invocation {
            command: definition.name.clone(),
            arguments,
        })
    }

    /// [`dispatch`](Self::dispatch) with the registry's default prefix.
    pub fn dispatch_default(&self, message: &str) -> Result<Invocation, InvocationError> {
        self.dispatch(self.prefix(), message).inspect_err(|e| {
            if !e.is_user_error() {
                error!(error = %e, "Dispatch failed");
            }
        })
    }
}

fn strip_prefix_ignore_case<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    let head = message.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        message.get(prefix.len()..)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommandDefinition;
    use command_syntax_core::DeclaredArgument;
    use command_syntax_structure::leaves::UINT4_LIKE;

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new("%");
        registry
            .register(
                CommandDefinition::new("ban", "<prefix>ban $1{opt $2}[ with reason]{opt $2}[: $2]")
                    .with_argument(DeclaredArgument::required("user", "User"))
                    .with_argument(DeclaredArgument::optional("reason", "Reason")),
            )
            .unwrap();
        registry
            .register(
                CommandDefinition::new("slow", "<prefix>slow $1")
                    .with_argument(
                        DeclaredArgument::required("seconds", "Seconds")
                            .with_constraint(UINT4_LIKE.clone()),
                    ),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_strip_prefix_ignore_case() {
        assert_eq!(strip_prefix_ignore_case("BOT!ping", "bot!"), Some("ping"));
        assert_eq!(strip_prefix_ignore_case("ping", "bot!"), None);
        assert_eq!(strip_prefix_ignore_case("é", "a"), None);
    }

    #[test]
    fn test_not_a_command() {
        let registry = registry();
        assert!(matches!(
            registry.dispatch("%", "hello"),
            Err(InvocationError::NotACommand)
        ));
        assert!(matches!(
            registry.dispatch("%", "%   "),
            Err(InvocationError::NotACommand)
        ));
    }

    #[test]
    fn test_inconsistent_key_offs() {
        let err = registry().dispatch("%", "%ban bob: spam").unwrap_err();
        assert!(matches!(
            &err,
            InvocationError::InconsistentKeyOffs { argument, .. } if argument == "Reason"
        ));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_malformed_reports_usage_for_active_prefix() {
        let err = registry().dispatch("?", "?slow").unwrap_err();
        assert_eq!(err.user_message(), "Usage: ?slow <Seconds>");
    }

    #[test]
    fn test_invalid_arguments_name_the_argument() {
        let err = registry().dispatch("%", "%slow forever").unwrap_err();
        match &err {
            InvocationError::InvalidArguments { command, failure } => {
                assert_eq!(command, "slow");
                assert!(failure.mentions("seconds"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(err.user_message().starts_with("seconds"));
    }

    #[test]
    fn test_dispatch_default_prefix() {
        let invocation = registry().dispatch_default("%slow 30").unwrap();
        assert_eq!(invocation.command, "slow");
        assert_eq!(invocation.arguments.get("seconds"), Some(&serde_json::json!(30)));
    }
}
