//! Error types for command registration and manifest loading.
//!
//! Registration failures are definition-time errors: the command's own
//! declaration is wrong, so the command must not be registered.

use command_syntax_core::CompileError;
use thiserror::Error;

/// A single command definition that cannot be registered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    /// Command name is empty or contains whitespace.
    #[error("invalid command name {0:?}")]
    InvalidName(String),

    /// A command with the same (case-insensitive) name is already registered.
    #[error("command `{0}` is already registered")]
    DuplicateCommand(String),

    /// Two arguments of one command share an id.
    #[error("command `{command}` declares argument `{id}` more than once")]
    DuplicateArgument { command: String, id: String },

    /// An argument's constraint configuration is unusable.
    #[error("command `{command}`, argument `{argument}`: {detail}")]
    Constraint {
        command: String,
        argument: String,
        detail: String,
    },

    /// The syntax string does not parse or compile.
    #[error("command `{command}` has an invalid syntax string: {source}")]
    Syntax {
        command: String,
        #[source]
        source: CompileError,
    },
}

impl DefinitionError {
    /// Name of the command the error belongs to.
    pub fn command(&self) -> &str {
        match self {
            Self::InvalidName(name) | Self::DuplicateCommand(name) => name,
            Self::DuplicateArgument { command, .. }
            | Self::Constraint { command, .. }
            | Self::Syntax { command, .. } => command,
        }
    }
}

/// Errors that can occur while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Manifest is structurally valid but unusable (e.g. empty prefix).
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),

    /// One command definition was rejected.
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    /// Several command definitions were rejected.
    #[error("{} command definitions are invalid: {}", .0.len(), summarize(.0))]
    Definitions(Vec<DefinitionError>),
}

fn summarize(errors: &[DefinitionError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenience alias for results with [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;
