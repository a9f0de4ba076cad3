//! Command definitions and the registry that validates them.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use command_syntax_core::{
    DeclaredArgument, PatternCache, Specification, SyntaxSegment, keyed_off_arguments,
    referenced_arguments, render_usage,
};
use tracing::{debug, error, info, warn};

use crate::config::{CommandConfig, RegistryConfig};
use crate::error::{DefinitionError, RegistryError, Result};

/// A command as authored: name, syntax string and ordered arguments.
///
/// # Examples
///
/// ```
/// use command_syntax_core::DeclaredArgument;
/// use command_syntax_registry::CommandDefinition;
///
/// let role = CommandDefinition::new("role", "<prefix>role set NAME $1{opt $2}[ TIER $2]")
///     .with_argument(DeclaredArgument::required("name", "Role name"))
///     .with_argument(DeclaredArgument::optional("tier", "Tier"));
/// assert_eq!(role.arguments.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CommandDefinition {
    pub name: String,
    pub syntax: String,
    pub description: Option<String>,
    pub arguments: Vec<DeclaredArgument>,
}

impl CommandDefinition {
    pub fn new(name: &str, syntax: &str) -> Self {
        Self {
            name: name.to_string(),
            syntax: syntax.to_string(),
            description: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_argument(mut self, argument: DeclaredArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Builds a definition from manifest data, resolving constraints.
    pub fn from_config(config: &CommandConfig) -> std::result::Result<Self, DefinitionError> {
        let mut definition = Self::new(&config.name, &config.syntax);
        definition.description = config.description.clone();

        for argument in &config.arguments {
            let mut declared = if argument.optional {
                DeclaredArgument::optional(&argument.id, &argument.name)
            } else {
                DeclaredArgument::required(&argument.id, &argument.name)
            };
            if let Some(constraint) = &argument.constraint {
                let structure =
                    constraint
                        .to_structure()
                        .map_err(|detail| DefinitionError::Constraint {
                            command: config.name.clone(),
                            argument: argument.id.clone(),
                            detail,
                        })?;
                declared = declared.with_erased_constraint(structure);
            }
            definition.arguments.push(declared);
        }
        Ok(definition)
    }
}

/// Non-fatal finding about a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintWarning {
    pub command: String,
    pub message: String,
}

impl fmt::Display for LintWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "command `{}`: {}", self.command, self.message)
    }
}

/// Checks a parsed definition for mistakes the parser accepts.
///
/// - a required argument that is never referenced can never be captured;
/// - an optional argument with no key-off block can never be supplied;
/// - dispatch routes on the first word after the prefix, so the syntax
///   should start with the command name.
pub fn lint(definition: &CommandDefinition, segments: &[SyntaxSegment]) -> Vec<LintWarning> {
    let referenced = referenced_arguments(segments);
    let keyed_off = keyed_off_arguments(segments);
    let mut warnings = Vec::new();
    let mut warn_about = |message: String| {
        warnings.push(LintWarning {
            command: definition.name.clone(),
            message,
        })
    };

    for (index, argument) in definition.arguments.iter().enumerate() {
        let ordinal = index + 1;
        if !argument.optional && !referenced.contains(&ordinal) {
            warn_about(format!(
                "required argument `{}` is never referenced",
                argument.id
            ));
        }
        if argument.optional && !keyed_off.contains(&ordinal) {
            warn_about(format!(
                "optional argument `{}` has no key-off block",
                argument.id
            ));
        }
    }

    let leading_word = match segments.get(1) {
        Some(SyntaxSegment::Literal(text)) => text.split_whitespace().next(),
        _ => None,
    };
    if !leading_word.is_some_and(|word| word.eq_ignore_ascii_case(&definition.name)) {
        warn_about(format!(
            "syntax does not start with the command name `{}`",
            definition.name
        ));
    }

    warnings
}

/// A definition that passed registration.
#[derive(Debug, Clone)]
pub struct RegisteredCommand {
    pub definition: CommandDefinition,
    pub specification: Specification,
    pub segments: Vec<SyntaxSegment>,
    pub warnings: Vec<LintWarning>,
}

impl RegisteredCommand {
    /// Usage text for `prefix`.
    pub fn usage(&self, prefix: &str) -> String {
        render_usage(prefix, &self.definition.arguments, &self.segments)
    }
}

/// Registered commands, keyed by lower-cased name.
///
/// Registration is eager: a definition whose syntax does not compile is
/// rejected immediately and logged, rather than failing on first use.
///
/// # Examples
///
/// ```
/// use command_syntax_core::DeclaredArgument;
/// use command_syntax_registry::{CommandDefinition, CommandRegistry};
///
/// let mut registry = CommandRegistry::new("%");
/// registry
///     .register(CommandDefinition::new("echo", "<prefix>echo $1")
///         .with_argument(DeclaredArgument::required("text", "Text")))
///     .unwrap();
///
/// let broken = CommandDefinition::new("bad", "<prefix>bad $1 $1")
///     .with_argument(DeclaredArgument::required("text", "Text"));
/// assert!(registry.register(broken).is_err());
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Debug)]
pub struct CommandRegistry {
    prefix: String,
    commands: BTreeMap<String, RegisteredCommand>,
    cache: Arc<PatternCache>,
}

impl CommandRegistry {
    pub fn new(prefix: &str) -> Self {
        Self::with_cache(prefix, Arc::new(PatternCache::new()))
    }

    /// Creates a registry sharing an existing pattern cache.
    pub fn with_cache(prefix: &str, cache: Arc<PatternCache>) -> Self {
        Self {
            prefix: prefix.to_string(),
            commands: BTreeMap::new(),
            cache,
        }
    }

    /// Builds a registry from a manifest.
    ///
    /// Every definition is attempted; all failures are returned together.
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        let (registry, mut failures) = Self::from_config_partial(config);

        match failures.len() {
            0 => {
                info!(
                    prefix = %registry.prefix,
                    commands = registry.len(),
                    "Loaded command registry"
                );
                Ok(registry)
            }
            1 => Err(RegistryError::Definition(failures.remove(0))),
            _ => Err(RegistryError::Definitions(failures)),
        }
    }

    /// Registers every valid definition of a manifest and returns the
    /// rejected ones alongside, so lint warnings of the valid commands stay
    /// available when others fail.
    pub fn from_config_partial(config: &RegistryConfig) -> (Self, Vec<DefinitionError>) {
        let mut registry = Self::new(&config.prefix);
        let mut failures = Vec::new();

        for command in &config.commands {
            let outcome = CommandDefinition::from_config(command)
                .and_then(|definition| registry.register(definition).map(|_| ()));
            if let Err(e) = outcome {
                failures.push(e);
            }
        }
        (registry, failures)
    }

    /// Loads a YAML or JSON manifest and registers its commands.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config = RegistryConfig::load(path)?;
        Self::from_config(&config)
    }

    /// Validates, compiles and stores `definition`.
    ///
    /// # Errors
    ///
    /// Returns a [`DefinitionError`] for an invalid or duplicate name,
    /// duplicate argument ids, or a syntax string that fails to compile.
    /// Lint findings are logged and kept on the registered command.
    pub fn register(
        &mut self,
        definition: CommandDefinition,
    ) -> std::result::Result<&RegisteredCommand, DefinitionError> {
        let registered = self.prepare(definition).inspect_err(|e| {
            error!(command = %e.command(), error = %e, "Command definition rejected");
        })?;

        for warning in &registered.warnings {
            warn!(command = %warning.command, "{}", warning.message);
        }
        debug!(
            command = %registered.definition.name,
            syntax = %registered.definition.syntax,
            "Registered command"
        );

        let key = registered.definition.name.to_lowercase();
        Ok(self.commands.entry(key).or_insert(registered))
    }

    fn prepare(
        &self,
        definition: CommandDefinition,
    ) -> std::result::Result<RegisteredCommand, DefinitionError> {
        let name = definition.name.clone();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(DefinitionError::InvalidName(name));
        }
        if self.commands.contains_key(&name.to_lowercase()) {
            return Err(DefinitionError::DuplicateCommand(name));
        }

        let mut seen = HashSet::new();
        for argument in &definition.arguments {
            if !seen.insert(argument.id.as_str()) {
                return Err(DefinitionError::DuplicateArgument {
                    command: name,
                    id: argument.id.clone(),
                });
            }
        }

        let compiled = self
            .cache
            .get_or_compile(&self.prefix, &definition.arguments, &definition.syntax)
            .map_err(|source| DefinitionError::Syntax {
                command: name.clone(),
                source,
            })?;

        let segments = compiled.segments().to_vec();
        let warnings = lint(&definition, &segments);
        Ok(RegisteredCommand {
            specification: Specification::from_arguments(&definition.arguments),
            definition,
            segments,
            warnings,
        })
    }

    /// Looks up a command by name, ignoring case.
    pub fn get(&self, name: &str) -> Option<&RegisteredCommand> {
        self.commands.get(&name.to_lowercase())
    }

    pub fn commands(&self) -> impl Iterator<Item = &RegisteredCommand> {
        self.commands.values()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn cache(&self) -> &Arc<PatternCache> {
        &self.cache
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every lint warning across registered commands, in name order.
    pub fn warnings(&self) -> Vec<&LintWarning> {
        self.commands
            .values()
            .flat_map(|command| command.warnings.iter())
            .collect()
    }
}
