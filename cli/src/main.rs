use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use command_syntax_core::{
    DeclaredArgument, KeyOffInconsistency, compile, extract_compiled, render_usage,
};
use command_syntax_registry::{CommandRegistry, RegistryConfig};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Exit status for a message that was rejected by its command.
const EXIT_INVOCATION_ERROR: i32 = 2;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliOutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(name = "syntax-check")]
#[command(about = "Lint, compile and try out chat command syntax strings")]
struct Cli {
    /// Output format.
    #[arg(long, global = true, default_value = "json")]
    format: CliOutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check command manifests for definition errors and lint warnings.
    Lint(LintArgs),
    /// Compile a single syntax string and print the generated pattern.
    Compile(CompileArgs),
    /// Dispatch a message against the commands in a manifest.
    Invoke(InvokeArgs),
}

#[derive(Debug, Args)]
struct LintArgs {
    /// Manifest files (YAML, or JSON with a .json extension).
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Number of manifests checked in parallel (default: number of CPUs).
    #[arg(long)]
    jobs: Option<usize>,
    /// Treat lint warnings as failures.
    #[arg(long)]
    deny_warnings: bool,
}

#[derive(Debug, Args)]
struct CompileArgs {
    /// Syntax string, e.g. "<prefix>role set $1{opt $2}[ TIER $2]".
    #[arg(long)]
    syntax: String,
    /// Declared argument in order; append ":opt" for an optional argument.
    #[arg(long = "arg", value_name = "ID[:opt]")]
    arguments: Vec<String>,
    /// Prefix substituted for <prefix>.
    #[arg(long, default_value = "!")]
    prefix: String,
    /// Message to match against the compiled pattern.
    #[arg(long)]
    message: Option<String>,
}

#[derive(Debug, Args)]
struct InvokeArgs {
    /// Manifest declaring the commands.
    #[arg(long)]
    manifest: PathBuf,
    /// Prefix active for the message (default: the manifest's prefix).
    #[arg(long)]
    prefix: Option<String>,
    /// Message text, including the prefix.
    message: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Lint(args) => run_lint(args, cli.format),
        Command::Compile(args) => run_compile(args, cli.format),
        Command::Invoke(args) => run_invoke(args, cli.format),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

fn emit<T: Serialize>(value: &T, format: CliOutputFormat) -> Result<(), String> {
    let raw = match format {
        CliOutputFormat::Json => serde_json::to_string_pretty(value)
            .map_err(|e| format!("Failed to serialize output: {e}"))?,
        CliOutputFormat::Yaml => {
            serde_yaml::to_string(value).map_err(|e| format!("Failed to serialize output: {e}"))?
        }
    };
    println!("{}", raw.trim_end());
    Ok(())
}

// ---------------------------------------------------------------------------
// lint command
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct LintReport {
    path: PathBuf,
    commands: usize,
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn lint_manifest(path: PathBuf) -> LintReport {
    let mut report = LintReport {
        path,
        commands: 0,
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    let config = match RegistryConfig::load(&report.path) {
        Ok(config) => config,
        Err(e) => {
            report.errors.push(e.to_string());
            return report;
        }
    };
    report.commands = config.commands.len();

    let (registry, failures) = CommandRegistry::from_config_partial(&config);
    report.warnings = registry.warnings().iter().map(ToString::to_string).collect();
    report.errors = failures.iter().map(ToString::to_string).collect();
    report
}

fn run_lint(args: LintArgs, format: CliOutputFormat) -> Result<i32, String> {
    use rayon::prelude::*;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;

    let reports: Vec<LintReport> =
        pool.install(|| args.inputs.into_par_iter().map(lint_manifest).collect());

    let errors: usize = reports.iter().map(|r| r.errors.len()).sum();
    let warnings: usize = reports.iter().map(|r| r.warnings.len()).sum();
    info!(
        manifests = reports.len(),
        errors, warnings, "Lint finished"
    );

    emit(&reports, format)?;

    let failed = errors > 0 || (args.deny_warnings && warnings > 0);
    Ok(if failed { 1 } else { 0 })
}

// ---------------------------------------------------------------------------
// compile command
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct CompileOutput {
    pattern: String,
    keyoff_counts: BTreeMap<usize, usize>,
    usage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    extraction: Option<ExtractionOutput>,
}

#[derive(Debug, Serialize)]
struct ExtractionOutput {
    succeeded: bool,
    values: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    inconsistent_key_offs: Vec<KeyOffInconsistency>,
}

fn parse_argument(declaration: &str) -> Result<DeclaredArgument, String> {
    let (id, optional) = match declaration.split_once(':') {
        Some((id, "opt")) => (id, true),
        Some((_, modifier)) => {
            return Err(format!(
                "Unknown argument modifier '{modifier}' in '{declaration}' (expected ':opt')"
            ));
        }
        None => (declaration, false),
    };
    if id.is_empty() {
        return Err(format!("Argument '{declaration}' has an empty id"));
    }
    Ok(if optional {
        DeclaredArgument::optional(id, id)
    } else {
        DeclaredArgument::required(id, id)
    })
}

fn run_compile(args: CompileArgs, format: CliOutputFormat) -> Result<i32, String> {
    let arguments = args
        .arguments
        .iter()
        .map(|declaration| parse_argument(declaration))
        .collect::<Result<Vec<_>, _>>()?;

    let compiled = compile(&args.prefix, &arguments, &args.syntax)
        .map_err(|e| format!("Invalid syntax string: {e}"))?;
    debug!(pattern = %compiled.pattern().as_str(), "Compiled");

    let extraction = args.message.as_deref().map(|message| {
        let result = extract_compiled(&compiled, &arguments, message);
        ExtractionOutput {
            succeeded: result.succeeded,
            values: result.values,
            inconsistent_key_offs: result.inconsistent_key_offs,
        }
    });
    let matched = extraction.as_ref().is_none_or(|e| e.succeeded);

    emit(
        &CompileOutput {
            pattern: compiled.pattern().as_str().to_string(),
            keyoff_counts: compiled.keyoff_counts().clone(),
            usage: render_usage(&args.prefix, &arguments, compiled.segments()),
            extraction,
        },
        format,
    )?;

    Ok(if matched { 0 } else { EXIT_INVOCATION_ERROR })
}

// ---------------------------------------------------------------------------
// invoke command
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct InvokeFailure {
    error: String,
    reply: String,
}

fn run_invoke(args: InvokeArgs, format: CliOutputFormat) -> Result<i32, String> {
    let registry = CommandRegistry::load(&args.manifest).map_err(|e| {
        format!(
            "Failed to load manifest '{}': {e}",
            args.manifest.display()
        )
    })?;
    let prefix = args
        .prefix
        .unwrap_or_else(|| registry.prefix().to_string());

    match registry.dispatch(&prefix, &args.message) {
        Ok(invocation) => {
            emit(&invocation, format)?;
            Ok(0)
        }
        Err(e) if e.is_user_error() => {
            emit(
                &InvokeFailure {
                    error: e.to_string(),
                    reply: e.user_message(),
                },
                format,
            )?;
            Ok(EXIT_INVOCATION_ERROR)
        }
        Err(e) => Err(e.to_string()),
    }
}
