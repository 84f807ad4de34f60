//! Ruleset Schema CLI
//!
//! Validates ruleset payloads, lints schema documents, and turns fetched
//! rulesets into payloads ready to be sent back.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use ruleset_schema::{
    lint, load_document, load_json, load_json_str, prepare_payload, ruleset_schema,
    validate_payload, Diagnostic, FileResult, FileStatus, LintResult, LoadError, Severity,
    ValidateError, ValidateOptions, Violation, DEFAULT_ROOT_LABEL, RULESET_SCHEMA_JSON,
};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ruleset-schema")]
#[command(about = "Validate repository ruleset payloads against a declarative schema")]
#[command(version)]
struct Cli {
    /// Log debug details to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a payload and report every violation
    Validate {
        /// Payload JSON file
        payload: PathBuf,

        /// Schema file or URL (bundled ruleset schema when omitted)
        #[arg(long, value_name = "SRC")]
        schema: Option<String>,

        /// Print the outcome as a JSON object on stdout
        #[arg(long)]
        json: bool,

        /// Run the structural pass only
        #[arg(long)]
        no_rules: bool,

        /// Label violation paths are rooted at
        #[arg(long, value_name = "LABEL", default_value = DEFAULT_ROOT_LABEL)]
        root_label: String,
    },

    /// Lint schema documents (a file or every *.json under a directory)
    Lint {
        path: PathBuf,

        #[arg(long, value_enum, default_value_t = LintFormat::Text)]
        format: LintFormat,

        /// Fail on warnings too
        #[arg(long)]
        strict: bool,

        /// Only list files with problems
        #[arg(long, short)]
        quiet: bool,
    },

    /// Strip server-managed fields from a fetched ruleset
    Prepare {
        /// Ruleset JSON as returned by the API
        ruleset: PathBuf,

        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        #[arg(long)]
        pretty: bool,
    },

    /// Print the bundled ruleset schema
    Schema {
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LintFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let outcome = match cli.command {
        Command::Validate {
            payload,
            schema,
            json,
            no_rules,
            root_label,
        } => {
            let options = ValidateOptions::new()
                .root_label(root_label)
                .semantic_rules(!no_rules);
            run_validate(&payload, schema.as_deref(), &options, json)
        }
        Command::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, format, strict, quiet),
        Command::Prepare {
            ruleset,
            output,
            pretty,
        } => run_prepare(&ruleset, output.as_deref(), pretty),
        Command::Schema { pretty } => run_schema(pretty),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose {
        "ruleset_schema=debug"
    } else {
        "ruleset_schema=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run_validate(
    payload_path: &Path,
    schema_source: Option<&str>,
    options: &ValidateOptions,
    json_output: bool,
) -> Result<(), u8> {
    let payload = load_json(payload_path)
        .map_err(|e| load_failure(json_output, "loading payload", &e))?;

    let document = schema_source
        .map_or_else(ruleset_schema, load_document)
        .map_err(|e| load_failure(json_output, "loading schema", &e))?;

    match validate_payload(&document, &payload, options) {
        Ok(()) => {
            if json_output {
                println!("{}", json!({ "valid": true }));
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { violations }) => {
            print_violations(json_output, &violations);
            Err(1)
        }
        Err(ValidateError::Load(e)) => Err(load_failure(json_output, "decoding payload", &e)),
    }
}

fn print_violations(json_output: bool, violations: &[Violation]) {
    if json_output {
        println!("{}", json!({ "valid": false, "errors": violations }));
        return;
    }
    eprintln!("Validation failed:");
    for violation in violations {
        eprintln!("  {}", violation);
    }
}

/// Report a load error and return its exit code.
fn load_failure(json_output: bool, context: &str, error: &LoadError) -> u8 {
    let message = format!("{}: {}", context, error);
    if json_output {
        println!("{}", json!({ "valid": false, "error": message }));
    } else {
        eprintln!("Error: {}", message);
    }
    error.exit_code() as u8
}

fn run_lint(path: &Path, format: LintFormat, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);
    match format {
        LintFormat::Json => {
            let rendered = serde_json::to_string_pretty(&result).map_err(|e| {
                eprintln!("Error: cannot serialize lint result: {}", e);
                2u8
            })?;
            println!("{}", rendered);
        }
        LintFormat::Text => print_lint_report(&result, strict, quiet),
    }

    if result.passes(strict) {
        Ok(())
    } else {
        Err(1)
    }
}

fn print_lint_report(result: &LintResult, strict: bool, quiet: bool) {
    if !quiet {
        println!("Linting {}\n", result.path.display());
    }

    for file in &result.results {
        print_file_result(file, quiet);
    }

    let summary = if result.passes(strict) {
        format!("{} file(s) checked, all passed", result.files_checked)
    } else {
        format!(
            "{} file(s) checked: {} passed, {} failed ({} errors, {} warnings)",
            result.files_checked, result.passed, result.failed, result.errors, result.warnings
        )
    };
    println!("\n{}", summary);
}

fn print_file_result(file: &FileResult, quiet: bool) {
    let label = match file.status {
        FileStatus::Ok if quiet => return,
        FileStatus::Ok => "ok",
        FileStatus::Warning => "warn",
        FileStatus::Error => "FAIL",
    };
    println!("  {:<4} {}", label, file.file.display());

    let shown = file
        .diagnostics
        .iter()
        .filter(|d| !quiet || d.severity == Severity::Error);
    for diagnostic in shown {
        println!("       {}", describe(diagnostic));
    }
}

fn describe(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    format!(
        "{}[{}] {}: {}",
        severity, diagnostic.code, diagnostic.path, diagnostic.message
    )
}

fn run_prepare(ruleset_path: &Path, output: Option<&Path>, pretty: bool) -> Result<(), u8> {
    let ruleset = load_json(ruleset_path).map_err(|e| load_failure(false, "loading ruleset", &e))?;
    emit(&prepare_payload(&ruleset), output, pretty)
}

fn run_schema(pretty: bool) -> Result<(), u8> {
    let schema = load_json_str(RULESET_SCHEMA_JSON)
        .map_err(|e| load_failure(false, "bundled schema", &e))?;
    emit(&schema, None, pretty)
}

fn emit(value: &serde_json::Value, output: Option<&Path>, pretty: bool) -> Result<(), u8> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error: cannot serialize output: {}", e);
        2u8
    })?;

    let Some(path) = output else {
        println!("{}", rendered);
        return Ok(());
    };
    std::fs::write(path, rendered).map_err(|e| {
        eprintln!("Error: cannot write {}: {}", path.display(), e);
        3u8
    })
}
