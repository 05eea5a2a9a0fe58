// tagsieve/src/cli.rs
//! This file defines the command-line interface (CLI) for the tagsieve
//! application, including all available commands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "tagsieve",
    author = "Relay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Clean untrusted HTML against a declarative policy",
    long_about = "tagsieve removes every tag, attribute and CSS property that a policy does not explicitly allow from an HTML fragment, keeping harmless content and structure in place, and explains each change it made.",
    arg_required_else_help = true,
)]
pub struct Cli {
    /// Disable informational messages
    #[arg(long, short = 'q', global = true, help = "Suppress all informational and debug messages.")]
    pub quiet: bool,

    /// Enable debug logging for the tagsieve crates.
    #[arg(long, short = 'd', global = true, help = "Enable debug logging.")]
    pub debug: bool,

    /// Cap tagsieve logging at INFO, even if RUST_LOG asks for more.
    #[arg(long = "disable-debug", global = true, help = "Disable debug logging, overriding RUST_LOG.")]
    pub disable_debug: bool,

    /// Specify the path to a custom YAML theme file.
    #[arg(long = "theme", value_name = "FILE", global = true, help = "Specify the path to a custom YAML theme file.")]
    pub theme: Option<PathBuf>,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// All available commands for the `tagsieve` CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cleans an input file or stdin and writes the clean markup.
    #[command(about = "Cleans an input file or stdin and writes the clean markup.")]
    Sanitize(SanitizeCommand),

    /// Scans an input and reports what would be changed, without writing markup.
    #[command(about = "Scans an input and reports what would be changed, without writing markup.")]
    Check(CheckCommand),

    /// Loads a policy file and prints a summary of it.
    #[command(about = "Loads a policy file (or the built-in policy) and prints a summary of it.")]
    Policy(PolicyCommand),
}

/// Arguments for the `sanitize` command.
#[derive(Parser, Debug)]
pub struct SanitizeCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Write clean output to this file instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE", help = "Write output to a specified file instead of stdout.")]
    pub output: Option<PathBuf>,

    /// Path to a policy XML file.
    #[arg(long = "policy", short = 'p', value_name = "FILE", env = "TAGSIEVE_POLICY", help = "Path to a policy XML file (defaults to the built-in policy).")]
    pub policy: Option<PathBuf>,

    /// Emit the whole scan result as JSON.
    #[arg(long = "json", conflicts_with = "diff", help = "Write the full scan result (clean output and diagnostics) as JSON.")]
    pub json: bool,

    /// Show a unified diff to highlight the changes made.
    #[arg(long, short = 'D', help = "Show a unified diff to highlight the changes made.")]
    pub diff: bool,

    /// Suppress the diagnostics summary.
    #[arg(long = "no-diagnostics", help = "Do not print the diagnostics summary to stderr.")]
    pub no_diagnostics: bool,
}

/// Arguments for the `check` command.
#[derive(Parser, Debug)]
pub struct CheckCommand {
    /// Path to an input file (reads from stdin if not provided).
    #[arg(long, short = 'i', value_name = "FILE", help = "Read input from a specified file instead of stdin.")]
    pub input_file: Option<PathBuf>,

    /// Path to a policy XML file.
    #[arg(long = "policy", short = 'p', value_name = "FILE", env = "TAGSIEVE_POLICY", help = "Path to a policy XML file (defaults to the built-in policy).")]
    pub policy: Option<PathBuf>,

    /// Exit with a non-zero code if the number of diagnostics exceeds this threshold.
    #[arg(long = "fail-over-threshold", value_name = "N", help = "Exit with a non-zero code if the number of diagnostics exceeds this threshold.")]
    pub fail_over_threshold: Option<usize>,

    /// Export the report to a JSON file.
    #[arg(long = "json-file", value_name = "FILE", help = "Export the check report to a JSON file.")]
    pub json_file: Option<PathBuf>,

    /// Print the report as JSON to stdout (conflicts with --json-file).
    #[arg(long = "json-stdout", conflicts_with = "json_file", help = "Print the check report to stdout as JSON.")]
    pub json_stdout: bool,
}

/// Arguments for the `policy` command.
#[derive(Parser, Debug)]
pub struct PolicyCommand {
    /// The policy file to load. The built-in policy is summarized when omitted.
    #[arg(value_name = "FILE", help = "The policy XML file to load.")]
    pub path: Option<PathBuf>,

    /// List every tag rule and CSS property by name.
    #[arg(long, short = 'v', help = "List every tag rule and CSS property by name.")]
    pub verbose: bool,
}
