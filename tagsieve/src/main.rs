// tagsieve/src/main.rs
//! tagsieve entry point.
//!
//! Parses the command line, installs the logger and theme, and dispatches to
//! the command implementations.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;

use tagsieve::cli::{Cli, Commands};
use tagsieve::commands::{self, check, policy, sanitize};
use tagsieve::logger;
use tagsieve::ui::theme::{build_theme_map, ThemeMap, ThemeStyle};

fn main() -> ExitCode {
    let args = Cli::parse();
    logger::init_logger(logger::level_for_flags(args.quiet, args.debug, args.disable_debug));

    let theme = match build_theme_map(args.theme.as_deref()).context("Theme error") {
        Ok(theme) => theme,
        Err(e) => {
            commands::error_msg(format!("{:#}", e), &ThemeStyle::default_theme_map());
            return ExitCode::FAILURE;
        }
    };

    match run(args, &theme) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            log::debug!("Command failed: {:?}", e);
            commands::error_msg(format!("{:#}", e), &theme);
            ExitCode::FAILURE
        }
    }
}

/// Runs the selected command. `Ok(false)` means it ran but the input failed
/// the check threshold.
fn run(args: Cli, theme: &ThemeMap) -> Result<bool> {
    match args.command {
        Commands::Sanitize(cmd) => {
            let engine = commands::build_engine(cmd.policy.as_deref())?;
            let input = commands::read_input(cmd.input_file.as_deref())?;
            let opts = sanitize::SanitizeOptions {
                input,
                output_path: cmd.output,
                json: cmd.json,
                diff: cmd.diff,
                no_diagnostics: cmd.no_diagnostics,
                quiet: args.quiet,
            };
            sanitize::run_sanitize(&engine, opts, theme)?;
            Ok(true)
        }
        Commands::Check(cmd) => {
            let engine = commands::build_engine(cmd.policy.as_deref())?;
            let input = commands::read_input(cmd.input_file.as_deref())?;
            let opts = check::CheckOptions {
                input,
                fail_over_threshold: cmd.fail_over_threshold,
                json_file: cmd.json_file,
                json_stdout: cmd.json_stdout,
                quiet: args.quiet,
            };
            check::run_check(&engine, opts, theme)
        }
        Commands::Policy(cmd) => {
            policy::run_policy(cmd.path.as_deref(), cmd.verbose, theme)?;
            Ok(true)
        }
    }
}
