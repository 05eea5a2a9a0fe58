// tagsieve/src/commands/sanitize.rs
//! The `sanitize` command: write the clean markup, report the changes.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::{debug, info};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tagsieve_core::{SanitizationEngine, ScanResult};

use crate::commands::{info_msg, warn_msg};
use crate::ui::theme::ThemeMap;
use crate::ui::{diagnostics_summary, diff_viewer};

/// Options for `run_sanitize`.
pub struct SanitizeOptions {
    pub input: String,
    pub output_path: Option<PathBuf>,
    pub json: bool,
    pub diff: bool,
    pub no_diagnostics: bool,
    pub quiet: bool,
}

pub fn run_sanitize(
    engine: &dyn SanitizationEngine,
    opts: SanitizeOptions,
    theme: &ThemeMap,
) -> Result<ScanResult> {
    info!("Starting sanitize operation.");
    if opts.input.trim().is_empty() && !opts.quiet {
        warn_msg("Input is empty; nothing to sanitize.", theme);
    }
    let result = engine.scan(&opts.input).context("Sanitization failed")?;
    debug!(
        "Input length: {}, clean length: {}, diagnostics: {}",
        opts.input.len(),
        result.clean_output().len(),
        result.diagnostics().len()
    );

    write_primary_output(&opts, &result, theme)?;

    if !opts.no_diagnostics && !opts.quiet && !opts.json {
        let colors = io::stderr().is_terminal();
        diagnostics_summary::print_summary(&result, &mut io::stderr(), theme, colors)?;
    }
    info!("Sanitize operation completed.");
    Ok(result)
}

fn write_primary_output(opts: &SanitizeOptions, result: &ScanResult, theme: &ThemeMap) -> Result<()> {
    match &opts.output_path {
        Some(path) => {
            if !opts.quiet {
                info_msg(format!("Writing clean output to file: {}", path.display()), theme);
            }
            let mut file = fs::File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            render(opts, result, &mut file, theme, false)
        }
        None => {
            let stdout = io::stdout();
            let colors = stdout.is_terminal();
            let mut writer = stdout.lock();
            render(opts, result, &mut writer, theme, colors)
        }
    }
}

fn render<W: Write>(
    opts: &SanitizeOptions,
    result: &ScanResult,
    writer: &mut W,
    theme: &ThemeMap,
    colors: bool,
) -> Result<()> {
    if opts.json {
        writeln!(writer, "{}", result.to_json().context("Failed to serialize scan result")?)?;
    } else if opts.diff {
        diff_viewer::print_diff(&opts.input, result.clean_output(), writer, theme, colors)?;
    } else {
        writeln!(writer, "{}", result.clean_output())?;
    }
    Ok(())
}
