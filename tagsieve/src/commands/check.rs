// tagsieve/src/commands/check.rs
//! The `check` command: report what a scan would change without writing the
//! clean markup, optionally failing past a threshold.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::info;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::PathBuf;
use tagsieve_core::{Diagnostic, DiagnosticKind, SanitizationEngine, ScanResult};

use crate::commands::info_msg;
use crate::ui::diagnostics_summary;
use crate::ui::theme::ThemeMap;

/// Options for `run_check`.
pub struct CheckOptions {
    pub input: String,
    pub fail_over_threshold: Option<usize>,
    pub json_file: Option<PathBuf>,
    pub json_stdout: bool,
    pub quiet: bool,
}

/// The JSON form of a check.
#[derive(Debug, Serialize)]
pub struct CheckReport<'a> {
    pub total: usize,
    pub counts: BTreeMap<&'static str, usize>,
    pub diagnostics: &'a [Diagnostic],
    pub elapsed_ms: u128,
    pub scanned_at: String,
    pub threshold: Option<usize>,
    pub passed: bool,
}

impl<'a> CheckReport<'a> {
    pub fn new(result: &'a ScanResult, threshold: Option<usize>) -> Self {
        let counts = DiagnosticKind::ALL
            .iter()
            .map(|kind| (kind.as_str(), result.count_of(*kind)))
            .filter(|(_, count)| *count > 0)
            .collect();
        let total = result.diagnostics().len();
        Self {
            total,
            counts,
            diagnostics: result.diagnostics(),
            elapsed_ms: result.elapsed().as_millis(),
            scanned_at: result.scanned_at().to_rfc3339(),
            threshold,
            passed: threshold_passed(total, threshold),
        }
    }
}

/// `true` unless a threshold is set and the total goes over it.
pub fn threshold_passed(total: usize, threshold: Option<usize>) -> bool {
    threshold.map_or(true, |limit| total <= limit)
}

/// Runs the check. Returns whether the input stayed within the threshold.
pub fn run_check(engine: &dyn SanitizationEngine, opts: CheckOptions, theme: &ThemeMap) -> Result<bool> {
    info!("Starting check operation.");
    let result = engine.scan(&opts.input).context("Scan failed")?;
    let report = CheckReport::new(&result, opts.fail_over_threshold);

    if let Some(path) = &opts.json_file {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize check report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write JSON report: {}", path.display()))?;
        if !opts.quiet {
            info_msg(format!("Check report written to: {}", path.display()), theme);
        }
    }

    let stdout = io::stdout();
    let colors = stdout.is_terminal();
    let mut writer = stdout.lock();
    if opts.json_stdout {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize check report")?;
        writeln!(writer, "{}", json)?;
    } else {
        diagnostics_summary::print_summary(&result, &mut writer, theme, colors)?;
    }

    if !report.passed {
        if let Some(limit) = opts.fail_over_threshold {
            writeln!(
                writer,
                "Check failed: {} diagnostic(s) exceed the threshold of {}.",
                report.total, limit
            )?;
        }
    }
    info!("Check operation completed.");
    Ok(report.passed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagsieve_core::{headless_scan, Policy};

    #[test]
    fn threshold_semantics() {
        assert!(threshold_passed(5, None));
        assert!(threshold_passed(2, Some(2)));
        assert!(!threshold_passed(3, Some(2)));
    }

    #[test]
    fn report_counts_by_kind() {
        let policy = Policy::load_default().unwrap();
        let result = headless_scan("<x>a</x><y>b</y><p onclick=\"z\">c</p>", &policy).unwrap();
        let report = CheckReport::new(&result, Some(2));
        assert_eq!(report.total, 3);
        assert_eq!(report.counts.get("tag_filtered"), Some(&2));
        assert_eq!(report.counts.get("attribute_removed"), Some(&1));
        assert!(!report.passed);
    }
}
