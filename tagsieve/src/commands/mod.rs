// tagsieve/src/commands/mod.rs
//! Command implementations and the input/policy plumbing they share.

pub mod check;
pub mod policy;
pub mod sanitize;

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::debug;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use tagsieve_core::{HtmlScanner, Policy};

use crate::ui::output_format;
use crate::ui::theme::ThemeMap;

/// Reads the whole input file, or stdin when no file is given.
pub fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => {
            debug!("Reading input from file: {}", path.display());
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))
        }
        None => {
            debug!("Reading input from stdin.");
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            Ok(buffer)
        }
    }
}

/// Loads the policy file when given, otherwise the built-in policy.
pub fn load_policy(path: Option<&Path>) -> Result<Arc<Policy>> {
    match path {
        Some(path) => Policy::from_file(path)
            .map(Arc::new)
            .with_context(|| format!("Failed to load policy '{}'", path.display())),
        None => Policy::shared_default().context("Failed to load the built-in policy"),
    }
}

pub fn build_engine(policy_path: Option<&Path>) -> Result<HtmlScanner> {
    Ok(HtmlScanner::new(load_policy(policy_path)?))
}

/// Helper for printing info messages to stderr.
pub fn info_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = output_format::print_info_message(&mut io::stderr(), msg.as_ref(), theme, colors);
}

/// Helper for printing warning messages to stderr.
pub fn warn_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = output_format::print_warn_message(&mut io::stderr(), msg.as_ref(), theme, colors);
}

/// Helper for printing error messages to stderr.
pub fn error_msg(msg: impl AsRef<str>, theme: &ThemeMap) {
    let colors = io::stderr().is_terminal();
    let _ = output_format::print_error_message(&mut io::stderr(), msg.as_ref(), theme, colors);
}
