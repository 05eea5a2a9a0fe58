// tagsieve/src/commands/policy.rs
//! The `policy` command: load a policy and describe what it allows.

use anyhow::Result;
use is_terminal::IsTerminal;
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::Path;
use tagsieve_core::{Policy, TagAction};

use crate::commands::load_policy;
use crate::ui::output_format::styled;
use crate::ui::theme::{ThemeEntry, ThemeMap};

pub fn run_policy(path: Option<&Path>, verbose: bool, theme: &ThemeMap) -> Result<()> {
    let policy = load_policy(path)?;
    let stdout = io::stdout();
    let colors = stdout.is_terminal();
    let mut writer = stdout.lock();
    let source = path.map_or_else(|| "built-in policy".to_string(), |p| p.display().to_string());
    write_summary(&policy, &source, verbose, &mut writer, theme, colors)?;
    Ok(())
}

pub fn write_summary<W: Write>(
    policy: &Policy,
    source: &str,
    verbose: bool,
    writer: &mut W,
    theme: &ThemeMap,
    colors: bool,
) -> io::Result<()> {
    writeln!(
        writer,
        "{}",
        styled(&format!("Policy: {}", source), ThemeEntry::Header, theme, colors)
    )?;

    let directives: BTreeMap<&str, &str> = policy.directives().collect();
    writeln!(writer, "Directives ({}):", directives.len())?;
    for (name, value) in &directives {
        writeln!(writer, "  {} = {}", name, value)?;
    }

    let mut by_action: BTreeMap<&'static str, Vec<&str>> = BTreeMap::new();
    for rule in policy.tag_rules() {
        by_action
            .entry(rule.action.as_str())
            .or_default()
            .push(rule.name.as_str());
    }
    let total_tags: usize = by_action.values().map(Vec::len).sum();
    writeln!(writer, "Tag rules ({}):", total_tags)?;
    for action in [TagAction::Validate, TagAction::Filter, TagAction::Truncate, TagAction::Remove] {
        let Some(names) = by_action.get_mut(action.as_str()) else {
            continue;
        };
        names.sort_unstable();
        write!(
            writer,
            "  {}: {}",
            styled(action.as_str(), ThemeEntry::SummaryKind, theme, colors),
            styled(&names.len().to_string(), ThemeEntry::SummaryCount, theme, colors)
        )?;
        if verbose {
            write!(writer, " ({})", names.join(", "))?;
        }
        writeln!(writer)?;
    }

    let mut globals: Vec<&str> = policy.global_attributes().map(|a| a.name.as_str()).collect();
    globals.sort_unstable();
    writeln!(writer, "Global attributes ({}): {}", globals.len(), globals.join(", "))?;

    let mut properties: Vec<&str> = policy.css_rules().map(|r| r.name.as_str()).collect();
    properties.sort_unstable();
    write!(writer, "CSS properties ({})", properties.len())?;
    if verbose && !properties.is_empty() {
        write!(writer, ": {}", properties.join(", "))?;
    }
    writeln!(writer)?;

    writeln!(
        writer,
        "Common regexps: {}, common attributes: {}",
        policy.common_regexp_count(),
        policy.common_attribute_count()
    )
}
