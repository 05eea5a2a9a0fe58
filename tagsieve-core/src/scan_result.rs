// tagsieve-core/src/scan_result.rs
//! The outcome of a scan: clean markup plus the diagnostics explaining every
//! change that was made to reach it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// What kind of change a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A tag was dropped and its contents kept.
    TagFiltered,
    /// A tag was dropped together with its contents.
    TagRemoved,
    /// An element sat deeper than `maxNestingDepth` and was dropped.
    NestingTooDeep,
    /// An attribute with no rule, or stripped by a truncating tag.
    AttributeRemoved,
    /// An attribute whose value failed its rule.
    AttributeInvalid,
    /// A CSS declaration that failed the policy.
    CssPropertyRemoved,
    /// A CSS at-rule that is never allowed.
    CssRuleRemoved,
    /// CSS that could not be parsed, so its node or attribute was dropped.
    CssUnparseable,
}

impl DiagnosticKind {
    /// Every kind, in the order summaries list them.
    pub const ALL: [DiagnosticKind; 8] = [
        DiagnosticKind::TagFiltered,
        DiagnosticKind::TagRemoved,
        DiagnosticKind::NestingTooDeep,
        DiagnosticKind::AttributeRemoved,
        DiagnosticKind::AttributeInvalid,
        DiagnosticKind::CssPropertyRemoved,
        DiagnosticKind::CssRuleRemoved,
        DiagnosticKind::CssUnparseable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::TagFiltered => "tag_filtered",
            DiagnosticKind::TagRemoved => "tag_removed",
            DiagnosticKind::NestingTooDeep => "nesting_too_deep",
            DiagnosticKind::AttributeRemoved => "attribute_removed",
            DiagnosticKind::AttributeInvalid => "attribute_invalid",
            DiagnosticKind::CssPropertyRemoved => "css_property_removed",
            DiagnosticKind::CssRuleRemoved => "css_rule_removed",
            DiagnosticKind::CssUnparseable => "css_unparseable",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single human-readable message. Any part of it that came from the input
/// has been HTML-entity-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Immutable result of one scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    clean_output: String,
    diagnostics: Vec<Diagnostic>,
    elapsed: Duration,
    scanned_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn new(
        clean_output: String,
        diagnostics: Vec<Diagnostic>,
        elapsed: Duration,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            clean_output,
            diagnostics,
            elapsed,
            scanned_at,
        }
    }

    /// The sanitized markup.
    pub fn clean_output(&self) -> &str {
        &self.clean_output
    }

    /// Diagnostics in the order the changes were made.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Just the message texts.
    pub fn error_messages(&self) -> Vec<&str> {
        self.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// True when the input needed no changes.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    pub fn into_clean_output(self) -> String {
        self.clean_output
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
