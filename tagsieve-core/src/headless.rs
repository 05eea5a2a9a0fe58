// tagsieve-core/src/headless.rs

//! `headless.rs`
//! Convenience wrappers for one-shot scans without constructing an engine.

use crate::engines::html_scanner::scan_with_policy;
use crate::errors::SieveError;
use crate::policy::Policy;
use crate::scan_result::ScanResult;

/// Scans `markup` against `policy`.
///
/// This is the primary entry point for non-interactive use when the caller
/// already owns a policy and has no need for a `SanitizationEngine`.
pub fn headless_scan(markup: &str, policy: &Policy) -> Result<ScanResult, SieveError> {
    scan_with_policy(markup, policy)
}

/// Scans `markup` and returns only the clean output.
pub fn headless_sanitize_string(markup: &str, policy: &Policy) -> Result<String, SieveError> {
    headless_scan(markup, policy).map(ScanResult::into_clean_output)
}
