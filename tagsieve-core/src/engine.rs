// tagsieve-core/src/engine.rs
//! Defines the core SanitizationEngine trait.
//!
//! The trait decouples hosts (the CLI, services embedding the library) from
//! the concrete scanner, so a host can hold a `Box<dyn SanitizationEngine>`
//! and share it across threads.
//!
//! License: MIT OR APACHE 2.0

use crate::errors::SieveError;
use crate::policy::Policy;
use crate::scan_result::ScanResult;

/// A trait that defines the core functionality of a sanitization engine.
pub trait SanitizationEngine: Send + Sync {
    /// Sanitizes `markup` and reports every change made.
    ///
    /// Fails only for input larger than the policy's `maxInputSize` or for
    /// markup that cannot be parsed at all. Disallowed content is not an
    /// error; it shows up in the result's diagnostics.
    fn scan(&self, markup: &str) -> Result<ScanResult, SieveError>;

    /// Returns a reference to the policy the engine enforces.
    fn policy(&self) -> &Policy;
}
