// tagsieve-core/src/lib.rs
//! # tagsieve Core Library
//!
//! `tagsieve-core` cleans untrusted HTML fragments against a declarative
//! policy. The markup is parsed into a tree, every element is walked in
//! document order and handled according to the policy's tag rules, attribute
//! values are checked against literal lists and anchored patterns, and CSS
//! found in `style` attributes or `<style>` elements is checked property by
//! property. The library returns the serialized clean tree together with a
//! human-readable diagnostic for every change it made.
//!
//! The library does no I/O beyond reading policy files and keeps no state
//! between scans, so one loaded [`Policy`] can serve any number of scans on
//! any number of threads.
//!
//! ## Modules
//!
//! * `policy`: The policy model, its XML loader and the pattern compiler.
//! * `engine`: Defines the `SanitizationEngine` trait.
//! * `engines`: Contains the html5ever-backed `HtmlScanner`.
//! * `rewriter`: The tree walk that applies tag actions.
//! * `validators`: Per-attribute decisions.
//! * `css_scanner`: Property, value and url checks for CSS.
//! * `scan_result`: The output record and its diagnostics.
//! * `preprocess`, `entities`: Input normalization and entity handling.
//! * `headless`: One-shot convenience functions.
//!
//! ## Usage Example
//!
//! ```rust
//! use tagsieve_core::{headless_scan, Policy};
//!
//! fn main() -> Result<(), tagsieve_core::SieveError> {
//!     let policy = Policy::load_default()?;
//!     let result = headless_scan("<p onclick=\"x()\">hi</p>", &policy)?;
//!     assert_eq!(result.clean_output(), "<p>hi</p>");
//!     assert_eq!(result.diagnostics().len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! License: MIT OR APACHE 2.0

pub mod css_scanner;
mod dom;
pub mod engine;
pub mod engines;
pub mod entities;
pub mod errors;
pub mod headless;
pub mod policy;
pub mod preprocess;
pub mod rewriter;
pub mod scan_result;
pub mod validators;

pub use css_scanner::{CssOutcome, CssScanner};
pub use engine::SanitizationEngine;
pub use engines::html_scanner::HtmlScanner;
pub use errors::SieveError;
pub use headless::{headless_sanitize_string, headless_scan};
pub use policy::{
    AttributeRule, CssPropertyRule, OnInvalid, Pattern, Policy, PolicyBuilder, TagAction, TagRule,
};
pub use scan_result::{Diagnostic, DiagnosticKind, ScanResult};
