//! errors.rs - Custom error types for the tagsieve-core library.
//!
//! Policy errors are fatal at load time and the input size and markup errors
//! are fatal for a single scan. CSS parse failures are caught by the rewriter,
//! which drops the offending node or attribute and keeps going.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `tagsieve-core` library.
///
/// Rejected tags, attributes and CSS properties are not errors. They are
/// ordinary sanitization outcomes and only show up as diagnostics.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SieveError {
    #[error("Failed to read policy file '{path}': {source}")]
    PolicyIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Policy parsing error: {0}")]
    PolicyFormat(String),

    #[error("Regular expression '{name}' was referenced in the definition of '{owner}', but does not exist in <common-regexps>")]
    UndefinedRegexp { name: String, owner: String },

    #[error("Attribute '{name}' was referenced in the definition of '{owner}', but does not exist in <common-attributes>")]
    UndefinedAttribute { name: String, owner: String },

    #[error("Failed to compile pattern for '{0}': {1}")]
    PatternCompilation(String, regex::Error),

    #[error("'{0}': pattern length ({1}) exceeds maximum allowed ({2})")]
    PatternLengthExceeded(String, usize, usize),

    #[error("Directive '{name}' has a malformed value '{value}'")]
    InvalidDirective { name: String, value: String },

    #[error("File size [{size}] is larger than maximum [{max}]")]
    InputTooLarge { size: usize, max: usize },

    #[error("Markup could not be parsed: {0}")]
    MarkupParse(String),

    #[error("Css could not be parsed: {0}")]
    CssParse(#[from] tagsieve_css::ParseError),

    #[error("Css output would terminate its <style> element early")]
    UnsafeStylesheet,

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

impl SieveError {
    /// True for errors raised while loading or building a policy.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SieveError::PolicyIo { .. }
                | SieveError::PolicyFormat(_)
                | SieveError::UndefinedRegexp { .. }
                | SieveError::UndefinedAttribute { .. }
                | SieveError::PatternCompilation(..)
                | SieveError::PatternLengthExceeded(..)
                | SieveError::InvalidDirective { .. }
        )
    }
}
