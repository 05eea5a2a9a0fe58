use thiserror::Error;

/// Reasons a stylesheet or declaration list was refused by the parser.
///
/// Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("invalid rule at line {line}, column {column}: '{rule}'")]
    InvalidRule { line: u32, column: u32, rule: String },

    #[error("blocks are nested deeper than {limit}")]
    NestingTooDeep { limit: usize },
}

/// Custom error carried through `cssparser` while a rule is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Invalid {
    TooDeep,
    Misplaced,
}
