// tagsieve-css/src/lib.rs
//! CSS parsing for tagsieve.
//!
//! Tokenizing is left to `cssparser`, so escapes, comments, strings and
//! `url(...)` tokens are read exactly the way a browser reads them. On top of
//! that this crate builds a small rule tree and serializes every selector,
//! prelude and value back out from its tokens, never from the source text.

pub mod error;
pub mod parser;
pub mod stylesheet;
pub mod tokens;

pub use error::ParseError;
pub use parser::{parse_declarations, parse_stylesheet, MAX_BLOCK_DEPTH};
pub use stylesheet::{
    AtRule, Declaration, DeclarationAtRule, DeclarationBlock, GroupingRule, KeyframeRule,
    KeyframesRule, Rule, StyleRule, StyleSheet,
};
pub use tokens::TokenText;
