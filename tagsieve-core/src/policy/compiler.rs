//! compiler.rs - Compiles policy patterns into anchored regular expressions.
//!
//! Every pattern in a policy is compiled exactly once, while the policy is
//! loaded. A `PatternCache` lives for the duration of one load so that a
//! common regexp referenced by many attributes is compiled a single time.
//! Nothing is compiled at scan time.
//!
//! License: MIT OR APACHE 2.0

use log::debug;
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::fmt;

use crate::errors::SieveError;

/// Maximum allowed length for a pattern string.
pub const MAX_PATTERN_LENGTH: usize = 1000;

/// Upper bound on the compiled size of a single pattern.
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// A compiled allow-list pattern. Matching is always a full match of the
/// value, whatever anchors the source text does or does not carry.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a pattern without going through a cache.
    pub fn new(owner: &str, source: &str) -> Result<Self, SieveError> {
        Ok(Self {
            source: source.to_string(),
            regex: compile_anchored(owner, source)?,
        })
    }

    /// The pattern as written in the policy.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_full_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pattern").field(&self.source).finish()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Compiles `source` wrapped as `^(?:source)$`.
///
/// `owner` names the policy entry the pattern belongs to and only appears in
/// error messages.
pub fn compile_anchored(owner: &str, source: &str) -> Result<Regex, SieveError> {
    if source.len() > MAX_PATTERN_LENGTH {
        return Err(SieveError::PatternLengthExceeded(
            owner.to_string(),
            source.len(),
            MAX_PATTERN_LENGTH,
        ));
    }

    let anchored = format!("^(?:{})$", source);
    RegexBuilder::new(&anchored)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
        .map_err(|e| SieveError::PatternCompilation(owner.to_string(), e))
}

/// A compile-once cache keyed by pattern source.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Pattern>,
    hits: usize,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the compiled pattern for `source`, compiling it on first use.
    pub fn get_or_compile(&mut self, owner: &str, source: &str) -> Result<Pattern, SieveError> {
        if let Some(pattern) = self.compiled.get(source) {
            self.hits += 1;
            debug!("Serving pattern for '{}' from cache.", owner);
            return Ok(pattern.clone());
        }

        let pattern = Pattern::new(owner, source)?;
        debug!("Compiled pattern for '{}'.", owner);
        self.compiled.insert(source.to_string(), pattern.clone());
        Ok(pattern)
    }

    /// Number of distinct patterns compiled so far.
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Number of lookups answered without compiling.
    pub fn hits(&self) -> usize {
        self.hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_are_anchored() {
        let pattern = Pattern::new("align", "left|right").unwrap();
        assert!(pattern.is_full_match("left"));
        assert!(pattern.is_full_match("right"));
        assert!(!pattern.is_full_match("leftish"));
        assert!(!pattern.is_full_match("x right"));
    }

    #[test]
    fn test_explicit_anchors_are_harmless() {
        let pattern = Pattern::new("id", "^[a-z]+$").unwrap();
        assert!(pattern.is_full_match("abc"));
        assert!(!pattern.is_full_match("abc1"));
    }

    #[test]
    fn test_pattern_too_long() {
        let long = "a".repeat(MAX_PATTERN_LENGTH + 1);
        match Pattern::new("long", &long) {
            Err(SieveError::PatternLengthExceeded(owner, len, max)) => {
                assert_eq!(owner, "long");
                assert_eq!(len, MAX_PATTERN_LENGTH + 1);
                assert_eq!(max, MAX_PATTERN_LENGTH);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            Pattern::new("broken", "(unclosed"),
            Err(SieveError::PatternCompilation(owner, _)) if owner == "broken"
        ));
    }

    #[test]
    fn test_cache_compiles_once() {
        let mut cache = PatternCache::new();
        cache.get_or_compile("a", "[0-9]+").unwrap();
        cache.get_or_compile("b", "[0-9]+").unwrap();
        cache.get_or_compile("c", "[a-z]+").unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.hits(), 1);
    }
}
