//! The immutable policy model consulted by every scan.
//!
//! A `Policy` is produced once, either by the XML loader (`loader`) or by a
//! `PolicyBuilder`, and is then only read. All patterns it holds are already
//! compiled and every attribute reference is already resolved, so a policy
//! can be shared across threads behind an `Arc` without any locking.
//!
//! License: MIT OR APACHE 2.0

pub mod compiler;
pub mod loader;

use log::warn;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::errors::SieveError;
pub use compiler::{Pattern, PatternCache, MAX_PATTERN_LENGTH};

/// Default for the `maxInputSize` directive.
pub const DEFAULT_MAX_INPUT_SIZE: usize = 100_000;
/// Default for the `maxNestingDepth` directive.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;
/// Default for the `allowedCssUrlSchemes` directive.
pub const DEFAULT_CSS_URL_SCHEMES: &[&str] = &["http", "https"];

pub const MAX_INPUT_SIZE: &str = "maxInputSize";
pub const MAX_NESTING_DEPTH: &str = "maxNestingDepth";
pub const PRESERVE_COMMENTS: &str = "preserveComments";
pub const ALLOWED_CSS_URL_SCHEMES: &str = "allowedCssUrlSchemes";

/// What happens to an element, keyed by its tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagAction {
    /// Keep the element, check its attributes, then its children.
    Validate,
    /// Drop the element but keep its processed children in its place.
    Filter,
    /// Drop the element and everything inside it.
    Remove,
    /// Keep the element with no attributes and only its text and comments.
    Truncate,
}

impl TagAction {
    /// Parses the policy spelling, ignoring case. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "validate" => Some(TagAction::Validate),
            "filter" => Some(TagAction::Filter),
            "remove" => Some(TagAction::Remove),
            "truncate" => Some(TagAction::Truncate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TagAction::Validate => "validate",
            TagAction::Filter => "filter",
            TagAction::Remove => "remove",
            TagAction::Truncate => "truncate",
        }
    }
}

impl fmt::Display for TagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response to an attribute (or CSS property) whose value fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OnInvalid {
    #[default]
    RemoveAttribute,
    RemoveTag,
    FilterTag,
}

impl OnInvalid {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            v if v.eq_ignore_ascii_case("removeAttribute") => Some(OnInvalid::RemoveAttribute),
            v if v.eq_ignore_ascii_case("removeTag") => Some(OnInvalid::RemoveTag),
            v if v.eq_ignore_ascii_case("filterTag") => Some(OnInvalid::FilterTag),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OnInvalid::RemoveAttribute => "removeAttribute",
            OnInvalid::RemoveTag => "removeTag",
            OnInvalid::FilterTag => "filterTag",
        }
    }
}

impl fmt::Display for OnInvalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive comparison used for literals and names.
pub(crate) fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// An allowed attribute and the values it may carry.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeRule {
    pub name: String,
    pub allowed_literals: Vec<String>,
    pub allowed_patterns: Vec<Pattern>,
    pub on_invalid: OnInvalid,
    pub description: Option<String>,
}

impl AttributeRule {
    /// A presence-only rule: any value is accepted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_literals: Vec::new(),
            allowed_patterns: Vec::new(),
            on_invalid: OnInvalid::default(),
            description: None,
        }
    }

    pub fn with_literals<I, S>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_literals.extend(literals.into_iter().map(Into::into));
        self
    }

    /// Compiles and appends an inline pattern.
    pub fn with_pattern(mut self, source: &str) -> Result<Self, SieveError> {
        let pattern = Pattern::new(&self.name, source)?;
        self.allowed_patterns.push(pattern);
        Ok(self)
    }

    pub fn on_invalid(mut self, action: OnInvalid) -> Self {
        self.on_invalid = action;
        self
    }

    /// True when the rule carries neither literals nor patterns.
    pub fn is_presence_only(&self) -> bool {
        self.allowed_literals.is_empty() && self.allowed_patterns.is_empty()
    }

    /// Literals first, then patterns, both in policy order; first hit wins.
    pub fn accepts(&self, value: &str) -> bool {
        if self.is_presence_only() {
            return true;
        }
        self.allowed_literals.iter().any(|lit| eq_ignore_case(lit, value))
            || self.allowed_patterns.iter().any(|p| p.is_full_match(value))
    }
}

/// An allowed CSS property and the values it may take.
#[derive(Debug, Clone, PartialEq)]
pub struct CssPropertyRule {
    pub name: String,
    pub allowed_literals: Vec<String>,
    pub allowed_patterns: Vec<Pattern>,
    /// Other properties whose constraints the value must also satisfy.
    pub shorthand_refs: Vec<String>,
    pub on_invalid: OnInvalid,
    pub description: Option<String>,
    pub default_value: Option<String>,
}

impl CssPropertyRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allowed_literals: Vec::new(),
            allowed_patterns: Vec::new(),
            shorthand_refs: Vec::new(),
            on_invalid: OnInvalid::default(),
            description: None,
            default_value: None,
        }
    }

    pub fn with_literals<I, S>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_literals.extend(literals.into_iter().map(Into::into));
        self
    }

    pub fn with_pattern(mut self, source: &str) -> Result<Self, SieveError> {
        let pattern = Pattern::new(&self.name, source)?;
        self.allowed_patterns.push(pattern);
        Ok(self)
    }

    pub fn with_shorthand(mut self, name: impl Into<String>) -> Self {
        self.shorthand_refs.push(name.into());
        self
    }

    /// Passes when the literal list is empty or contains `value`.
    pub fn literal_allows(&self, value: &str) -> bool {
        self.allowed_literals.is_empty()
            || self.allowed_literals.iter().any(|lit| eq_ignore_case(lit, value))
    }

    /// Passes when the pattern list is empty or one pattern fully matches.
    pub fn pattern_allows(&self, value: &str) -> bool {
        self.allowed_patterns.is_empty()
            || self.allowed_patterns.iter().any(|p| p.is_full_match(value))
    }
}

/// The rule for one tag name.
#[derive(Debug, Clone, PartialEq)]
pub struct TagRule {
    pub name: String,
    pub action: TagAction,
    /// Tag-specific attribute rules keyed by lowercase name.
    pub allowed_attributes: HashMap<String, AttributeRule>,
}

impl TagRule {
    pub fn new(name: impl Into<String>, action: TagAction) -> Self {
        Self {
            name: name.into(),
            action,
            allowed_attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, rule: AttributeRule) -> Self {
        self.allowed_attributes.insert(rule.name.to_lowercase(), rule);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeRule> {
        self.allowed_attributes.get(&name.to_lowercase())
    }
}

/// An immutable, fully resolved sanitization policy.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    directives: HashMap<String, String>,
    common_regexps: HashMap<String, Pattern>,
    common_attributes: HashMap<String, AttributeRule>,
    global_attributes: HashMap<String, AttributeRule>,
    tag_rules: HashMap<String, TagRule>,
    css_rules: HashMap<String, CssPropertyRule>,
}

impl Policy {
    pub fn tag_rule(&self, name: &str) -> Option<&TagRule> {
        self.tag_rules.get(&name.to_lowercase())
    }

    pub fn global_attribute(&self, name: &str) -> Option<&AttributeRule> {
        self.global_attributes.get(&name.to_lowercase())
    }

    pub fn css_property(&self, name: &str) -> Option<&CssPropertyRule> {
        self.css_rules.get(&name.to_lowercase())
    }

    pub fn common_attribute(&self, name: &str) -> Option<&AttributeRule> {
        self.common_attributes.get(&name.to_lowercase())
    }

    /// Common regexp names are case-sensitive.
    pub fn common_regexp(&self, name: &str) -> Option<&Pattern> {
        self.common_regexps.get(name)
    }

    /// Directive names are case-sensitive.
    pub fn directive(&self, name: &str) -> Option<&str> {
        self.directives.get(name).map(String::as_str)
    }

    /// Reads a numeric directive. A missing directive yields `default`; a
    /// present but non-numeric one is an `InvalidDirective` error.
    pub fn directive_as_int(&self, name: &str, default: usize) -> Result<usize, SieveError> {
        match self.directive(name) {
            None => Ok(default),
            Some(raw) => raw.trim().parse().map_err(|_| SieveError::InvalidDirective {
                name: name.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    pub fn directive_as_bool(&self, name: &str, default: bool) -> Result<bool, SieveError> {
        match self.directive(name) {
            None => Ok(default),
            Some(raw) if raw.trim().eq_ignore_ascii_case("true") => Ok(true),
            Some(raw) if raw.trim().eq_ignore_ascii_case("false") => Ok(false),
            Some(raw) => Err(SieveError::InvalidDirective {
                name: name.to_string(),
                value: raw.to_string(),
            }),
        }
    }

    /// Reads a comma-separated directive as lowercase, trimmed entries.
    pub fn directive_as_list(&self, name: &str, default: &[&str]) -> Vec<String> {
        match self.directive(name) {
            None => default.iter().map(|s| s.to_string()).collect(),
            Some(raw) => raw
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    /// Like `directive_as_int`, but logs a malformed value and falls back.
    pub fn int_directive_or_default(&self, name: &str, default: usize) -> usize {
        self.directive_as_int(name, default).unwrap_or_else(|e| {
            warn!("{}. Falling back to the default of {}.", e, default);
            default
        })
    }

    /// Like `directive_as_bool`, but logs a malformed value and falls back.
    pub fn bool_directive_or_default(&self, name: &str, default: bool) -> bool {
        self.directive_as_bool(name, default).unwrap_or_else(|e| {
            warn!("{}. Falling back to the default of {}.", e, default);
            default
        })
    }

    pub fn tag_rules(&self) -> impl Iterator<Item = &TagRule> {
        self.tag_rules.values()
    }

    pub fn css_rules(&self) -> impl Iterator<Item = &CssPropertyRule> {
        self.css_rules.values()
    }

    pub fn global_attributes(&self) -> impl Iterator<Item = &AttributeRule> {
        self.global_attributes.values()
    }

    pub fn directives(&self) -> impl Iterator<Item = (&str, &str)> {
        self.directives.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn common_regexp_count(&self) -> usize {
        self.common_regexps.len()
    }

    pub fn common_attribute_count(&self) -> usize {
        self.common_attributes.len()
    }
}

/// Programmatic construction of a `Policy`.
///
/// Later entries with the same name replace earlier ones, except directives,
/// where the first value set wins as it does in policy files.
#[derive(Debug, Default)]
pub struct PolicyBuilder {
    policy: Policy,
}

impl PolicyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directive(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.policy
            .directives
            .entry(name.into())
            .or_insert_with(|| value.into());
        self
    }

    pub fn common_regexp(mut self, name: impl Into<String>, pattern: Pattern) -> Self {
        self.policy.common_regexps.insert(name.into(), pattern);
        self
    }

    pub fn common_attribute(mut self, rule: AttributeRule) -> Self {
        self.policy
            .common_attributes
            .insert(rule.name.to_lowercase(), rule);
        self
    }

    pub fn global_attribute(mut self, rule: AttributeRule) -> Self {
        self.policy
            .global_attributes
            .insert(rule.name.to_lowercase(), rule);
        self
    }

    pub fn tag(mut self, rule: TagRule) -> Self {
        self.policy.tag_rules.insert(rule.name.to_lowercase(), rule);
        self
    }

    pub fn css_property(mut self, rule: CssPropertyRule) -> Self {
        self.policy.css_rules.insert(rule.name.to_lowercase(), rule);
        self
    }

    pub fn build(self) -> Policy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Policy {
        PolicyBuilder::new()
            .directive(MAX_INPUT_SIZE, "500")
            .directive(MAX_INPUT_SIZE, "900")
            .directive(PRESERVE_COMMENTS, "nope")
            .directive(ALLOWED_CSS_URL_SCHEMES, "HTTPS, data ,")
            .tag(
                TagRule::new("P", TagAction::Validate)
                    .with_attribute(AttributeRule::new("Align").with_literals(["left", "right"])),
            )
            .global_attribute(AttributeRule::new("title"))
            .css_property(CssPropertyRule::new("Color").with_literals(["red"]))
            .build()
    }

    #[test]
    fn test_lookups_ignore_case() {
        let policy = sample();
        assert!(policy.tag_rule("p").is_some());
        assert!(policy.tag_rule("P").is_some());
        assert!(policy.global_attribute("TITLE").is_some());
        assert!(policy.css_property("COLOR").is_some());
        let p = policy.tag_rule("p").unwrap();
        assert!(p.attribute("ALIGN").is_some());
    }

    #[test]
    fn test_directive_parsing() {
        let policy = sample();
        assert_eq!(policy.directive_as_int(MAX_INPUT_SIZE, 1).unwrap(), 500);
        assert_eq!(policy.directive_as_int("missing", 7).unwrap(), 7);
        assert!(matches!(
            policy.directive_as_bool(PRESERVE_COMMENTS, true),
            Err(SieveError::InvalidDirective { .. })
        ));
        assert!(policy.bool_directive_or_default(PRESERVE_COMMENTS, true));
        assert_eq!(
            policy.directive_as_list(ALLOWED_CSS_URL_SCHEMES, DEFAULT_CSS_URL_SCHEMES),
            vec!["https".to_string(), "data".to_string()]
        );
    }

    #[test]
    fn test_malformed_int_directive_falls_back() {
        let policy = PolicyBuilder::new().directive(MAX_INPUT_SIZE, "lots").build();
        assert!(policy.directive_as_int(MAX_INPUT_SIZE, 10).is_err());
        assert_eq!(policy.int_directive_or_default(MAX_INPUT_SIZE, 10), 10);
    }

    #[test]
    fn test_attribute_rule_acceptance() {
        let rule = AttributeRule::new("align")
            .with_literals(["left", "right"])
            .with_pattern("[0-9]+")
            .unwrap();
        assert!(rule.accepts("LEFT"));
        assert!(rule.accepts("42"));
        assert!(!rule.accepts("invalid"));
        assert!(AttributeRule::new("title").accepts("anything at all"));
    }

    #[test]
    fn test_css_rule_checks_are_vacuous_when_empty() {
        let literal_only = CssPropertyRule::new("float").with_literals(["left"]);
        assert!(literal_only.literal_allows("Left"));
        assert!(!literal_only.literal_allows("top"));
        assert!(literal_only.pattern_allows("anything"));

        let pattern_only = CssPropertyRule::new("width").with_pattern("[0-9]+px").unwrap();
        assert!(pattern_only.literal_allows("10px"));
        assert!(pattern_only.pattern_allows("10px"));
        assert!(!pattern_only.pattern_allows("10em"));
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!(TagAction::parse("VALIDATE"), Some(TagAction::Validate));
        assert_eq!(TagAction::parse("truncate"), Some(TagAction::Truncate));
        assert_eq!(TagAction::parse("explode"), None);
        assert_eq!(OnInvalid::parse("filterTag"), Some(OnInvalid::FilterTag));
        assert_eq!(OnInvalid::parse("removetag"), Some(OnInvalid::RemoveTag));
        assert_eq!(OnInvalid::parse(""), None);
    }
}
