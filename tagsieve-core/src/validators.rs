//! validators.rs - Decides what happens to a single attribute.
//!
//! The validator never touches the tree. It returns a `Verdict` and the
//! diagnostics that go with it, and the rewriter applies the verdict.
//!
//! License: MIT OR APACHE 2.0

use log::debug;

use crate::css_scanner::CssScanner;
use crate::entities::{decode_entities, encode_for_message};
use crate::policy::{AttributeRule, OnInvalid, Policy, TagRule};
use crate::scan_result::{Diagnostic, DiagnosticKind};

/// What to do with an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Leave the attribute as it is.
    Keep,
    /// Keep the attribute with a new value.
    Replace(String),
    /// Drop the attribute and carry on with the next one.
    Strip,
    /// Drop the whole element and its subtree.
    RemoveTag,
    /// Drop the element but keep its processed children.
    FilterTag,
}

/// A verdict plus the messages explaining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeCheck {
    pub verdict: Verdict,
    pub diagnostics: Vec<Diagnostic>,
}

impl AttributeCheck {
    fn keep() -> Self {
        Self {
            verdict: Verdict::Keep,
            diagnostics: Vec::new(),
        }
    }
}

/// Validates attributes of elements whose tag action is `validate`.
pub struct AttributeValidator<'p> {
    policy: &'p Policy,
}

impl<'p> AttributeValidator<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Self { policy }
    }

    /// Tag-specific rule first, then the global one.
    pub fn resolve(&self, tag: &'p TagRule, name: &str) -> Option<&'p AttributeRule> {
        tag.attribute(name)
            .or_else(|| self.policy.global_attribute(name))
    }

    pub fn check(
        &self,
        tag: &'p TagRule,
        tag_name: &str,
        name: &str,
        value: &str,
        css: &CssScanner<'_>,
    ) -> AttributeCheck {
        let Some(rule) = self.resolve(tag, name) else {
            debug!("No rule for attribute '{}' on <{}>.", name, tag_name);
            return AttributeCheck {
                verdict: Verdict::Strip,
                diagnostics: vec![attribute_removed(tag_name, name)],
            };
        };

        if name == "style" {
            return check_style(tag_name, value, css);
        }

        if rule.is_presence_only() {
            return AttributeCheck::keep();
        }

        let decoded = decode_entities(value);
        if rule.accepts(&decoded) {
            return AttributeCheck::keep();
        }

        debug!(
            "Attribute '{}' on <{}> failed validation; applying {}.",
            name, tag_name, rule.on_invalid
        );
        let verdict = match rule.on_invalid {
            OnInvalid::RemoveTag => Verdict::RemoveTag,
            OnInvalid::FilterTag => Verdict::FilterTag,
            OnInvalid::RemoveAttribute => Verdict::Strip,
        };
        AttributeCheck {
            verdict,
            diagnostics: vec![attribute_invalid(tag_name, name, &decoded, rule.on_invalid)],
        }
    }
}

fn check_style(tag_name: &str, value: &str, css: &CssScanner<'_>) -> AttributeCheck {
    match css.scan_inline(value) {
        Ok(outcome) => {
            let verdict = if outcome.clean.trim().is_empty() {
                Verdict::Strip
            } else if outcome.clean == value {
                Verdict::Keep
            } else {
                Verdict::Replace(outcome.clean)
            };
            AttributeCheck {
                verdict,
                diagnostics: outcome.diagnostics,
            }
        }
        Err(e) => AttributeCheck {
            verdict: Verdict::Strip,
            diagnostics: vec![Diagnostic::new(
                DiagnosticKind::CssUnparseable,
                format!(
                    "The \"style\" attribute of the \"{}\" tag could not be parsed and has been removed. {}",
                    encode_for_message(tag_name),
                    encode_for_message(&e.to_string())
                ),
            )],
        },
    }
}

pub(crate) fn attribute_removed(tag_name: &str, name: &str) -> Diagnostic {
    Diagnostic::new(
        DiagnosticKind::AttributeRemoved,
        format!(
            "The \"{}\" attribute of the \"{}\" tag has been removed for security reasons. \
             This removal should not affect the display of the HTML submitted.",
            encode_for_message(name),
            encode_for_message(tag_name)
        ),
    )
}

fn attribute_invalid(tag_name: &str, name: &str, value: &str, action: OnInvalid) -> Diagnostic {
    let tag = encode_for_message(tag_name);
    let attr = encode_for_message(name);
    let outcome = match action {
        OnInvalid::RemoveTag => format!(
            "remove the \"{}\" tag and its contents in order to process this input.",
            tag
        ),
        OnInvalid::FilterTag => format!(
            "filter the \"{}\" tag and leave its contents in place so that we could process this input.",
            tag
        ),
        OnInvalid::RemoveAttribute => format!(
            "remove the \"{}\" attribute from the tag and leave everything else in place so that we could process this input.",
            attr
        ),
    };
    Diagnostic::new(
        DiagnosticKind::AttributeInvalid,
        format!(
            "The \"{}\" tag contained an attribute that we couldn't process. \
             The \"{}\" attribute had a value of \"{}\". \
             This value could not be accepted for security reasons. We have chosen to {}",
            tag,
            attr,
            encode_for_message(value),
            outcome
        ),
    )
}
