//! rewriter.rs - The policy-driven walk over the parsed markup tree.
//!
//! The tree is edited while it is walked. Each level is traversed with a
//! cursor into the parent's live child vector, and the cursor is recomputed
//! from the vector's length after every child is processed:
//!
//! * child still attached: step past it;
//! * child gone: its promoted children (if any) now sit at the cursor. They
//!   were already processed beneath it, so the cursor steps past them too.
//!
//! That keeps every node of a level visited exactly once, including nodes that
//! arrive through promotion from below.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, warn};
use markup5ever_rcdom::{Handle, NodeData};

use crate::css_scanner::CssScanner;
use crate::dom;
use crate::entities::encode_for_message;
use crate::policy::{
    Policy, TagAction, TagRule, DEFAULT_MAX_NESTING_DEPTH, MAX_NESTING_DEPTH, PRESERVE_COMMENTS,
};
use crate::scan_result::{Diagnostic, DiagnosticKind};
use crate::validators::{attribute_removed, AttributeValidator, Verdict};

/// Rewrites one tree against one policy and collects the diagnostics.
pub struct TreeRewriter<'p> {
    policy: &'p Policy,
    css: CssScanner<'p>,
    attributes: AttributeValidator<'p>,
    diagnostics: Vec<Diagnostic>,
    max_depth: usize,
    preserve_comments: bool,
}

impl<'p> TreeRewriter<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Self {
            policy,
            css: CssScanner::new(policy),
            attributes: AttributeValidator::new(policy),
            diagnostics: Vec::new(),
            max_depth: policy.int_directive_or_default(MAX_NESTING_DEPTH, DEFAULT_MAX_NESTING_DEPTH),
            preserve_comments: policy.bool_directive_or_default(PRESERVE_COMMENTS, true),
        }
    }

    /// Rewrites every child of `root`. `root` itself is not evaluated.
    pub fn rewrite(&mut self, root: &Handle) {
        self.process_children(root, 0);
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn report(&mut self, kind: DiagnosticKind, message: String) {
        self.diagnostics.push(Diagnostic::new(kind, message));
    }

    fn process_children(&mut self, parent: &Handle, depth: usize) {
        let mut index = 0;
        while let Some(child) = dom::child_at(parent, index) {
            let before = dom::child_count(parent);
            self.process_node(&child, depth);

            if dom::is_child_of(&child, parent) {
                index += 1;
            } else {
                let after = dom::child_count(parent);
                index = (index + after + 1).saturating_sub(before);
            }
        }
    }

    fn process_node(&mut self, node: &Handle, depth: usize) {
        match &node.data {
            NodeData::Element { .. } => self.process_element(node, depth),
            NodeData::Comment { .. } if !self.preserve_comments => dom::detach(node),
            _ => {}
        }
    }

    fn process_element(&mut self, node: &Handle, depth: usize) {
        let tag_name = dom::element_name(node).unwrap_or_default();

        if depth >= self.max_depth {
            warn!("Element <{}> exceeds the nesting limit of {}.", tag_name, self.max_depth);
            self.report(
                DiagnosticKind::NestingTooDeep,
                format!(
                    "The \"{}\" tag is nested more than {} levels deep and has been removed along with its contents.",
                    encode_for_message(&tag_name),
                    self.max_depth
                ),
            );
            dom::detach(node);
            return;
        }

        let policy = self.policy;
        match policy.tag_rule(&tag_name) {
            None => self.filter(node, &tag_name, depth),
            Some(rule) => match rule.action {
                TagAction::Filter => self.filter(node, &tag_name, depth),
                TagAction::Validate => self.validate(node, rule, &tag_name, depth),
                TagAction::Truncate => self.truncate(node, &tag_name),
                TagAction::Remove => self.remove(node, &tag_name),
            },
        }
    }

    /// Processes the children, then puts them in the element's place.
    fn filter(&mut self, node: &Handle, tag_name: &str, depth: usize) {
        debug!("Filtering <{}>.", tag_name);
        let lead = if tag_name.trim().is_empty() {
            "An unprocessable ".to_string()
        } else {
            format!("The \"{}\" ", encode_for_message(tag_name))
        };
        self.report(
            DiagnosticKind::TagFiltered,
            format!(
                "{}tag has been filtered for security reasons. The contents of the tag will remain in place.",
                lead
            ),
        );
        self.process_children(node, depth + 1);
        dom::promote_children(node);
    }

    fn validate(&mut self, node: &Handle, rule: &'p TagRule, tag_name: &str, depth: usize) {
        debug!("Validating <{}>.", tag_name);

        if tag_name == "style" && !self.scan_style_element(node) {
            return;
        }

        let mut index = 0;
        while let Some((name, value)) = dom::attribute_at(node, index) {
            let check = self
                .attributes
                .check(rule, tag_name, &name, &value, &self.css);
            self.diagnostics.extend(check.diagnostics);

            match check.verdict {
                Verdict::Keep => index += 1,
                Verdict::Replace(clean) => {
                    dom::set_attribute_at(node, index, &clean);
                    index += 1;
                }
                Verdict::Strip => dom::remove_attribute_at(node, index),
                Verdict::RemoveTag => {
                    dom::detach(node);
                    return;
                }
                Verdict::FilterTag => {
                    self.process_children(node, depth + 1);
                    dom::promote_children(node);
                    return;
                }
            }
        }

        self.process_children(node, depth + 1);
        if let Some(contents) = dom::template_contents(node) {
            self.process_children(&contents, depth + 1);
        }
    }

    /// Cleans the stylesheet inside a `<style>` element. Returns false when
    /// the element had to be removed.
    fn scan_style_element(&mut self, node: &Handle) -> bool {
        if dom::child_count(node) == 0 {
            return true;
        }

        let css = dom::text_content(node);
        match self.css.scan_stylesheet(&css) {
            Ok(outcome) => {
                if outcome.clean != css {
                    dom::replace_text(node, &outcome.clean);
                }
                self.diagnostics.extend(outcome.diagnostics);
                true
            }
            Err(e) => {
                debug!("Removing <style> element: {}", e);
                self.report(
                    DiagnosticKind::CssUnparseable,
                    format!(
                        "Css could not be parsed and the \"style\" tag has been removed. {}",
                        encode_for_message(&e.to_string())
                    ),
                );
                dom::detach(node);
                false
            }
        }
    }

    /// Strips every attribute and every element child. Text (and comments,
    /// unless comments are being dropped) stay where they are.
    fn truncate(&mut self, node: &Handle, tag_name: &str) {
        debug!("Truncating <{}>.", tag_name);
        for name in dom::take_attribute_names(node) {
            self.diagnostics.push(attribute_removed(tag_name, &name));
        }

        let keep_comments = self.preserve_comments;
        dom::retain_children(node, |child| {
            dom::is_text(child) || (keep_comments && dom::is_comment(child))
        });
    }

    fn remove(&mut self, node: &Handle, tag_name: &str) {
        debug!("Removing <{}>.", tag_name);
        self.report(
            DiagnosticKind::TagRemoved,
            format!(
                "The \"{}\" tag has been removed for security reasons.",
                encode_for_message(tag_name)
            ),
        );
        dom::detach(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::headless_scan;
    use crate::policy::{AttributeRule, OnInvalid, PolicyBuilder, TagRule};

    fn policy() -> Policy {
        PolicyBuilder::new()
            .tag(TagRule::new("b", TagAction::Validate))
            .tag(
                TagRule::new("a", TagAction::Validate).with_attribute(
                    AttributeRule::new("href")
                        .with_literals(["ok"])
                        .on_invalid(OnInvalid::FilterTag),
                ),
            )
            .tag(TagRule::new("script", TagAction::Remove))
            .build()
    }

    #[test]
    fn test_promoted_children_are_visited_once() {
        let policy = policy();
        let result = headless_scan("<x><y>a<script>1</script></y>b</x><z>c</z><b>d</b>", &policy).unwrap();
        assert_eq!(result.clean_output(), "abc<b>d</b>");
        let kinds: Vec<DiagnosticKind> = result.diagnostics().iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiagnosticKind::TagFiltered,
                DiagnosticKind::TagFiltered,
                DiagnosticKind::TagRemoved,
                DiagnosticKind::TagFiltered,
            ]
        );
    }

    #[test]
    fn test_filter_tag_verdict_processes_children() {
        let policy = policy();
        let result = headless_scan(r#"<a href="bad">x<script>1</script><b>y</b></a>"#, &policy).unwrap();
        assert_eq!(result.clean_output(), "x<b>y</b>");
        assert_eq!(result.count_of(DiagnosticKind::AttributeInvalid), 1);
        assert_eq!(result.count_of(DiagnosticKind::TagRemoved), 1);
    }

    #[test]
    fn test_sibling_after_removed_node_is_processed() {
        let policy = policy();
        let result = headless_scan("<script>1</script><blink>2</blink><b>3</b>", &policy).unwrap();
        assert_eq!(result.clean_output(), "2<b>3</b>");
        assert_eq!(result.diagnostics().len(), 2);
    }
}
