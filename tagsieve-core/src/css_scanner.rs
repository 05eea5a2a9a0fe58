//! css_scanner.rs - Policy checks for CSS from `style` attributes and `<style>` elements.
//!
//! The parser hands over every value already serialized from its tokens, with
//! escapes resolved and comments gone, and with the url targets the tokenizer
//! found. That serialized text is both what gets checked and what gets written
//! out. Declarations that fail are dropped with one diagnostic. At-rules that
//! can pull in remote content are dropped whole.
//!
//! License: MIT OR APACHE 2.0

use lazy_static::lazy_static;
use log::debug;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

use tagsieve_css::{parse_declarations, parse_stylesheet, Declaration, DeclarationBlock, Rule};

use crate::entities::encode_for_message;
use crate::errors::SieveError;
use crate::policy::{CssPropertyRule, Policy, ALLOWED_CSS_URL_SCHEMES, DEFAULT_CSS_URL_SCHEMES};
use crate::scan_result::{Diagnostic, DiagnosticKind};

lazy_static! {
    /// "expression" spelled with ASCII, full-width or small-capital letters.
    static ref DANGEROUS_EXPRESSION: Regex = Regex::new(concat!(
        r"[eE\x{FF25}\x{FF45}][xX\x{FF38}\x{FF58}][pP\x{FF30}\x{FF50}]",
        r"[rR\x{0280}\x{FF32}\x{FF52}][eE\x{FF25}\x{FF45}][sS\x{FF33}\x{FF53}]{2}",
        r"[iI\x{026A}\x{FF29}\x{FF49}][oO\x{FF2F}\x{FF4F}][nN\x{0274}\x{FF2E}\x{FF4E}]"
    ))
    .expect("expression detector is a valid regex");

    /// A leading scheme, with the colon written literally or as a numeric reference.
    static ref URL_SCHEME: Regex = RegexBuilder::new(r"^\s*([^/#?]*?)(?::|&#0*58;?|&#x0*3a;?)")
        .case_insensitive(true)
        .build()
        .expect("scheme detector is a valid regex");
}

/// Separator the serializer writes where a dropped comment kept two tokens apart.
const TOKEN_SEPARATOR: &str = "/**/";

/// Cleaned CSS text and the diagnostics produced while cleaning it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssOutcome {
    pub clean: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Checks CSS against one policy.
#[derive(Debug)]
pub struct CssScanner<'p> {
    policy: &'p Policy,
    allowed_schemes: Vec<String>,
}

impl<'p> CssScanner<'p> {
    pub fn new(policy: &'p Policy) -> Self {
        Self {
            policy,
            allowed_schemes: policy.directive_as_list(ALLOWED_CSS_URL_SCHEMES, DEFAULT_CSS_URL_SCHEMES),
        }
    }

    /// Cleans the value of a `style` attribute.
    pub fn scan_inline(&self, css: &str) -> Result<CssOutcome, SieveError> {
        let mut block = parse_declarations(css)?;
        let mut diagnostics = Vec::new();
        self.scan_block(&mut block, &mut diagnostics);
        Ok(CssOutcome {
            clean: block.to_string(),
            diagnostics,
        })
    }

    /// Cleans the body of a `<style>` element.
    pub fn scan_stylesheet(&self, css: &str) -> Result<CssOutcome, SieveError> {
        let mut sheet = parse_stylesheet(css)?;
        let mut diagnostics = Vec::new();
        self.scan_rules(&mut sheet.rules, &mut diagnostics);

        let clean = sheet.to_string();
        if clean.to_ascii_lowercase().contains("</style") {
            return Err(SieveError::UnsafeStylesheet);
        }
        Ok(CssOutcome { clean, diagnostics })
    }

    fn scan_rules(&self, rules: &mut Vec<Rule>, diagnostics: &mut Vec<Diagnostic>) {
        rules.retain_mut(|rule| self.scan_rule(rule, diagnostics));
    }

    /// Returns false when the rule must be dropped.
    fn scan_rule(&self, rule: &mut Rule, diagnostics: &mut Vec<Diagnostic>) -> bool {
        match rule {
            Rule::Style(style) => self.scan_block(&mut style.block, diagnostics),
            Rule::Grouping(group) => self.scan_rules(&mut group.rules, diagnostics),
            Rule::Page(page) | Rule::FontFace(page) => self.scan_block(&mut page.block, diagnostics),
            Rule::Keyframes(keyframes) => {
                for frame in &mut keyframes.frames {
                    self.scan_block(&mut frame.block, diagnostics);
                }
            }
            Rule::Import(at) | Rule::Other(at) => {
                debug!("Dropping @{} rule.", at.keyword);
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::CssRuleRemoved,
                    format!(
                        "Css at-rule \"@{}\" is not allowed",
                        encode_for_message(&at.keyword)
                    ),
                ));
                return false;
            }
        }
        true
    }

    fn scan_block(&self, block: &mut DeclarationBlock, diagnostics: &mut Vec<Diagnostic>) {
        let mut kept = Vec::with_capacity(block.declarations.len());
        for declaration in block.declarations.drain(..) {
            match self.check_declaration(&declaration) {
                Ok(name) => kept.push(Declaration { name, ..declaration }),
                Err(message) => {
                    debug!("Dropping css declaration '{}'.", declaration.name);
                    diagnostics.push(Diagnostic::new(DiagnosticKind::CssPropertyRemoved, message));
                }
            }
        }
        block.declarations = kept;
    }

    /// Returns the normalized property name to emit, or the rejection message.
    /// Only the first failing check is reported.
    fn check_declaration(&self, declaration: &Declaration) -> Result<String, String> {
        let key = declaration.name.trim().to_lowercase();
        let value = declaration.value.as_str();

        let Some(rule) = self.policy.css_property(&key) else {
            return Err(format!(
                "Css property \"{}\" is not allowed",
                encode_for_message(&key)
            ));
        };

        if DANGEROUS_EXPRESSION.is_match(&value.replace(TOKEN_SEPARATOR, "")) {
            return Err(format!(
                "\"{}\" is invalid css expression",
                encode_for_message(value)
            ));
        }

        if declaration.malformed {
            return Err(format!(
                "\"{}\" is not well-formed css",
                encode_for_message(value)
            ));
        }

        let mut visited = HashSet::new();
        self.check_value(rule, value, &mut visited)?;

        if !declaration.urls.iter().all(|url| self.url_allowed(url)) {
            return Err("Illegal url detected.".to_string());
        }

        Ok(key)
    }

    /// Literal check, then pattern check, then the same for every shorthand
    /// reference. A list that is empty does not constrain the value.
    fn check_value(
        &self,
        rule: &CssPropertyRule,
        value: &str,
        visited: &mut HashSet<String>,
    ) -> Result<(), String> {
        if !visited.insert(rule.name.to_lowercase()) {
            return Ok(());
        }

        if !rule.literal_allows(value) {
            return Err(format!(
                "\"{}\" is not allowed literal",
                encode_for_message(value)
            ));
        }
        if !rule.pattern_allows(value) {
            return Err(format!(
                "\"{}\" is not allowed literal by regex",
                encode_for_message(value)
            ));
        }

        for reference in &rule.shorthand_refs {
            if let Some(shorthand) = self.policy.css_property(reference) {
                self.check_value(shorthand, value, visited)?;
            }
        }
        Ok(())
    }

    /// A url target must open with an allowed scheme.
    fn url_allowed(&self, url: &str) -> bool {
        URL_SCHEME
            .captures(url)
            .and_then(|scheme| scheme.get(1))
            .map(|scheme| {
                let scheme = scheme.as_str().trim().to_lowercase();
                self.allowed_schemes.iter().any(|allowed| *allowed == scheme)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::PolicyBuilder;

    fn policy() -> Policy {
        PolicyBuilder::new()
            .css_property(CssPropertyRule::new("color").with_literals(["red", "blue"]))
            .css_property(
                CssPropertyRule::new("width")
                    .with_pattern(r"[0-9]+(px|em|%)|expression\(.*\)")
                    .unwrap(),
            )
            .css_property(
                CssPropertyRule::new("background-image")
                    .with_pattern(r#"url\(\s*['"]?[^'"()]+['"]?\s*\)|none"#)
                    .unwrap(),
            )
            .css_property(
                CssPropertyRule::new("border")
                    .with_pattern(r"[a-z0-9 ]+")
                    .unwrap()
                    .with_shorthand("border-style"),
            )
            .css_property(
                CssPropertyRule::new("border-style")
                    .with_literals(["solid", "dashed"])
                    .with_shorthand("border"),
            )
            .css_property(CssPropertyRule::new("margin"))
            .css_property(CssPropertyRule::new("background"))
            .build()
    }

    #[test]
    fn test_allowed_declarations_survive() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let outcome = scanner.scan_inline("color: RED; width: 10px !important").unwrap();
        assert_eq!(outcome.clean, "color: RED; width: 10px !important");
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_property_is_removed() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let outcome = scanner.scan_inline("position: fixed; color: blue").unwrap();
        assert_eq!(outcome.clean, "color: blue");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].message, "Css property \"position\" is not allowed");
    }

    #[test]
    fn test_expression_is_rejected_even_when_pattern_allows_it() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let outcome = scanner.scan_inline("width: expression(alert('XSS'))").unwrap();
        assert_eq!(outcome.clean, "");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(outcome.diagnostics[0].message.ends_with("is invalid css expression"));
    }

    #[test]
    fn test_escaped_and_commented_expression_is_rejected() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let outcome = scanner.scan_inline(r"width: \65 xpr/**/ession(alert(1))").unwrap();
        assert_eq!(outcome.clean, "");
        let outcome = scanner.scan_inline("width: \u{FF45}xpression(alert(1))").unwrap();
        assert_eq!(outcome.clean, "");
    }

    #[test]
    fn test_escaped_property_name_is_decoded() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let outcome = scanner.scan_inline(r"\63olor: red").unwrap();
        assert_eq!(outcome.clean, "color: red");
    }

    #[test]
    fn test_literal_mismatch() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let outcome = scanner.scan_inline("color: green").unwrap();
        assert_eq!(outcome.clean, "");
        assert_eq!(outcome.diagnostics[0].message, "\"green\" is not allowed literal");
    }

    #[test]
    fn test_url_schemes() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);

        let bad = scanner
            .scan_inline("background-image: url(javascript:alert(1))")
            .unwrap();
        assert_eq!(bad.clean, "");
        assert_eq!(bad.diagnostics.len(), 1);

        let good = scanner
            .scan_inline("background-image: url(http://example.com/a.png)")
            .unwrap();
        assert_eq!(good.clean, "background-image: url(http://example.com/a.png)");
        assert!(good.diagnostics.is_empty());

        let relative = scanner.scan_inline("background-image: url(a.png)").unwrap();
        assert_eq!(relative.diagnostics[0].message, "Illegal url detected.");

        let encoded = scanner
            .scan_inline("background-image: url('javascript&#58;alert(1)')")
            .unwrap();
        assert_eq!(encoded.clean, "");
    }

    #[test]
    fn test_comment_markers_cannot_hide_urls() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);

        let relative = scanner
            .scan_inline("background: url(http://a/*), url(//evil.example/leak), url(*/b)")
            .unwrap();
        assert_eq!(relative.clean, "");
        assert_eq!(relative.diagnostics.len(), 1);
        assert_eq!(relative.diagnostics[0].message, "Illegal url detected.");

        let hidden = scanner
            .scan_inline("background: url(http://a/*), url(javascript:alert(1)), url(*/b)")
            .unwrap();
        assert_eq!(hidden.clean, "");
        assert_eq!(hidden.diagnostics.len(), 1);
        assert!(hidden.diagnostics[0].message.ends_with("is not well-formed css"));
    }

    #[test]
    fn test_kept_values_are_written_as_checked() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let outcome = scanner
            .scan_inline("background: url( 'http://example.com/a.png' ) /* note */ no-repeat")
            .unwrap();
        assert_eq!(outcome.clean, r#"background: url( "http://example.com/a.png" ) no-repeat"#);
        let again = scanner.scan_inline(&outcome.clean).unwrap();
        assert_eq!(again.clean, outcome.clean);
    }

    #[test]
    fn test_shorthand_constraints_compound_without_looping() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let ok = scanner.scan_inline("border: solid").unwrap();
        assert_eq!(ok.clean, "border: solid");
        let rejected = scanner.scan_inline("border: 1px solid").unwrap();
        assert_eq!(rejected.clean, "");
        assert_eq!(rejected.diagnostics[0].message, "\"1px solid\" is not allowed literal");
    }

    #[test]
    fn test_presence_only_property() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        assert_eq!(scanner.scan_inline("margin: 0 auto").unwrap().clean, "margin: 0 auto");
    }

    #[test]
    fn test_stylesheet_import_and_nested_rules() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        let outcome = scanner
            .scan_stylesheet(
                "@import url(http://evil.example/x.css);\np { color: red; position: absolute }\n@media print { a { color: green } }",
            )
            .unwrap();
        assert_eq!(outcome.clean, "p { color: red }\n@media print {\na {}\n}");
        assert_eq!(outcome.diagnostics.len(), 3);
        assert_eq!(outcome.diagnostics[0].kind, DiagnosticKind::CssRuleRemoved);
    }

    #[test]
    fn test_style_breakout_is_refused() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        assert!(matches!(
            scanner.scan_stylesheet("p</style><script> { color: red }"),
            Err(SieveError::UnsafeStylesheet)
        ));
    }

    #[test]
    fn test_parse_failure_surfaces() {
        let policy = policy();
        let scanner = CssScanner::new(&policy);
        assert!(matches!(
            scanner.scan_stylesheet("p { color: red } q"),
            Err(SieveError::CssParse(_))
        ));
    }

    #[test]
    fn test_custom_scheme_directive() {
        let policy = PolicyBuilder::new()
            .directive(ALLOWED_CSS_URL_SCHEMES, "data")
            .css_property(CssPropertyRule::new("background"))
            .build();
        let scanner = CssScanner::new(&policy);
        assert_eq!(
            scanner.scan_inline("background: url(data:image/png;base64,AAAA)").unwrap().clean,
            "background: url(data:image/png;base64,AAAA)"
        );
        assert_eq!(
            scanner.scan_inline("background: url(https://example.com)").unwrap().clean,
            ""
        );
    }
}
