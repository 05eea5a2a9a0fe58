//! Stylesheet and declaration-list parsing over `cssparser`.
//!
//! Rule structure comes from `cssparser`'s `StyleSheetParser` and
//! `RuleBodyParser`. The parsers here only decide what each rule becomes:
//! style rules, grouping at-rules, `@page`, `@font-face`, `@keyframes`, or an
//! opaque at-rule. In a stylesheet any rule `cssparser` cannot make sense of
//! is an error. Inside a declaration block a broken declaration is skipped,
//! the same way a browser skips it.

use cssparser::{
    parse_important, AtRuleParser, CowRcStr, DeclarationParser, Delimiter,
    ParseError as CssError, ParseErrorKind, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser,
};

use crate::error::{Invalid, ParseError};
use crate::stylesheet::{
    AtRule, Declaration, DeclarationAtRule, DeclarationBlock, GroupingRule, KeyframeRule,
    KeyframesRule, Rule, StyleRule, StyleSheet,
};
use crate::tokens::serialize_tokens;

/// Deepest block nesting accepted before parsing is abandoned.
pub const MAX_BLOCK_DEPTH: usize = 32;

/// Parses the body of a `<style>` element.
pub fn parse_stylesheet(css: &str) -> Result<StyleSheet, ParseError> {
    let mut input = ParserInput::new(css);
    let mut input = Parser::new(&mut input);
    let mut parser = RuleListParser { depth: 0 };
    let mut rules = Vec::new();

    for item in StyleSheetParser::new(&mut input, &mut parser) {
        match item {
            Ok(rule) => rules.push(rule),
            Err((error, rule)) => return Err(refusal(error, rule)),
        }
    }
    Ok(StyleSheet { rules })
}

/// Parses the value of a `style` attribute.
pub fn parse_declarations(css: &str) -> Result<DeclarationBlock, ParseError> {
    let mut input = ParserInput::new(css);
    let mut input = Parser::new(&mut input);
    declaration_list(&mut input, 0).map_err(|error| refusal(error, css))
}

fn refusal(error: CssError<'_, Invalid>, rule: &str) -> ParseError {
    match error.kind {
        ParseErrorKind::Custom(Invalid::TooDeep) => ParseError::NestingTooDeep {
            limit: MAX_BLOCK_DEPTH,
        },
        _ => ParseError::InvalidRule {
            line: error.location.line + 1,
            column: error.location.column,
            rule: rule.trim().to_string(),
        },
    }
}

fn is_too_deep(error: &CssError<'_, Invalid>) -> bool {
    matches!(error.kind, ParseErrorKind::Custom(Invalid::TooDeep))
}

fn rule_list<'i>(input: &mut Parser<'i, '_>, depth: usize) -> Result<Vec<Rule>, CssError<'i, Invalid>> {
    let mut parser = RuleListParser { depth };
    let mut rules = Vec::new();
    for item in RuleBodyParser::new(input, &mut parser) {
        match item {
            Ok(rule) => rules.push(rule),
            Err((error, _)) => return Err(error),
        }
    }
    Ok(rules)
}

fn declaration_list<'i>(
    input: &mut Parser<'i, '_>,
    depth: usize,
) -> Result<DeclarationBlock, CssError<'i, Invalid>> {
    if depth > MAX_BLOCK_DEPTH {
        return Err(input.new_custom_error(Invalid::TooDeep));
    }
    let mut parser = DeclarationListParser { depth };
    let mut block = DeclarationBlock::default();
    for item in RuleBodyParser::new(input, &mut parser) {
        match item {
            Ok(declaration) => block.declarations.push(declaration),
            Err((error, _)) if is_too_deep(&error) => return Err(error),
            Err(_) => {}
        }
    }
    Ok(block)
}

fn keyframe_list<'i>(
    input: &mut Parser<'i, '_>,
    depth: usize,
) -> Result<Vec<KeyframeRule>, CssError<'i, Invalid>> {
    let mut parser = KeyframeListParser { depth };
    let mut frames = Vec::new();
    for item in RuleBodyParser::new(input, &mut parser) {
        match item {
            Ok(frame) => frames.push(frame),
            Err((error, _)) => return Err(error),
        }
    }
    Ok(frames)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AtRuleKind {
    Grouping,
    Page,
    FontFace,
    Keyframes,
    Opaque,
}

impl AtRuleKind {
    fn of(keyword: &str) -> Self {
        match keyword {
            "media" | "supports" | "document" | "-moz-document" => AtRuleKind::Grouping,
            "page" => AtRuleKind::Page,
            "font-face" => AtRuleKind::FontFace,
            k if k == "keyframes" || k.ends_with("-keyframes") => AtRuleKind::Keyframes,
            _ => AtRuleKind::Opaque,
        }
    }
}

struct AtPrelude {
    kind: AtRuleKind,
    keyword: String,
    prelude: String,
}

fn opaque_rule(keyword: String, prelude: String, block: Option<String>) -> Rule {
    let rule = AtRule {
        keyword,
        prelude,
        block,
    };
    if rule.keyword == "import" {
        Rule::Import(rule)
    } else {
        Rule::Other(rule)
    }
}

/// Rules at the top of a stylesheet or inside a grouping at-rule.
struct RuleListParser {
    depth: usize,
}

impl<'i> AtRuleParser<'i> for RuleListParser {
    type Prelude = AtPrelude;
    type AtRule = Rule;
    type Error = Invalid;

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<AtPrelude, CssError<'i, Invalid>> {
        let keyword = name.to_ascii_lowercase();
        Ok(AtPrelude {
            kind: AtRuleKind::of(&keyword),
            prelude: serialize_tokens(input, self.depth)?.text,
            keyword,
        })
    }

    fn rule_without_block(&mut self, prelude: AtPrelude, _start: &ParserState) -> Result<Rule, ()> {
        Ok(opaque_rule(prelude.keyword, prelude.prelude, None))
    }

    fn parse_block<'t>(
        &mut self,
        prelude: AtPrelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Rule, CssError<'i, Invalid>> {
        let depth = self.depth + 1;
        if depth > MAX_BLOCK_DEPTH {
            return Err(input.new_custom_error(Invalid::TooDeep));
        }
        let AtPrelude {
            kind,
            keyword,
            prelude,
        } = prelude;

        Ok(match kind {
            AtRuleKind::Grouping => Rule::Grouping(GroupingRule {
                rules: rule_list(input, depth)?,
                keyword,
                prelude,
            }),
            AtRuleKind::Page => Rule::Page(DeclarationAtRule {
                block: declaration_list(input, depth)?,
                keyword,
                prelude,
            }),
            AtRuleKind::FontFace => Rule::FontFace(DeclarationAtRule {
                block: declaration_list(input, depth)?,
                keyword,
                prelude,
            }),
            AtRuleKind::Keyframes => Rule::Keyframes(KeyframesRule {
                frames: keyframe_list(input, depth)?,
                keyword,
                name: prelude,
            }),
            AtRuleKind::Opaque => {
                let block = serialize_tokens(input, depth)?.text;
                opaque_rule(keyword, prelude, Some(block))
            }
        })
    }
}

impl<'i> QualifiedRuleParser<'i> for RuleListParser {
    type Prelude = String;
    type QualifiedRule = Rule;
    type Error = Invalid;

    fn parse_prelude<'t>(&mut self, input: &mut Parser<'i, 't>) -> Result<String, CssError<'i, Invalid>> {
        Ok(serialize_tokens(input, self.depth)?.text)
    }

    fn parse_block<'t>(
        &mut self,
        selectors: String,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Rule, CssError<'i, Invalid>> {
        Ok(Rule::Style(StyleRule {
            block: declaration_list(input, self.depth + 1)?,
            selectors,
        }))
    }
}

impl<'i> DeclarationParser<'i> for RuleListParser {
    type Declaration = Rule;
    type Error = Invalid;

    fn parse_value<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Rule, CssError<'i, Invalid>> {
        Err(input.new_custom_error(Invalid::Misplaced))
    }
}

impl<'i> RuleBodyItemParser<'i, Rule, Invalid> for RuleListParser {
    fn parse_declarations(&self) -> bool {
        false
    }

    fn parse_qualified(&self) -> bool {
        true
    }
}

/// `name: value [!important]` pairs inside a block or a `style` attribute.
struct DeclarationListParser {
    depth: usize,
}

impl<'i> DeclarationParser<'i> for DeclarationListParser {
    type Declaration = Declaration;
    type Error = Invalid;

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Declaration, CssError<'i, Invalid>> {
        let depth = self.depth;
        let value = input.parse_until_before(Delimiter::Bang, |input| serialize_tokens(input, depth))?;
        let important = input.try_parse(parse_important).is_ok();
        input.expect_exhausted()?;
        Ok(Declaration::from_tokens(name.to_string(), value, important))
    }
}

impl<'i> AtRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = Invalid;

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<(), CssError<'i, Invalid>> {
        Err(input.new_custom_error(Invalid::Misplaced))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = Invalid;

    fn parse_prelude<'t>(&mut self, input: &mut Parser<'i, 't>) -> Result<(), CssError<'i, Invalid>> {
        Err(input.new_custom_error(Invalid::Misplaced))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: (),
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Declaration, CssError<'i, Invalid>> {
        Err(input.new_custom_error(Invalid::Misplaced))
    }
}

impl<'i> RuleBodyItemParser<'i, Declaration, Invalid> for DeclarationListParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}

/// `from`/`to`/percentage blocks inside `@keyframes`.
struct KeyframeListParser {
    depth: usize,
}

impl<'i> QualifiedRuleParser<'i> for KeyframeListParser {
    type Prelude = String;
    type QualifiedRule = KeyframeRule;
    type Error = Invalid;

    fn parse_prelude<'t>(&mut self, input: &mut Parser<'i, 't>) -> Result<String, CssError<'i, Invalid>> {
        Ok(serialize_tokens(input, self.depth)?.text)
    }

    fn parse_block<'t>(
        &mut self,
        selector: String,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<KeyframeRule, CssError<'i, Invalid>> {
        Ok(KeyframeRule {
            block: declaration_list(input, self.depth + 1)?,
            selector,
        })
    }
}

impl<'i> AtRuleParser<'i> for KeyframeListParser {
    type Prelude = ();
    type AtRule = KeyframeRule;
    type Error = Invalid;

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<(), CssError<'i, Invalid>> {
        Err(input.new_custom_error(Invalid::Misplaced))
    }
}

impl<'i> DeclarationParser<'i> for KeyframeListParser {
    type Declaration = KeyframeRule;
    type Error = Invalid;

    fn parse_value<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<KeyframeRule, CssError<'i, Invalid>> {
        Err(input.new_custom_error(Invalid::Misplaced))
    }
}

impl<'i> RuleBodyItemParser<'i, KeyframeRule, Invalid> for KeyframeListParser {
    fn parse_declarations(&self) -> bool {
        false
    }

    fn parse_qualified(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_declarations() {
        let block = parse_declarations("color: red; margin:0 ;; font-weight: bold !IMPORTANT").unwrap();
        assert_eq!(block.len(), 3);
        assert_eq!(block.declarations[0], Declaration::new("color", "red", false));
        assert_eq!(block.declarations[1], Declaration::new("margin", "0", false));
        assert_eq!(block.declarations[2], Declaration::new("font-weight", "bold", true));
    }

    #[test]
    fn test_semicolons_inside_strings_and_urls_do_not_split() {
        let block =
            parse_declarations(r#"content: "a;b"; background: url(data:x;base64,AA)"#).unwrap();
        assert_eq!(block.len(), 2);
        assert_eq!(block.declarations[0].value, r#""a;b""#);
        assert_eq!(block.declarations[1].value, "url(data:x;base64,AA)");
        assert_eq!(block.declarations[1].urls, vec!["data:x;base64,AA".to_string()]);
    }

    #[test]
    fn test_broken_declarations_are_skipped() {
        let block = parse_declarations("garbage; color: blue; width: 1px ! nope; @x y; top: 0").unwrap();
        let names: Vec<&str> = block.declarations.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["color", "top"]);
    }

    #[test]
    fn test_escaped_property_name_is_resolved() {
        let block = parse_declarations(r"\63olor: red").unwrap();
        assert_eq!(block.declarations[0].name, "color");
    }

    #[test]
    fn test_comment_inside_unquoted_url_does_not_hide_later_urls() {
        let block = parse_declarations(
            "background-image: url(http://a/*), url(javascript:alert(1)), url(*/b)",
        )
        .unwrap();
        let declaration = &block.declarations[0];
        assert_eq!(declaration.urls.len(), 3);
        assert_eq!(declaration.urls[0], "http://a/*");
        assert!(declaration.urls[1].starts_with("javascript:"));
        assert_eq!(declaration.urls[2], "*/b");
        assert!(declaration.malformed);
    }

    #[test]
    fn test_stylesheet_with_grouping_and_keyframes() {
        let sheet = parse_stylesheet(
            "p { color: red }\n@media screen { a { color: blue } }\n@keyframes spin { from { top: 0 } to { top: 10px } }",
        )
        .unwrap();
        assert_eq!(sheet.rules.len(), 3);
        assert!(matches!(&sheet.rules[1], Rule::Grouping(g) if g.rules.len() == 1 && g.prelude == "screen"));
        assert!(matches!(&sheet.rules[2], Rule::Keyframes(k) if k.frames.len() == 2 && k.name == "spin"));
    }

    #[test]
    fn test_escaped_at_keyword_is_resolved() {
        let sheet = parse_stylesheet(r#"@im\port'\ja\vasc\ript:alert("XSS")';"#).unwrap();
        assert!(matches!(&sheet.rules[0], Rule::Import(_)));
    }

    #[test]
    fn test_import_without_semicolon_at_end_of_input() {
        let sheet = parse_stylesheet("@import 'http://example.com/x.css'").unwrap();
        assert!(matches!(&sheet.rules[0], Rule::Import(r) if r.block.is_none()));
    }

    #[test]
    fn test_unknown_at_rule_block_is_kept_opaque() {
        let sheet = parse_stylesheet("@font-feature-values Font { @swash { fancy: 1 } }").unwrap();
        match &sheet.rules[0] {
            Rule::Other(rule) => {
                assert_eq!(rule.keyword, "font-feature-values");
                assert_eq!(rule.prelude, "Font");
                assert_eq!(rule.block.as_deref(), Some("@swash { fancy: 1 }"));
            }
            other => panic!("unexpected rule {:?}", other),
        }
    }

    #[test]
    fn test_cdo_and_cdc_are_ignored_at_top_level() {
        let sheet = parse_stylesheet("<!-- p { color: red } -->").unwrap();
        assert_eq!(sheet.rules.len(), 1);
    }

    #[test]
    fn test_rule_without_block_is_refused() {
        match parse_stylesheet("p { color: red }\nq") {
            Err(ParseError::InvalidRule { line, rule, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(rule, "q");
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(matches!(
            parse_stylesheet("@media print { color: red }"),
            Err(ParseError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let mut css = String::new();
        for _ in 0..(MAX_BLOCK_DEPTH + 2) {
            css.push_str("@media screen {");
        }
        for _ in 0..(MAX_BLOCK_DEPTH + 2) {
            css.push('}');
        }
        assert_eq!(
            parse_stylesheet(&css),
            Err(ParseError::NestingTooDeep { limit: MAX_BLOCK_DEPTH })
        );

        let deep_value = format!("width: {}", "(".repeat(MAX_BLOCK_DEPTH + 2));
        assert_eq!(
            parse_declarations(&deep_value),
            Err(ParseError::NestingTooDeep { limit: MAX_BLOCK_DEPTH })
        );
    }

    #[test]
    fn test_serialization_round_trip_is_stable() {
        let source = "p { color: red; margin: 0 !important }\n@media print {\na { color: blue }\n}";
        let sheet = parse_stylesheet(source).unwrap();
        let once = sheet.to_string();
        let twice = parse_stylesheet(&once).unwrap().to_string();
        assert_eq!(once, source);
        assert_eq!(once, twice);
    }
}
