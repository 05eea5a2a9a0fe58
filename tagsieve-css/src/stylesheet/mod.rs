//! The rule/declaration tree produced by the parser, and its serialization.
//!
//! Selectors, preludes and values are stored already serialized from their
//! tokens, so writing the tree out again and re-parsing it gives back the
//! same tree.

use std::fmt;

use crate::tokens::TokenText;

/// A single `name: value` pair. `value` excludes a trailing `!important`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
    pub important: bool,
    /// Every url the value would make a browser fetch.
    pub urls: Vec<String>,
    /// The value holds a bad string, a bad url or an unmatched closing bracket.
    pub malformed: bool,
}

impl Declaration {
    pub fn new(name: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            important,
            urls: Vec::new(),
            malformed: false,
        }
    }

    pub(crate) fn from_tokens(name: String, value: TokenText, important: bool) -> Self {
        Self {
            name,
            value: value.text,
            important,
            urls: value.urls,
            malformed: value.malformed,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    pub declarations: Vec<Declaration>,
}

impl DeclarationBlock {
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }
}

impl fmt::Display for DeclarationBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, declaration) in self.declarations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", declaration)?;
        }
        Ok(())
    }
}

/// `selectors { declarations }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRule {
    pub selectors: String,
    pub block: DeclarationBlock,
}

/// An at-rule whose block holds further rules: `@media`, `@supports`, `@document`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupingRule {
    pub keyword: String,
    pub prelude: String,
    pub rules: Vec<Rule>,
}

/// An at-rule whose block holds declarations directly: `@page`, `@font-face`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationAtRule {
    pub keyword: String,
    pub prelude: String,
    pub block: DeclarationBlock,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframesRule {
    pub keyword: String,
    pub name: String,
    pub frames: Vec<KeyframeRule>,
}

/// One `from`/`to`/percentage block inside `@keyframes`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyframeRule {
    pub selector: String,
    pub block: DeclarationBlock,
}

/// Any at-rule kept opaque by the parser. `block` is the serialized text between the
/// braces, or `None` for statement at-rules such as `@import`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtRule {
    pub keyword: String,
    pub prelude: String,
    pub block: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Style(StyleRule),
    Grouping(GroupingRule),
    Page(DeclarationAtRule),
    FontFace(DeclarationAtRule),
    Keyframes(KeyframesRule),
    Import(AtRule),
    Other(AtRule),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Style(rule) => write_block(f, &rule.selectors, &rule.block),
            Rule::Grouping(rule) => {
                write_at_prelude(f, &rule.keyword, &rule.prelude)?;
                f.write_str(" {\n")?;
                for nested in &rule.rules {
                    writeln!(f, "{}", nested)?;
                }
                f.write_str("}")
            }
            Rule::Page(rule) | Rule::FontFace(rule) => {
                let mut head = String::from("@");
                head.push_str(&rule.keyword);
                if !rule.prelude.is_empty() {
                    head.push(' ');
                    head.push_str(&rule.prelude);
                }
                write_block(f, &head, &rule.block)
            }
            Rule::Keyframes(rule) => {
                write_at_prelude(f, &rule.keyword, &rule.name)?;
                f.write_str(" {\n")?;
                for frame in &rule.frames {
                    write_block(f, &frame.selector, &frame.block)?;
                    f.write_str("\n")?;
                }
                f.write_str("}")
            }
            Rule::Import(rule) | Rule::Other(rule) => {
                write_at_prelude(f, &rule.keyword, &rule.prelude)?;
                match &rule.block {
                    Some(block) => write!(f, " {{{}}}", block),
                    None => f.write_str(";"),
                }
            }
        }
    }
}

fn write_at_prelude(f: &mut fmt::Formatter<'_>, keyword: &str, prelude: &str) -> fmt::Result {
    write!(f, "@{}", keyword)?;
    if !prelude.is_empty() {
        write!(f, " {}", prelude)?;
    }
    Ok(())
}

fn write_block(f: &mut fmt::Formatter<'_>, head: &str, block: &DeclarationBlock) -> fmt::Result {
    if block.is_empty() {
        write!(f, "{} {{}}", head)
    } else {
        write!(f, "{} {{ {} }}", head, block)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSheet {
    pub rules: Vec<Rule>,
}

impl fmt::Display for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, rule) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}
