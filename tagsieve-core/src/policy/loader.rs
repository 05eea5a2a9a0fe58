//! loader.rs - Reads policy XML documents into a resolved `Policy`.
//!
//! The document is first deserialized into plain `serde` structs mirroring
//! the XML, then resolved: common regexps are compiled, `<common-attributes>`
//! references are copied into the tag rules and global attributes that use
//! them, and action names become enums. A dangling reference is an error, so
//! a policy that loads never needs to look anything up by reference again.
//!
//! License: MIT OR APACHE 2.0

use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::compiler::PatternCache;
use super::{AttributeRule, CssPropertyRule, OnInvalid, Pattern, Policy, TagAction, TagRule};
use crate::errors::SieveError;

const DEFAULT_POLICY_XML: &str = include_str!("../../policies/default.xml");

static SHARED_DEFAULT: OnceCell<Arc<Policy>> = OnceCell::new();

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PolicyDocument {
    #[serde(default)]
    directives: DirectiveList,
    #[serde(default)]
    common_regexps: RegexpList,
    #[serde(default)]
    common_attributes: AttributeList,
    #[serde(default)]
    global_tag_attributes: AttributeList,
    #[serde(default)]
    tag_rules: TagList,
    #[serde(default)]
    css_rules: PropertyList,
}

#[derive(Debug, Default, Deserialize)]
struct DirectiveList {
    #[serde(rename = "directive", default)]
    items: Vec<RawDirective>,
}

#[derive(Debug, Deserialize)]
struct RawDirective {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@value")]
    value: String,
}

#[derive(Debug, Default, Deserialize)]
struct RegexpList {
    #[serde(rename = "regexp", default)]
    items: Vec<RawRegexp>,
}

#[derive(Debug, Deserialize)]
struct RawRegexp {
    #[serde(rename = "@name")]
    name: Option<String>,
    #[serde(rename = "@value")]
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LiteralList {
    #[serde(rename = "literal", default)]
    items: Vec<RawLiteral>,
}

#[derive(Debug, Deserialize)]
struct RawLiteral {
    #[serde(rename = "@value")]
    value: Option<String>,
    #[serde(rename = "$text")]
    text: Option<String>,
}

impl RawLiteral {
    fn into_value(self) -> Option<String> {
        match self.value {
            Some(v) if !v.is_empty() => Some(v),
            _ => self.text,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AttributeList {
    #[serde(rename = "attribute", default)]
    items: Vec<RawAttribute>,
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@description")]
    description: Option<String>,
    #[serde(rename = "@onInvalid")]
    on_invalid: Option<String>,
    #[serde(rename = "regexp-list")]
    regexp_list: Option<RegexpList>,
    #[serde(rename = "literal-list")]
    literal_list: Option<LiteralList>,
}

impl RawAttribute {
    /// An attribute written without any value lists is a reference to
    /// `<common-attributes>`.
    fn is_reference(&self) -> bool {
        self.regexp_list.is_none() && self.literal_list.is_none()
    }
}

#[derive(Debug, Default, Deserialize)]
struct TagList {
    #[serde(rename = "tag", default)]
    items: Vec<RawTag>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@action")]
    action: Option<String>,
    #[serde(rename = "attribute", default)]
    attributes: Vec<RawAttribute>,
}

#[derive(Debug, Default, Deserialize)]
struct PropertyList {
    #[serde(rename = "property", default)]
    items: Vec<RawProperty>,
}

#[derive(Debug, Deserialize)]
struct RawProperty {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@description")]
    description: Option<String>,
    #[serde(rename = "@onInvalid")]
    on_invalid: Option<String>,
    #[serde(rename = "@default")]
    default_value: Option<String>,
    #[serde(rename = "regexp-list")]
    regexp_list: Option<RegexpList>,
    #[serde(rename = "literal-list")]
    literal_list: Option<LiteralList>,
    #[serde(rename = "shorthand-list")]
    shorthand_list: Option<ShorthandList>,
}

#[derive(Debug, Default, Deserialize)]
struct ShorthandList {
    #[serde(rename = "shorthand", default)]
    items: Vec<RawShorthand>,
}

#[derive(Debug, Deserialize)]
struct RawShorthand {
    #[serde(rename = "@name")]
    name: String,
}

impl Policy {
    /// Parses and resolves a policy from XML text.
    pub fn from_xml_str(xml: &str) -> Result<Self, SieveError> {
        let document: PolicyDocument =
            quick_xml::de::from_str(xml).map_err(|e| SieveError::PolicyFormat(e.to_string()))?;
        Resolver::default().resolve(document)
    }

    /// Loads a policy from an XML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SieveError> {
        let path = path.as_ref();
        info!("Loading policy from: {}", path.display());
        let xml = std::fs::read_to_string(path).map_err(|source| SieveError::PolicyIo {
            path: path.display().to_string(),
            source,
        })?;
        let policy = Self::from_xml_str(&xml)?;
        info!(
            "Loaded policy from {} ({} tag rules, {} css rules).",
            path.display(),
            policy.tag_rules.len(),
            policy.css_rules.len()
        );
        Ok(policy)
    }

    /// Loads the policy embedded in the library.
    pub fn load_default() -> Result<Self, SieveError> {
        debug!("Loading default policy from embedded string...");
        Self::from_xml_str(DEFAULT_POLICY_XML)
    }

    /// The embedded policy, loaded on first use and shared afterwards.
    pub fn shared_default() -> Result<Arc<Self>, SieveError> {
        SHARED_DEFAULT
            .get_or_try_init(|| Self::load_default().map(Arc::new))
            .map(Arc::clone)
    }
}

#[derive(Default)]
struct Resolver {
    cache: PatternCache,
}

impl Resolver {
    fn resolve(mut self, document: PolicyDocument) -> Result<Policy, SieveError> {
        let mut policy = Policy::default();

        for directive in document.directives.items {
            policy
                .directives
                .entry(directive.name)
                .or_insert(directive.value);
        }

        for regexp in document.common_regexps.items {
            let (name, value) = match (regexp.name, regexp.value) {
                (Some(name), Some(value)) => (name, value),
                (name, _) => {
                    return Err(SieveError::PolicyFormat(format!(
                        "<common-regexps> entry '{}' needs both a name and a value",
                        name.unwrap_or_default()
                    )))
                }
            };
            if policy.common_regexps.contains_key(&name) {
                continue;
            }
            let pattern = self.cache.get_or_compile(&name, &value)?;
            policy.common_regexps.insert(name, pattern);
        }

        for raw in document.common_attributes.items {
            let rule = self.attribute_rule(raw, &policy.common_regexps)?;
            policy
                .common_attributes
                .entry(rule.name.to_lowercase())
                .or_insert(rule);
        }

        for raw in document.global_tag_attributes.items {
            let rule = referenced_attribute(&raw, &policy.common_attributes, "global-tag-attributes")?;
            policy.global_attributes.insert(rule.name.to_lowercase(), rule);
        }

        for raw in document.tag_rules.items {
            let rule = self.tag_rule(raw, &policy)?;
            policy.tag_rules.insert(rule.name.to_lowercase(), rule);
        }

        for raw in document.css_rules.items {
            let rule = self.css_rule(raw, &policy.common_regexps)?;
            policy.css_rules.insert(rule.name.to_lowercase(), rule);
        }

        for rule in policy.css_rules.values() {
            for reference in &rule.shorthand_refs {
                if !policy.css_rules.contains_key(&reference.to_lowercase()) {
                    warn!(
                        "Css property '{}' lists shorthand '{}', which is not defined; it will be ignored.",
                        rule.name, reference
                    );
                }
            }
        }

        debug!(
            "Resolved policy: {} directives, {} common regexps ({} distinct patterns compiled, {} reused), {} tag rules, {} css rules.",
            policy.directives.len(),
            policy.common_regexps.len(),
            self.cache.len(),
            self.cache.hits(),
            policy.tag_rules.len(),
            policy.css_rules.len()
        );
        Ok(policy)
    }

    fn patterns(
        &mut self,
        list: Option<RegexpList>,
        owner: &str,
        common: &HashMap<String, Pattern>,
    ) -> Result<Vec<Pattern>, SieveError> {
        let mut patterns = Vec::new();
        for regexp in list.map(|l| l.items).unwrap_or_default() {
            match (regexp.name.filter(|n| !n.is_empty()), regexp.value) {
                (Some(name), _) => match common.get(&name) {
                    Some(pattern) => patterns.push(pattern.clone()),
                    None => {
                        return Err(SieveError::UndefinedRegexp {
                            name,
                            owner: owner.to_string(),
                        })
                    }
                },
                (None, Some(value)) if !value.is_empty() => {
                    patterns.push(self.cache.get_or_compile(owner, &value)?);
                }
                (None, _) => {
                    return Err(SieveError::PolicyFormat(format!(
                        "a <regexp> in the definition of '{}' has neither a name nor a value",
                        owner
                    )))
                }
            }
        }
        Ok(patterns)
    }

    fn attribute_rule(
        &mut self,
        raw: RawAttribute,
        common: &HashMap<String, Pattern>,
    ) -> Result<AttributeRule, SieveError> {
        let allowed_patterns = self.patterns(raw.regexp_list, &raw.name, common)?;
        let allowed_literals = literals(raw.literal_list);
        Ok(AttributeRule {
            on_invalid: on_invalid(raw.on_invalid.as_deref(), &raw.name),
            description: raw.description,
            name: raw.name,
            allowed_literals,
            allowed_patterns,
        })
    }

    fn tag_rule(&mut self, raw: RawTag, policy: &Policy) -> Result<TagRule, SieveError> {
        let action = match raw.action.as_deref().map(TagAction::parse) {
            Some(Some(action)) => action,
            Some(None) | None => {
                warn!(
                    "Tag '{}' has unknown action {:?}; treating it as 'remove'.",
                    raw.name, raw.action
                );
                TagAction::Remove
            }
        };

        let mut rule = TagRule::new(raw.name, action);
        for attribute in raw.attributes {
            let resolved = if attribute.is_reference() {
                referenced_attribute(&attribute, &policy.common_attributes, &rule.name)?
            } else {
                self.attribute_rule(attribute, &policy.common_regexps)?
            };
            rule.allowed_attributes
                .insert(resolved.name.to_lowercase(), resolved);
        }
        Ok(rule)
    }

    fn css_rule(
        &mut self,
        raw: RawProperty,
        common: &HashMap<String, Pattern>,
    ) -> Result<CssPropertyRule, SieveError> {
        let allowed_patterns = self.patterns(raw.regexp_list, &raw.name, common)?;
        Ok(CssPropertyRule {
            allowed_patterns,
            allowed_literals: literals(raw.literal_list),
            shorthand_refs: raw
                .shorthand_list
                .map(|l| l.items.into_iter().map(|s| s.name).collect())
                .unwrap_or_default(),
            on_invalid: on_invalid(raw.on_invalid.as_deref(), &raw.name),
            description: raw.description,
            default_value: raw.default_value,
            name: raw.name,
        })
    }
}

/// Copies a `<common-attributes>` entry, applying any `onInvalid` or
/// `description` override written on the reference.
fn referenced_attribute(
    raw: &RawAttribute,
    common: &HashMap<String, AttributeRule>,
    owner: &str,
) -> Result<AttributeRule, SieveError> {
    let mut rule = common
        .get(&raw.name.to_lowercase())
        .cloned()
        .ok_or_else(|| SieveError::UndefinedAttribute {
            name: raw.name.clone(),
            owner: owner.to_string(),
        })?;

    if let Some(action) = raw.on_invalid.as_deref().filter(|s| !s.is_empty()) {
        rule.on_invalid = on_invalid(Some(action), &raw.name);
    }
    if let Some(description) = raw.description.as_ref().filter(|s| !s.is_empty()) {
        rule.description = Some(description.clone());
    }
    Ok(rule)
}

fn literals(list: Option<LiteralList>) -> Vec<String> {
    list.map(|l| l.items.into_iter().filter_map(RawLiteral::into_value).collect())
        .unwrap_or_default()
}

fn on_invalid(raw: Option<&str>, owner: &str) -> OnInvalid {
    match raw.filter(|s| !s.trim().is_empty()) {
        None => OnInvalid::default(),
        Some(value) => OnInvalid::parse(value).unwrap_or_else(|| {
            warn!(
                "'{}' has unknown onInvalid value '{}'; using removeAttribute.",
                owner, value
            );
            OnInvalid::RemoveAttribute
        }),
    }
}
