//! Input normalization applied before markup is parsed.
//!
//! License: MIT OR APACHE 2.0

use std::borrow::Cow;

const NBSP_ENTITY: &str = "&nbsp;";

/// Applies every normalization step in order.
pub fn prepare(input: &str) -> String {
    let normalized = normalize_nbsp(input);
    strip_invalid_xml_chars(&normalized).into_owned()
}

/// Replaces the `&nbsp;` reference with a literal U+00A0.
pub fn normalize_nbsp(input: &str) -> Cow<'_, str> {
    if input.contains(NBSP_ENTITY) {
        Cow::Owned(input.replace(NBSP_ENTITY, "\u{a0}"))
    } else {
        Cow::Borrowed(input)
    }
}

/// True for code points allowed in an XML document.
pub fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x9 | 0xA | 0xD | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Drops every code point outside the XML character ranges.
pub fn strip_invalid_xml_chars(input: &str) -> Cow<'_, str> {
    if input.chars().all(is_valid_xml_char) {
        Cow::Borrowed(input)
    } else {
        Cow::Owned(input.chars().filter(|&c| is_valid_xml_char(c)).collect())
    }
}
