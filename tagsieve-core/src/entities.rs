//! HTML entity handling: decoding attribute values before they are compared
//! with a policy, and encoding input fragments before they are quoted in a
//! diagnostic.
//!
//! License: MIT OR APACHE 2.0

use htmlentity::entity::{decode, ICodedDataTrait};

/// Resolves named and numeric character references in `value`.
///
/// Values that cannot be decoded are returned unchanged.
pub fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    decode(value.as_bytes())
        .to_string()
        .unwrap_or_else(|_| value.to_string())
}

/// Encodes `value` so it can be embedded in a diagnostic shown as HTML.
///
/// Letters, digits and whitespace pass through. `&`, `<` and `>` become
/// named references and every other character a numeric one.
pub fn encode_for_message(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if c.is_whitespace() || c.is_alphanumeric() => out.push(c),
            c => {
                out.push_str("&#");
                out.push_str(&(c as u32).to_string());
                out.push(';');
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("left"), "left");
        assert_eq!(decode_entities("&#106;avascript&#x3a;"), "javascript:");
        assert_eq!(decode_entities("a &amp; b"), "a & b");
    }

    #[test]
    fn test_encode_for_message() {
        assert_eq!(encode_for_message("onclick"), "onclick");
        assert_eq!(encode_for_message("<script>"), "&lt;script&gt;");
        assert_eq!(encode_for_message("a\"b"), "a&#34;b");
        assert_eq!(encode_for_message("x y"), "x y");
        assert_eq!(encode_for_message("(1)"), "&#40;1&#41;");
    }
}
