//! Token-level serialization.
//!
//! Everything this crate hands back (selectors, preludes, declaration values)
//! is rebuilt from `cssparser` tokens. Comments are dropped, runs of
//! whitespace become one space and escapes come out resolved. Where dropping
//! a comment would glue two tokens into one, an empty `/**/` is written
//! between them, so the text re-tokenizes to the same sequence.

use cssparser::{ParseError as CssError, Parser, ToCss, Token, TokenSerializationType};

use crate::error::Invalid;
use crate::parser::MAX_BLOCK_DEPTH;

/// Functions whose direct string arguments are fetched as urls.
const URL_FUNCTIONS: &[&str] = &["url", "src", "image", "image-set", "-webkit-image-set"];

/// Serialized text of a token run plus what the serializer saw on the way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenText {
    pub text: String,
    /// Every url target, from `url(...)` tokens and from strings passed to
    /// url-taking functions.
    pub urls: Vec<String>,
    /// A bad string, a bad url or an unmatched closing bracket was seen.
    pub malformed: bool,
}

/// Serializes the rest of `input`. The result is trimmed.
pub(crate) fn serialize_tokens<'i>(
    input: &mut Parser<'i, '_>,
    depth: usize,
) -> Result<TokenText, CssError<'i, Invalid>> {
    let mut out = TokenText::default();
    write_tokens(input, depth, false, &mut out)?;
    let trimmed = out.text.trim();
    if trimmed.len() != out.text.len() {
        out.text = trimmed.to_string();
    }
    Ok(out)
}

fn write_tokens<'i>(
    input: &mut Parser<'i, '_>,
    depth: usize,
    url_arguments: bool,
    out: &mut TokenText,
) -> Result<(), CssError<'i, Invalid>> {
    if depth > MAX_BLOCK_DEPTH {
        return Err(input.new_custom_error(Invalid::TooDeep));
    }

    let mut previous = TokenSerializationType::nothing();
    let mut after_comment = false;
    let mut after_space = false;

    while let Ok(token) = input.next_including_whitespace_and_comments() {
        let token = token.clone();
        match token {
            Token::Comment(_) => {
                after_comment = true;
                continue;
            }
            Token::WhiteSpace(_) => {
                if !after_space {
                    out.text.push(' ');
                    after_space = true;
                }
                previous = token.serialization_type();
                after_comment = false;
                continue;
            }
            _ => {}
        }

        let kind = token.serialization_type();
        if after_comment && previous.needs_separator_when_before(kind) {
            out.text.push_str("/**/");
        }
        after_comment = false;
        after_space = false;

        match &token {
            Token::UnquotedUrl(url) => out.urls.push(url.to_string()),
            Token::QuotedString(value) if url_arguments => out.urls.push(value.to_string()),
            Token::BadUrl(url) => {
                out.urls.push(url.to_string());
                out.malformed = true;
            }
            Token::BadString(_)
            | Token::CloseParenthesis
            | Token::CloseSquareBracket
            | Token::CloseCurlyBracket => out.malformed = true,
            _ => {}
        }
        out.text.push_str(&token.to_css_string());

        let closer = match &token {
            Token::Function(_) | Token::ParenthesisBlock => Some(')'),
            Token::SquareBracketBlock => Some(']'),
            Token::CurlyBracketBlock => Some('}'),
            _ => None,
        };
        match closer {
            Some(closer) => {
                let takes_urls = matches!(
                    &token,
                    Token::Function(name)
                        if URL_FUNCTIONS.iter().any(|f| name.eq_ignore_ascii_case(f))
                );
                input.parse_nested_block(|nested| write_tokens(nested, depth + 1, takes_urls, out))?;
                out.text.push(closer);
                previous = TokenSerializationType::nothing();
            }
            None => previous = kind,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cssparser::ParserInput;

    fn serialize(css: &str) -> TokenText {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        serialize_tokens(&mut parser, 0).unwrap()
    }

    #[test]
    fn test_comments_are_dropped_and_whitespace_collapsed() {
        assert_eq!(serialize("  red  /* x */  bold ").text, "red bold");
    }

    #[test]
    fn test_escapes_come_out_resolved() {
        assert_eq!(serialize(r"\65 xpression(1)").text, "expression(1)");
        assert_eq!(serialize(r"j\61vascript").text, "javascript");
    }

    #[test]
    fn test_comment_between_tokens_that_would_merge_keeps_them_apart() {
        assert_eq!(serialize("expr/**/ession(1)").text, "expr/**/ession(1)");
        assert_eq!(serialize("a/* x */,b").text, "a,b");
    }

    #[test]
    fn test_comment_markers_inside_unquoted_urls_are_url_text() {
        let scanned = serialize("url(http://a/*), url(//evil.example/leak), url(*/b)");
        assert_eq!(
            scanned.urls,
            vec![
                "http://a/*".to_string(),
                "//evil.example/leak".to_string(),
                "*/b".to_string()
            ]
        );
        assert_eq!(scanned.text, "url(http://a/*), url(//evil.example/leak), url(*/b)");
        assert!(!scanned.malformed);
    }

    #[test]
    fn test_quoted_url_arguments_are_collected() {
        let scanned = serialize(r#"url('a.png') image-set("b.png" 1x, url(c.png) 2x)"#);
        assert_eq!(scanned.urls, vec!["a.png", "b.png", "c.png"]);
        assert_eq!(scanned.text, r#"url("a.png") image-set("b.png" 1x, url(c.png) 2x)"#);
    }

    #[test]
    fn test_bad_url_marks_the_run_malformed() {
        let scanned = serialize("url(javascript:alert(1))");
        assert!(scanned.malformed);
        assert!(scanned.urls[0].starts_with("javascript:alert"));
    }

    #[test]
    fn test_serialization_is_stable() {
        let once = serialize(r"a/**/b \31 0px url( 'x y' ) 'q\'s'").text;
        assert_eq!(serialize(&once).text, once);
    }
}
