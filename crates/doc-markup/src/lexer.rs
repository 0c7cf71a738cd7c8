//! Inline lexer for the round-trip Markdown subset.
//!
//! At every cursor position the span rules are tried in a fixed priority
//! order; the first match wins. When nothing matches, one literal is
//! consumed (an escape sequence or entity counts as one literal).
//!
//! `***` is tried before `**` and `*` so that `***x***` is bold+italic and
//! not italic-wrapped bold.

use crate::escape::next_literal;

/// The style a matched span applies to its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    BoldItalic,
    Bold,
    Italic,
    Strikethrough,
    Underline,
    Link,
}

/// A matched span at the start of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanMatch<'a> {
    pub kind: SpanKind,
    /// Markup between the delimiters, still to be lexed
    pub inner: &'a str,
    /// Link target (links only)
    pub url: Option<&'a str>,
    /// Bytes consumed, delimiters included
    pub consumed: usize,
}

/// One lexed unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Span(SpanMatch<'a>),
    /// A decoded literal character and the bytes it took in the source
    Literal(char, usize),
}

type Matcher = for<'a> fn(&'a str) -> Option<SpanMatch<'a>>;

/// Span rules in priority order.
const SPAN_RULES: &[Matcher] = &[
    bold_italic,
    bold,
    italic,
    strikethrough,
    underline,
    link,
];

/// Lex the next token at the start of `text`.
pub fn next_token(text: &str) -> Option<Token<'_>> {
    if text.is_empty() {
        return None;
    }

    SPAN_RULES
        .iter()
        .find_map(|rule| rule(text))
        .map(Token::Span)
        .or_else(|| next_literal(text).map(|(c, len)| Token::Literal(c, len)))
}

fn bold_italic(text: &str) -> Option<SpanMatch<'_>> {
    delimited(text, SpanKind::BoldItalic, "***", "***")
}

fn bold(text: &str) -> Option<SpanMatch<'_>> {
    delimited(text, SpanKind::Bold, "**", "**")
}

fn italic(text: &str) -> Option<SpanMatch<'_>> {
    delimited(text, SpanKind::Italic, "*", "*")
}

fn strikethrough(text: &str) -> Option<SpanMatch<'_>> {
    delimited(text, SpanKind::Strikethrough, "~~", "~~")
}

fn underline(text: &str) -> Option<SpanMatch<'_>> {
    delimited(text, SpanKind::Underline, "<u>", "</u>")
}

/// `[text](url)`: text has no unescaped `]`, parentheses in url are
/// balanced, both non-empty.
fn link(text: &str) -> Option<SpanMatch<'_>> {
    let body = text.strip_prefix('[')?;
    let close = find_unescaped(body, ']')?;
    if close == 0 {
        return None;
    }

    let after = body[close + 1..].strip_prefix('(')?;
    let url_len = url_end(after)?;
    if url_len == 0 {
        return None;
    }

    Some(SpanMatch {
        kind: SpanKind::Link,
        inner: &body[..close],
        url: Some(&after[..url_len]),
        // '[' + text + "](" + url + ')'
        consumed: 1 + close + 2 + url_len + 1,
    })
}

/// Position of the `)` closing a link target, skipping balanced pairs.
fn url_end(after: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in after.char_indices() {
        match c {
            '(' => depth += 1,
            ')' if depth == 0 => return Some(i),
            ')' => depth -= 1,
            _ => {}
        }
    }
    None
}

/// Match `open`, then the shortest non-empty content, then `close`.
fn delimited<'a>(text: &'a str, kind: SpanKind, open: &str, close: &str) -> Option<SpanMatch<'a>> {
    let body = text.strip_prefix(open)?;
    let end = find_closing(body, close)?;

    Some(SpanMatch {
        kind,
        inner: &body[..end],
        url: None,
        consumed: open.len() + end + close.len(),
    })
}

/// Byte length of the literal at the start of `text`, treating a backslash
/// escape as a single unit so escaped delimiters never close a span.
fn literal_len(text: &str) -> usize {
    let mut chars = text.chars();
    match chars.next() {
        Some('\\') => match chars.next() {
            Some(next) => 1 + next.len_utf8(),
            None => 1,
        },
        Some(c) => c.len_utf8(),
        None => 0,
    }
}

/// Position of the first `close` after at least one literal of content.
fn find_closing(body: &str, close: &str) -> Option<usize> {
    let mut pos = literal_len(body);
    if pos == 0 {
        return None;
    }

    while pos < body.len() {
        if body[pos..].starts_with(close) {
            return Some(pos);
        }
        pos += literal_len(&body[pos..]);
    }

    None
}

fn find_unescaped(body: &str, target: char) -> Option<usize> {
    let mut pos = 0;
    while pos < body.len() {
        if body[pos..].starts_with(target) {
            return Some(pos);
        }
        pos += literal_len(&body[pos..]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str) -> SpanMatch<'_> {
        match next_token(text) {
            Some(Token::Span(span)) => span,
            other => panic!("expected span for {:?}, got {:?}", text, other),
        }
    }

    #[test]
    fn test_triple_asterisk_wins() {
        let m = span("***x*** tail");
        assert_eq!(m.kind, SpanKind::BoldItalic);
        assert_eq!(m.inner, "x");
        assert_eq!(m.consumed, 7);
    }

    #[test]
    fn test_bold_before_italic() {
        let m = span("**a** b");
        assert_eq!(m.kind, SpanKind::Bold);
        assert_eq!(m.inner, "a");
    }

    #[test]
    fn test_lazy_content() {
        let m = span("*a* and *b*");
        assert_eq!(m.kind, SpanKind::Italic);
        assert_eq!(m.inner, "a");
        assert_eq!(m.consumed, 3);
    }

    #[test]
    fn test_adjacent_bold_then_italic() {
        let m = span("**a***b*");
        assert_eq!(m.kind, SpanKind::Bold);
        assert_eq!(m.inner, "a");
        assert_eq!(m.consumed, 5);
    }

    #[test]
    fn test_escaped_delimiter_does_not_close() {
        let m = span(r"*a\*b*");
        assert_eq!(m.kind, SpanKind::Italic);
        assert_eq!(m.inner, r"a\*b");
    }

    #[test]
    fn test_strike_and_underline() {
        assert_eq!(span("~~gone~~").kind, SpanKind::Strikethrough);
        let m = span("<u>under</u>!");
        assert_eq!(m.kind, SpanKind::Underline);
        assert_eq!(m.inner, "under");
        assert_eq!(m.consumed, 12);
    }

    #[test]
    fn test_link() {
        let m = span("[docs](https://example.com/a?b=c) more");
        assert_eq!(m.kind, SpanKind::Link);
        assert_eq!(m.inner, "docs");
        assert_eq!(m.url, Some("https://example.com/a?b=c"));
        assert_eq!(m.consumed, "[docs](https://example.com/a?b=c)".len());
    }

    #[test]
    fn test_link_url_with_balanced_parens() {
        let m = span("[Foo](https://en.wikipedia.org/wiki/Foo_(bar)) tail");
        assert_eq!(m.url, Some("https://en.wikipedia.org/wiki/Foo_(bar)"));
        assert_eq!(
            m.consumed,
            "[Foo](https://en.wikipedia.org/wiki/Foo_(bar))".len()
        );
    }

    #[test]
    fn test_link_url_with_unclosed_paren_is_literal() {
        assert!(matches!(next_token("[a](u(v)"), Some(Token::Literal(..))));
    }

    #[test]
    fn test_link_with_escaped_bracket() {
        let m = span(r"[a\]b](u)");
        assert_eq!(m.inner, r"a\]b");
        assert_eq!(m.url, Some("u"));
    }

    #[test]
    fn test_unmatched_openers_are_literals() {
        for text in ["*open", "**", "~~x", "<u>x", "[text]", "[text](", "[](u)"] {
            assert!(
                matches!(next_token(text), Some(Token::Literal(..))),
                "{text:?} should lex as a literal"
            );
        }
    }

    #[test]
    fn test_bare_triple_asterisk_is_italic_star() {
        let m = span("***");
        assert_eq!(m.kind, SpanKind::Italic);
        assert_eq!(m.inner, "*");
    }

    #[test]
    fn test_escape_literal() {
        assert_eq!(next_token(r"\#1"), Some(Token::Literal('#', 2)));
        assert_eq!(next_token("&amp;"), Some(Token::Literal('&', 5)));
        assert_eq!(next_token(""), None);
    }
}
