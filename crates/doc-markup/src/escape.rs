//! Escaping between literal text and markup-significant characters.

/// Characters escaped with a leading backslash.
pub const DELIMITERS: &[char] = &['*', '_', '~', '`', '[', ']', '#', '|'];

/// HTML entities and the character each one stands for.
const ENTITIES: &[(&str, char)] = &[("&amp;", '&'), ("&lt;", '<'), ("&gt;", '>')];

fn is_escapable(c: char) -> bool {
    c == '\\' || DELIMITERS.contains(&c)
}

/// Escape literal text so it displays verbatim once rendered as markup.
///
/// Equivalent to replacing, in order: backslash, then `& < >` with entities,
/// then each delimiter with its backslash form. Doing it in a single pass
/// means no inserted escape is ever escaped again.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if is_escapable(c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Decode one literal at the start of `text`.
///
/// Returns the decoded character and the number of bytes consumed. An escape
/// sequence or entity counts as one literal; anything else is one character.
/// Returns `None` only for empty input.
pub fn next_literal(text: &str) -> Option<(char, usize)> {
    let mut chars = text.chars();
    let first = chars.next()?;

    if first == '\\' {
        if let Some(next) = chars.next() {
            if is_escapable(next) {
                return Some((next, 1 + next.len_utf8()));
            }
        }
    } else if first == '&' {
        for (entity, c) in ENTITIES {
            if text.starts_with(entity) {
                return Some((*c, entity.len()));
            }
        }
    }

    Some((first, first.len_utf8()))
}

/// Inverse of [`escape`].
///
/// Text without escape sequences or entities is returned unchanged; a lone
/// backslash stays a backslash.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some((c, len)) = next_literal(rest) {
        out.push(c);
        rest = &rest[len..];
    }
    out
}
