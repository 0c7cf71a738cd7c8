//! Word counting over plain text and markup.

use once_cell::sync::Lazy;
use regex::Regex;

static IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static UNDERLINE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"</?u>").unwrap());
static MARKERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[*_~`#>|\\]").unwrap());

/// Number of whitespace-separated tokens.
pub fn count_plain_words(text: &str) -> u64 {
    text.split_whitespace().count() as u64
}

/// Number of words a reader would see once the markup is rendered.
///
/// Images are dropped, links count their text only, and markers and
/// escapes are removed before counting.
pub fn count_markup_words(markup: &str) -> u64 {
    let text = IMAGE.replace_all(markup, " ");
    let text = LINK.replace_all(&text, "$1");
    let text = UNDERLINE_TAG.replace_all(&text, "");
    let text = MARKERS.replace_all(&text, "");
    count_plain_words(&text)
}
