//! Structured content to Markdown.
//!
//! Runs are merged, escaped, wrapped in delimiters, then joined into
//! paragraphs: body paragraphs end with one line break, headings with a
//! blank line.

use std::borrow::Cow;

use crate::escape::escape;
use crate::style::{Block, Paragraph, TextRun};

/// Stand-in for a table. Not round-trippable.
pub const TABLE_PLACEHOLDER: &str = "_[Table content]_";

/// Stand-in for block kinds the converter does not understand.
pub const UNSUPPORTED_PLACEHOLDER: &str = "_[Unsupported content]_";

/// Merge adjacent runs that share an identical style.
///
/// The result is maximal: no two neighbours have the same style.
pub fn merge_runs(runs: &[TextRun]) -> Vec<TextRun> {
    let mut merged: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs {
        if run.text.is_empty() {
            continue;
        }
        match merged.last_mut() {
            Some(last) if last.style == run.style => last.text.push_str(&run.text),
            _ => merged.push(run.clone()),
        }
    }
    merged
}

/// Render one merged run.
pub fn render_run(run: &TextRun) -> String {
    let text = run.text.as_str();

    // Paragraph newlines never go inside emphasis markers
    if text == "\n" {
        return text.to_string();
    }

    if run.style.is_plain() {
        return escape(text);
    }

    let core = text.trim();
    if core.is_empty() {
        return text.to_string();
    }

    // Surrounding whitespace stays outside the delimiters, unstyled
    let leading_len = text.len() - text.trim_start().len();
    let leading = &text[..leading_len];
    let trailing = &text[leading_len + core.len()..];

    let style = &run.style;
    let mut formatted = escape(core);

    if style.strikethrough {
        formatted = format!("~~{}~~", formatted);
    }

    if style.underline {
        formatted = format!("<u>{}</u>", formatted);
    }

    formatted = match (style.bold, style.italic) {
        (true, true) => format!("***{}***", formatted),
        (true, false) => format!("**{}**", formatted),
        (false, true) => format!("*{}*", formatted),
        (false, false) => formatted,
    };

    if let Some(url) = &style.link {
        formatted = format!("[{}]({})", formatted, link_target(url));
    }

    format!("{}{}{}", leading, formatted, trailing)
}

/// A link URL as written between `(` and `)`. Balanced parentheses are
/// kept; otherwise they are percent-encoded so the target cannot end early.
fn link_target(url: &str) -> Cow<'_, str> {
    if parens_balanced(url) {
        Cow::Borrowed(url)
    } else {
        Cow::Owned(url.replace('(', "%28").replace(')', "%29"))
    }
}

fn parens_balanced(url: &str) -> bool {
    let mut depth = 0usize;
    for c in url.chars() {
        match c {
            '(' => depth += 1,
            ')' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => {}
        }
    }
    depth == 0
}

/// Render a paragraph's runs without heading prefix or separator.
pub fn render_paragraph(paragraph: &Paragraph) -> String {
    merge_runs(&paragraph.runs).iter().map(render_run).collect()
}

/// Convert a document body to Markdown.
pub fn blocks_to_markup(blocks: &[Block]) -> String {
    let mut markup = String::new();

    for block in blocks {
        match block {
            Block::Paragraph(paragraph) => {
                let text = render_paragraph(paragraph);

                if text.trim().is_empty() {
                    markup.push('\n');
                    continue;
                }

                if let Some(level) = paragraph.heading {
                    markup.push_str(&"#".repeat(level.get() as usize));
                    markup.push(' ');
                }
                markup.push_str(text.trim_end_matches('\n'));

                if paragraph.heading.is_some() {
                    markup.push_str("\n\n");
                } else {
                    markup.push('\n');
                }
            }
            Block::Table => {
                markup.push_str(TABLE_PLACEHOLDER);
                markup.push_str("\n\n");
            }
            Block::Unsupported(_) => {
                markup.push_str(UNSUPPORTED_PLACEHOLDER);
                markup.push_str("\n\n");
            }
            Block::SectionBreak => {}
        }
    }

    markup.trim_end().to_string()
}

/// Convert a list of paragraphs to Markdown.
pub fn paragraphs_to_markup(paragraphs: &[Paragraph]) -> String {
    let blocks: Vec<Block> = paragraphs.iter().cloned().map(Block::Paragraph).collect();
    blocks_to_markup(&blocks)
}
