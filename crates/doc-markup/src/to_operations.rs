//! Markdown to structured-content write operations.
//!
//! Markup is flattened to plain text while the styled spans are recorded as
//! [`FormattingRange`]s over that text. Offsets are 1-based and counted in
//! UTF-16 code units, the remote service's indexing unit.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexer::{SpanKind, Token, next_token};
use crate::ops::{Link, NORMAL_TEXT, Operation, Range, TextStyleFields, UpdateTextStyle};
use crate::style::{HeadingLevel, Paragraph, TextRun, TextStyle};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").unwrap());

/// Index at which a document body's editable text begins.
pub const BODY_START: usize = 1;

/// Style attributes to apply over a span of the inserted text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormattingRange {
    pub start_index: usize,
    pub end_index: usize,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub strikethrough: Option<bool>,
    pub underline: Option<bool>,
    pub link: Option<String>,
}

impl FormattingRange {
    fn for_span(kind: SpanKind, start_index: usize, end_index: usize, url: Option<&str>) -> Self {
        let mut range = Self {
            start_index,
            end_index,
            ..Self::default()
        };
        range.absorb(kind, url);
        range
    }

    /// Add the attribute a span kind applies.
    fn absorb(&mut self, kind: SpanKind, url: Option<&str>) {
        match kind {
            SpanKind::BoldItalic => {
                self.bold = Some(true);
                self.italic = Some(true);
            }
            SpanKind::Bold => self.bold = Some(true),
            SpanKind::Italic => self.italic = Some(true),
            SpanKind::Strikethrough => self.strikethrough = Some(true),
            SpanKind::Underline => self.underline = Some(true),
            SpanKind::Link => self.link = url.map(str::to_string),
        }
    }

    fn field_mask(&self) -> String {
        let mut fields = Vec::new();
        if self.bold.is_some() {
            fields.push("bold");
        }
        if self.italic.is_some() {
            fields.push("italic");
        }
        if self.underline.is_some() {
            fields.push("underline");
        }
        if self.strikethrough.is_some() {
            fields.push("strikethrough");
        }
        if self.link.is_some() {
            fields.push("link");
        }
        fields.join(",")
    }

    pub fn to_operation(&self, tab_id: Option<&str>) -> Operation {
        Operation::UpdateTextStyle(UpdateTextStyle {
            range: Range::new(self.start_index, self.end_index, tab_id),
            text_style: TextStyleFields {
                bold: self.bold,
                italic: self.italic,
                underline: self.underline,
                strikethrough: self.strikethrough,
                link: self.link.clone().map(|url| Link { url }),
            },
            fields: self.field_mask(),
        })
    }

    /// Overlay the attributes this range sets onto `style`.
    fn apply(&self, style: &mut TextStyle) {
        if let Some(bold) = self.bold {
            style.bold = bold;
        }
        if let Some(italic) = self.italic {
            style.italic = italic;
        }
        if let Some(underline) = self.underline {
            style.underline = underline;
        }
        if let Some(strikethrough) = self.strikethrough {
            style.strikethrough = strikethrough;
        }
        if let Some(url) = &self.link {
            style.link = Some(url.clone());
        }
    }

    fn contains(&self, index: usize) -> bool {
        self.start_index <= index && index < self.end_index
    }
}

/// A heading paragraph, newline included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadingRange {
    pub start_index: usize,
    pub end_index: usize,
    pub level: HeadingLevel,
}

impl HeadingRange {
    pub fn to_operation(&self, tab_id: Option<&str>) -> Operation {
        Operation::named_paragraph_style(
            Range::new(self.start_index, self.end_index, tab_id),
            self.level.named_style(),
        )
    }
}

/// Plain text plus the styling needed to rebuild the markup in a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMarkup {
    pub plain_text: String,
    /// Ordered by decreasing start, wider first on ties
    pub ranges: Vec<FormattingRange>,
    pub headings: Vec<HeadingRange>,
}

impl ParsedMarkup {
    /// Length of the plain text in UTF-16 units.
    pub fn utf16_len(&self) -> usize {
        self.plain_text.encode_utf16().count()
    }

    /// Exclusive end index of the text once inserted at [`BODY_START`].
    pub fn end_index(&self) -> usize {
        BODY_START + self.utf16_len()
    }

    pub fn insert_operation(&self, tab_id: Option<&str>) -> Option<Operation> {
        (!self.plain_text.is_empty())
            .then(|| Operation::insert_text(BODY_START, self.plain_text.clone(), tab_id))
    }

    pub fn style_operations(&self, tab_id: Option<&str>) -> Vec<Operation> {
        self.ranges.iter().map(|r| r.to_operation(tab_id)).collect()
    }

    /// Rebuild the paragraphs a document would hold after the insert and
    /// style operations are applied to an empty body.
    pub fn paragraphs(&self) -> Vec<Paragraph> {
        let mut paragraphs = Vec::new();
        let mut runs: Vec<TextRun> = Vec::new();
        let mut paragraph_start = BODY_START;
        let mut index = BODY_START;

        for c in self.plain_text.chars() {
            let mut style = TextStyle::default();
            for range in self.ranges.iter().rev().filter(|r| r.contains(index)) {
                range.apply(&mut style);
            }

            match runs.last_mut() {
                Some(last) if last.style == style => last.text.push(c),
                _ => runs.push(TextRun::new(c.to_string(), style)),
            }
            index += c.len_utf16();

            if c == '\n' {
                paragraphs.push(self.paragraph_at(paragraph_start, std::mem::take(&mut runs)));
                paragraph_start = index;
            }
        }

        if !runs.is_empty() {
            paragraphs.push(self.paragraph_at(paragraph_start, runs));
        }

        paragraphs
    }

    fn paragraph_at(&self, start_index: usize, runs: Vec<TextRun>) -> Paragraph {
        let heading = self
            .headings
            .iter()
            .find(|h| h.start_index == start_index)
            .map(|h| h.level);
        Paragraph { heading, runs }
    }
}

/// Accumulates plain text and tracks the next insertion offset.
struct PlainTextWriter {
    text: String,
    offset: usize,
    ranges: Vec<FormattingRange>,
}

impl PlainTextWriter {
    fn new() -> Self {
        Self {
            text: String::new(),
            offset: BODY_START,
            ranges: Vec::new(),
        }
    }

    fn push(&mut self, c: char) {
        self.text.push(c);
        self.offset += c.len_utf16();
    }

    /// Lex `markup` and write its literal text, recording styled spans.
    fn write_inline(&mut self, markup: &str) {
        let mut rest = markup;
        while let Some(token) = next_token(rest) {
            match token {
                Token::Literal(c, len) => {
                    self.push(c);
                    rest = &rest[len..];
                }
                Token::Span(span) => {
                    let start = self.offset;
                    self.write_inline(span.inner);
                    let end = self.offset;
                    if end > start {
                        self.record(span.kind, start, end, span.url);
                    }
                    rest = &rest[span.consumed..];
                }
            }
        }
    }

    fn record(&mut self, kind: SpanKind, start: usize, end: usize, url: Option<&str>) {
        // Nested delimiters over the same text collapse into one range.
        // Inner spans are recorded first, so the match is always the last one.
        match self.ranges.last_mut() {
            Some(last) if last.start_index == start && last.end_index == end => {
                last.absorb(kind, url)
            }
            _ => self
                .ranges
                .push(FormattingRange::for_span(kind, start, end, url)),
        }
    }
}

/// Split a heading marker off a line.
fn split_heading(line: &str) -> (Option<HeadingLevel>, &str) {
    match HEADING.captures(line) {
        Some(caps) => {
            let level = HeadingLevel::new(caps[1].len() as u8);
            let text = caps.get(2).map_or("", |m| m.as_str());
            (level, text)
        }
        None => (None, line),
    }
}

/// Parse markup into plain text, style ranges and heading ranges.
pub fn parse_markup(markup: &str) -> ParsedMarkup {
    let mut writer = PlainTextWriter::new();
    let mut headings = Vec::new();

    let lines: Vec<&str> = markup.split('\n').collect();
    let last = lines.len() - 1;
    let mut after_heading = false;

    for (i, raw) in lines.iter().copied().enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        if after_heading && line.is_empty() {
            after_heading = false;
            continue;
        }

        let (level, text) = split_heading(line);
        let start = writer.offset;

        writer.write_inline(text);
        if i != last || !line.is_empty() {
            writer.push('\n');
        }

        if let Some(level) = level {
            headings.push(HeadingRange {
                start_index: start,
                end_index: writer.offset,
                level,
            });
        }
        after_heading = level.is_some();
    }

    let mut ranges = writer.ranges;
    ranges.sort_by(|a, b| {
        b.start_index
            .cmp(&a.start_index)
            .then(b.end_index.cmp(&a.end_index))
    });

    ParsedMarkup {
        plain_text: writer.text,
        ranges,
        headings,
    }
}

/// The insert and text-style operations for a markup document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationBatch {
    pub operations: Vec<Operation>,
    pub plain_text: String,
    pub headings: Vec<HeadingRange>,
}

impl OperationBatch {
    /// Everything needed to fill an emptied body: the insert, a reset of the
    /// styles the inserted text picked up from its neighbours, the text
    /// styles, then the heading styles.
    pub fn into_fill_operations(self, tab_id: Option<&str>) -> Vec<Operation> {
        if self.plain_text.is_empty() {
            return Vec::new();
        }

        let mut operations = self.operations;
        let styles = operations.split_off(1);

        let end = BODY_START + self.plain_text.encode_utf16().count();
        let span = Range::new(BODY_START, end, tab_id);
        operations.push(Operation::clear_text_style(span.clone()));
        operations.push(Operation::named_paragraph_style(span, NORMAL_TEXT));

        operations.extend(styles);
        operations.extend(self.headings.iter().map(|h| h.to_operation(tab_id)));
        operations
    }
}

/// Convert markup to an insert at the start of the body followed by style
/// updates in decreasing start order.
pub fn markup_to_operations(markup: &str, tab_id: Option<&str>) -> OperationBatch {
    let parsed = parse_markup(markup);

    let mut operations: Vec<Operation> = parsed.insert_operation(tab_id).into_iter().collect();
    operations.extend(parsed.style_operations(tab_id));

    OperationBatch {
        operations,
        plain_text: parsed.plain_text,
        headings: parsed.headings,
    }
}
