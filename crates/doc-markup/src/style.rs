//! Styled text model shared by both conversion directions.
//!
//! A document is a list of [`Block`]s. Paragraph blocks hold [`TextRun`]s,
//! each carrying one uniform [`TextStyle`].

use serde::{Deserialize, Serialize};

/// Character-level style attributes supported by the round-trip format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    /// Link target, if the text is a hyperlink
    pub link: Option<String>,
}

impl TextStyle {
    /// Returns true when no attribute is set.
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.underline && !self.strikethrough && self.link.is_none()
    }

    pub fn bold() -> Self {
        Self {
            bold: true,
            ..Self::default()
        }
    }

    pub fn italic() -> Self {
        Self {
            italic: true,
            ..Self::default()
        }
    }

    pub fn link(url: impl Into<String>) -> Self {
        Self {
            link: Some(url.into()),
            ..Self::default()
        }
    }
}

/// A contiguous piece of text with one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub style: TextStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, TextStyle::default())
    }
}

/// Heading level, always within 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    pub const MAX: u8 = 6;

    /// Returns `None` for levels outside 1..=6.
    pub fn new(level: u8) -> Option<Self> {
        (1..=Self::MAX).contains(&level).then_some(Self(level))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Parse a named paragraph style such as `HEADING_2`.
    ///
    /// `TITLE`, `SUBTITLE` and `NORMAL_TEXT` are body text.
    pub fn from_named_style(name: &str) -> Option<Self> {
        name.strip_prefix("HEADING_")
            .and_then(|level| level.parse::<u8>().ok())
            .and_then(Self::new)
    }

    /// Named paragraph style for this level (`HEADING_1` .. `HEADING_6`).
    pub fn named_style(self) -> String {
        format!("HEADING_{}", self.0)
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("heading level out of range: {}", value))
    }
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        level.0
    }
}

/// One paragraph: runs plus an optional heading level applying to all of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub heading: Option<HeadingLevel>,
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    pub fn body(runs: Vec<TextRun>) -> Self {
        Self {
            heading: None,
            runs,
        }
    }

    pub fn heading(level: HeadingLevel, runs: Vec<TextRun>) -> Self {
        Self {
            heading: Some(level),
            runs,
        }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A structural element of a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Paragraph),
    /// Tables are opaque and not decomposed
    Table,
    /// Section breaks carry no text
    SectionBreak,
    /// Any element kind the converter does not understand
    Unsupported(String),
}
