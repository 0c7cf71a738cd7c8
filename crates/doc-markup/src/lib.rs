//! doc-markup: Conversion between Markdown and Google Docs structured content.
//!
//! This crate provides:
//! - Escaping of markup-significant characters
//! - A styled-run model for document paragraphs
//! - Structured content to Markdown rendering
//! - Markdown to insert and style operations, with UTF-16 offsets
//! - Word counting
//!
//! The supported subset is headings 1-6, bold, italic, bold+italic,
//! strikethrough (`~~`), underline (`<u>`) and links. Everything else
//! passes through as text.

pub mod escape;
pub mod lexer;
pub mod ops;
pub mod style;
pub mod to_markup;
pub mod to_operations;
pub mod words;

pub use escape::{escape, unescape};
pub use ops::{Operation, Range};
pub use style::{Block, HeadingLevel, Paragraph, TextRun, TextStyle};
pub use to_markup::{blocks_to_markup, merge_runs, paragraphs_to_markup, render_run};
pub use to_operations::{
    FormattingRange, HeadingRange, OperationBatch, ParsedMarkup, markup_to_operations,
    parse_markup,
};
pub use words::{count_markup_words, count_plain_words};
