//! Write operations in the remote document service's request shape.
//!
//! Each [`Operation`] serializes to one entry of a `batchUpdate` request
//! list, e.g. `{"insertText": {"location": {"index": 1}, "text": "..."}}`.

use serde::{Deserialize, Serialize};

/// Text style fields that can be cleared or set on a range.
pub const TEXT_STYLE_FIELDS: &str = "bold,italic,underline,strikethrough,link";

pub const NORMAL_TEXT: &str = "NORMAL_TEXT";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

/// Half-open `[start_index, end_index)` range, in UTF-16 units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Range {
    pub start_index: usize,
    pub end_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

impl Range {
    pub fn new(start_index: usize, end_index: usize, tab_id: Option<&str>) -> Self {
        Self {
            start_index,
            end_index,
            tab_id: tab_id.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertText {
    pub location: Location,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteContentRange {
    pub range: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

/// Text style values. Fields listed in the operation's `fields` mask but
/// absent here are reset to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyleFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTextStyle {
    pub range: Range,
    pub text_style: TextStyleFields,
    /// Comma-separated field mask
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphStyleFields {
    pub named_style_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParagraphStyle {
    pub range: Range,
    pub paragraph_style: ParagraphStyleFields,
    pub fields: String,
}

/// One entry of an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operation {
    InsertText(InsertText),
    DeleteContentRange(DeleteContentRange),
    UpdateTextStyle(UpdateTextStyle),
    UpdateParagraphStyle(UpdateParagraphStyle),
}

impl Operation {
    pub fn insert_text(index: usize, text: impl Into<String>, tab_id: Option<&str>) -> Self {
        Operation::InsertText(InsertText {
            location: Location {
                index,
                tab_id: tab_id.map(str::to_string),
            },
            text: text.into(),
        })
    }

    pub fn delete_range(range: Range) -> Self {
        Operation::DeleteContentRange(DeleteContentRange { range })
    }

    /// Reset every supported text style field over `range`.
    pub fn clear_text_style(range: Range) -> Self {
        Operation::UpdateTextStyle(UpdateTextStyle {
            range,
            text_style: TextStyleFields::default(),
            fields: TEXT_STYLE_FIELDS.to_string(),
        })
    }

    pub fn named_paragraph_style(range: Range, named_style_type: impl Into<String>) -> Self {
        Operation::UpdateParagraphStyle(UpdateParagraphStyle {
            range,
            paragraph_style: ParagraphStyleFields {
                named_style_type: named_style_type.into(),
            },
            fields: "namedStyleType".to_string(),
        })
    }

    /// The range this operation touches, if it is range-based.
    pub fn range(&self) -> Option<&Range> {
        match self {
            Operation::InsertText(_) => None,
            Operation::DeleteContentRange(op) => Some(&op.range),
            Operation::UpdateTextStyle(op) => Some(&op.range),
            Operation::UpdateParagraphStyle(op) => Some(&op.range),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_text_wire_shape() {
        let op = Operation::insert_text(1, "Hello\n", None);
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"insertText": {"location": {"index": 1}, "text": "Hello\n"}})
        );
    }

    #[test]
    fn test_tab_id_is_serialized_when_present() {
        let op = Operation::delete_range(Range::new(1, 10, Some("t.1")));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"deleteContentRange": {"range": {"startIndex": 1, "endIndex": 10, "tabId": "t.1"}}})
        );
    }

    #[test]
    fn test_clear_text_style_wire_shape() {
        let op = Operation::clear_text_style(Range::new(1, 4, None));
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"updateTextStyle": {
                "range": {"startIndex": 1, "endIndex": 4},
                "textStyle": {},
                "fields": "bold,italic,underline,strikethrough,link"
            }})
        );
    }

    #[test]
    fn test_paragraph_style_wire_shape() {
        let op = Operation::named_paragraph_style(Range::new(1, 7, None), "HEADING_2");
        assert_eq!(
            serde_json::to_value(&op).unwrap(),
            json!({"updateParagraphStyle": {
                "range": {"startIndex": 1, "endIndex": 7},
                "paragraphStyle": {"namedStyleType": "HEADING_2"},
                "fields": "namedStyleType"
            }})
        );
    }
}
