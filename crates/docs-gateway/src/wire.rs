//! JSON shapes of the Docs v1 and Drive v3 APIs.
//!
//! Only the fields the gateway reads are modeled; everything else is ignored
//! on deserialization.

use doc_markup::{Block, HeadingLevel, Operation, Paragraph, TextRun, TextStyle};
use serde::{Deserialize, Serialize};

/// A Drive file entry for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modified_time: String,
    #[serde(default)]
    pub web_view_link: String,
    #[serde(default = "default_owned")]
    pub owned_by_me: bool,
}

fn default_owned() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileList {
    #[serde(default)]
    pub files: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub document_id: String,
    #[serde(default)]
    pub title: String,
    /// Legacy single-tab content, absent when tab content is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<Tab>,
}

impl Document {
    /// All tabs, depth-first, paired with their nesting depth.
    pub fn flatten_tabs(&self) -> Vec<(&Tab, usize)> {
        fn walk<'a>(tabs: &'a [Tab], depth: usize, out: &mut Vec<(&'a Tab, usize)>) {
            for tab in tabs {
                out.push((tab, depth));
                walk(&tab.child_tabs, depth + 1, out);
            }
        }

        let mut out = Vec::new();
        walk(&self.tabs, 0, &mut out);
        out
    }

    pub fn find_tab(&self, tab_id: &str) -> Option<&Tab> {
        self.flatten_tabs()
            .into_iter()
            .map(|(tab, _)| tab)
            .find(|tab| tab.tab_properties.tab_id == tab_id)
    }

    /// Body of the given tab, or of the first tab, or the legacy body.
    ///
    /// `None` when a tab was requested and does not exist.
    pub fn select_body(&self, tab_id: Option<&str>) -> Option<Body> {
        match tab_id {
            Some(id) => self.find_tab(id).map(Tab::body),
            None => Some(
                self.tabs
                    .first()
                    .map(Tab::body)
                    .or_else(|| self.body.clone())
                    .unwrap_or_default(),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub tab_properties: TabProperties,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_tab: Option<DocumentTab>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_tabs: Vec<Tab>,
}

impl Tab {
    fn body(&self) -> Body {
        self.document_tab
            .as_ref()
            .map(|tab| tab.body.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabProperties {
    pub tab_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub nesting_level: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_tab_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentTab {
    #[serde(default)]
    pub body: Body,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(default)]
    pub content: Vec<StructuralElement>,
}

impl Body {
    /// Largest end index of any element, 1 for an empty body.
    pub fn end_index(&self) -> usize {
        self.content
            .iter()
            .filter_map(|element| element.end_index)
            .max()
            .unwrap_or(1)
            .max(1)
    }

    pub fn blocks(&self) -> Vec<Block> {
        self.content.iter().map(StructuralElement::to_block).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<WireParagraph>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_break: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<serde_json::Value>,
}

impl StructuralElement {
    pub fn to_block(&self) -> Block {
        if let Some(paragraph) = &self.paragraph {
            Block::Paragraph(paragraph.to_paragraph())
        } else if self.table.is_some() {
            Block::Table
        } else if self.section_break.is_some() {
            Block::SectionBreak
        } else if self.table_of_contents.is_some() {
            Block::Unsupported("tableOfContents".to_string())
        } else {
            Block::Unsupported("unknown".to_string())
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParagraph {
    #[serde(default)]
    pub elements: Vec<ParagraphElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_style: Option<WireParagraphStyle>,
}

impl WireParagraph {
    pub fn to_paragraph(&self) -> Paragraph {
        let heading = self
            .paragraph_style
            .as_ref()
            .and_then(|style| style.named_style_type.as_deref())
            .and_then(HeadingLevel::from_named_style);

        // Inline objects, page breaks and the like carry no text run
        let runs = self
            .elements
            .iter()
            .filter_map(|element| element.text_run.as_ref())
            .filter(|run| !run.content.is_empty())
            .map(|run| TextRun::new(run.content.clone(), run.text_style.to_style()))
            .collect();

        Paragraph { heading, runs }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireParagraphStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub named_style_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<WireTextRun>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTextRun {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub text_style: WireTextStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireTextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub underline: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<WireLink>,
}

impl WireTextStyle {
    pub fn to_style(&self) -> TextStyle {
        TextStyle {
            bold: self.bold.unwrap_or(false),
            italic: self.italic.unwrap_or(false),
            underline: self.underline.unwrap_or(false),
            strikethrough: self.strikethrough.unwrap_or(false),
            link: self.link.as_ref().and_then(|link| link.url.clone()),
        }
    }

    pub fn from_style(style: &TextStyle) -> Self {
        Self {
            bold: style.bold.then_some(true),
            italic: style.italic.then_some(true),
            underline: style.underline.then_some(true),
            strikethrough: style.strikethrough.then_some(true),
            link: style.link.clone().map(|url| WireLink { url: Some(url) }),
        }
    }
}

/// Links to headings or bookmarks have no url and are treated as plain text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireLink {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchUpdateRequest<'a> {
    pub requests: &'a [Operation],
}

#[derive(Debug, Serialize)]
pub struct CreateDocumentRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Document {
        serde_json::from_value(json!({
            "documentId": "doc-1",
            "title": "Novel",
            "tabs": [{
                "tabProperties": {"tabId": "t.0", "title": "Draft", "index": 0},
                "documentTab": {"body": {"content": [
                    {"endIndex": 1, "sectionBreak": {"sectionStyle": {}}},
                    {"startIndex": 1, "endIndex": 7, "paragraph": {
                        "elements": [{"startIndex": 1, "endIndex": 7, "textRun": {
                            "content": "Title\n", "textStyle": {}
                        }}],
                        "paragraphStyle": {"namedStyleType": "HEADING_1", "direction": "LEFT_TO_RIGHT"}
                    }},
                    {"startIndex": 7, "endIndex": 19, "paragraph": {
                        "elements": [
                            {"startIndex": 7, "endIndex": 11, "textRun": {
                                "content": "Some", "textStyle": {"bold": true}
                            }},
                            {"startIndex": 11, "endIndex": 12, "inlineObjectElement": {"inlineObjectId": "x"}},
                            {"startIndex": 12, "endIndex": 19, "textRun": {
                                "content": " words\n", "textStyle": {"link": {"headingId": "h.1"}}
                            }}
                        ],
                        "paragraphStyle": {"namedStyleType": "NORMAL_TEXT"}
                    }},
                    {"startIndex": 19, "endIndex": 40, "table": {"rows": 1, "columns": 1}}
                ]}},
                "childTabs": [{
                    "tabProperties": {"tabId": "t.1", "title": "Notes", "index": 0, "nestingLevel": 1, "parentTabId": "t.0"},
                    "documentTab": {"body": {"content": []}}
                }]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn test_blocks_from_tab_body() {
        let document = sample_document();
        let body = document.select_body(None).unwrap();
        let blocks = body.blocks();

        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0], Block::SectionBreak);
        match &blocks[1] {
            Block::Paragraph(p) => {
                assert_eq!(p.heading, HeadingLevel::new(1));
                assert_eq!(p.text(), "Title\n");
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
        match &blocks[2] {
            Block::Paragraph(p) => {
                assert_eq!(p.heading, None);
                assert_eq!(p.runs.len(), 2);
                assert!(p.runs[0].style.bold);
                assert!(p.runs[1].style.is_plain());
            }
            other => panic!("expected paragraph, got {other:?}"),
        }
        assert_eq!(blocks[3], Block::Table);
        assert_eq!(body.end_index(), 40);
    }

    #[test]
    fn test_select_nested_tab() {
        let document = sample_document();
        assert!(document.select_body(Some("t.1")).unwrap().content.is_empty());
        assert!(document.select_body(Some("missing")).is_none());

        let flattened: Vec<(&str, usize)> = document
            .flatten_tabs()
            .into_iter()
            .map(|(tab, depth)| (tab.tab_properties.tab_id.as_str(), depth))
            .collect();
        assert_eq!(flattened, vec![("t.0", 0), ("t.1", 1)]);
    }

    #[test]
    fn test_legacy_body_without_tabs() {
        let document: Document = serde_json::from_value(json!({
            "documentId": "d",
            "body": {"content": [{"endIndex": 1, "sectionBreak": {}}]}
        }))
        .unwrap();
        assert_eq!(document.select_body(None).unwrap().content.len(), 1);
        assert_eq!(Document::default().select_body(None), Some(Body::default()));
    }

    #[test]
    fn test_drive_file_defaults() {
        let list: FileList = serde_json::from_value(json!({
            "files": [{"id": "a", "name": "A", "modifiedTime": "2024-01-01T00:00:00Z",
                       "webViewLink": "https://docs.google.com/document/d/a/edit"}]
        }))
        .unwrap();
        assert!(list.files[0].owned_by_me);

        let summary = serde_json::to_value(&list.files[0]).unwrap();
        assert_eq!(summary["modifiedTime"], "2024-01-01T00:00:00Z");
        assert_eq!(summary["ownedByMe"], true);
    }

    #[test]
    fn test_empty_body_end_index() {
        assert_eq!(Body::default().end_index(), 1);
    }
}
