//! Simulated document service for testing.
//!
//! Bodies are stored as UTF-16 code units, each with its own text style,
//! and every request index is validated the way the real service does:
//! ranges must lie inside the live segment, may not split a surrogate pair,
//! and the final newline can never be deleted or inserted after. A batch is
//! applied to a copy and only committed when every request succeeds.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::DateTime;
use doc_markup::ops::{Range, TextStyleFields};
use doc_markup::{HeadingLevel, Operation, TextStyle, parse_markup};
use serde_json::json;

use crate::api::DocsApi;
use crate::credential::Credential;
use crate::error::{GatewayError, Result};
use crate::wire::{
    Body, Document, DocumentSummary, DocumentTab, ParagraphElement, StructuralElement, Tab,
    TabProperties, WireParagraph, WireParagraphStyle, WireTextRun, WireTextStyle,
};

const NEWLINE: u16 = b'\n' as u16;

/// Epoch second the simulated clock starts from
const CLOCK_START: i64 = 1_700_000_000;

fn invalid(message: impl Into<String>) -> GatewayError {
    GatewayError::Upstream {
        status: 400,
        message: message.into(),
    }
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

#[derive(Debug, Clone)]
struct Cell {
    unit: u16,
    style: TextStyle,
    /// Paragraph style, only meaningful on newline cells
    heading: Option<HeadingLevel>,
}

impl Cell {
    fn is_newline(&self) -> bool {
        self.unit == NEWLINE
    }
}

/// One segment's text. Always ends with a newline.
#[derive(Debug, Clone)]
struct SimBody {
    cells: Vec<Cell>,
}

impl SimBody {
    fn empty() -> Self {
        Self {
            cells: vec![Cell {
                unit: NEWLINE,
                style: TextStyle::default(),
                heading: None,
            }],
        }
    }

    fn from_markup(markup: &str) -> Self {
        let mut cells = Vec::new();
        for paragraph in parse_markup(markup).paragraphs() {
            for run in &paragraph.runs {
                for unit in run.text.encode_utf16() {
                    cells.push(Cell {
                        unit,
                        style: run.style.clone(),
                        heading: paragraph.heading,
                    });
                }
            }
        }

        if cells.last().is_some_and(Cell::is_newline) {
            Self { cells }
        } else {
            let mut body = Self::empty();
            cells.append(&mut body.cells);
            Self { cells }
        }
    }

    /// Position of the newline ending the paragraph that holds `pos`.
    fn paragraph_end(&self, pos: usize) -> usize {
        self.cells[pos..]
            .iter()
            .position(Cell::is_newline)
            .map_or(self.cells.len() - 1, |offset| pos + offset)
    }

    fn check_boundary(&self, index: usize) -> Result<()> {
        let splits_pair = self
            .cells
            .get(index - 1)
            .is_some_and(|cell| is_low_surrogate(cell.unit));
        if splits_pair {
            return Err(invalid(format!(
                "The index {} would split a surrogate pair",
                index
            )));
        }
        Ok(())
    }

    /// Validate `[start, end)`. Style updates may cover the final newline,
    /// deletions may not.
    fn check_range(&self, range: &Range, include_final_newline: bool) -> Result<()> {
        let limit = if include_final_newline {
            self.cells.len() + 1
        } else {
            self.cells.len()
        };

        if range.start_index < 1 || range.start_index >= range.end_index {
            return Err(invalid(format!(
                "Invalid range [{}, {})",
                range.start_index, range.end_index
            )));
        }
        if range.end_index > limit {
            return Err(invalid(format!(
                "Index {} must be less than the end index of the referenced segment, {}",
                range.end_index - 1,
                limit
            )));
        }

        self.check_boundary(range.start_index)?;
        self.check_boundary(range.end_index)
    }

    fn insert(&mut self, index: usize, text: &str) -> Result<()> {
        if text.is_empty() {
            return Err(invalid("Insert text must not be empty"));
        }
        if index < 1 || index > self.cells.len() {
            return Err(invalid(format!(
                "Index {} must be less than the end index of the referenced segment, {}",
                index,
                self.cells.len() + 1
            )));
        }
        self.check_boundary(index)?;

        let pos = index - 1;
        // Text takes the style of the character before it, or of the one
        // after it at the start of a paragraph
        let style = match pos.checked_sub(1).map(|prev| &self.cells[prev]) {
            Some(prev) if !prev.is_newline() => prev.style.clone(),
            _ => self.cells[pos].style.clone(),
        };
        let heading = self.cells[self.paragraph_end(pos)].heading;

        let inserted: Vec<Cell> = text
            .encode_utf16()
            .map(|unit| Cell {
                unit,
                style: style.clone(),
                heading,
            })
            .collect();
        self.cells.splice(pos..pos, inserted);
        Ok(())
    }

    fn delete(&mut self, range: &Range) -> Result<()> {
        self.check_range(range, false)?;
        self.cells.drain(range.start_index - 1..range.end_index - 1);
        Ok(())
    }

    fn update_text_style(
        &mut self,
        range: &Range,
        values: &TextStyleFields,
        fields: &str,
    ) -> Result<()> {
        self.check_range(range, true)?;

        let fields: Vec<&str> = fields.split(',').map(str::trim).collect();
        for field in &fields {
            if !matches!(
                *field,
                "bold" | "italic" | "underline" | "strikethrough" | "link"
            ) {
                return Err(invalid(format!("Unsupported text style field: {}", field)));
            }
        }

        for cell in &mut self.cells[range.start_index - 1..range.end_index - 1] {
            for field in &fields {
                match *field {
                    "bold" => cell.style.bold = values.bold.unwrap_or(false),
                    "italic" => cell.style.italic = values.italic.unwrap_or(false),
                    "underline" => cell.style.underline = values.underline.unwrap_or(false),
                    "strikethrough" => {
                        cell.style.strikethrough = values.strikethrough.unwrap_or(false)
                    }
                    _ => cell.style.link = values.link.as_ref().map(|link| link.url.clone()),
                }
            }
        }
        Ok(())
    }

    fn update_paragraph_style(&mut self, range: &Range, named_style_type: &str) -> Result<()> {
        self.check_range(range, true)?;

        let heading = HeadingLevel::from_named_style(named_style_type);
        let known = heading.is_some()
            || matches!(named_style_type, "NORMAL_TEXT" | "TITLE" | "SUBTITLE");
        if !known {
            return Err(invalid(format!(
                "Unknown named style type: {}",
                named_style_type
            )));
        }

        let mut pos = range.start_index - 1;
        let last = self.paragraph_end(range.end_index - 2);
        while pos <= last {
            let end = self.paragraph_end(pos);
            self.cells[end].heading = heading;
            pos = end + 1;
        }
        Ok(())
    }

    fn to_body(&self) -> Body {
        let mut content = vec![StructuralElement {
            end_index: Some(1),
            section_break: Some(json!({"sectionStyle": {}})),
            ..StructuralElement::default()
        }];

        let mut start = 0;
        while start < self.cells.len() {
            let end = self.paragraph_end(start);
            let cells = &self.cells[start..=end];

            let mut elements: Vec<ParagraphElement> = Vec::new();
            let mut run_start = start;
            for chunk in cells.chunk_by(|a, b| a.style == b.style) {
                let units: Vec<u16> = chunk.iter().map(|cell| cell.unit).collect();
                let run_end = run_start + chunk.len();
                elements.push(ParagraphElement {
                    start_index: Some(run_start + 1),
                    end_index: Some(run_end + 1),
                    text_run: Some(WireTextRun {
                        content: String::from_utf16_lossy(&units),
                        text_style: WireTextStyle::from_style(&chunk[0].style),
                    }),
                });
                run_start = run_end;
            }

            let named_style = self.cells[end]
                .heading
                .map_or_else(|| "NORMAL_TEXT".to_string(), HeadingLevel::named_style);

            content.push(StructuralElement {
                start_index: Some(start + 1),
                end_index: Some(end + 2),
                paragraph: Some(WireParagraph {
                    elements,
                    paragraph_style: Some(WireParagraphStyle {
                        named_style_type: Some(named_style),
                    }),
                }),
                ..StructuralElement::default()
            });

            start = end + 1;
        }

        Body { content }
    }
}

#[derive(Debug, Clone)]
struct SimTab {
    id: String,
    title: String,
    body: SimBody,
    children: Vec<SimTab>,
}

impl SimTab {
    fn find_mut(&mut self, tab_id: &str) -> Option<&mut SimTab> {
        if self.id == tab_id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_mut(tab_id))
    }

    fn to_tab(&self, index: usize, nesting_level: usize, parent: Option<&str>) -> Tab {
        Tab {
            tab_properties: TabProperties {
                tab_id: self.id.clone(),
                title: self.title.clone(),
                index,
                nesting_level,
                parent_tab_id: parent.map(str::to_string),
            },
            document_tab: Some(DocumentTab {
                body: self.body.to_body(),
            }),
            child_tabs: self
                .children
                .iter()
                .enumerate()
                .map(|(i, child)| child.to_tab(i, nesting_level + 1, Some(&self.id)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct SimDocument {
    id: String,
    title: String,
    owned: bool,
    modified: i64,
    tabs: Vec<SimTab>,
    next_tab: usize,
}

impl SimDocument {
    fn tab_mut(&mut self, tab_id: Option<&str>) -> Result<&mut SimTab> {
        match tab_id {
            Some(id) => self
                .tabs
                .iter_mut()
                .find_map(|tab| tab.find_mut(id))
                .ok_or_else(|| invalid(format!("The tab with ID {} was not found", id))),
            None => self
                .tabs
                .first_mut()
                .ok_or_else(|| invalid("Document has no tabs")),
        }
    }

    fn apply(&mut self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::InsertText(op) => self
                .tab_mut(op.location.tab_id.as_deref())?
                .body
                .insert(op.location.index, &op.text),
            Operation::DeleteContentRange(op) => self
                .tab_mut(op.range.tab_id.as_deref())?
                .body
                .delete(&op.range),
            Operation::UpdateTextStyle(op) => self
                .tab_mut(op.range.tab_id.as_deref())?
                .body
                .update_text_style(&op.range, &op.text_style, &op.fields),
            Operation::UpdateParagraphStyle(op) => {
                if op.fields != "namedStyleType" {
                    return Err(invalid(format!(
                        "Unsupported paragraph style fields: {}",
                        op.fields
                    )));
                }
                self.tab_mut(op.range.tab_id.as_deref())?
                    .body
                    .update_paragraph_style(&op.range, &op.paragraph_style.named_style_type)
            }
        }
    }

    fn modified_time(&self) -> String {
        DateTime::from_timestamp(CLOCK_START + self.modified, 0)
            .map(|time| time.to_rfc3339())
            .unwrap_or_default()
    }

    fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id.clone(),
            name: self.title.clone(),
            modified_time: self.modified_time(),
            web_view_link: format!("https://docs.google.com/document/d/{}/edit", self.id),
            owned_by_me: self.owned,
        }
    }

    fn to_document(&self) -> Document {
        Document {
            document_id: self.id.clone(),
            title: self.title.clone(),
            body: None,
            tabs: self
                .tabs
                .iter()
                .enumerate()
                .map(|(i, tab)| tab.to_tab(i, 0, None))
                .collect(),
        }
    }
}

#[derive(Default)]
struct State {
    documents: HashMap<String, SimDocument>,
    clock: i64,
    next_id: usize,
    unavailable: bool,
    accepted_token: Option<String>,
    batches: Vec<(String, Vec<Operation>)>,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }

    fn authorize(&self, credential: &Credential) -> Result<()> {
        if self.unavailable {
            return Err(GatewayError::Upstream {
                status: 503,
                message: "The service is currently unavailable.".to_string(),
            });
        }
        match &self.accepted_token {
            Some(token) if token != credential.token() => Err(GatewayError::Unauthorized),
            _ => Ok(()),
        }
    }

    fn insert_document(&mut self, title: &str, body: SimBody, owned: bool) -> String {
        self.next_id += 1;
        let id = format!("doc-{}", self.next_id);
        let modified = self.tick();
        self.documents.insert(
            id.clone(),
            SimDocument {
                id: id.clone(),
                title: title.to_string(),
                owned,
                modified,
                tabs: vec![SimTab {
                    id: "t.0".to_string(),
                    title: "Tab 1".to_string(),
                    body,
                    children: Vec::new(),
                }],
                next_tab: 1,
            },
        );
        id
    }
}

/// In-memory document service for testing
#[derive(Default)]
pub struct InMemoryDocsApi {
    state: RwLock<State>,
}

impl InMemoryDocsApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every token except `token`
    pub fn accept_only(&self, token: &str) {
        self.state.write().unwrap().accepted_token = Some(token.to_string());
    }

    /// Make every call fail with a 503 until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.write().unwrap().unavailable = unavailable;
    }

    /// Seed an owned document whose first tab holds `markup`
    pub fn add_document(&self, title: &str, markup: &str) -> String {
        self.state
            .write()
            .unwrap()
            .insert_document(title, SimBody::from_markup(markup), true)
    }

    /// Seed a document shared with the caller by someone else
    pub fn add_shared_document(&self, title: &str, markup: &str) -> String {
        self.state
            .write()
            .unwrap()
            .insert_document(title, SimBody::from_markup(markup), false)
    }

    /// Add a tab under `parent_tab_id`, or at the top level. Returns its ID.
    pub fn add_tab(
        &self,
        document_id: &str,
        parent_tab_id: Option<&str>,
        title: &str,
        markup: &str,
    ) -> Option<String> {
        let mut state = self.state.write().unwrap();
        let document = state.documents.get_mut(document_id)?;

        let id = format!("t.{}", document.next_tab);
        document.next_tab += 1;
        let tab = SimTab {
            id: id.clone(),
            title: title.to_string(),
            body: SimBody::from_markup(markup),
            children: Vec::new(),
        };

        match parent_tab_id {
            Some(parent) => document
                .tabs
                .iter_mut()
                .find_map(|t| t.find_mut(parent))?
                .children
                .push(tab),
            None => document.tabs.push(tab),
        }
        Some(id)
    }

    /// Batches applied so far, oldest first
    pub fn batches(&self) -> Vec<(String, Vec<Operation>)> {
        self.state.read().unwrap().batches.clone()
    }
}

#[async_trait]
impl DocsApi for InMemoryDocsApi {
    async fn list_files(
        &self,
        credential: &Credential,
        page_size: u32,
    ) -> Result<Vec<DocumentSummary>> {
        let state = self.state.read().unwrap();
        state.authorize(credential)?;

        let mut documents: Vec<&SimDocument> =
            state.documents.values().filter(|d| d.owned).collect();
        documents.sort_by(|a, b| b.modified.cmp(&a.modified));

        Ok(documents
            .into_iter()
            .take(page_size as usize)
            .map(SimDocument::summary)
            .collect())
    }

    async fn get_document(&self, credential: &Credential, document_id: &str) -> Result<Document> {
        let state = self.state.read().unwrap();
        state.authorize(credential)?;

        state
            .documents
            .get(document_id)
            .map(SimDocument::to_document)
            .ok_or_else(|| GatewayError::NotFound(format!("document {}", document_id)))
    }

    async fn batch_update(
        &self,
        credential: &Credential,
        document_id: &str,
        operations: &[Operation],
    ) -> Result<()> {
        let mut state = self.state.write().unwrap();
        state.authorize(credential)?;

        let mut document = state
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(format!("document {}", document_id)))?;

        for operation in operations {
            document.apply(operation)?;
        }

        document.modified = state.tick();
        state.documents.insert(document_id.to_string(), document);
        state
            .batches
            .push((document_id.to_string(), operations.to_vec()));
        Ok(())
    }

    async fn create_document(&self, credential: &Credential, title: &str) -> Result<Document> {
        let mut state = self.state.write().unwrap();
        state.authorize(credential)?;

        let id = state.insert_document(title, SimBody::empty(), true);
        Ok(state.documents[&id].to_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential::bearer("token")
    }

    fn body_text(document: &Document) -> String {
        document.tabs[0]
            .document_tab
            .as_ref()
            .unwrap()
            .body
            .content
            .iter()
            .filter_map(|e| e.paragraph.as_ref())
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| e.text_run.as_ref())
            .map(|r| r.content.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_new_document_is_single_newline() {
        let api = InMemoryDocsApi::new();
        let document = api.create_document(&credential(), "Fresh").await.unwrap();
        assert_eq!(body_text(&document), "\n");
        assert_eq!(
            document.tabs[0].document_tab.as_ref().unwrap().body.end_index(),
            2
        );
    }

    #[tokio::test]
    async fn test_insert_after_final_newline_is_rejected() {
        let api = InMemoryDocsApi::new();
        let id = api.add_document("Doc", "abc");
        let err = api
            .batch_update(&credential(), &id, &[Operation::insert_text(5, "x", None)])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upstream { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_batch_is_atomic() {
        let api = InMemoryDocsApi::new();
        let id = api.add_document("Doc", "abc");
        let operations = vec![
            Operation::insert_text(1, "new ", None),
            Operation::delete_range(Range::new(1, 100, None)),
        ];
        assert!(api.batch_update(&credential(), &id, &operations).await.is_err());

        let document = api.get_document(&credential(), &id).await.unwrap();
        assert_eq!(body_text(&document), "abc\n");
        assert!(api.batches().is_empty());
    }

    #[tokio::test]
    async fn test_final_newline_cannot_be_deleted() {
        let api = InMemoryDocsApi::new();
        let id = api.add_document("Doc", "abc");
        let end = Range::new(1, 5, None);
        assert!(
            api.batch_update(&credential(), &id, &[Operation::delete_range(end)])
                .await
                .is_err()
        );
        let ok = Range::new(1, 4, None);
        api.batch_update(&credential(), &id, &[Operation::delete_range(ok)])
            .await
            .unwrap();
        let document = api.get_document(&credential(), &id).await.unwrap();
        assert_eq!(body_text(&document), "\n");
    }

    #[tokio::test]
    async fn test_surrogate_pair_cannot_be_split() {
        let api = InMemoryDocsApi::new();
        let id = api.add_document("Doc", "🎉");
        let split = Range::new(2, 3, None);
        assert!(
            api.batch_update(&credential(), &id, &[Operation::clear_text_style(split)])
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_insert_inherits_preceding_style() {
        let api = InMemoryDocsApi::new();
        let id = api.add_document("Doc", "**bold**");
        api.batch_update(&credential(), &id, &[Operation::insert_text(5, "er", None)])
            .await
            .unwrap();

        let document = api.get_document(&credential(), &id).await.unwrap();
        let body = document.select_body(None).unwrap();
        let runs: Vec<(String, bool)> = body
            .content
            .iter()
            .filter_map(|e| e.paragraph.as_ref())
            .flat_map(|p| p.elements.iter())
            .filter_map(|e| e.text_run.as_ref())
            .map(|r| (r.content.clone(), r.text_style.bold == Some(true)))
            .collect();
        assert_eq!(
            runs,
            vec![("bolder".to_string(), true), ("\n".to_string(), false)]
        );
    }

    #[tokio::test]
    async fn test_list_only_owned_newest_first() {
        let api = InMemoryDocsApi::new();
        let first = api.add_document("First", "");
        api.add_shared_document("Shared", "");
        let second = api.add_document("Second", "");

        let files = api.list_files(&credential(), 16).await.unwrap();
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    }

    #[tokio::test]
    async fn test_unknown_tab_is_rejected() {
        let api = InMemoryDocsApi::new();
        let id = api.add_document("Doc", "abc");
        let err = api
            .batch_update(
                &credential(),
                &id,
                &[Operation::insert_text(1, "x", Some("t.9"))],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upstream { status: 400, .. }));
    }

    #[tokio::test]
    async fn test_rejects_foreign_token() {
        let api = InMemoryDocsApi::new();
        api.accept_only("good");
        let err = api
            .list_files(&Credential::bearer("bad"), 16)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Unauthorized));
    }
}
