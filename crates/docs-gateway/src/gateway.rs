//! Markdown-level operations on remote documents.

use doc_markup::{Operation, Range, blocks_to_markup, count_plain_words, markup_to_operations};
use serde::Serialize;

use crate::api::DocsApi;
use crate::credential::Credential;
use crate::error::{GatewayError, Result};
use crate::wire::{Body, Document, DocumentSummary};

/// How many recent documents the picker shows.
pub const RECENT_DOCUMENTS_LIMIT: u32 = 16;

/// A tab of a document, flattened out of the tab tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    pub id: String,
    pub title: String,
    /// Position among its siblings
    pub order_index: usize,
    pub nesting_depth: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceOutcome {
    pub success: bool,
    pub word_count: u64,
}

pub struct Gateway<A> {
    api: A,
}

fn require_document_id(document_id: &str) -> Result<()> {
    if document_id.trim().is_empty() {
        return Err(GatewayError::validation(
            "documentId",
            "Document ID is required",
        ));
    }
    Ok(())
}

impl<A: DocsApi> Gateway<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn list_recent_documents(
        &self,
        credential: &Credential,
    ) -> Result<Vec<DocumentSummary>> {
        credential.check()?;
        let documents = self
            .api
            .list_files(credential, RECENT_DOCUMENTS_LIMIT)
            .await?;
        tracing::debug!("Listed {} documents", documents.len());
        Ok(documents)
    }

    /// Fetch one tab (or the first tab) of a document as Markdown.
    pub async fn fetch_as_markup(
        &self,
        credential: &Credential,
        document_id: &str,
        tab_id: Option<&str>,
    ) -> Result<String> {
        credential.check()?;
        require_document_id(document_id)?;

        let document = self.api.get_document(credential, document_id).await?;
        let body = select_body(&document, tab_id)?;
        Ok(blocks_to_markup(&body.blocks()))
    }

    /// Replace a tab's entire content with `markup` in one atomic batch.
    pub async fn replace_with_markup(
        &self,
        credential: &Credential,
        document_id: &str,
        markup: &str,
        tab_id: Option<&str>,
    ) -> Result<ReplaceOutcome> {
        credential.check()?;
        require_document_id(document_id)?;

        let document = self.api.get_document(credential, document_id).await?;
        let end_index = select_body(&document, tab_id)?.end_index();

        let batch = markup_to_operations(markup, tab_id);
        let word_count = count_plain_words(&batch.plain_text);
        let mut operations = Vec::new();

        // The final newline of a segment can never be deleted
        if end_index > 2 {
            operations.push(Operation::delete_range(Range::new(
                1,
                end_index - 1,
                tab_id,
            )));
        }
        operations.extend(batch.into_fill_operations(tab_id));

        if !operations.is_empty() {
            tracing::debug!(
                "Sending batch of {} operations to {}",
                operations.len(),
                document_id
            );
            self.api
                .batch_update(credential, document_id, &operations)
                .await?;
        }

        tracing::info!("Wrote {} words to document {}", word_count, document_id);

        Ok(ReplaceOutcome {
            success: true,
            word_count,
        })
    }

    /// The document's tabs, depth-first.
    pub async fn list_containers(
        &self,
        credential: &Credential,
        document_id: &str,
    ) -> Result<Vec<ContainerInfo>> {
        credential.check()?;
        require_document_id(document_id)?;

        let document = self.api.get_document(credential, document_id).await?;
        Ok(document
            .flatten_tabs()
            .into_iter()
            .map(|(tab, depth)| {
                let properties = &tab.tab_properties;
                ContainerInfo {
                    id: properties.tab_id.clone(),
                    title: properties.title.clone(),
                    order_index: properties.index,
                    nesting_depth: depth,
                    parent_id: properties.parent_tab_id.clone(),
                }
            })
            .collect())
    }

    pub async fn create_document(
        &self,
        credential: &Credential,
        title: &str,
    ) -> Result<DocumentSummary> {
        let title = title.trim();
        if title.is_empty() {
            return Err(GatewayError::validation(
                "title",
                "Document title is required",
            ));
        }
        credential.check()?;

        let document = self.api.create_document(credential, title).await?;
        tracing::info!("Created document {}", document.document_id);

        Ok(DocumentSummary {
            web_view_link: format!(
                "https://docs.google.com/document/d/{}/edit",
                document.document_id
            ),
            id: document.document_id,
            name: document.title,
            modified_time: chrono::Utc::now().to_rfc3339(),
            owned_by_me: true,
        })
    }
}

fn select_body(document: &Document, tab_id: Option<&str>) -> Result<Body> {
    document.select_body(tab_id).ok_or_else(|| {
        GatewayError::NotFound(format!(
            "tab {} in document {}",
            tab_id.unwrap_or_default(),
            document.document_id
        ))
    })
}
