//! Transport abstraction for the remote document service.
//!
//! Implementations:
//! - `HttpDocsApi` - Talks to the Docs and Drive REST APIs
//! - `InMemoryDocsApi` - Simulated service for testing

use std::sync::Arc;

use async_trait::async_trait;
use doc_markup::Operation;

use crate::credential::Credential;
use crate::error::Result;
use crate::wire::{Document, DocumentSummary};

#[async_trait]
pub trait DocsApi: Send + Sync {
    /// Documents the caller owns, most recently modified first
    async fn list_files(&self, credential: &Credential, page_size: u32)
    -> Result<Vec<DocumentSummary>>;

    /// Fetch a document with the content of all its tabs
    async fn get_document(&self, credential: &Credential, document_id: &str) -> Result<Document>;

    /// Apply the operations in order, all or nothing
    async fn batch_update(
        &self,
        credential: &Credential,
        document_id: &str,
        operations: &[Operation],
    ) -> Result<()>;

    /// Create an empty document
    async fn create_document(&self, credential: &Credential, title: &str) -> Result<Document>;
}

#[async_trait]
impl<T: DocsApi + ?Sized> DocsApi for Arc<T> {
    async fn list_files(
        &self,
        credential: &Credential,
        page_size: u32,
    ) -> Result<Vec<DocumentSummary>> {
        (**self).list_files(credential, page_size).await
    }

    async fn get_document(&self, credential: &Credential, document_id: &str) -> Result<Document> {
        (**self).get_document(credential, document_id).await
    }

    async fn batch_update(
        &self,
        credential: &Credential,
        document_id: &str,
        operations: &[Operation],
    ) -> Result<()> {
        (**self)
            .batch_update(credential, document_id, operations)
            .await
    }

    async fn create_document(&self, credential: &Credential, title: &str) -> Result<Document> {
        (**self).create_document(credential, title).await
    }
}
