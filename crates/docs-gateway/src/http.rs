//! Docs v1 and Drive v3 over HTTPS.

use async_trait::async_trait;
use doc_markup::Operation;
use reqwest::{Client, Response};

use crate::api::DocsApi;
use crate::credential::Credential;
use crate::error::{GatewayError, Result};
use crate::wire::{
    ApiErrorBody, BatchUpdateRequest, CreateDocumentRequest, Document, DocumentSummary, FileList,
};

pub const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1";
pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Drive query for the caller's own, non-trashed Google Docs.
pub const OWNED_DOCUMENTS_QUERY: &str =
    "mimeType='application/vnd.google-apps.document' and trashed=false and 'me' in owners";

const LIST_FIELDS: &str = "files(id,name,modifiedTime,webViewLink,ownedByMe)";

pub struct HttpDocsApi {
    client: Client,
    docs_base: String,
    drive_base: String,
}

impl HttpDocsApi {
    pub fn new() -> Result<Self> {
        Self::with_base_urls(DOCS_API_BASE, DRIVE_API_BASE)
    }

    pub fn with_base_urls(docs_base: impl Into<String>, drive_base: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("daily-write/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            docs_base: docs_base.into().trim_end_matches('/').to_string(),
            drive_base: drive_base.into().trim_end_matches('/').to_string(),
        })
    }

    fn document_url(&self, document_id: &str) -> String {
        format!("{}/documents/{}", self.docs_base, document_id)
    }
}

/// Turn a non-success response into the matching error, preferring the
/// service's own error message over the raw body.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.error.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or(text);

    tracing::debug!("Docs API returned {}: {}", status, message);
    Err(GatewayError::from_status(status.as_u16(), message))
}

#[async_trait]
impl DocsApi for HttpDocsApi {
    async fn list_files(
        &self,
        credential: &Credential,
        page_size: u32,
    ) -> Result<Vec<DocumentSummary>> {
        let page_size = page_size.to_string();
        let response = self
            .client
            .get(format!("{}/files", self.drive_base))
            .bearer_auth(credential.token())
            .query(&[
                ("q", OWNED_DOCUMENTS_QUERY),
                ("orderBy", "modifiedTime desc"),
                ("pageSize", page_size.as_str()),
                ("fields", LIST_FIELDS),
            ])
            .send()
            .await?;

        let list: FileList = check(response).await?.json().await?;
        Ok(list.files)
    }

    async fn get_document(&self, credential: &Credential, document_id: &str) -> Result<Document> {
        let response = self
            .client
            .get(self.document_url(document_id))
            .bearer_auth(credential.token())
            .query(&[("includeTabsContent", "true")])
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }

    async fn batch_update(
        &self,
        credential: &Credential,
        document_id: &str,
        operations: &[Operation],
    ) -> Result<()> {
        let response = self
            .client
            .post(format!("{}:batchUpdate", self.document_url(document_id)))
            .bearer_auth(credential.token())
            .json(&BatchUpdateRequest {
                requests: operations,
            })
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    async fn create_document(&self, credential: &Credential, title: &str) -> Result<Document> {
        let response = self
            .client
            .post(format!("{}/documents", self.docs_base))
            .bearer_auth(credential.token())
            .json(&CreateDocumentRequest { title })
            .send()
            .await?;

        Ok(check(response).await?.json().await?)
    }
}
