//! docs-gateway: Markdown access to Google Docs.
//!
//! This crate provides:
//! - Wire types for the Docs v1 and Drive v3 APIs
//! - The `DocsApi` transport trait, with an HTTP and an in-memory implementation
//! - `Gateway`, which lists, fetches, replaces and creates documents as Markdown

pub mod api;
pub mod credential;
pub mod error;
pub mod gateway;
pub mod http;
pub mod memory;
pub mod wire;

pub use api::DocsApi;
pub use credential::Credential;
pub use error::{GatewayError, Result};
pub use gateway::{ContainerInfo, Gateway, RECENT_DOCUMENTS_LIMIT, ReplaceOutcome};
pub use http::HttpDocsApi;
pub use memory::InMemoryDocsApi;
pub use wire::{Document, DocumentSummary};
