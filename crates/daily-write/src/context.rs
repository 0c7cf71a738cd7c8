//! Shared state for every subcommand.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use docs_gateway::{Credential, DocsApi, Gateway, HttpDocsApi};
use word_ledger::JsonFileStore;

use crate::config::{LEDGER_FILE, Settings};

pub struct Context {
    pub settings: Settings,
    pub data_dir: PathBuf,
    token: Option<String>,
    user_id: Option<String>,
}

impl Context {
    pub fn new(
        settings: Settings,
        data_dir: PathBuf,
        token: Option<String>,
        user_id: Option<String>,
    ) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        Self {
            settings,
            data_dir,
            token: non_empty(token),
            user_id: non_empty(user_id),
        }
    }

    pub fn credential(&self) -> Result<Credential> {
        self.token
            .as_deref()
            .map(Credential::bearer)
            .context("No access token; set DAILY_WRITE_ACCESS_TOKEN or pass --token")
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn require_user(&self) -> Result<&str> {
        self.user_id()
            .context("No user configured; set DAILY_WRITE_USER or pass --user")
    }

    pub fn gateway(&self) -> Result<Gateway<Arc<dyn DocsApi>>> {
        let api = HttpDocsApi::with_base_urls(
            &self.settings.api.docs_base_url,
            &self.settings.api.drive_base_url,
        )?;
        let api: Arc<dyn DocsApi> = Arc::new(api);
        Ok(Gateway::new(api))
    }

    pub async fn store(&self) -> Result<Arc<JsonFileStore>> {
        let path = self.data_dir.join(LEDGER_FILE);
        let store = JsonFileStore::open(&path)
            .await
            .with_context(|| format!("Failed to open ledger at {:?}", path))?;
        Ok(Arc::new(store))
    }
}
