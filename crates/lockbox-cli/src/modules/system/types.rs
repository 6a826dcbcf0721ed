use std::sync::Arc;

use lockbox_db::TransactionManager;
use lockbox_sync::{HttpRemote, SyncEngine};
use serde::{Deserialize, Serialize};

use super::config::ensure_secure_endpoint;

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
}

pub struct CommandContext<'a> {
    pub client: &'a reqwest::Client,
    pub endpoint: &'a str,
    pub allow_insecure: bool,
    pub manager: Arc<TransactionManager>,
}

impl CommandContext<'_> {
    /// Sync engine bound to the resolved endpoint. Refuses plain http unless
    /// `--insecure` was given.
    pub fn sync_engine(&self) -> anyhow::Result<SyncEngine<HttpRemote>> {
        ensure_secure_endpoint(self.endpoint, self.allow_insecure)?;
        let remote = HttpRemote::new(self.client.clone(), self.endpoint);
        Ok(SyncEngine::new(Arc::clone(&self.manager), remote))
    }
}
