use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use tracing::debug;

use lockbox_core::{ChangeLog, Error, FetchResponse, RemoteId, Result, Snapshot, Vault};

/// The remote vault server.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Vaults available to the caller (`GET /meta`).
    async fn list_vaults(&self) -> Result<Vec<Vault>>;

    /// Snapshots committed after `since`, oldest first (`GET /fetch`).
    async fn fetch_changes(
        &self,
        vault_id: &RemoteId,
        since: Option<&RemoteId>,
    ) -> Result<FetchResponse>;

    /// Uploads the change log and returns the snapshot it became (`POST /save`).
    async fn push_changes(&self, vault_id: &RemoteId, changes: &ChangeLog) -> Result<Snapshot>;
}

#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRemote {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str, params: Vec<(String, String)>) -> String {
        let mut url = format!("{}{}", self.endpoint.trim_end_matches('/'), path);
        append_params(&mut url, params);
        url
    }

    async fn send(&self, method: Method, url: String, builder: RequestBuilder) -> Result<String> {
        debug!(method = %method, url = %url, "http request");
        let start = Instant::now();
        let response = builder
            .send()
            .await
            .map_err(|err| Error::Network(err.to_string()))?;
        let status = response.status();
        debug!(
            method = %method,
            url = %url,
            status = %status,
            elapsed_ms = start.elapsed().as_millis(),
            "http response"
        );
        let body = response
            .text()
            .await
            .map_err(|err| Error::Network(err.to_string()))?;
        if !status.is_success() {
            return Err(Error::Remote {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn list_vaults(&self) -> Result<Vec<Vault>> {
        let url = self.url("/meta", Vec::new());
        let builder = self.client.get(&url);
        let body = self.send(Method::GET, url, builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_changes(
        &self,
        vault_id: &RemoteId,
        since: Option<&RemoteId>,
    ) -> Result<FetchResponse> {
        let params = build_params([
            Some(("vaultId".to_string(), vault_id.to_string())),
            opt_param("sinceCommitId", since.map(ToString::to_string)),
        ]);
        let url = self.url("/fetch", params);
        let builder = self.client.get(&url);
        let body = self.send(Method::GET, url, builder).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn push_changes(&self, vault_id: &RemoteId, changes: &ChangeLog) -> Result<Snapshot> {
        let params = build_params([Some(("vaultId".to_string(), vault_id.to_string()))]);
        let url = self.url("/save", params);
        let builder = self.client.post(&url).json(changes);
        let body = self.send(Method::POST, url, builder).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn build_params<const N: usize>(pairs: [Option<(String, String)>; N]) -> Vec<(String, String)> {
    pairs.into_iter().flatten().collect()
}

fn opt_param(key: &str, value: Option<String>) -> Option<(String, String)> {
    value.map(|value| (key.to_string(), value))
}

fn append_params(url: &mut String, params: Vec<(String, String)>) {
    if params.is_empty() {
        return;
    }
    let query = params
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(&value)))
        .collect::<Vec<String>>()
        .join("&");
    url.push('?');
    url.push_str(&query);
}
