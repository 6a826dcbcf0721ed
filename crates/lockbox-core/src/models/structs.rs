use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ChangeLog, RemoteId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
    /// Assigned by the store on insert.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub group_id: i64,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub principal: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

/// Filter for `find_secrets`. Empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SecretQuery {
    pub group: Option<i64>,
    pub keyword: Option<String>,
}

impl SecretQuery {
    pub fn matches(&self, secret: &Secret) -> bool {
        if let Some(group) = self.group {
            if secret.group_id != group {
                return false;
            }
        }
        if let Some(keyword) = self.keyword.as_deref() {
            let keyword = keyword.to_lowercase();
            let hit = [&secret.resource, &secret.principal, &secret.note]
                .iter()
                .any(|field| field.to_lowercase().contains(&keyword));
            if !hit {
                return false;
            }
        }
        true
    }
}

/// Remote vault descriptor. Only `id` is interpreted; the rest is kept as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    pub id: RemoteId,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Vault {
    pub fn new(id: impl Into<RemoteId>) -> Self {
        Self {
            id: id.into(),
            attributes: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: RemoteId,
    /// Serialized change set. Servers send it as a JSON string; inline objects
    /// are accepted too.
    #[serde(default)]
    pub delta: Value,
}

impl Snapshot {
    pub fn changes(&self) -> Result<ChangeLog, serde_json::Error> {
        match &self.delta {
            Value::Null => Ok(ChangeLog::default()),
            Value::String(raw) if raw.trim().is_empty() => Ok(ChangeLog::default()),
            Value::String(raw) => serde_json::from_str(raw),
            other => serde_json::from_value(other.clone()),
        }
    }
}

/// The `sync` document of the `meta` store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub vault: Vault,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<Snapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<DateTime<Utc>>,
}

impl SyncStatus {
    pub fn new(vault_id: impl Into<RemoteId>) -> Self {
        Self {
            vault: Vault::new(vault_id),
            snapshot: None,
            when: None,
        }
    }

    pub fn cursor(&self) -> Option<&RemoteId> {
        self.snapshot.as_ref().map(|snapshot| &snapshot.id)
    }
}

/// Body of `GET /fetch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub vault: Vault,
    #[serde(default)]
    pub snapshots: Vec<Snapshot>,
}
